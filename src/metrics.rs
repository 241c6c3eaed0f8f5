//! Query metrics and tracing spans.
//!
//! Metrics go to the global OpenTelemetry meter under `incidentdb_*`; the
//! application decides which exporter (if any) is installed. Both halves are
//! compiled only with their cargo feature.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<IncidentDbMetrics> = Lazy::new(IncidentDbMetrics::init);

#[cfg(feature = "metrics")]
pub struct IncidentDbMetrics {
    pub queries_total: Counter<u64>,
    pub query_duration: Histogram<f64>,
    pub query_errors: Counter<u64>,
    pub connection_wait_duration: Histogram<f64>,
    pub rows_mapped: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl IncidentDbMetrics {
    pub fn init() -> Self {
        let meter = global::meter("incidentdb");

        let queries_total = meter
            .u64_counter("incidentdb_queries_total")
            .with_description("Total statements executed")
            .build();

        let query_duration = meter
            .f64_histogram("incidentdb_query_duration_seconds")
            .with_description("Duration of statements")
            .build();

        let query_errors = meter
            .u64_counter("incidentdb_query_errors_total")
            .with_description("Statements that failed in the database")
            .build();

        let connection_wait_duration = meter
            .f64_histogram("incidentdb_connection_wait_seconds")
            .with_description("Time spent establishing connections")
            .build();

        let rows_mapped = meter
            .u64_counter("incidentdb_rows_mapped_total")
            .with_description("Raw rows consumed by row collectors")
            .build();

        Self {
            queries_total,
            query_duration,
            query_errors,
            connection_wait_duration,
            rows_mapped,
        }
    }

    pub fn record_query(&self, elapsed: std::time::Duration) {
        self.queries_total.add(1, &[]);
        self.query_duration.record(elapsed.as_secs_f64(), &[]);
    }

    pub fn record_query_error(&self) {
        self.query_errors.add(1, &[]);
    }

    pub fn record_connection_wait(&self, duration: std::time::Duration) {
        self.connection_wait_duration
            .record(duration.as_secs_f64(), &[]);
    }

    pub fn record_rows_mapped(&self, rows: usize) {
        self.rows_mapped.add(rows as u64, &[]);
    }
}

/// Spans wrapped around execution, connection and mapping.
#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    const MAX_STATEMENT_LEN: usize = 256;

    fn truncate(sql: &str) -> &str {
        match sql.char_indices().nth(MAX_STATEMENT_LEN) {
            Some((end, _)) => &sql[..end],
            None => sql,
        }
    }

    pub fn execute_query_span(sql: &str) -> Span {
        info_span!(
            "incidentdb.execute_query",
            db.system = "postgresql",
            db.statement = truncate(sql)
        )
    }

    pub fn acquire_connection_span() -> Span {
        info_span!("incidentdb.acquire_connection", db.system = "postgresql")
    }

    pub fn map_rows_span(table: &str) -> Span {
        info_span!("incidentdb.map_rows", db.sql.table = table)
    }

}
