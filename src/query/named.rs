//! `:name` placeholder scanning and rewriting.
//!
//! String literals, quoted identifiers and `::` casts are skipped, so
//! `'a:b'`, `"col:x"` and `created::date` are never mistaken for parameters.

use crate::query::{Parameters, QueryError};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|::|:([A-Za-z_][A-Za-z0-9_]*)"#)
        .expect("placeholder pattern is valid")
});

/// Distinct placeholder names in order of first appearance.
///
/// ```
/// use incidentdb::query::placeholders;
///
/// let sql = "SELECT * FROM chat WHERE chatid = :id AND created::date > :day OR chatid = :id";
/// assert_eq!(placeholders(sql), vec!["id", "day"]);
/// ```
pub fn placeholders(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(sql) {
        if let Some(name) = caps.get(1) {
            if !names.iter().any(|n| n == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}

/// Rewrite `:name` placeholders to positional `$n` and collect the values in
/// position order. A name used twice maps to the same position.
pub fn to_positional(sql: &str, params: &Parameters) -> Result<(String, Vec<Value>), QueryError> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut values: Vec<Value> = Vec::new();
    let mut missing: Option<String> = None;

    let rewritten = PLACEHOLDER.replace_all(sql, |caps: &Captures<'_>| {
        let Some(name) = caps.get(1) else {
            return caps[0].to_string();
        };
        let name = name.as_str();
        if let Some(position) = positions.get(name) {
            return format!("${position}");
        }
        match params.get(name) {
            Some(value) => {
                values.push(value.clone());
                positions.insert(name.to_string(), values.len());
                format!("${}", values.len())
            }
            None => {
                missing.get_or_insert_with(|| name.to_string());
                caps[0].to_string()
            }
        }
    });

    match missing {
        Some(name) => Err(QueryError::UnboundParameter(name)),
        None => Ok((rewritten.into_owned(), values)),
    }
}
