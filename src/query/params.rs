//! Named parameter bindings.

use crate::query::QueryError;
use crate::value::Value;
use std::collections::HashMap;

/// Ordered name → value bindings of one statement
///
/// ```
/// use incidentdb::Parameters;
///
/// let params = Parameters::new().with("incidentid", 7).with("name", "Flood");
/// assert_eq!(params.len(), 2);
/// assert!(params.contains("name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, Value)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Parameters::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Bind `name`, replacing any earlier value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Bind a fresh name; binding the same name twice is an error.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), QueryError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(QueryError::DuplicateParameter(name));
        }
        self.entries.push((name, value.into()));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<N, V> FromIterator<(N, V)> for Parameters
where
    N: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}

/// Turn a column reference into a placeholder-safe name:
/// `incident.incidentid` → `incident_incidentid`.
pub(crate) fn flatten_name(column: &str) -> String {
    let flat: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match flat.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("p_{flat}"),
        Some(_) => flat,
        None => "p".to_string(),
    }
}

/// Allocates unique parameter names while a model renders.
#[derive(Debug, Default)]
pub(crate) struct Binder {
    params: Parameters,
    suffixes: HashMap<String, usize>,
}

impl Binder {
    /// Register a caller-chosen name.
    pub(crate) fn bind_named(&mut self, name: &str, value: Value) -> Result<(), QueryError> {
        self.params.insert(name, value)
    }

    /// Bind `value` under a name derived from `hint`, suffixing `_1`, `_2`, …
    /// when the plain name is taken. Returns the allocated name.
    pub(crate) fn bind_auto(&mut self, hint: &str, value: Value) -> String {
        let base = flatten_name(hint);
        let mut name = base.clone();
        while self.params.contains(&name) {
            let n = self.suffixes.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{base}_{n}");
        }
        self.params.entries.push((name.clone(), value));
        name
    }

    pub(crate) fn into_parameters(self) -> Parameters {
        self.params
    }
}
