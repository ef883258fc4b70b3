//! Per-suite store for values passed between sequential steps
//!
//! A suite creates one context, hands it `&mut` to each step in order and
//! drops it when the suite ends. Steps capture values from responses (for
//! example a created payment ID) and later steps reference them as
//! `{{name}}` in URLs, parameters, headers and bodies.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::json;
use crate::path::FieldPath;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Stored values of one suite run
#[derive(Debug, Clone, Default)]
pub struct SuiteContext {
    values: BTreeMap<String, Value>,
}

impl SuiteContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug!(name = %name, "storing suite value");
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy the values at `fields` out of a response body. Paths that do not
    /// resolve are skipped. Returns the number of values stored.
    pub fn capture(&mut self, fields: &BTreeMap<String, FieldPath>, data: &Value) -> usize {
        let mut stored = 0;
        for (name, path) in fields {
            match path.resolve(data) {
                Some(value) => {
                    self.store(name.clone(), value.clone());
                    stored += 1;
                }
                None => debug!(name = %name, path = %path, "capture path not found"),
            }
        }
        stored
    }

    /// Replace `{{name}}` placeholders; unknown names are left untouched
    pub fn interpolate(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| match self.values.get(&caps[1]) {
                Some(value) => json::display(value),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Interpolate every string inside a JSON value. A string that is exactly
    /// one placeholder is replaced by the stored value itself, keeping its type.
    pub fn interpolate_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => {
                if let Some(caps) = PLACEHOLDER.captures(s) {
                    if caps[0].len() == s.len() {
                        if let Some(stored) = self.values.get(&caps[1]) {
                            return stored.clone();
                        }
                    }
                }
                Value::String(self.interpolate(s))
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.interpolate_value(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.interpolate_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}
