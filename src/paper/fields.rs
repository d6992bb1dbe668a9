//! Lenient field access over a JSON object
//!
//! Stored lines and model replies are both read through [`Fields`]. A field
//! that is missing reads as its default. A field that is `null` or of the
//! wrong shape also reads as its default (a single string is accepted for a
//! list) and its key is noted, so callers can report what was coerced.

use serde_json::{Map, Value};

pub(crate) struct Fields {
    map: Map<String, Value>,
    coerced: Vec<String>,
}

impl Fields {
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self {
            map,
            coerced: Vec::new(),
        }
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub(crate) fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.map.contains_key(*k))
    }

    /// Remove and return the raw value under `key`.
    pub(crate) fn take(&mut self, key: &str) -> Option<Value> {
        self.map.remove(key)
    }

    pub(crate) fn note(&mut self, key: &str) {
        self.coerced.push(key.to_string());
    }

    pub(crate) fn string(&mut self, key: &str) -> String {
        let Some(value) = self.take(key) else {
            return String::new();
        };
        let (s, clean) = plain_string(value);
        if !clean {
            self.note(key);
        }
        s
    }

    pub(crate) fn string_list(&mut self, key: &str) -> Vec<String> {
        let Some(value) = self.take(key) else {
            return Vec::new();
        };
        let (items, clean) = string_list(value);
        if !clean {
            self.note(key);
        }
        items
    }

    /// An integer year; numeric strings are parsed, anything else is 0.
    pub(crate) fn year(&mut self, key: &str) -> i32 {
        let Some(value) = self.take(key) else {
            return 0;
        };
        let (year, clean) = match value {
            Value::Number(n) => match n.as_i64().and_then(|y| i32::try_from(y).ok()) {
                Some(y) => (y, true),
                None => (0, false),
            },
            Value::String(s) => (s.trim().parse().unwrap_or(0), false),
            _ => (0, false),
        };
        if !clean {
            self.note(key);
        }
        year
    }

    /// Keys not taken so far, and the keys that had to be coerced.
    pub(crate) fn finish(self) -> (Map<String, Value>, Vec<String>) {
        (self.map, self.coerced)
    }
}

/// A string value; `false` when anything else was replaced by "".
fn plain_string(value: Value) -> (String, bool) {
    match value {
        Value::String(s) => (s, true),
        _ => (String::new(), false),
    }
}

/// A list of strings; `false` when the value was not a list of strings.
/// Non-string items are dropped and a lone string becomes a one-item list.
fn string_list(value: Value) -> (Vec<String>, bool) {
    match value {
        Value::Array(items) => {
            let total = items.len();
            let strings: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            let clean = strings.len() == total;
            (strings, clean)
        }
        Value::String(s) if s.trim().is_empty() => (Vec::new(), false),
        Value::String(s) => (vec![s], false),
        _ => (Vec::new(), false),
    }
}
