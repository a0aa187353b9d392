use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::app::{PageturnError, Result};

/// Field-level reader for payloads whose key spelling and value types
/// drift between responses: the same field may arrive camelCase or
/// snake_case, as a number, a numeric string, or a stringified number.
///
/// For each logical field the caller supplies the accepted spellings in
/// preference order; per key the native type is tried first, then the
/// coerced forms. The first key that yields a value wins. A miss across
/// all keys is an error that names every key that was tried.
pub struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    pub fn new(value: &'a Value) -> Result<Self> {
        value
            .as_object()
            .map(|obj| Self { obj })
            .ok_or_else(|| PageturnError::Decode("expected a JSON object".into()))
    }

    pub fn int(&self, field: &'static str, keys: &[&str]) -> Result<i64> {
        for key in keys {
            if let Some(v) = self.obj.get(*key) {
                if let Some(i) = v.as_i64() {
                    return Ok(i);
                }
                if let Some(i) = v.as_str().and_then(|s| s.parse::<i64>().ok()) {
                    return Ok(i);
                }
                if let Some(f) = v.as_f64() {
                    return Ok(f as i64);
                }
            }
        }
        Err(self.missing(field, keys))
    }

    pub fn int_or(&self, field: &'static str, keys: &[&str], default: i64) -> i64 {
        self.int(field, keys).unwrap_or(default)
    }

    pub fn float(&self, field: &'static str, keys: &[&str]) -> Result<f64> {
        for key in keys {
            if let Some(v) = self.obj.get(*key) {
                if let Some(f) = v.as_f64() {
                    return Ok(f);
                }
                if let Some(f) = v.as_str().and_then(|s| s.parse::<f64>().ok()) {
                    return Ok(f);
                }
            }
        }
        Err(self.missing(field, keys))
    }

    /// Non-empty native strings win; numbers are stringified as a last
    /// resort per key.
    pub fn string(&self, field: &'static str, keys: &[&str]) -> Result<String> {
        for key in keys {
            if let Some(v) = self.obj.get(*key) {
                if let Some(s) = v.as_str().filter(|s| !s.is_empty()) {
                    return Ok(s.to_string());
                }
                if v.is_number() {
                    return Ok(v.to_string());
                }
            }
        }
        Err(self.missing(field, keys))
    }

    pub fn opt_string(&self, keys: &[&str]) -> Option<String> {
        for key in keys {
            if let Some(s) = self.obj.get(*key).and_then(Value::as_str) {
                return Some(s.to_string());
            }
        }
        None
    }

    pub fn string_map(&self, keys: &[&str]) -> Option<BTreeMap<String, String>> {
        for key in keys {
            if let Some(obj) = self.obj.get(*key).and_then(Value::as_object) {
                let mut map = BTreeMap::new();
                for (k, v) in obj {
                    map.insert(k.clone(), v.as_str()?.to_string());
                }
                return Some(map);
            }
        }
        None
    }

    fn missing(&self, field: &'static str, keys: &[&str]) -> PageturnError {
        PageturnError::MissingField {
            field,
            tried: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}
