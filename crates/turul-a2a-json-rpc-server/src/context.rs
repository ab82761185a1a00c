//! Per-call transport metadata

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Transport-derived metadata for one dispatch call.
///
/// Built by the transport layer from the inbound request (HTTP method, URL and
/// headers) and handed to context-aware handlers. It is never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallContext {
    /// Transport method, e.g. `POST`
    pub method: String,
    /// Full request URL
    pub url: String,
    /// Request headers, names lowercased
    pub headers: BTreeMap<String, String>,
}

impl CallContext {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Add a header; repeated names are joined with `, `.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn insert_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        self.headers
            .entry(name)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// JSON form injected into handler parameters
    pub fn to_value(&self) -> Value {
        let headers = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        serde_json::json!({
            "method": self.method,
            "url": self.url,
            "headers": Value::Object(headers),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let ctx = CallContext::new("POST", "http://localhost:8000/a2a")
            .with_header("Content-Type", "application/json")
            .with_header("X-Trace", "a")
            .with_header("x-trace", "b");

        assert_eq!(ctx.header("content-type"), Some("application/json"));
        assert_eq!(ctx.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(ctx.header("x-trace"), Some("a, b"));
        assert_eq!(ctx.header("missing"), None);
    }

    #[test]
    fn test_to_value_shape() {
        let ctx = CallContext::new("POST", "http://localhost/a2a").with_header("Accept", "*/*");
        assert_eq!(
            ctx.to_value(),
            json!({
                "method": "POST",
                "url": "http://localhost/a2a",
                "headers": {"accept": "*/*"}
            })
        );
    }
}
