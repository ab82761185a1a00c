use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for an A2A request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Positional(Vec<Value>),
    /// Named parameters as an object
    Named(Map<String, Value>),
}

impl Default for RequestParams {
    fn default() -> Self {
        RequestParams::Named(Map::new())
    }
}

impl RequestParams {
    /// Get a parameter by name (named params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Named(map) => map.get(key),
            RequestParams::Positional(_) => None,
        }
    }

    /// Get a parameter by index (positional params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Positional(vec) => vec.get(index),
            RequestParams::Named(_) => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, RequestParams::Named(_))
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Named(map) => map.len(),
            RequestParams::Positional(vec) => vec.len(),
        }
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to a serde_json::Value for serialization
    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Named(map) => Value::Object(map.clone()),
            RequestParams::Positional(vec) => Value::Array(vec.clone()),
        }
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        RequestParams::Named(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Positional(vec)
    }
}

/// An A2A request that expects a response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            method: method.into(),
            params,
        }
    }

    /// Create a new request with no parameters
    pub fn new_no_params(id: RequestId, method: impl Into<String>) -> Self {
        Self::new(id, method, None)
    }

    /// Create a new request with named parameters
    pub fn new_with_named_params(
        id: RequestId,
        method: impl Into<String>,
        params: Map<String, Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Named(params)))
    }

    /// Create a new request with positional parameters
    pub fn new_with_positional_params(
        id: RequestId,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Positional(params)))
    }

    /// Get a parameter by name (if params are named)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }

    /// Get a parameter by index (if params are positional)
    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.as_ref()?.get_index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, json, to_string};

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest::new_no_params(RequestId::Number(1), "ping");

        let json = to_string(&request).unwrap();
        let parsed: JsonRpcRequest = from_str(&json).unwrap();

        assert_eq!(parsed.id, RequestId::Number(1));
        assert_eq!(parsed.method, "ping");
        assert!(parsed.params.is_none());
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_request_with_named_params() {
        let mut params = Map::new();
        params.insert("message".to_string(), json!("hi"));
        params.insert("language".to_string(), json!("rust"));

        let request = JsonRpcRequest::new_with_named_params(
            RequestId::String("req1".to_string()),
            "ai.review_code",
            params,
        );

        assert_eq!(request.get_param("message"), Some(&json!("hi")));
        assert_eq!(request.get_param("language"), Some(&json!("rust")));
        assert_eq!(request.get_param("missing"), None);
        assert_eq!(request.get_param_index(0), None);
    }

    #[test]
    fn test_request_with_positional_params() {
        let request = JsonRpcRequest::new_with_positional_params(
            RequestId::Number(2),
            "echo",
            vec![json!("hi"), json!(42)],
        );

        assert_eq!(request.get_param_index(0), Some(&json!("hi")));
        assert_eq!(request.get_param_index(1), Some(&json!(42)));
        assert_eq!(request.get_param_index(2), None);
        assert_eq!(request.get_param("message"), None);
    }

    #[test]
    fn test_params_shape_from_json() {
        let named: RequestParams = from_str(r#"{"a": 1}"#).unwrap();
        assert!(named.is_named());
        assert_eq!(named.len(), 1);

        let positional: RequestParams = from_str(r#"[1, 2, 3]"#).unwrap();
        assert!(!positional.is_named());
        assert_eq!(positional.to_value(), json!([1, 2, 3]));

        assert!(RequestParams::default().is_empty());
        assert!(RequestParams::default().is_named());
    }
}
