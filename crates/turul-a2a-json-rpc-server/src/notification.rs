use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{request::RequestParams, types::JsonRpcVersion};

/// An A2A notification (request without an id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
        }
    }

    /// Create a new notification with no parameters
    pub fn new_no_params(method: impl Into<String>) -> Self {
        Self::new(method, None)
    }

    /// Create a new notification with named parameters
    pub fn new_with_named_params(method: impl Into<String>, params: Map<String, Value>) -> Self {
        Self::new(method, Some(RequestParams::Named(params)))
    }

    /// Get a parameter by name (if params are named)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_string};

    #[test]
    fn test_notification_with_params() {
        let mut params = Map::new();
        params.insert("message".to_string(), json!("Hello"));

        let notification = JsonRpcNotification::new_with_named_params("echo", params);

        assert_eq!(notification.get_param("message"), Some(&json!("Hello")));
        assert_eq!(notification.get_param("level"), None);
    }

    #[test]
    fn test_notification_json_format() {
        let notification = JsonRpcNotification::new_no_params("ping");
        let json_str = to_string(&notification).unwrap();

        // Should not contain an "id" field
        assert!(!json_str.contains("\"id\""));
        assert!(json_str.contains("\"jsonrpc\":\"2.0\""));
        assert!(json_str.contains("\"method\":\"ping\""));
    }
}
