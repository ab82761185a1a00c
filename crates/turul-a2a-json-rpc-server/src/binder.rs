//! Shapes raw request params into handler arguments

use tracing::warn;

use crate::context::CallContext;
use crate::request::RequestParams;

/// Reserved named-parameter key for the injected call context
pub const CONTEXT_PARAM: &str = "context";

/// Arguments handed to a [`MethodHandler`](crate::MethodHandler)
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParams {
    pub params: RequestParams,
    pub context: Option<CallContext>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterBinder;

impl ParameterBinder {
    /// Bind `params` for `method`.
    ///
    /// Absent params become an empty named map. When the handler accepts context, the
    /// serialized context is inserted under `"context"` (named params, replacing any
    /// caller value) or appended as the last item (positional params).
    pub fn bind(
        method: &str,
        params: Option<RequestParams>,
        context: &CallContext,
        accepts_context: bool,
    ) -> BoundParams {
        let params = params.unwrap_or_default();
        if !accepts_context {
            return BoundParams {
                params,
                context: None,
            };
        }

        let params = match params {
            RequestParams::Named(mut map) => {
                if map.insert(CONTEXT_PARAM.to_string(), context.to_value()).is_some() {
                    warn!(
                        "Caller-supplied '{}' parameter for method '{}' replaced by call context",
                        CONTEXT_PARAM, method
                    );
                }
                RequestParams::Named(map)
            }
            RequestParams::Positional(mut items) => {
                items.push(context.to_value());
                RequestParams::Positional(items)
            }
        };

        BoundParams {
            params,
            context: Some(context.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use tracing_test::traced_test;

    fn ctx() -> CallContext {
        CallContext::new("POST", "http://localhost/a2a").with_header("X-Test", "1")
    }

    #[test]
    fn test_absent_params_become_empty_map() {
        let bound = ParameterBinder::bind("ping", None, &ctx(), false);
        assert_eq!(bound.params, RequestParams::Named(Map::new()));
        assert!(bound.context.is_none());
    }

    #[test]
    fn test_plain_handler_gets_params_untouched() {
        let mut map = Map::new();
        map.insert("context".to_string(), json!("caller value"));
        let bound = ParameterBinder::bind("ai.chat", Some(RequestParams::Named(map.clone())), &ctx(), false);

        assert_eq!(bound.params, RequestParams::Named(map));
    }

    #[test]
    fn test_named_params_gain_context() {
        let mut map = Map::new();
        map.insert("message".to_string(), json!("hi"));
        let bound = ParameterBinder::bind("echo", Some(map.into()), &ctx(), true);

        assert_eq!(bound.params.get("message"), Some(&json!("hi")));
        assert_eq!(bound.params.get("context"), Some(&ctx().to_value()));
        assert_eq!(bound.context, Some(ctx()));
    }

    #[test]
    fn test_absent_params_with_context() {
        let bound = ParameterBinder::bind("whoami", None, &ctx(), true);
        assert_eq!(bound.params.len(), 1);
        assert_eq!(bound.params.get("context").unwrap()["headers"]["x-test"], "1");
    }

    #[test]
    #[traced_test]
    fn test_caller_context_key_is_overwritten() {
        let mut map = Map::new();
        map.insert("context".to_string(), json!("caller value"));
        let bound = ParameterBinder::bind("echo", Some(map.into()), &ctx(), true);

        assert_eq!(bound.params.get("context"), Some(&ctx().to_value()));
        assert!(logs_contain("replaced by call context"));
    }

    #[test]
    fn test_positional_params_gain_trailing_context() {
        let bound = ParameterBinder::bind(
            "echo",
            Some(RequestParams::Positional(vec![json!("hi")])),
            &ctx(),
            true,
        );

        assert_eq!(bound.params.get_index(0), Some(&json!("hi")));
        assert_eq!(bound.params.get_index(1), Some(&ctx().to_value()));
        assert_eq!(bound.params.len(), 2);
    }
}
