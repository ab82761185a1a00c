//! HTTP Transport Tests
//!
//! - Request-mode and notification-mode endpoints
//! - Status codes for decode failures, empty bodies and notifications
//! - CORS handling and OPTIONS requests
//! - Call context reaching context-aware methods

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::FutureExt;
use http_body_util::BodyExt;
use hyper::header::{CONTENT_TYPE, HOST, HeaderValue};
use hyper::{HeaderMap, Method, StatusCode, Uri};
use serde_json::{Value, json};

use turul_a2a_json_rpc_server::{FunctionHandler, HandlerError, HandlerResult, RequestParams};

use crate::server::HttpA2aServer;
use crate::handler::A2aHttpHandler;

async fn echo(params: RequestParams) -> HandlerResult<Value> {
    let message = params
        .get("message")
        .or_else(|| params.get_index(0))
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::invalid_params("message is required"))?
        .to_string();
    let length = message.chars().count();
    Ok(json!({"echo": message, "length": length}))
}

fn test_handler(seen: Arc<Mutex<Vec<String>>>) -> A2aHttpHandler {
    HttpA2aServer::builder()
        .method("echo", FunctionHandler::new(|params, _ctx| echo(params).boxed()))
        .method(
            "whoami",
            FunctionHandler::context_aware(|params, _ctx| {
                async move { Ok(params.get("context").cloned().unwrap_or(Value::Null)) }.boxed()
            }),
        )
        .method(
            "record",
            FunctionHandler::new(move |params, _ctx| {
                let seen = seen.clone();
                async move {
                    let tag = params.get("tag").and_then(Value::as_str).unwrap_or("-").to_string();
                    seen.lock().unwrap().push(tag);
                    Ok(Value::Null)
                }
                .boxed()
            }),
        )
        .max_body_size(4096)
        .build()
        .unwrap()
        .handler()
        .clone()
}

fn headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(HOST, HeaderValue::from_static("localhost:8000"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

async fn call(handler: &A2aHttpHandler, method: Method, path: &str, body: &str) -> (StatusCode, HeaderMap, Option<Value>) {
    let uri: Uri = path.parse().unwrap();
    let response = handler
        .respond(method, uri, headers(), Bytes::from(body.to_string()))
        .await;
    let status = response.status();
    let response_headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };
    (status, response_headers, json)
}

#[tokio::test]
async fn test_echo_request() {
    let handler = test_handler(Default::default());
    let (status, headers, body) = call(
        &handler,
        Method::POST,
        "/a2a",
        r#"{"jsonrpc":"2.0","method":"echo","params":{"message":"hi"},"id":1}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(
        body.unwrap(),
        json!({"success": true, "data": {"jsonrpc": "2.0", "id": 1, "result": {"echo": "hi", "length": 2}}})
    );
}

#[tokio::test]
async fn test_unknown_method_is_enveloped() {
    let handler = test_handler(Default::default());
    let (status, _, body) = call(
        &handler,
        Method::POST,
        "/a2a",
        r#"{"jsonrpc":"2.0","method":"nope","id":1}"#,
    )
    .await;

    let body = body.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "not_found");
    assert_eq!(body["error"]["message"], "Method 'nope' not found");
}

#[tokio::test]
async fn test_batch_request() {
    let handler = test_handler(Default::default());
    let (status, _, body) = call(
        &handler,
        Method::POST,
        "/a2a",
        r#"[{"jsonrpc":"2.0","method":"echo","params":{"message":"a"},"id":1},
            {"jsonrpc":"2.0","method":"echo","params":{"message":"bb"},"id":2}]"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["data"]["result"], json!({"echo": "a", "length": 1}));
    assert_eq!(items[1]["data"]["result"], json!({"echo": "bb", "length": 2}));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let handler = test_handler(Default::default());
    let (status, _, body) = call(&handler, Method::POST, "/a2a", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body.unwrap();
    assert_eq!(body["error"]["kind"], "bad_request");
    assert_eq!(body["error"]["message"], "Invalid JSON in request body");
    assert!(body["error"]["suggestion"].is_string());
}

#[tokio::test]
async fn test_empty_bodies_are_bad_request() {
    let handler = test_handler(Default::default());
    for body in ["", "null", "{}", "[]", "\"\""] {
        let (status, _, response) = call(&handler, Method::POST, "/a2a", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(response.unwrap()["error"]["message"], "Empty request body");
    }
}

#[tokio::test]
async fn test_structurally_invalid_object_is_bad_request() {
    let handler = test_handler(Default::default());
    let (status, _, body) = call(&handler, Method::POST, "/a2a", r#"{"jsonrpc":"2.0","id":1}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.unwrap()["error"]["message"].as_str().unwrap().contains("method"));
}

#[tokio::test]
async fn test_notification_on_request_endpoint_is_no_content() {
    let seen: Arc<Mutex<Vec<String>>> = Default::default();
    let handler = test_handler(seen.clone());
    let (status, _, body) = call(
        &handler,
        Method::POST,
        "/a2a",
        r#"{"jsonrpc":"2.0","method":"record","params":{"tag":"n"}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_none());
    assert_eq!(*seen.lock().unwrap(), vec!["n"]);
}

#[tokio::test]
async fn test_notify_endpoint_always_accepted() {
    let seen: Arc<Mutex<Vec<String>>> = Default::default();
    let handler = test_handler(seen.clone());

    let (status, _, body) = call(
        &handler,
        Method::POST,
        "/a2a/notify",
        r#"[{"jsonrpc":"2.0","method":"record","params":{"tag":"1"}},
            {"jsonrpc":"2.0","method":"nope"},
            {"jsonrpc":"2.0","method":"record","params":{"tag":"2"}}]"#,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body.is_none());
    assert_eq!(*seen.lock().unwrap(), vec!["1", "2"]);

    let (status, _, _) = call(&handler, Method::POST, "/a2a/notify", "{garbage").await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _, _) = call(&handler, Method::POST, "/a2a/notify", "").await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_context_reaches_context_aware_method() {
    let handler = test_handler(Default::default());
    let (_, _, body) = call(
        &handler,
        Method::POST,
        "/a2a?trace=1",
        r#"{"jsonrpc":"2.0","method":"whoami","id":"ctx"}"#,
    )
    .await;

    let result = &body.unwrap()["data"]["result"];
    assert_eq!(result["method"], "POST");
    assert_eq!(result["url"], "http://localhost:8000/a2a?trace=1");
    assert_eq!(result["headers"]["content-type"], "application/json");
}

#[tokio::test]
async fn test_options_and_method_not_allowed() {
    let handler = test_handler(Default::default());

    let (status, headers, _) = call(&handler, Method::OPTIONS, "/a2a", "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), "*");

    let (status, headers, body) = call(&handler, Method::GET, "/a2a", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers.get("Allow").unwrap(), "POST, OPTIONS");
    assert_eq!(body.unwrap()["success"], false);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let handler = test_handler(Default::default());
    let (status, _, body) = call(&handler, Method::GET, "/missing", "").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = body.unwrap();
    assert_eq!(body["error"]["kind"], "not_found");
    assert!(body["error"]["suggestion"].as_str().unwrap().contains("/a2a"));
}

#[tokio::test]
async fn test_cors_headers_follow_config() {
    let handler = test_handler(Default::default());
    let (_, headers, _) = call(&handler, Method::GET, "/missing", "").await;
    assert!(headers.contains_key("Access-Control-Allow-Origin"));

    let handler = HttpA2aServer::builder().cors(false).build().unwrap().handler().clone();
    let (_, headers, _) = call(&handler, Method::GET, "/missing", "").await;
    assert!(!headers.contains_key("Access-Control-Allow-Origin"));
}
