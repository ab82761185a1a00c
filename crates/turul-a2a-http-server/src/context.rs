//! Call context extraction from HTTP requests

use hyper::header::HOST;
use hyper::{HeaderMap, Method, Uri};
use turul_a2a_json_rpc_server::CallContext;

/// Build the [`CallContext`] for one inbound request.
///
/// Origin-form URIs are completed from the `Host` header. Headers that are not
/// valid UTF-8 are skipped.
pub fn call_context_from_request(method: &Method, uri: &Uri, headers: &HeaderMap) -> CallContext {
    let mut context = CallContext::new(method.as_str(), full_url(uri, headers));
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            context.insert_header(name.as_str(), value);
        }
    }
    context
}

fn full_url(uri: &Uri, headers: &HeaderMap) -> String {
    if uri.authority().is_some() {
        return uri.to_string();
    }

    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    match headers.get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, path),
        None => path.to_string(),
    }
}
