//! Test modules for turul-a2a-http-server crate
//!
//! Routing, status codes and envelopes, exercised through `A2aHttpHandler::respond`.

pub mod http_transport_tests;
