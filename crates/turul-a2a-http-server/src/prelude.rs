//! # HTTP A2A Server Prelude
//!
//! ```rust
//! use turul_a2a_http_server::prelude::*;
//! ```

pub use crate::{
    CorsLayer, HttpA2aError, HttpA2aServer, HttpA2aServerBuilder, Result, RouteHandler,
    RouteRequest, RouteResponse, ServerConfig,
};

pub use turul_a2a_json_rpc_server::prelude::*;
