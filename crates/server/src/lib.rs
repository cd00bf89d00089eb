//! Essay correction HTTP server
//!
//! Thin axum wrapper around the correction pipeline: one correction
//! endpoint, a status endpoint and the usual middleware stack.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;
