//! API Module
//!
//! HTTP and WebSocket surface of the relay.
//!
//! # Endpoints
//! - `GET /ws/lia` - Authenticated request/response stream (WebSocket)
//! - `GET /stats` - Content cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
