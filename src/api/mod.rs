//! API Module
//!
//! HTTP handlers and routing for the tiered cache REST API.
//!
//! # Endpoints
//! - `PUT /cache/:namespace/:key` - Store a value
//! - `GET /cache/:namespace/:key` - Retrieve a value
//! - `DELETE /cache/:namespace/:key` - Delete a value
//! - `POST /cache/:namespace/invalidate` - Delete keys matching a glob
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
