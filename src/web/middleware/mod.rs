//! Middleware for Web API.

pub mod auth;
pub mod cors;

pub use auth::{guard_layer, Authorized, RequiredPermission};
pub use cors::create_cors_layer;
