//! HTTP API for Tollgate.
//!
//! Thin axum glue over [`crate::auth`]: account routes, a profile picture
//! upload and sample resources guarded by the `Authorized` extractor.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod permissions;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
