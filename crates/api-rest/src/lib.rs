//! # API REST
//!
//! REST API implementation for HMS.
//!
//! Handles:
//! - HTTP endpoints with axum for the discharge summary edit page
//! - OpenAPI documentation
//! - REST-specific concerns (form decoding, cookies, redirects, CORS)
//!
//! Uses `api-shared` for identity resolution and shared DTOs, and `hms-core` for all
//! business logic.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod form_payload;
pub mod handlers;
pub mod openapi;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::router;
pub use state::AppState;
