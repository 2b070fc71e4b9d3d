//! # API Shared
//!
//! Shared utilities and definitions for HMS APIs.
//!
//! Contains:
//! - Wire DTOs with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - Caller identity resolution (`auth` module)
//!
//! Transport-agnostic: nothing here depends on an HTTP framework.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{AuthError, UserInfo};
pub use dto::{ErrorBody, ErrorDetail, HealthRes};
pub use health::HealthService;
