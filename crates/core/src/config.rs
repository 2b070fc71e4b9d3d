//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing in request handling reads process-wide environment variables; the helpers here take
//! the raw values as arguments so binaries and tests decide where they come from.

use crate::constants::{DEFAULT_DATA_DIR, DISCHARGE_SUMMARY_DIR_NAME};
use crate::{HmsError, HmsResult, NonEmptyText};
use std::path::PathBuf;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    session_secret: NonEmptyText,
    honeypot_secret: NonEmptyText,
    honeypot_valid_from: bool,
    enforce_tenant_match: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `honeypot_secret` falls back to `session_secret` when absent. Valid-from checking and
    /// tenant matching default to on; use the builder-style setters to change them.
    pub fn new(
        data_dir: PathBuf,
        session_secret: &str,
        honeypot_secret: Option<&str>,
    ) -> HmsResult<Self> {
        let session_secret = NonEmptyText::new(session_secret)
            .map_err(|_| HmsError::InvalidInput("session secret cannot be empty".into()))?;
        let honeypot_secret = match honeypot_secret.map(str::trim).filter(|s| !s.is_empty()) {
            Some(secret) => NonEmptyText::new(secret)
                .map_err(|_| HmsError::InvalidInput("honeypot secret cannot be empty".into()))?,
            None => session_secret.clone(),
        };

        Ok(Self {
            data_dir,
            session_secret,
            honeypot_secret,
            honeypot_valid_from: true,
            enforce_tenant_match: true,
        })
    }

    /// Enable or disable the honeypot valid-from timestamp check.
    pub fn with_honeypot_valid_from(mut self, enabled: bool) -> Self {
        self.honeypot_valid_from = enabled;
        self
    }

    /// Enable or disable rejecting a posted hospital id that differs from the caller's.
    pub fn with_enforce_tenant_match(mut self, enabled: bool) -> Self {
        self.enforce_tenant_match = enabled;
        self
    }

    pub fn discharge_summary_dir(&self) -> PathBuf {
        self.data_dir.join(DISCHARGE_SUMMARY_DIR_NAME)
    }

    pub fn session_secret(&self) -> &str {
        self.session_secret.as_str()
    }

    pub fn honeypot_secret(&self) -> &str {
        self.honeypot_secret.as_str()
    }

    pub fn honeypot_valid_from(&self) -> bool {
        self.honeypot_valid_from
    }

    pub fn enforce_tenant_match(&self) -> bool {
        self.enforce_tenant_match
    }
}

/// Resolve the data directory from an optional override.
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse a boolean flag from an optional string value.
///
/// Accepts `1/true/yes/on` and `0/false/no/off` (case-insensitive). `None` or blank yields
/// `default`.
///
/// # Errors
///
/// Returns [`HmsError::InvalidInput`] naming `name` for any other value.
pub fn flag_from_env_value(name: &str, value: Option<String>, default: bool) -> HmsResult<bool> {
    let Some(raw) = value.map(|v| v.trim().to_ascii_lowercase()) else {
        return Ok(default);
    };

    match raw.as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(HmsError::InvalidInput(format!(
            "{name} must be a boolean flag, got '{other}'"
        ))),
    }
}
