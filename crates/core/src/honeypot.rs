//! Bot-submission trap for public forms.
//!
//! Every rendered form carries two extra inputs. `name__confirm` is hidden from people and
//! must come back empty. `from__confirm` carries the time the form was issued, sealed with the
//! honeypot secret, and must come back intact and not dated in the future.

use crate::config::CoreConfig;
use crate::constants::{HONEYPOT_NAME_FIELD, HONEYPOT_VALID_FROM_FIELD};
use crate::signing;
use crate::{HmsError, HmsResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Hidden inputs rendered into a protected form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoneypotInputs {
    pub name_field_name: &'static str,
    pub valid_from_field_name: &'static str,
    pub encrypted_valid_from: String,
}

#[derive(Debug, Clone)]
pub struct Honeypot {
    secret: String,
    check_valid_from: bool,
}

impl Honeypot {
    pub fn new(secret: impl Into<String>, check_valid_from: bool) -> Self {
        Self {
            secret: secret.into(),
            check_valid_from,
        }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.honeypot_secret(), cfg.honeypot_valid_from())
    }

    /// Inputs for a form issued at `now`.
    pub fn issue(&self, now: DateTime<Utc>) -> HoneypotInputs {
        HoneypotInputs {
            name_field_name: HONEYPOT_NAME_FIELD,
            valid_from_field_name: HONEYPOT_VALID_FROM_FIELD,
            encrypted_valid_from: signing::seal(&self.secret, &now.timestamp_millis().to_string()),
        }
    }

    /// Check the honeypot inputs of a posted form.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::SpamDetected`] when the name trap is filled, or (with valid-from
    /// checking on) when the timestamp is missing, tampered with, or in the future.
    pub fn check(&self, pairs: &[(String, String)], now: DateTime<Utc>) -> HmsResult<()> {
        let value_of = |field: &str| {
            pairs
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value.as_str())
        };

        if value_of(HONEYPOT_NAME_FIELD).is_some_and(|v| !v.is_empty()) {
            return Err(HmsError::SpamDetected("honeypot input not empty".into()));
        }

        if !self.check_valid_from {
            return Ok(());
        }

        let sealed = value_of(HONEYPOT_VALID_FROM_FIELD)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| HmsError::SpamDetected("missing honeypot valid from input".into()))?;

        let issued_at = signing::unseal(&self.secret, sealed)
            .and_then(|millis| millis.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| HmsError::SpamDetected("invalid honeypot valid from input".into()))?;

        if issued_at > now {
            return Err(HmsError::SpamDetected("honeypot valid from is in future".into()));
        }
        Ok(())
    }
}
