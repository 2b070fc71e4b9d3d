//! Lifecycle of one edit-form session.
//!
//! ```text
//! idle --submit--> validating --invalid--> error --submit--> validating
//!                      |
//!                      +--valid--> submitting --redirected--> redirected (terminal)
//!                                      |
//!                                      +--not updated--> idle
//! ```
//!
//! Nothing retries on its own; leaving `error` or `idle` always takes a new submission.

use crate::{HmsError, HmsResult};
use serde::Serialize;

/// Where the form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Idle,
    Validating,
    Error,
    Submitting,
    Redirected,
}

impl FormStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FormStatus::Idle => "idle",
            FormStatus::Validating => "validating",
            FormStatus::Error => "error",
            FormStatus::Submitting => "submitting",
            FormStatus::Redirected => "redirected",
        }
    }

    /// A submission round-trip is in flight.
    pub fn is_pending(self) -> bool {
        matches!(self, FormStatus::Validating | FormStatus::Submitting)
    }
}

/// Visual status of the reset and submit controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStatus {
    Idle,
    Pending,
    Error,
    Success,
}

/// Transition guard for [`FormStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormMachine {
    status: FormStatus,
}

impl Default for FormMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormMachine {
    pub fn new() -> Self {
        Self {
            status: FormStatus::Idle,
        }
    }

    /// Resume a machine at a known status.
    pub fn at(status: FormStatus) -> Self {
        Self { status }
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    /// The user submitted the form.
    pub fn submit(&mut self) -> HmsResult<()> {
        self.transition("submit", |from| match from {
            FormStatus::Idle | FormStatus::Error => Some(FormStatus::Validating),
            _ => None,
        })
    }

    /// Validation found field errors.
    pub fn reject(&mut self) -> HmsResult<()> {
        self.transition("reject", |from| match from {
            FormStatus::Validating => Some(FormStatus::Error),
            _ => None,
        })
    }

    /// Validation passed; persistence is under way.
    pub fn accept(&mut self) -> HmsResult<()> {
        self.transition("accept", |from| match from {
            FormStatus::Validating => Some(FormStatus::Submitting),
            _ => None,
        })
    }

    /// The record was updated and the client is navigating away.
    pub fn redirected(&mut self) -> HmsResult<()> {
        self.transition("redirected", |from| match from {
            FormStatus::Submitting => Some(FormStatus::Redirected),
            _ => None,
        })
    }

    /// Persistence reported that nothing was updated; the user stays on the form.
    pub fn not_updated(&mut self) -> HmsResult<()> {
        self.transition("not_updated", |from| match from {
            FormStatus::Submitting => Some(FormStatus::Idle),
            _ => None,
        })
    }

    /// Status shown on the reset and submit controls.
    pub fn button_status(&self) -> ButtonStatus {
        match self.status {
            FormStatus::Validating | FormStatus::Submitting => ButtonStatus::Pending,
            FormStatus::Error => ButtonStatus::Error,
            FormStatus::Redirected => ButtonStatus::Success,
            FormStatus::Idle => ButtonStatus::Idle,
        }
    }

    /// Controls are disabled while a submission is in flight.
    pub fn controls_disabled(&self) -> bool {
        self.status.is_pending()
    }

    fn transition(
        &mut self,
        event: &'static str,
        next: impl FnOnce(FormStatus) -> Option<FormStatus>,
    ) -> HmsResult<()> {
        let to = next(self.status).ok_or(HmsError::InvalidTransition {
            from: self.status.as_str(),
            event,
        })?;
        tracing::debug!(from = self.status.as_str(), to = to.as_str(), event, "form transition");
        self.status = to;
        Ok(())
    }
}
