//! # HMS Core
//!
//! Business logic for editing in-patient discharge summaries:
//! - the form schema and its validation ([`schema`])
//! - loading a record for editing ([`retrieval`]) and handling a posted form ([`submission`])
//! - the form view model with its dynamic drug list ([`presentation`], [`drug_list`])
//! - storage behind the [`DischargeSummaryStore`] trait
//! - the honeypot, toast cookie and mailer collaborators
//!
//! **No API concerns**: HTTP routing, authentication and response mapping belong in
//! `api-rest` and `api-shared`.

pub mod config;
pub mod constants;
pub mod discharge_summary;
pub mod drug_list;
pub mod error;
pub mod form;
pub mod form_state;
pub mod honeypot;
pub mod mailer;
pub mod presentation;
pub mod repositories;
pub mod retrieval;
pub mod schema;
pub mod signing;
pub mod submission;
pub mod toast;
pub mod validation;

pub use config::CoreConfig;
pub use discharge_summary::{DischargeSummary, DischargeSummaryUpdate, DrugInstruction};
pub use error::{HmsError, HmsResult};
pub use hms_types::{FrequencyCode, MealTiming, NonEmptyText, PaymentType};
pub use repositories::{DischargeSummaryStore, InMemoryStore, YamlFileStore};
pub use submission::{submit_edit, SubmissionContext, SubmissionOutcome};
