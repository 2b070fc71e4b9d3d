//! Handling a posted edit form.
//!
//! Order of work for every post:
//! 1. Honeypot check. A tripped trap fails the whole request before anything is parsed.
//! 2. Parse the pairs and dispatch on the `intent` field.
//! 3. For a plain submit: validate, check the tenant, persist, and redirect with a toast.
//!
//! Structural intents (reset, insert, remove) and on-blur validation never persist.

use crate::constants::{
    view_path, DISCHARGE_SUMMARY_ID_FIELD, HOSPITAL_ID_FIELD, INTENT_FIELD,
};
use crate::discharge_summary::DischargeSummaryUpdate;
use crate::form::{Intent, SubmittedForm};
use crate::form_state::{FormMachine, FormStatus};
use crate::honeypot::Honeypot;
use crate::presentation::{render_edit_form, EditFormView, FormDraft};
use crate::repositories::DischargeSummaryStore;
use crate::retrieval::load_for_edit;
use crate::schema::{validate, FieldErrors};
use crate::toast::Toast;
use crate::HmsResult;
use chrono::{DateTime, Utc};

pub const UPDATED_TOAST_TITLE: &str = "Discharge Summary updated";
pub const UPDATED_TOAST_DESCRIPTION: &str = "Discharge Summary has been updated successfully.";
pub const TENANT_MISMATCH_MESSAGE: &str = "Does not match your hospital";
pub const RECORD_MISMATCH_MESSAGE: &str = "Does not match the record being edited";

/// Collaborators and settings for one submission.
pub struct SubmissionContext<'a> {
    pub store: &'a dyn DischargeSummaryStore,
    pub honeypot: &'a Honeypot,
    /// Hospital of the authenticated caller.
    pub caller_hospital_id: &'a str,
    pub enforce_tenant_match: bool,
    pub now: DateTime<Utc>,
}

/// What the caller should do with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Record updated; navigate to `location` and show `toast` there.
    Redirect { location: String, toast: Toast },
    /// Validation failed; redisplay the form with its errors.
    Rejected(Box<EditFormView>),
    /// A structural or validate-only intent; redisplay the form.
    Rendered(Box<EditFormView>),
    /// Validation passed but nothing was updated; stay put.
    NoOp,
}

/// Process the post of the edit form for `discharge_summary_id`.
///
/// # Errors
///
/// - [`crate::HmsError::SpamDetected`] when the honeypot trips.
/// - [`crate::HmsError::NotFound`] when a reset targets a record the caller cannot see.
/// - Storage failures from the store.
pub fn submit_edit(
    ctx: &SubmissionContext<'_>,
    discharge_summary_id: &str,
    pairs: &[(String, String)],
) -> HmsResult<SubmissionOutcome> {
    ctx.honeypot.check(pairs, ctx.now)?;

    let form = SubmittedForm::parse(pairs);
    let posted_draft = || {
        FormDraft::from_submitted(&form).with_identity(
            discharge_summary_id,
            ctx.enforce_tenant_match.then_some(ctx.caller_hospital_id),
        )
    };
    let rerender = |draft: &FormDraft, errors: &FieldErrors, status: FormStatus| {
        Box::new(render_edit_form(
            draft,
            errors,
            &FormMachine::at(status),
            ctx.honeypot.issue(ctx.now),
        ))
    };

    match &form.intent {
        Intent::Reset => {
            let record = load_for_edit(ctx.store, discharge_summary_id, ctx.caller_hospital_id)?;
            let draft = FormDraft::from_record(&record);
            Ok(SubmissionOutcome::Rendered(rerender(
                &draft,
                &FieldErrors::default(),
                FormStatus::Idle,
            )))
        }
        Intent::InsertDrug => {
            let mut draft = posted_draft();
            draft.drugs.append();
            Ok(SubmissionOutcome::Rendered(rerender(
                &draft,
                &FieldErrors::default(),
                FormStatus::Idle,
            )))
        }
        Intent::RemoveDrug(index) => {
            let mut draft = posted_draft();
            if draft.drugs.remove_at(*index).is_none() {
                tracing::debug!(index, "drug removal index out of range");
            }
            Ok(SubmissionOutcome::Rendered(rerender(
                &draft,
                &FieldErrors::default(),
                FormStatus::Idle,
            )))
        }
        Intent::Validate(field) => {
            let errors = check(ctx, discharge_summary_id, &form)
                .err()
                .map(|errors| errors.only(field))
                .unwrap_or_default();
            let status = if errors.is_empty() {
                FormStatus::Idle
            } else {
                FormStatus::Error
            };
            Ok(SubmissionOutcome::Rendered(rerender(
                &posted_draft(),
                &errors,
                status,
            )))
        }
        Intent::Unknown(raw) => {
            let mut errors = FieldErrors::default();
            errors.push(INTENT_FIELD, format!("Unknown intent '{raw}'"));
            Ok(SubmissionOutcome::Rejected(rerender(
                &posted_draft(),
                &errors,
                FormStatus::Error,
            )))
        }
        Intent::Submit => {
            let mut machine = FormMachine::new();
            machine.submit()?;

            let update = match check(ctx, discharge_summary_id, &form) {
                Ok(update) => update,
                Err(errors) => {
                    machine.reject()?;
                    tracing::info!(
                        discharge_summary_id,
                        fields = errors.len(),
                        "discharge summary submission rejected"
                    );
                    return Ok(SubmissionOutcome::Rejected(rerender(
                        &posted_draft(),
                        &errors,
                        machine.status(),
                    )));
                }
            };

            machine.accept()?;
            match ctx.store.update(&update)? {
                Some(record) => {
                    machine.redirected()?;
                    Ok(SubmissionOutcome::Redirect {
                        location: view_path(record.id.as_str()),
                        toast: Toast::success(UPDATED_TOAST_TITLE, UPDATED_TOAST_DESCRIPTION),
                    })
                }
                None => {
                    machine.not_updated()?;
                    tracing::warn!(
                        discharge_summary_id,
                        hospital_id = update.hospital_id.as_str(),
                        "validated submission matched no record"
                    );
                    Ok(SubmissionOutcome::NoOp)
                }
            }
        }
    }
}

/// Schema validation plus the identity checks that need request context.
fn check(
    ctx: &SubmissionContext<'_>,
    discharge_summary_id: &str,
    form: &SubmittedForm,
) -> Result<DischargeSummaryUpdate, FieldErrors> {
    let mut errors = match validate(form) {
        Ok(update) => {
            let errors = identity_errors(ctx, discharge_summary_id, &update);
            if errors.is_empty() {
                return Ok(update);
            }
            errors
        }
        Err(errors) => errors,
    };

    // Identity errors are reported alongside schema errors so the user sees everything at once.
    if let (Some(id), Some(hospital)) = (
        form.get(DISCHARGE_SUMMARY_ID_FIELD),
        form.get(HOSPITAL_ID_FIELD),
    ) {
        if errors.get(DISCHARGE_SUMMARY_ID_FIELD).is_empty()
            && errors.get(HOSPITAL_ID_FIELD).is_empty()
        {
            for (field, message) in posted_identity_errors(ctx, discharge_summary_id, id, hospital) {
                errors.push(field, message);
            }
        }
    }
    Err(errors)
}

fn identity_errors(
    ctx: &SubmissionContext<'_>,
    discharge_summary_id: &str,
    update: &DischargeSummaryUpdate,
) -> FieldErrors {
    let mut errors = FieldErrors::default();
    for (field, message) in posted_identity_errors(
        ctx,
        discharge_summary_id,
        update.discharge_summary_id.as_str(),
        update.hospital_id.as_str(),
    ) {
        errors.push(field, message);
    }
    errors
}

fn posted_identity_errors(
    ctx: &SubmissionContext<'_>,
    route_id: &str,
    posted_id: &str,
    posted_hospital: &str,
) -> Vec<(&'static str, &'static str)> {
    let mut found = Vec::new();
    if posted_id.trim() != route_id.trim() {
        found.push((DISCHARGE_SUMMARY_ID_FIELD, RECORD_MISMATCH_MESSAGE));
    }
    if posted_hospital.trim() != ctx.caller_hospital_id {
        if ctx.enforce_tenant_match {
            found.push((HOSPITAL_ID_FIELD, TENANT_MISMATCH_MESSAGE));
        } else {
            tracing::warn!(
                posted_hospital,
                caller_hospital = ctx.caller_hospital_id,
                "posted hospital id differs from caller; tenant match not enforced"
            );
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{HONEYPOT_NAME_FIELD, HONEYPOT_VALID_FROM_FIELD};
    use crate::discharge_summary::{DischargeSummary, Narrative};
    use crate::repositories::InMemoryStore;
    use crate::{HmsError, NonEmptyText};
    use hms_types::{FrequencyCode, MealTiming, PaymentType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts update calls on top of an in-memory store.
    struct CountingStore {
        inner: InMemoryStore,
        updates: AtomicUsize,
        last: std::sync::Mutex<Option<DischargeSummaryUpdate>>,
    }

    impl CountingStore {
        fn seeded() -> Self {
            let now = Utc::now();
            Self {
                inner: InMemoryStore::with_records([DischargeSummary {
                    id: NonEmptyText::new("ds1").unwrap(),
                    hospital_id: NonEmptyText::new("h1").unwrap(),
                    final_diagnosis: NonEmptyText::new("Fever").unwrap(),
                    narrative: Narrative::default(),
                    admit_date: None,
                    discharge_date: None,
                    payment_type: PaymentType::Card,
                    drugs: vec![],
                    created_at: now,
                    updated_at: now,
                }]),
                updates: AtomicUsize::new(0),
                last: std::sync::Mutex::new(None),
            }
        }
    }

    impl DischargeSummaryStore for CountingStore {
        fn find(&self, id: &str, hospital_id: &str) -> HmsResult<Option<DischargeSummary>> {
            self.inner.find(id, hospital_id)
        }
        fn update(
            &self,
            update: &DischargeSummaryUpdate,
        ) -> HmsResult<Option<DischargeSummary>> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(update.clone());
            self.inner.update(update)
        }
        fn insert(&self, record: DischargeSummary) -> HmsResult<()> {
            self.inner.insert(record)
        }
        fn list(&self, hospital_id: &str) -> HmsResult<Vec<DischargeSummary>> {
            self.inner.list(hospital_id)
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid_post() -> Vec<(String, String)> {
        pairs(&[
            ("dischargeSummaryId", "ds1"),
            ("hospitalId", "h1"),
            ("finalDiagnosis", "Pneumonia"),
            ("paymentType", "Cash"),
            ("summaryDrugInstruction[0].name", "Amoxicillin"),
            ("summaryDrugInstruction[0].strength", "500mg"),
            ("summaryDrugInstruction[0].frequency", "101"),
            ("summaryDrugInstruction[0].duration", "5"),
            ("summaryDrugInstruction[0].time", "after"),
        ])
    }

    fn run(
        store: &CountingStore,
        enforce: bool,
        caller: &str,
        post: &[(String, String)],
    ) -> HmsResult<SubmissionOutcome> {
        let honeypot = Honeypot::new("hp", false);
        let ctx = SubmissionContext {
            store,
            honeypot: &honeypot,
            caller_hospital_id: caller,
            enforce_tenant_match: enforce,
            now: Utc::now(),
        };
        submit_edit(&ctx, "ds1", post)
    }

    #[test]
    fn valid_submit_redirects_with_success_toast() {
        let store = CountingStore::seeded();
        let outcome = run(&store, true, "h1", &valid_post()).unwrap();
        let SubmissionOutcome::Redirect { location, toast } = outcome else {
            panic!("expected redirect, got {outcome:?}");
        };
        assert_eq!(location, "/in-patients/ds/ds1/view");
        assert_eq!(toast.title, UPDATED_TOAST_TITLE);
        assert_eq!(toast.description, UPDATED_TOAST_DESCRIPTION);
        assert_eq!(store.updates.load(Ordering::SeqCst), 1);

        let forwarded = store.last.lock().unwrap().clone().unwrap();
        let drugs = forwarded.summary_drug_instruction.unwrap();
        assert_eq!(drugs[0].frequency, FrequencyCode::MorningNight);
        assert_eq!(drugs[0].time, MealTiming::After);
    }

    #[test]
    fn honeypot_trips_before_any_processing() {
        let store = CountingStore::seeded();
        let mut post = valid_post();
        post.push((HONEYPOT_NAME_FIELD.into(), "I am a bot".into()));
        let err = run(&store, true, "h1", &post).expect_err("spam");
        assert!(matches!(err, HmsError::SpamDetected(_)));
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_valid_from_is_spam_when_checked() {
        let store = CountingStore::seeded();
        let honeypot = Honeypot::new("hp", true);
        let ctx = SubmissionContext {
            store: &store,
            honeypot: &honeypot,
            caller_hospital_id: "h1",
            enforce_tenant_match: true,
            now: Utc::now(),
        };
        assert!(submit_edit(&ctx, "ds1", &valid_post()).is_err());

        let mut post = valid_post();
        post.push((
            HONEYPOT_VALID_FROM_FIELD.into(),
            honeypot.issue(Utc::now()).encrypted_valid_from,
        ));
        assert!(matches!(
            submit_edit(&ctx, "ds1", &post).unwrap(),
            SubmissionOutcome::Redirect { .. }
        ));
    }

    #[test]
    fn invalid_submit_is_rejected_without_persisting() {
        let store = CountingStore::seeded();
        let mut post = valid_post();
        post.retain(|(k, _)| k != "finalDiagnosis");
        let outcome = run(&store, true, "h1", &post).unwrap();
        let SubmissionOutcome::Rejected(view) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(view.final_diagnosis.errors, ["Required"]);
        assert_eq!(view.status, FormStatus::Error);
        assert_eq!(view.payment_type.value, "Cash");
        assert_eq!(view.drug_list.entries.len(), 1);
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn foreign_hospital_id_is_a_field_error_when_enforced() {
        let store = CountingStore::seeded();
        let outcome = run(&store, true, "h2", &valid_post()).unwrap();
        let SubmissionOutcome::Rejected(view) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(view.hidden[1].errors, [TENANT_MISMATCH_MESSAGE]);
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn foreign_hospital_id_passes_through_when_not_enforced() {
        let store = CountingStore::seeded();
        let outcome = run(&store, false, "h2", &valid_post()).unwrap();
        assert!(matches!(outcome, SubmissionOutcome::Redirect { .. }));
    }

    #[test]
    fn posted_id_must_match_route() {
        let store = CountingStore::seeded();
        let mut post = valid_post();
        post.retain(|(k, _)| k != "dischargeSummaryId");
        post.push(("dischargeSummaryId".into(), "ds9".into()));
        let SubmissionOutcome::Rejected(view) = run(&store, true, "h1", &post).unwrap() else {
            panic!("expected rejection");
        };
        assert_eq!(view.hidden[0].errors, [RECORD_MISMATCH_MESSAGE]);
    }

    #[test]
    fn redisplayed_form_keeps_the_route_identity() {
        let store = CountingStore::seeded();
        let mut without_id = valid_post();
        without_id.retain(|(k, _)| k != "dischargeSummaryId");
        let mut other_id = without_id.clone();
        other_id.push(("dischargeSummaryId".into(), "ds9".into()));

        for post in [without_id, other_id] {
            let SubmissionOutcome::Rejected(view) = run(&store, true, "h1", &post).unwrap() else {
                panic!("expected rejection");
            };
            assert_eq!(view.action, "/in-patients/ds/ds1/edit");
            assert_eq!(view.hidden[0].value, "ds1");
        }

        let SubmissionOutcome::Rejected(view) = run(&store, true, "h2", &valid_post()).unwrap()
        else {
            panic!("expected rejection");
        };
        assert_eq!(view.hidden[1].value, "h2");

        let mut post = valid_post();
        post.push((INTENT_FIELD.into(), "insert:summaryDrugInstruction".into()));
        let SubmissionOutcome::Rendered(view) = run(&store, false, "h2", &post).unwrap() else {
            panic!("expected render");
        };
        assert_eq!(view.hidden[1].value, "h1");
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_record_updated_is_a_silent_no_op() {
        let store = CountingStore::seeded();
        let mut post = valid_post();
        post.retain(|(k, _)| k != "dischargeSummaryId");
        post.push(("dischargeSummaryId".into(), "ds2".into()));
        let honeypot = Honeypot::new("hp", false);
        let ctx = SubmissionContext {
            store: &store,
            honeypot: &honeypot,
            caller_hospital_id: "h1",
            enforce_tenant_match: true,
            now: Utc::now(),
        };
        let outcome = submit_edit(&ctx, "ds2", &post).unwrap();
        assert_eq!(outcome, SubmissionOutcome::NoOp);
        assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn insert_and_remove_restructure_without_persisting() {
        let store = CountingStore::seeded();
        let mut post = valid_post();
        post.push((INTENT_FIELD.into(), "insert:summaryDrugInstruction".into()));
        let SubmissionOutcome::Rendered(view) = run(&store, true, "h1", &post).unwrap() else {
            panic!("expected render");
        };
        assert_eq!(view.drug_list.entries.len(), 2);
        assert_eq!(view.drug_list.entries[1].fields[1].value, "");

        let mut post = valid_post();
        post.push((INTENT_FIELD.into(), "remove:summaryDrugInstruction:0".into()));
        let SubmissionOutcome::Rendered(view) = run(&store, true, "h1", &post).unwrap() else {
            panic!("expected render");
        };
        assert!(view.drug_list.entries.is_empty());
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reset_reloads_the_stored_record() {
        let store = CountingStore::seeded();
        let mut post = valid_post();
        post.push((INTENT_FIELD.into(), "reset".into()));
        let SubmissionOutcome::Rendered(view) = run(&store, true, "h1", &post).unwrap() else {
            panic!("expected render");
        };
        assert_eq!(view.final_diagnosis.value, "Fever");
        assert!(view.drug_list.entries.is_empty());
    }

    #[test]
    fn validate_intent_reports_only_the_named_field() {
        let store = CountingStore::seeded();
        let post = pairs(&[
            ("dischargeSummaryId", "ds1"),
            ("hospitalId", "h1"),
            ("paymentType", "Bitcoin"),
            (INTENT_FIELD, "validate:paymentType"),
        ]);
        let SubmissionOutcome::Rendered(view) = run(&store, true, "h1", &post).unwrap() else {
            panic!("expected render");
        };
        assert_eq!(view.payment_type.errors.len(), 1);
        assert!(view.final_diagnosis.errors.is_empty());
        assert_eq!(view.status, FormStatus::Error);
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_intent_is_rejected() {
        let store = CountingStore::seeded();
        let mut post = valid_post();
        post.push((INTENT_FIELD.into(), "delete-note".into()));
        let SubmissionOutcome::Rejected(_) = run(&store, true, "h1", &post).unwrap() else {
            panic!("expected rejection");
        };
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }
}
