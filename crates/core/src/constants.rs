//! Constants used throughout the HMS core crate.
//!
//! Field names, route shapes and storage paths live here so the schema, the form parser and
//! the presentation layer agree on them.

/// Default directory for record storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "hms_data";

/// Directory name for discharge summary storage.
pub const DISCHARGE_SUMMARY_DIR_NAME: &str = "discharge_summaries";

/// File extension for stored discharge summaries.
pub const RECORD_FILE_EXTENSION: &str = "yaml";

/// DOM id of the edit form.
pub const EDIT_FORM_ID: &str = "in-patient-registration-form";

/// Form field selecting reset/list/validate semantics.
pub const INTENT_FIELD: &str = "intent";

pub const DISCHARGE_SUMMARY_ID_FIELD: &str = "dischargeSummaryId";
pub const HOSPITAL_ID_FIELD: &str = "hospitalId";
pub const FINAL_DIAGNOSIS_FIELD: &str = "finalDiagnosis";
pub const ADMIT_DATE_FIELD: &str = "admitDate";
pub const DISCHARGE_DATE_FIELD: &str = "dischargeDate";
pub const PAYMENT_TYPE_FIELD: &str = "paymentType";

/// Name of the dynamic drug list; entries are `summaryDrugInstruction[i].<sub-field>`.
pub const DRUG_LIST_FIELD: &str = "summaryDrugInstruction";

/// Hidden per-entry field carrying the entry's stable key.
pub const DRUG_KEY_SUBFIELD: &str = "key";

/// Honeypot text input that humans never see and must stay empty.
pub const HONEYPOT_NAME_FIELD: &str = "name__confirm";

/// Honeypot input carrying the signed issue timestamp of the form.
pub const HONEYPOT_VALID_FROM_FIELD: &str = "from__confirm";

/// Cookie carrying a pending toast notification.
pub const TOAST_COOKIE_NAME: &str = "en_toast";

/// Default base URL of the transactional email API.
pub const DEFAULT_RESEND_API_BASE: &str = "https://api.resend.com";

/// Maximum length of an identifier used as a storage path component.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Route of the edit page for a discharge summary.
pub fn edit_path(discharge_summary_id: &str) -> String {
    format!("/in-patients/ds/{discharge_summary_id}/edit")
}

/// Route of the read-only confirmation view for a discharge summary.
pub fn view_path(discharge_summary_id: &str) -> String {
    format!("/in-patients/ds/{discharge_summary_id}/view")
}
