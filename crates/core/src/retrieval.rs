//! Loading a discharge summary for display or editing.

use crate::discharge_summary::{to_display_date, DischargeSummary, DrugInstruction, Narrative};
use crate::repositories::DischargeSummaryStore;
use crate::{HmsError, HmsResult};
use chrono::{DateTime, Utc};
use hms_types::PaymentType;
use serde::Serialize;

pub const NOT_AVAILABLE_MESSAGE: &str = "Discharge Summary is not available";

/// Fetch the record `discharge_summary_id` of `hospital_id`.
///
/// # Errors
///
/// [`HmsError::NotFound`] when the id is blank or no such record exists for the hospital.
/// Storage failures are passed through.
pub fn load_for_edit(
    store: &dyn DischargeSummaryStore,
    discharge_summary_id: &str,
    hospital_id: &str,
) -> HmsResult<DischargeSummary> {
    let id = discharge_summary_id.trim();
    if id.is_empty() {
        return Err(HmsError::NotFound(NOT_AVAILABLE_MESSAGE.into()));
    }
    store
        .find(id, hospital_id)?
        .ok_or_else(|| HmsError::NotFound(NOT_AVAILABLE_MESSAGE.into()))
}

/// A record with its dates as `YYYY-MM-DD` strings (`""` when unset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DischargeSummaryDisplay {
    pub id: String,
    pub hospital_id: String,
    pub final_diagnosis: String,
    #[serde(flatten)]
    pub narrative: Narrative,
    pub admit_date: String,
    pub discharge_date: String,
    pub payment_type: PaymentType,
    pub summary_drug_instruction: Vec<DrugInstruction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DischargeSummary> for DischargeSummaryDisplay {
    fn from(record: &DischargeSummary) -> Self {
        Self {
            id: record.id.to_string(),
            hospital_id: record.hospital_id.to_string(),
            final_diagnosis: record.final_diagnosis.to_string(),
            narrative: record.narrative.clone(),
            admit_date: to_display_date(record.admit_date),
            discharge_date: to_display_date(record.discharge_date),
            payment_type: record.payment_type,
            summary_drug_instruction: record.drugs.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
