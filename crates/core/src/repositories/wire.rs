//! On-disk YAML format for discharge summaries.
//!
//! The wire struct is strict (`deny_unknown_fields`) and uses the same camelCase keys as the
//! edit form. Parse errors name the failing path, e.g.
//! `summaryDrugInstruction[0].frequency`.

use crate::discharge_summary::{DischargeSummary, DrugInstruction, Narrative};
use crate::{HmsError, HmsResult, NonEmptyText};
use chrono::{DateTime, Utc};
use hms_types::{FrequencyCode, MealTiming, PaymentType};
use serde::{Deserialize, Serialize};

/// Parse a stored discharge summary.
///
/// # Errors
///
/// Returns [`HmsError::Translation`] naming the failing path when the document does not match
/// the wire schema (unknown keys, missing required keys, out-of-vocabulary values).
pub fn parse(yaml_text: &str) -> HmsResult<DischargeSummary> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    let wire = serde_path_to_error::deserialize::<_, DischargeSummaryWire>(deserializer).map_err(
        |err| {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            HmsError::Translation(format!(
                "Discharge summary schema mismatch at {path}: {source}"
            ))
        },
    )?;
    Ok(wire.into())
}

/// Render a discharge summary as YAML.
pub fn render(record: &DischargeSummary) -> HmsResult<String> {
    serde_yaml::to_string(&DischargeSummaryWire::from(record))
        .map_err(HmsError::YamlSerialization)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct DischargeSummaryWire {
    id: NonEmptyText,
    hospital_id: NonEmptyText,
    final_diagnosis: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    complaints_on_reporting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    past_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    history_of_presenting_illness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    physical_findings_of_examination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    laboratory_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    investigation_procedure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    therapeutic_procedure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    courses_of_treatment_in_hospital: Option<String>,
    #[serde(
        default,
        rename = "summaryOfICUStay",
        skip_serializing_if = "Option::is_none"
    )]
    summary_of_icu_stay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    future_advice_on_discharge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admit_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discharge_date: Option<DateTime<Utc>>,
    payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    summary_drug_instruction: Vec<DrugInstructionWire>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DrugInstructionWire {
    name: NonEmptyText,
    strength: NonEmptyText,
    frequency: FrequencyCode,
    duration: NonEmptyText,
    time: MealTiming,
}

impl From<DischargeSummaryWire> for DischargeSummary {
    fn from(wire: DischargeSummaryWire) -> Self {
        let mut narrative = Narrative {
            complaints_on_reporting: wire.complaints_on_reporting,
            past_history: wire.past_history,
            history_of_presenting_illness: wire.history_of_presenting_illness,
            physical_findings_of_examination: wire.physical_findings_of_examination,
            laboratory_data: wire.laboratory_data,
            investigation_procedure: wire.investigation_procedure,
            therapeutic_procedure: wire.therapeutic_procedure,
            courses_of_treatment_in_hospital: wire.courses_of_treatment_in_hospital,
            summary_of_icu_stay: wire.summary_of_icu_stay,
            future_advice_on_discharge: wire.future_advice_on_discharge,
        };
        // Blank sections on disk mean "not filled in".
        for field in crate::discharge_summary::NarrativeField::ALL {
            let value = narrative.get(field).map(str::to_string);
            narrative.set(field, value);
        }

        DischargeSummary {
            id: wire.id,
            hospital_id: wire.hospital_id,
            final_diagnosis: wire.final_diagnosis,
            narrative,
            admit_date: wire.admit_date,
            discharge_date: wire.discharge_date,
            payment_type: wire.payment_type,
            drugs: wire
                .summary_drug_instruction
                .into_iter()
                .map(|drug| DrugInstruction {
                    name: drug.name,
                    strength: drug.strength,
                    frequency: drug.frequency,
                    duration: drug.duration,
                    time: drug.time,
                })
                .collect(),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

impl From<&DischargeSummary> for DischargeSummaryWire {
    fn from(record: &DischargeSummary) -> Self {
        let n = record.narrative.clone();
        Self {
            id: record.id.clone(),
            hospital_id: record.hospital_id.clone(),
            final_diagnosis: record.final_diagnosis.clone(),
            complaints_on_reporting: n.complaints_on_reporting,
            past_history: n.past_history,
            history_of_presenting_illness: n.history_of_presenting_illness,
            physical_findings_of_examination: n.physical_findings_of_examination,
            laboratory_data: n.laboratory_data,
            investigation_procedure: n.investigation_procedure,
            therapeutic_procedure: n.therapeutic_procedure,
            courses_of_treatment_in_hospital: n.courses_of_treatment_in_hospital,
            summary_of_icu_stay: n.summary_of_icu_stay,
            future_advice_on_discharge: n.future_advice_on_discharge,
            admit_date: record.admit_date,
            discharge_date: record.discharge_date,
            payment_type: record.payment_type,
            summary_drug_instruction: record
                .drugs
                .iter()
                .map(|drug| DrugInstructionWire {
                    name: drug.name.clone(),
                    strength: drug.strength.clone(),
                    frequency: drug.frequency,
                    duration: drug.duration.clone(),
                    time: drug.time,
                })
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
