//! Discharge summary domain types.
//!
//! A discharge summary closes out one admission episode. It is always scoped to a hospital
//! (the tenant); the pair `(hospital_id, id)` addresses exactly one record.
//!
//! Two shapes live here:
//! - [`DischargeSummary`]: the stored record, with dates as UTC date-times.
//! - [`DischargeSummaryUpdate`]: the validated result of an edit submission, with dates as
//!   calendar dates. It carries exactly the fields the edit form is allowed to change.

use crate::NonEmptyText;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hms_types::{FrequencyCode, MealTiming, PaymentType};
use serde::Serialize;

/// Optional free-text sections of a discharge summary, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NarrativeField {
    ComplaintsOnReporting,
    PastHistory,
    HistoryOfPresentingIllness,
    PhysicalFindingsOfExamination,
    LaboratoryData,
    InvestigationProcedure,
    TherapeuticProcedure,
    CoursesOfTreatmentInHospital,
    SummaryOfIcuStay,
    FutureAdviceOnDischarge,
}

impl NarrativeField {
    pub const ALL: [NarrativeField; 10] = [
        NarrativeField::ComplaintsOnReporting,
        NarrativeField::PastHistory,
        NarrativeField::HistoryOfPresentingIllness,
        NarrativeField::PhysicalFindingsOfExamination,
        NarrativeField::LaboratoryData,
        NarrativeField::InvestigationProcedure,
        NarrativeField::TherapeuticProcedure,
        NarrativeField::CoursesOfTreatmentInHospital,
        NarrativeField::SummaryOfIcuStay,
        NarrativeField::FutureAdviceOnDischarge,
    ];

    /// Form field name (also the on-disk key).
    pub fn name(self) -> &'static str {
        match self {
            NarrativeField::ComplaintsOnReporting => "complaintsOnReporting",
            NarrativeField::PastHistory => "pastHistory",
            NarrativeField::HistoryOfPresentingIllness => "historyOfPresentingIllness",
            NarrativeField::PhysicalFindingsOfExamination => "physicalFindingsOfExamination",
            NarrativeField::LaboratoryData => "laboratoryData",
            NarrativeField::InvestigationProcedure => "investigationProcedure",
            NarrativeField::TherapeuticProcedure => "therapeuticProcedure",
            NarrativeField::CoursesOfTreatmentInHospital => "coursesOfTreatmentInHospital",
            NarrativeField::SummaryOfIcuStay => "summaryOfICUStay",
            NarrativeField::FutureAdviceOnDischarge => "futureAdviceOnDischarge",
        }
    }

    /// Label shown next to the textarea.
    pub fn label(self) -> &'static str {
        match self {
            NarrativeField::ComplaintsOnReporting => "Complaints On Reporting",
            NarrativeField::PastHistory => "Past History",
            NarrativeField::HistoryOfPresentingIllness => "History Of Presenting Illness",
            NarrativeField::PhysicalFindingsOfExamination => "Physical Findings Of Examination",
            NarrativeField::LaboratoryData => "Laboratory Data",
            NarrativeField::InvestigationProcedure => "Investigation Procedure",
            NarrativeField::TherapeuticProcedure => "Therapeutic Procedure",
            NarrativeField::CoursesOfTreatmentInHospital => "Courses Of Treatment In Hospital",
            NarrativeField::SummaryOfIcuStay => "Summary Of ICU Stay",
            NarrativeField::FutureAdviceOnDischarge => "Future Advice On Discharge",
        }
    }
}

/// The optional free-text sections. `None` means the section was left blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub complaints_on_reporting: Option<String>,
    pub past_history: Option<String>,
    pub history_of_presenting_illness: Option<String>,
    pub physical_findings_of_examination: Option<String>,
    pub laboratory_data: Option<String>,
    pub investigation_procedure: Option<String>,
    pub therapeutic_procedure: Option<String>,
    pub courses_of_treatment_in_hospital: Option<String>,
    #[serde(rename = "summaryOfICUStay")]
    pub summary_of_icu_stay: Option<String>,
    pub future_advice_on_discharge: Option<String>,
}

impl Narrative {
    pub fn get(&self, field: NarrativeField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Set a section; blank text clears it.
    pub fn set(&mut self, field: NarrativeField, value: Option<String>) {
        *self.slot_mut(field) = value.filter(|v| !v.trim().is_empty());
    }

    fn slot(&self, field: NarrativeField) -> &Option<String> {
        match field {
            NarrativeField::ComplaintsOnReporting => &self.complaints_on_reporting,
            NarrativeField::PastHistory => &self.past_history,
            NarrativeField::HistoryOfPresentingIllness => &self.history_of_presenting_illness,
            NarrativeField::PhysicalFindingsOfExamination => {
                &self.physical_findings_of_examination
            }
            NarrativeField::LaboratoryData => &self.laboratory_data,
            NarrativeField::InvestigationProcedure => &self.investigation_procedure,
            NarrativeField::TherapeuticProcedure => &self.therapeutic_procedure,
            NarrativeField::CoursesOfTreatmentInHospital => &self.courses_of_treatment_in_hospital,
            NarrativeField::SummaryOfIcuStay => &self.summary_of_icu_stay,
            NarrativeField::FutureAdviceOnDischarge => &self.future_advice_on_discharge,
        }
    }

    fn slot_mut(&mut self, field: NarrativeField) -> &mut Option<String> {
        match field {
            NarrativeField::ComplaintsOnReporting => &mut self.complaints_on_reporting,
            NarrativeField::PastHistory => &mut self.past_history,
            NarrativeField::HistoryOfPresentingIllness => &mut self.history_of_presenting_illness,
            NarrativeField::PhysicalFindingsOfExamination => {
                &mut self.physical_findings_of_examination
            }
            NarrativeField::LaboratoryData => &mut self.laboratory_data,
            NarrativeField::InvestigationProcedure => &mut self.investigation_procedure,
            NarrativeField::TherapeuticProcedure => &mut self.therapeutic_procedure,
            NarrativeField::CoursesOfTreatmentInHospital => {
                &mut self.courses_of_treatment_in_hospital
            }
            NarrativeField::SummaryOfIcuStay => &mut self.summary_of_icu_stay,
            NarrativeField::FutureAdviceOnDischarge => &mut self.future_advice_on_discharge,
        }
    }
}

/// One prescribed medication line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugInstruction {
    pub name: NonEmptyText,
    pub strength: NonEmptyText,
    pub frequency: FrequencyCode,
    /// Number of days, kept as entered.
    pub duration: NonEmptyText,
    pub time: MealTiming,
}

/// A stored discharge summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DischargeSummary {
    pub id: NonEmptyText,
    pub hospital_id: NonEmptyText,
    pub final_diagnosis: NonEmptyText,
    pub narrative: Narrative,
    pub admit_date: Option<DateTime<Utc>>,
    pub discharge_date: Option<DateTime<Utc>>,
    pub payment_type: PaymentType,
    /// Prescription order is meaningful.
    pub drugs: Vec<DrugInstruction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DischargeSummary {
    /// Overwrite every editable field from a validated update.
    ///
    /// Identity fields and `created_at` are left alone. No merge is attempted: fields absent
    /// from the update are cleared, matching a full-form submit.
    pub fn apply(&mut self, update: &DischargeSummaryUpdate, now: DateTime<Utc>) {
        self.final_diagnosis = update.final_diagnosis.clone();
        self.narrative = update.narrative.clone();
        self.admit_date = update.admit_date.map(calendar_date_to_stored);
        self.discharge_date = update.discharge_date.map(calendar_date_to_stored);
        self.payment_type = update.payment_type;
        self.drugs = update.summary_drug_instruction.clone().unwrap_or_default();
        self.updated_at = now;
    }
}

/// The validated value of an edit submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DischargeSummaryUpdate {
    pub discharge_summary_id: NonEmptyText,
    pub hospital_id: NonEmptyText,
    pub final_diagnosis: NonEmptyText,
    #[serde(flatten)]
    pub narrative: Narrative,
    pub admit_date: Option<NaiveDate>,
    pub discharge_date: Option<NaiveDate>,
    pub payment_type: PaymentType,
    /// `None` when the form carried no drug entries.
    pub summary_drug_instruction: Option<Vec<DrugInstruction>>,
}

/// Store a calendar date as midnight UTC.
pub fn calendar_date_to_stored(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Render a stored date-time as a `YYYY-MM-DD` calendar date, or `""` when absent.
///
/// The calendar date is taken in UTC, so `2024-01-15T00:00:00Z` renders as `2024-01-15`.
pub fn to_display_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
