//! The edit-form schema.
//!
//! One table of [`FieldRule`]s describes every field the discharge summary edit form accepts.
//! The same table drives server-side validation ([`validate`]) and the constraint map handed
//! to clients for their mirrored validation ([`constraints`]), so both layers accept exactly
//! the same inputs.
//!
//! Error messages follow the wording clients already display: `Required`, `Invalid date`, and
//! `Invalid enum value. Expected 'a' | 'b', received 'c'`.

use crate::constants::{
    ADMIT_DATE_FIELD, DISCHARGE_DATE_FIELD, DISCHARGE_SUMMARY_ID_FIELD, DRUG_LIST_FIELD,
    FINAL_DIAGNOSIS_FIELD, HOSPITAL_ID_FIELD, PAYMENT_TYPE_FIELD,
};
use crate::discharge_summary::{DischargeSummaryUpdate, DrugInstruction, Narrative, NarrativeField};
use crate::form::{drug_field_name, SubmittedForm};
use crate::NonEmptyText;
use chrono::NaiveDate;
use hms_types::{FrequencyCode, MealTiming, ParseEnumError, PaymentType};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

pub const REQUIRED_MESSAGE: &str = "Required";
pub const INVALID_DATE_MESSAGE: &str = "Invalid date";

/// Key under which form-level (not field-specific) errors are reported.
pub const FORM_ERRORS_KEY: &str = "";

/// Shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Identifier; surrounding whitespace is dropped.
    Text,
    /// Clinical free text, stored exactly as entered.
    FreeText,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// One of a closed set of exact strings.
    OneOf(&'static [&'static str]),
}

/// Constraint on one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub kind: ValueKind,
}

/// A value that passed its rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checked {
    Absent,
    Text(NonEmptyText),
    Date(NaiveDate),
    Choice(&'static str),
}

impl FieldRule {
    const fn required(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            required: true,
            kind,
        }
    }

    const fn optional(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }

    /// Check a raw posted value. Whitespace-only counts as absent.
    ///
    /// # Errors
    ///
    /// Returns the user-facing message when the value violates the rule.
    pub fn check(&self, raw: Option<&str>) -> Result<Checked, String> {
        let Some(value) = raw.filter(|v| !v.trim().is_empty()) else {
            return if self.required {
                Err(REQUIRED_MESSAGE.to_string())
            } else {
                Ok(Checked::Absent)
            };
        };

        match self.kind {
            ValueKind::Text => NonEmptyText::new(value)
                .map(Checked::Text)
                .map_err(|_| REQUIRED_MESSAGE.to_string()),
            ValueKind::FreeText => NonEmptyText::verbatim(value)
                .map(Checked::Text)
                .map_err(|_| REQUIRED_MESSAGE.to_string()),
            ValueKind::Date => parse_calendar_date(value)
                .map(Checked::Date)
                .ok_or_else(|| INVALID_DATE_MESSAGE.to_string()),
            ValueKind::OneOf(allowed) => allowed
                .iter()
                .copied()
                .find(|candidate| *candidate == value)
                .map(Checked::Choice)
                .ok_or_else(|| ParseEnumError::new(allowed, value).to_string()),
        }
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Sub-fields of one drug entry, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrugSubField {
    Name,
    Strength,
    Duration,
    Frequency,
    Time,
}

impl DrugSubField {
    pub const ALL: [DrugSubField; 5] = [
        DrugSubField::Name,
        DrugSubField::Strength,
        DrugSubField::Duration,
        DrugSubField::Frequency,
        DrugSubField::Time,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DrugSubField::Name => "name",
            DrugSubField::Strength => "strength",
            DrugSubField::Duration => "duration",
            DrugSubField::Frequency => "frequency",
            DrugSubField::Time => "time",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DrugSubField::Name => "Name",
            DrugSubField::Strength => "Strength",
            DrugSubField::Duration => "No Of Days",
            DrugSubField::Frequency => "Frequency",
            DrugSubField::Time => "When",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn rule(self) -> FieldRule {
        let kind = match self {
            DrugSubField::Frequency => ValueKind::OneOf(FrequencyCode::WIRE_VALUES),
            DrugSubField::Time => ValueKind::OneOf(MealTiming::WIRE_VALUES),
            DrugSubField::Name | DrugSubField::Strength | DrugSubField::Duration => {
                ValueKind::FreeText
            }
        };
        FieldRule::required(self.name(), kind)
    }
}

/// Rules for the top-level fields, in form order.
pub fn summary_rules() -> Vec<FieldRule> {
    let mut rules = vec![
        FieldRule::required(DISCHARGE_SUMMARY_ID_FIELD, ValueKind::Text),
        FieldRule::required(HOSPITAL_ID_FIELD, ValueKind::Text),
        FieldRule::required(FINAL_DIAGNOSIS_FIELD, ValueKind::FreeText),
    ];
    rules.extend(
        NarrativeField::ALL
            .into_iter()
            .map(|field| FieldRule::optional(field.name(), ValueKind::FreeText)),
    );
    rules.push(FieldRule::optional(ADMIT_DATE_FIELD, ValueKind::Date));
    rules.push(FieldRule::optional(DISCHARGE_DATE_FIELD, ValueKind::Date));
    rules.push(FieldRule::required(
        PAYMENT_TYPE_FIELD,
        ValueKind::OneOf(PaymentType::WIRE_VALUES),
    ));
    rules
}

/// Look up the rule for a top-level field.
pub fn summary_rule(name: &str) -> Option<FieldRule> {
    summary_rules().into_iter().find(|rule| rule.name == name)
}

/// Client-side constraint for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,
}

impl From<&FieldRule> for Constraint {
    fn from(rule: &FieldRule) -> Self {
        let pattern = match rule.kind {
            ValueKind::OneOf(allowed) => Some(allowed.join("|")),
            ValueKind::Text | ValueKind::FreeText | ValueKind::Date => None,
        };
        Self {
            required: rule.required,
            pattern,
            multiple: false,
        }
    }
}

/// Constraint map keyed by field name. Drug sub-fields use `summaryDrugInstruction[].<sub>`.
pub fn constraints() -> BTreeMap<String, Constraint> {
    let mut map: BTreeMap<String, Constraint> = summary_rules()
        .iter()
        .map(|rule| (rule.name.to_string(), Constraint::from(rule)))
        .collect();

    map.insert(
        DRUG_LIST_FIELD.to_string(),
        Constraint {
            required: false,
            pattern: None,
            multiple: true,
        },
    );
    for sub in DrugSubField::ALL {
        map.insert(
            format!("{DRUG_LIST_FIELD}[].{}", sub.name()),
            Constraint::from(&sub.rule()),
        );
    }
    map
}

/// Per-field error messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Messages for one field; empty when it has none.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Form-level messages.
    pub fn form_errors(&self) -> &[String] {
        self.get(FORM_ERRORS_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Keep only errors for `field` and anything nested under it.
    pub fn only(&self, field: &str) -> FieldErrors {
        let nested_index = format!("{field}[");
        let nested_member = format!("{field}.");
        FieldErrors(
            self.0
                .iter()
                .filter(|(name, _)| {
                    name.as_str() == field
                        || name.starts_with(&nested_index)
                        || name.starts_with(&nested_member)
                })
                .map(|(name, messages)| (name.clone(), messages.clone()))
                .collect(),
        )
    }
}

/// Validate a submitted form against the schema.
///
/// On success the returned update carries exactly the schema's fields. An empty drug list is
/// reported as absent (`None`).
///
/// # Errors
///
/// Returns every violation found, keyed by field name.
pub fn validate(form: &SubmittedForm) -> Result<DischargeSummaryUpdate, FieldErrors> {
    let mut errors = FieldErrors::default();

    let mut summary: BTreeMap<&'static str, Checked> = BTreeMap::new();
    for rule in summary_rules() {
        match rule.check(form.get(rule.name)) {
            Ok(value) => {
                summary.insert(rule.name, value);
            }
            Err(message) => errors.push(rule.name, message),
        }
    }

    let mut drugs: Vec<BTreeMap<&'static str, Checked>> = Vec::with_capacity(form.drugs.len());
    for (index, posted) in form.drugs.iter().enumerate() {
        let mut entry = BTreeMap::new();
        for sub in DrugSubField::ALL {
            let rule = sub.rule();
            match rule.check(Some(posted.draft.get(sub))) {
                Ok(value) => {
                    entry.insert(rule.name, value);
                }
                Err(message) => errors.push(drug_field_name(index, rule.name), message),
            }
        }
        drugs.push(entry);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    build_update(&summary, &drugs).ok_or_else(|| {
        let mut errors = FieldErrors::default();
        errors.push(FORM_ERRORS_KEY, "Submission did not match the form schema");
        errors
    })
}

fn build_update(
    summary: &BTreeMap<&'static str, Checked>,
    drugs: &[BTreeMap<&'static str, Checked>],
) -> Option<DischargeSummaryUpdate> {
    let mut narrative = Narrative::default();
    for field in NarrativeField::ALL {
        narrative.set(field, optional_text(summary, field.name()));
    }

    let instructions = drugs
        .iter()
        .map(|entry| {
            Some(DrugInstruction {
                name: text(entry, DrugSubField::Name.name())?,
                strength: text(entry, DrugSubField::Strength.name())?,
                frequency: choice(entry, DrugSubField::Frequency.name())?,
                duration: text(entry, DrugSubField::Duration.name())?,
                time: choice(entry, DrugSubField::Time.name())?,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(DischargeSummaryUpdate {
        discharge_summary_id: text(summary, DISCHARGE_SUMMARY_ID_FIELD)?,
        hospital_id: text(summary, HOSPITAL_ID_FIELD)?,
        final_diagnosis: text(summary, FINAL_DIAGNOSIS_FIELD)?,
        narrative,
        admit_date: date(summary, ADMIT_DATE_FIELD),
        discharge_date: date(summary, DISCHARGE_DATE_FIELD),
        payment_type: choice(summary, PAYMENT_TYPE_FIELD)?,
        summary_drug_instruction: Some(instructions).filter(|list| !list.is_empty()),
    })
}

fn text(values: &BTreeMap<&'static str, Checked>, name: &str) -> Option<NonEmptyText> {
    match values.get(name) {
        Some(Checked::Text(text)) => Some(text.clone()),
        _ => None,
    }
}

fn optional_text(values: &BTreeMap<&'static str, Checked>, name: &str) -> Option<String> {
    text(values, name).map(NonEmptyText::into_inner)
}

fn date(values: &BTreeMap<&'static str, Checked>, name: &str) -> Option<NaiveDate> {
    match values.get(name) {
        Some(Checked::Date(date)) => Some(*date),
        _ => None,
    }
}

fn choice<T: FromStr>(values: &BTreeMap<&'static str, Checked>, name: &str) -> Option<T> {
    match values.get(name) {
        Some(Checked::Choice(raw)) => raw.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormPairs;
    use proptest::prelude::*;

    fn pairs(items: &[(&str, &str)]) -> FormPairs {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid_pairs() -> FormPairs {
        pairs(&[
            ("dischargeSummaryId", "ds1"),
            ("hospitalId", "h1"),
            ("finalDiagnosis", "Pneumonia"),
            ("paymentType", "Cash"),
            ("admitDate", "2024-01-15"),
            ("summaryDrugInstruction[0].name", "Amoxicillin"),
            ("summaryDrugInstruction[0].strength", "500mg"),
            ("summaryDrugInstruction[0].frequency", "101"),
            ("summaryDrugInstruction[0].duration", "5"),
            ("summaryDrugInstruction[0].time", "after"),
        ])
    }

    #[test]
    fn accepts_a_complete_form() {
        let update = validate(&SubmittedForm::parse(&valid_pairs())).expect("valid form");
        assert_eq!(update.final_diagnosis.as_str(), "Pneumonia");
        assert_eq!(update.payment_type, PaymentType::Cash);
        assert_eq!(update.admit_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(update.discharge_date, None);

        let drugs = update.summary_drug_instruction.expect("one drug");
        assert_eq!(drugs.len(), 1);
        assert_eq!(drugs[0].frequency, FrequencyCode::MorningNight);
        assert_eq!(drugs[0].time, MealTiming::After);
    }

    #[test]
    fn free_text_keeps_the_clinician_layout() {
        let layout = "  1. Cough\n  2. Fever\n";
        let mut form = valid_pairs();
        form.retain(|(k, _)| {
            !["finalDiagnosis", "hospitalId", "summaryDrugInstruction[0].name"].contains(&k.as_str())
        });
        form.push(("finalDiagnosis".into(), layout.into()));
        form.push(("summaryDrugInstruction[0].name".into(), " Amoxicillin ".into()));
        form.push(("pastHistory".into(), layout.into()));
        form.push(("hospitalId".into(), " h1 ".into()));

        let update = validate(&SubmittedForm::parse(&form)).expect("valid form");
        assert_eq!(update.final_diagnosis.as_str(), layout);
        assert_eq!(update.narrative.past_history.as_deref(), Some(layout));
        let drugs = update.summary_drug_instruction.expect("one drug");
        assert_eq!(drugs[0].name.as_str(), " Amoxicillin ");
        assert_eq!(update.hospital_id.as_str(), "h1");
    }

    #[test]
    fn empty_drug_list_is_absent() {
        let form = SubmittedForm::parse(&pairs(&[
            ("dischargeSummaryId", "ds1"),
            ("hospitalId", "h1"),
            ("finalDiagnosis", "Pneumonia"),
            ("paymentType", "UPI"),
        ]));
        let update = validate(&form).expect("valid form");
        assert_eq!(update.summary_drug_instruction, None);
    }

    #[test]
    fn reports_every_required_field() {
        let errors = validate(&SubmittedForm::parse(&[])).expect_err("empty form");
        for field in ["dischargeSummaryId", "hospitalId", "finalDiagnosis", "paymentType"] {
            assert_eq!(errors.get(field), [REQUIRED_MESSAGE.to_string()], "{field}");
        }
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_out_of_vocabulary_values() {
        let mut form = valid_pairs();
        form.retain(|(k, _)| k != "paymentType" && k != "summaryDrugInstruction[0].time");
        form.push(("paymentType".into(), "Bitcoin".into()));
        form.push(("summaryDrugInstruction[0].time".into(), "during".into()));

        let errors = validate(&SubmittedForm::parse(&form)).expect_err("bad enums");
        assert_eq!(
            errors.get("paymentType"),
            ["Invalid enum value. Expected 'Card' | 'Cash' | 'UPI' | 'Insurance', received 'Bitcoin'"
                .to_string()]
        );
        assert_eq!(errors.get("summaryDrugInstruction[0].time").len(), 1);
    }

    #[test]
    fn rejects_malformed_dates() {
        let mut form = valid_pairs();
        form.push(("dischargeDate".into(), "15/01/2024".into()));
        let errors = validate(&SubmittedForm::parse(&form)).expect_err("bad date");
        assert_eq!(errors.get("dischargeDate"), [INVALID_DATE_MESSAGE.to_string()]);
    }

    #[test]
    fn incomplete_drug_rows_fail_on_each_missing_sub_field() {
        let form = SubmittedForm::parse(&pairs(&[
            ("dischargeSummaryId", "ds1"),
            ("hospitalId", "h1"),
            ("finalDiagnosis", "Pneumonia"),
            ("paymentType", "Cash"),
            ("summaryDrugInstruction[0].name", "Amoxicillin"),
        ]));
        let errors = validate(&form).expect_err("incomplete drug");
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            [
                "summaryDrugInstruction[0].duration",
                "summaryDrugInstruction[0].frequency",
                "summaryDrugInstruction[0].strength",
                "summaryDrugInstruction[0].time",
            ]
        );
    }

    #[test]
    fn only_keeps_a_field_and_its_children() {
        let mut errors = FieldErrors::default();
        errors.push("paymentType", "Required");
        errors.push("summaryDrugInstruction[0].name", "Required");
        errors.push("summaryDrugInstructionX", "Required");

        assert_eq!(errors.only("paymentType").len(), 1);
        let drugs = errors.only("summaryDrugInstruction");
        assert_eq!(drugs.fields().collect::<Vec<_>>(), ["summaryDrugInstruction[0].name"]);
    }

    #[test]
    fn constraints_mirror_the_rules() {
        let map = constraints();
        assert!(map["finalDiagnosis"].required);
        assert!(!map["pastHistory"].required);
        assert_eq!(
            map["paymentType"].pattern.as_deref(),
            Some("Card|Cash|UPI|Insurance")
        );
        assert!(map["summaryDrugInstruction"].multiple);
        assert_eq!(
            map["summaryDrugInstruction[].frequency"].pattern.as_deref(),
            Some("001|010|100|101|110|111")
        );
        assert_eq!(
            map["summaryDrugInstruction[].time"].pattern.as_deref(),
            Some("after|before")
        );
    }

    fn required_field() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("finalDiagnosis"),
            Just("hospitalId"),
            Just("dischargeSummaryId"),
            Just("paymentType"),
        ]
    }

    proptest! {
        #[test]
        fn missing_required_field_is_always_rejected(
            field in required_field(),
            blank in prop_oneof![Just(""), Just("   ")],
        ) {
            let mut form = valid_pairs();
            form.retain(|(k, _)| k != field);
            form.push((field.to_string(), blank.to_string()));
            let errors = validate(&SubmittedForm::parse(&form)).expect_err("must reject");
            prop_assert_eq!(errors.get(field), [REQUIRED_MESSAGE.to_string()]);
        }

        #[test]
        fn unknown_payment_type_is_always_rejected(value in "[A-Za-z]{1,12}") {
            prop_assume!(!PaymentType::WIRE_VALUES.contains(&value.as_str()));
            let mut form = valid_pairs();
            form.retain(|(k, _)| k != "paymentType");
            form.push(("paymentType".into(), value));
            let errors = validate(&SubmittedForm::parse(&form)).expect_err("must reject");
            prop_assert_eq!(errors.get("paymentType").len(), 1);
            prop_assert_eq!(errors.len(), 1);
        }

        #[test]
        fn free_text_is_forwarded_unchanged(text in "[a-zA-Z0-9 ,.]{1,40}") {
            prop_assume!(!text.trim().is_empty());
            let mut form = valid_pairs();
            form.push(("laboratoryData".into(), text.clone()));
            let update = validate(&SubmittedForm::parse(&form)).expect("valid");
            prop_assert_eq!(update.narrative.laboratory_data.as_deref(), Some(text.as_str()));
        }
    }
}
