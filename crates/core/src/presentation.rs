//! View model of the discharge summary edit form.
//!
//! The server renders the form as data: every input with its name, id, label, current value,
//! errors and constraint, plus the drug list with its structural controls. A client renders
//! this model directly and posts the same names back.

use crate::constants::{
    edit_path, ADMIT_DATE_FIELD, DISCHARGE_DATE_FIELD, DISCHARGE_SUMMARY_ID_FIELD,
    DRUG_KEY_SUBFIELD, DRUG_LIST_FIELD, EDIT_FORM_ID, FINAL_DIAGNOSIS_FIELD, HOSPITAL_ID_FIELD,
    INTENT_FIELD, PAYMENT_TYPE_FIELD,
};
use crate::discharge_summary::{to_display_date, DischargeSummary, NarrativeField};
use crate::drug_list::{DrugEntry, DrugListEditor};
use crate::form::{drug_field_name, Intent, SubmittedForm};
use crate::form_state::{ButtonStatus, FormMachine, FormStatus};
use crate::honeypot::HoneypotInputs;
use crate::schema::{constraints, summary_rule, Constraint, DrugSubField, FieldErrors};
use hms_types::{FrequencyCode, MealTiming, PaymentType};
use serde::Serialize;
use std::collections::BTreeMap;

pub const HEADING: &str = "Discharge Summary!";
pub const SUBTITLE: &str = "Edit Discharge Summary Details";
pub const DRUG_LIST_LABEL: &str = "Summary Drug Instruction";
pub const SHOULD_REVALIDATE: &str = "onBlur";

/// Raw values the form is showing: either a stored record or what the user last posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    values: BTreeMap<String, String>,
    pub drugs: DrugListEditor,
}

impl FormDraft {
    /// Defaults taken from a stored record.
    pub fn from_record(record: &DischargeSummary) -> Self {
        let mut values = BTreeMap::new();
        values.insert(DISCHARGE_SUMMARY_ID_FIELD.to_string(), record.id.to_string());
        values.insert(HOSPITAL_ID_FIELD.to_string(), record.hospital_id.to_string());
        values.insert(
            FINAL_DIAGNOSIS_FIELD.to_string(),
            record.final_diagnosis.to_string(),
        );
        for field in NarrativeField::ALL {
            if let Some(text) = record.narrative.get(field) {
                values.insert(field.name().to_string(), text.to_string());
            }
        }
        values.insert(ADMIT_DATE_FIELD.to_string(), to_display_date(record.admit_date));
        values.insert(
            DISCHARGE_DATE_FIELD.to_string(),
            to_display_date(record.discharge_date),
        );
        values.insert(
            PAYMENT_TYPE_FIELD.to_string(),
            record.payment_type.to_string(),
        );

        Self {
            values,
            drugs: DrugListEditor::from_instructions(&record.drugs),
        }
    }

    /// Values echoed back from a posted form, so the user never loses input.
    pub fn from_submitted(form: &SubmittedForm) -> Self {
        Self {
            values: form.fields().clone(),
            drugs: DrugListEditor::from_posted(&form.drugs),
        }
    }

    /// Pin the identity fields to the route's record, and to `hospital_id` when given.
    ///
    /// Posted identity values never flow back into the hidden inputs or the form action.
    pub fn with_identity(
        mut self,
        discharge_summary_id: &str,
        hospital_id: Option<&str>,
    ) -> Self {
        self.values.insert(
            DISCHARGE_SUMMARY_ID_FIELD.to_string(),
            discharge_summary_id.trim().to_string(),
        );
        if let Some(hospital_id) = hospital_id {
            self.values
                .insert(HOSPITAL_ID_FIELD.to_string(), hospital_id.to_string());
        }
        self
    }

    /// Current raw value of a top-level field; `""` when unset.
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Hidden,
    Text,
    Textarea,
    Date,
    Select,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub value: &'static str,
    pub label: String,
}

/// One input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub name: String,
    pub id: String,
    pub kind: InputKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    pub value: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionView>,
    pub errors: Vec<String>,
}

/// A button posting an `intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlView {
    pub name: &'static str,
    pub value: String,
    pub label: String,
    pub status: ButtonStatus,
    pub disabled: bool,
}

/// One drug fieldset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugEntryView {
    pub key: String,
    pub index: usize,
    pub fields: Vec<FieldView>,
    pub remove: ControlView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugListView {
    pub name: &'static str,
    pub label: &'static str,
    pub insert: ControlView,
    pub entries: Vec<DrugEntryView>,
    pub errors: Vec<String>,
}

/// The whole edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFormView {
    pub id: &'static str,
    pub heading: &'static str,
    pub subtitle: &'static str,
    pub method: &'static str,
    pub action: String,
    pub should_revalidate: &'static str,
    pub status: FormStatus,
    pub honeypot: HoneypotInputs,
    pub hidden: Vec<FieldView>,
    pub final_diagnosis: FieldView,
    pub narrative: Vec<FieldView>,
    pub drug_list: DrugListView,
    pub admit_date: FieldView,
    pub discharge_date: FieldView,
    pub payment_type: FieldView,
    pub form_errors: Vec<String>,
    pub reset: ControlView,
    pub submit: ControlView,
    pub constraints: BTreeMap<String, Constraint>,
}

/// Build the view model for `draft` in the given form state.
pub fn render_edit_form(
    draft: &FormDraft,
    errors: &FieldErrors,
    form: &FormMachine,
    honeypot: HoneypotInputs,
) -> EditFormView {
    let top = |name: &str, kind: InputKind, label: Option<&'static str>| FieldView {
        name: name.to_string(),
        id: field_id(name),
        kind,
        label,
        value: draft.value(name).to_string(),
        required: summary_rule(name).is_some_and(|rule| rule.required),
        options: Vec::new(),
        errors: errors.get(name).to_vec(),
    };

    let mut payment_type = top(PAYMENT_TYPE_FIELD, InputKind::Select, Some("Payment Type"));
    payment_type.options = PaymentType::ALL
        .iter()
        .map(|p| OptionView {
            value: p.as_str(),
            label: p.as_str().to_string(),
        })
        .collect();

    let disabled = form.controls_disabled();
    let status = form.button_status();
    let control = |value: Intent, label: String| ControlView {
        name: INTENT_FIELD,
        value: value.to_string(),
        label,
        status,
        disabled,
    };

    let entries = draft
        .drugs
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| DrugEntryView {
            key: entry.key.as_str().to_string(),
            index,
            fields: drug_fields(index, entry, errors),
            remove: control(Intent::RemoveDrug(index), format!("Remove drug {}", index + 1)),
        })
        .collect();

    EditFormView {
        id: EDIT_FORM_ID,
        heading: HEADING,
        subtitle: SUBTITLE,
        method: "post",
        action: edit_path(draft.value(DISCHARGE_SUMMARY_ID_FIELD)),
        should_revalidate: SHOULD_REVALIDATE,
        status: form.status(),
        honeypot,
        hidden: vec![
            top(DISCHARGE_SUMMARY_ID_FIELD, InputKind::Hidden, None),
            top(HOSPITAL_ID_FIELD, InputKind::Hidden, None),
        ],
        final_diagnosis: top(FINAL_DIAGNOSIS_FIELD, InputKind::Textarea, Some("Final Diagnosis")),
        narrative: NarrativeField::ALL
            .into_iter()
            .map(|field| top(field.name(), InputKind::Textarea, Some(field.label())))
            .collect(),
        drug_list: DrugListView {
            name: DRUG_LIST_FIELD,
            label: DRUG_LIST_LABEL,
            insert: control(Intent::InsertDrug, "Add drug".to_string()),
            entries,
            errors: errors.get(DRUG_LIST_FIELD).to_vec(),
        },
        admit_date: top(ADMIT_DATE_FIELD, InputKind::Date, Some("Admit Date")),
        discharge_date: top(DISCHARGE_DATE_FIELD, InputKind::Date, Some("Discharge Date")),
        payment_type,
        form_errors: errors.form_errors().to_vec(),
        reset: control(Intent::Reset, "Reset".to_string()),
        submit: control(Intent::Submit, "Save".to_string()),
        constraints: constraints(),
    }
}

fn drug_fields(index: usize, entry: &DrugEntry, errors: &FieldErrors) -> Vec<FieldView> {
    let key_name = drug_field_name(index, DRUG_KEY_SUBFIELD);
    let mut fields = vec![FieldView {
        id: field_id(&key_name),
        name: key_name,
        kind: InputKind::Hidden,
        label: None,
        value: entry.key.as_str().to_string(),
        required: false,
        options: Vec::new(),
        errors: Vec::new(),
    }];

    for sub in DrugSubField::ALL {
        let name = drug_field_name(index, sub.name());
        let (kind, options) = match sub {
            DrugSubField::Frequency => (
                InputKind::Select,
                FrequencyCode::ALL
                    .iter()
                    .map(|code| OptionView {
                        value: code.as_str(),
                        label: code.label(),
                    })
                    .collect(),
            ),
            DrugSubField::Time => (
                InputKind::Select,
                MealTiming::ALL
                    .iter()
                    .map(|timing| OptionView {
                        value: timing.as_str(),
                        label: timing.as_str().to_string(),
                    })
                    .collect(),
            ),
            DrugSubField::Name | DrugSubField::Strength | DrugSubField::Duration => {
                (InputKind::Text, Vec::new())
            }
        };
        fields.push(FieldView {
            id: field_id(&name),
            errors: errors.get(&name).to_vec(),
            name,
            kind,
            label: Some(sub.label()),
            value: entry.draft.get(sub).to_string(),
            required: sub.rule().required,
            options,
        });
    }
    fields
}

fn field_id(name: &str) -> String {
    format!("{EDIT_FORM_ID}-{name}")
}
