//! Posted form data.
//!
//! Browsers post the edit form as ordered `name=value` pairs. This module turns those pairs
//! into a [`SubmittedForm`]: top-level scalar fields, the drug list rows (from names shaped
//! like `summaryDrugInstruction[2].strength`), and the [`Intent`] that selects what the
//! request should do.
//!
//! Empty values count as absent. When a scalar name repeats, the first occurrence wins.
//! Honeypot inputs are left out; they are checked against the raw pairs before parsing.

use crate::constants::{
    DRUG_KEY_SUBFIELD, DRUG_LIST_FIELD, HONEYPOT_NAME_FIELD, HONEYPOT_VALID_FROM_FIELD,
    INTENT_FIELD,
};
use crate::drug_list::DrugDraft;
use crate::schema::DrugSubField;
use std::collections::BTreeMap;
use std::fmt;

/// Posted `name=value` pairs in document order.
pub type FormPairs = Vec<(String, String)>;

/// What a posted form asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Validate, persist and redirect.
    Submit,
    /// Discard edits and re-render from the stored record.
    Reset,
    /// Revalidate and report errors for one field only (sent on blur).
    Validate(String),
    /// Append a blank drug entry.
    InsertDrug,
    /// Remove the drug entry at the given index.
    RemoveDrug(usize),
    /// Anything else; rejected during submission.
    Unknown(String),
}

impl Intent {
    /// Parse the value of the `intent` field.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Intent::Submit;
        }
        if raw == "reset" {
            return Intent::Reset;
        }
        if let Some(field) = raw.strip_prefix("validate:") {
            if !field.is_empty() {
                return Intent::Validate(field.to_string());
            }
        }
        if raw == format!("insert:{DRUG_LIST_FIELD}") {
            return Intent::InsertDrug;
        }
        if let Some(index) = raw
            .strip_prefix("remove:")
            .and_then(|rest| rest.strip_prefix(DRUG_LIST_FIELD))
            .and_then(|rest| rest.strip_prefix(':'))
            .and_then(|index| index.parse::<usize>().ok())
        {
            return Intent::RemoveDrug(index);
        }
        Intent::Unknown(raw.to_string())
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Submit => Ok(()),
            Intent::Reset => f.write_str("reset"),
            Intent::Validate(field) => write!(f, "validate:{field}"),
            Intent::InsertDrug => write!(f, "insert:{DRUG_LIST_FIELD}"),
            Intent::RemoveDrug(index) => write!(f, "remove:{DRUG_LIST_FIELD}:{index}"),
            Intent::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// One drug row as posted, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostedDrug {
    /// Stable key carried by the row's hidden input, if any.
    pub key: Option<String>,
    pub draft: DrugDraft,
}

/// A parsed, unvalidated edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedForm {
    fields: BTreeMap<String, String>,
    pub drugs: Vec<PostedDrug>,
    pub intent: Intent,
}

impl SubmittedForm {
    /// Parse posted pairs.
    ///
    /// Drug rows are ordered by their posted index; gaps in the numbering are closed up.
    pub fn parse(pairs: &[(String, String)]) -> Self {
        let mut fields = BTreeMap::new();
        let mut rows: BTreeMap<usize, PostedDrug> = BTreeMap::new();
        let mut intent = Intent::Submit;

        for (name, value) in pairs {
            if name == HONEYPOT_NAME_FIELD || name == HONEYPOT_VALID_FROM_FIELD {
                continue;
            }
            if name == INTENT_FIELD {
                intent = Intent::parse(value);
                continue;
            }
            if let Some((index, sub)) = parse_drug_field_name(name) {
                let row = rows.entry(index).or_default();
                if sub == DRUG_KEY_SUBFIELD {
                    row.key = Some(value.clone()).filter(|v| !v.is_empty());
                } else if let Some(sub) = DrugSubField::from_name(sub) {
                    row.draft.set(sub, value.clone());
                }
                continue;
            }
            if value.is_empty() {
                continue;
            }
            fields.entry(name.clone()).or_insert_with(|| value.clone());
        }

        Self {
            fields,
            drugs: rows.into_values().collect(),
            intent,
        }
    }

    /// Value of a top-level field; `None` when absent or posted empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// All non-empty top-level fields.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// Form name of one drug sub-field, e.g. `summaryDrugInstruction[0].name`.
pub fn drug_field_name(index: usize, sub: &str) -> String {
    format!("{DRUG_LIST_FIELD}[{index}].{sub}")
}

/// Split `summaryDrugInstruction[3].name` into `(3, "name")`.
pub fn parse_drug_field_name(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix(DRUG_LIST_FIELD)?.strip_prefix('[')?;
    let (index, sub) = rest.split_once("].")?;
    let index = index.parse::<usize>().ok()?;
    if sub.is_empty() {
        return None;
    }
    Some((index, sub))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> FormPairs {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_scalars_and_skips_empty_values() {
        let form = SubmittedForm::parse(&pairs(&[
            ("finalDiagnosis", "Pneumonia"),
            ("pastHistory", ""),
            ("finalDiagnosis", "ignored duplicate"),
        ]));
        assert_eq!(form.get("finalDiagnosis"), Some("Pneumonia"));
        assert_eq!(form.get("pastHistory"), None);
        assert_eq!(form.intent, Intent::Submit);
        assert!(form.drugs.is_empty());
    }

    #[test]
    fn groups_drug_rows_by_index_and_closes_gaps() {
        let form = SubmittedForm::parse(&pairs(&[
            ("summaryDrugInstruction[3].name", "Paracetamol"),
            ("summaryDrugInstruction[0].name", "Amoxicillin"),
            ("summaryDrugInstruction[0].key", "k0"),
            ("summaryDrugInstruction[0].frequency", "101"),
            ("summaryDrugInstruction[3].unknown", "x"),
        ]));
        assert_eq!(form.drugs.len(), 2);
        assert_eq!(form.drugs[0].draft.name, "Amoxicillin");
        assert_eq!(form.drugs[0].draft.frequency, "101");
        assert_eq!(form.drugs[0].key.as_deref(), Some("k0"));
        assert_eq!(form.drugs[1].draft.name, "Paracetamol");
        assert_eq!(form.drugs[1].key, None);
    }

    #[test]
    fn honeypot_fields_are_not_form_values() {
        let form = SubmittedForm::parse(&pairs(&[
            (HONEYPOT_NAME_FIELD, "bot"),
            (HONEYPOT_VALID_FROM_FIELD, "123.abc"),
        ]));
        assert!(form.fields().is_empty());
    }

    #[test]
    fn parses_intents() {
        assert_eq!(Intent::parse(""), Intent::Submit);
        assert_eq!(Intent::parse("reset"), Intent::Reset);
        assert_eq!(
            Intent::parse("validate:paymentType"),
            Intent::Validate("paymentType".into())
        );
        assert_eq!(Intent::parse("insert:summaryDrugInstruction"), Intent::InsertDrug);
        assert_eq!(
            Intent::parse("remove:summaryDrugInstruction:2"),
            Intent::RemoveDrug(2)
        );
        assert_eq!(
            Intent::parse("remove:summaryDrugInstruction:x"),
            Intent::Unknown("remove:summaryDrugInstruction:x".into())
        );
        assert_eq!(Intent::parse("delete-note"), Intent::Unknown("delete-note".into()));
    }

    #[test]
    fn intents_render_back_to_their_wire_form() {
        for raw in [
            "reset",
            "validate:finalDiagnosis",
            "insert:summaryDrugInstruction",
            "remove:summaryDrugInstruction:4",
        ] {
            assert_eq!(Intent::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn drug_field_names_round_trip() {
        let name = drug_field_name(7, "duration");
        assert_eq!(name, "summaryDrugInstruction[7].duration");
        assert_eq!(parse_drug_field_name(&name), Some((7, "duration")));
        assert_eq!(parse_drug_field_name("summaryDrugInstruction[x].name"), None);
        assert_eq!(parse_drug_field_name("summaryDrugInstruction[1]."), None);
        assert_eq!(parse_drug_field_name("finalDiagnosis"), None);
    }
}
