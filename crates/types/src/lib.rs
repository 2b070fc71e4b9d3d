//! Validated primitive types shared across HMS crates.
//!
//! Everything here is a small value type that guarantees its invariant once constructed:
//! non-empty text, and the closed vocabularies used on a discharge summary (payment type,
//! dose-schedule frequency code, timing relative to meals).
//!
//! Closed vocabularies parse from (and render to) their exact wire strings. Parsing never
//! normalises case: `"upi"` is not `"UPI"`.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A value did not belong to a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid enum value. Expected {expected}, received '{received}'")]
pub struct ParseEnumError {
    /// Allowed values, pre-rendered as `'a' | 'b'`.
    pub expected: String,
    /// The rejected input.
    pub received: String,
}

impl ParseEnumError {
    /// Build the error for `received` given the allowed wire values.
    pub fn new(allowed: &[&str], received: &str) -> Self {
        let expected = allowed
            .iter()
            .map(|v| format!("'{v}'"))
            .collect::<Vec<_>>()
            .join(" | ");
        Self {
            expected,
            received: received.to_owned(),
        }
    }
}

/// A string type that guarantees non-empty content.
///
/// [`NonEmptyText::new`] trims leading and trailing whitespace; [`NonEmptyText::verbatim`]
/// keeps the input as given. Either way a value that trims to nothing is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the input is empty or whitespace only.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a new `NonEmptyText` holding `input` exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the input is empty or whitespace only.
    pub fn verbatim(input: impl Into<String>) -> Result<Self, TextError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(input))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::verbatim(s).map_err(serde::de::Error::custom)
    }
}

/// Declares a closed vocabulary backed by exact wire strings.
///
/// Generates `as_str`, `ALL`, `WIRE_VALUES`, `Display`, `FromStr` and string-based serde.
macro_rules! closed_vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representations of every value, in declaration order.
            pub const WIRE_VALUES: &'static [&'static str] = &[$($wire),+];

            /// Wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Wire representations of every value, in declaration order.
            pub fn wire_values() -> &'static [&'static str] {
                Self::WIRE_VALUES
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ParseEnumError::new(Self::wire_values(), other)),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_vocabulary! {
    /// How the episode was paid for.
    pub enum PaymentType {
        Card => "Card",
        Cash => "Cash",
        Upi => "UPI",
        Insurance => "Insurance",
    }
}

closed_vocabulary! {
    /// Dose-schedule code: one digit per slot, morning-afternoon-night.
    ///
    /// `101` means one dose in the morning and one at night.
    pub enum FrequencyCode {
        Night => "001",
        Afternoon => "010",
        Morning => "100",
        MorningNight => "101",
        MorningAfternoon => "110",
        ThreeTimes => "111",
    }
}

impl FrequencyCode {
    /// Human label with slots separated by dashes, e.g. `1-0-1`.
    pub fn label(self) -> String {
        self.as_str()
            .chars()
            .map(String::from)
            .collect::<Vec<_>>()
            .join("-")
    }
}

closed_vocabulary! {
    /// When a drug is taken relative to meals.
    pub enum MealTiming {
        After => "after",
        Before => "before",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  Pneumonia ").unwrap().as_str(), "Pneumonia");
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
    }

    #[test]
    fn verbatim_text_keeps_surrounding_whitespace() {
        let text = NonEmptyText::verbatim("  1. Cough\n").unwrap();
        assert_eq!(text.as_str(), "  1. Cough\n");
        assert!(matches!(NonEmptyText::verbatim(" \n "), Err(TextError::Empty)));

        let back: NonEmptyText = serde_json::from_str("\" Fever \"").unwrap();
        assert_eq!(back.as_str(), " Fever ");
    }

    #[test]
    fn payment_type_uses_exact_wire_strings() {
        assert_eq!("UPI".parse::<PaymentType>().unwrap(), PaymentType::Upi);
        assert_eq!(PaymentType::Upi.to_string(), "UPI");

        let err = "upi".parse::<PaymentType>().expect_err("case must match");
        assert_eq!(err.received, "upi");
        assert_eq!(err.expected, "'Card' | 'Cash' | 'UPI' | 'Insurance'");
    }

    #[test]
    fn frequency_labels() {
        assert_eq!(FrequencyCode::MorningNight.label(), "1-0-1");
        assert_eq!(FrequencyCode::ThreeTimes.label(), "1-1-1");
        assert_eq!(FrequencyCode::ALL.len(), 6);
        assert!("011".parse::<FrequencyCode>().is_err());
    }

    #[test]
    fn vocabularies_serialise_as_strings() {
        let json = serde_json::to_string(&MealTiming::Before).unwrap();
        assert_eq!(json, "\"before\"");
        let back: MealTiming = serde_json::from_str("\"after\"").unwrap();
        assert_eq!(back, MealTiming::After);
        assert!(serde_json::from_str::<MealTiming>("\"during\"").is_err());
    }
}
