//! Closed vocabularies for case, report and victim fields
//!
//! Every enum-like field is validated when it crosses the HTTP boundary.
//! Parsing is forgiving about presentation (`"Arbitrary Arrest"`,
//! `"arbitrary-arrest"` and `"ARBITRARY_ARREST"` are the same value) but
//! rejects anything outside the vocabulary. Values are stored and
//! serialized by their snake_case wire name.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::types::HrmError;

/// Fold case, spaces and hyphens so labels and wire names compare equal
fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($variant:ident => ($wire:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored / serialized name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Human-readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = HrmError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match normalize(raw).as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(HrmError::BadRequest(format!(
                        "Invalid {}: '{}' (expected one of: {})",
                        $what,
                        raw.trim(),
                        [$($wire),+].join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_enum! {
    /// Lifecycle of a case record
    CaseStatus, "case status" {
        New => ("new", "New"),
        UnderReview => ("under_review", "Under review"),
        Resolved => ("resolved", "Resolved"),
        Closed => ("closed", "Closed"),
    }
}

closed_enum! {
    /// Lifecycle of an incident report
    ReportStatus, "report status" {
        New => ("new", "New"),
        UnderReview => ("under_review", "Under review"),
        Resolved => ("resolved", "Resolved"),
    }
}

closed_enum! {
    /// Case triage priority
    Priority, "priority" {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
        Critical => ("critical", "Critical"),
    }
}

closed_enum! {
    /// Category of human-rights violation
    ViolationType, "violation type" {
        Torture => ("torture", "Torture"),
        ArbitraryArrest => ("arbitrary_arrest", "Arbitrary Arrest"),
        ForcedDisplacement => ("forced_displacement", "Forced Displacement"),
        UnlawfulKilling => ("unlawful_killing", "Unlawful Killing"),
        EnforcedDisappearance => ("enforced_disappearance", "Enforced Disappearance"),
        Other => ("other", "Other"),
    }
}

closed_enum! {
    /// Who submitted an incident report
    ReporterType, "reporter type" {
        Individual => ("individual", "Individual"),
        Organization => ("organization", "Organization"),
    }
}

closed_enum! {
    /// Role of a person in the victims collection
    PersonKind, "person type" {
        Victim => ("victim", "Victim"),
        Witness => ("witness", "Witness"),
    }
}

closed_enum! {
    /// Protection risk assessed for a victim or witness
    RiskLevel, "risk level" {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
    }
}

impl Default for CaseStatus {
    fn default() -> Self {
        Self::New
    }
}

impl Default for ReportStatus {
    fn default() -> Self {
        Self::New
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Parse a comma-separated violation list from a form field
///
/// Blank entries are skipped and duplicates collapse to their first
/// occurrence. At least one violation is required.
pub fn parse_violation_list(raw: &str) -> Result<Vec<ViolationType>, HrmError> {
    let mut types = Vec::new();
    for part in raw.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        let parsed: ViolationType = part.parse()?;
        if !types.contains(&parsed) {
            types.push(parsed);
        }
    }

    if types.is_empty() {
        return Err(HrmError::BadRequest(
            "violation_types must name at least one violation".to_string(),
        ));
    }

    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_and_wire_names_parse() {
        assert_eq!("Arbitrary Arrest".parse::<ViolationType>().unwrap(), ViolationType::ArbitraryArrest);
        assert_eq!("arbitrary-arrest".parse::<ViolationType>().unwrap(), ViolationType::ArbitraryArrest);
        assert_eq!(" UNDER_REVIEW ".parse::<CaseStatus>().unwrap(), CaseStatus::UnderReview);
    }

    #[test]
    fn test_unknown_value_is_bad_request() {
        let err = "escalated".parse::<CaseStatus>().unwrap_err();
        assert!(matches!(err, HrmError::BadRequest(_)));
        assert!(err.to_string().contains("escalated"));
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&ViolationType::UnlawfulKilling).unwrap();
        assert_eq!(json, "\"unlawful_killing\"");

        let back: ViolationType = serde_json::from_str("\"Unlawful Killing\"").unwrap();
        assert_eq!(back, ViolationType::UnlawfulKilling);

        assert!(serde_json::from_str::<RiskLevel>("\"extreme\"").is_err());
    }

    #[test]
    fn test_violation_list() {
        let list = parse_violation_list("Torture, ,arbitrary_arrest,torture").unwrap();
        assert_eq!(list, vec![ViolationType::Torture, ViolationType::ArbitraryArrest]);

        assert!(parse_violation_list(" , ").is_err());
        assert!(parse_violation_list("torture,looting").is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(CaseStatus::default(), CaseStatus::New);
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
