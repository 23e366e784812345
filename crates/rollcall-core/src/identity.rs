use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delimiter for composite labels. Must not appear in any identity field.
pub const LABEL_DELIMITER: char = '_';

/// Placeholder used when a legacy label is missing trailing fields.
const MISSING_FIELD: &str = "N/A";

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("malformed composite label: {0:?} (need at least roll number and name)")]
    Malformed(String),
    #[error("field {field} contains a reserved character: {value:?}")]
    ReservedCharacter { field: &'static str, value: String },
    #[error("field {0} is empty")]
    EmptyField(&'static str),
}

/// A person enrolled in the attendance system.
///
/// Created once at enrollment and stored as structured fields; the roll
/// number uniquely identifies a person across enrollment sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub roll_number: String,
    pub name: String,
    pub department: String,
    pub semester: String,
}

impl Identity {
    /// Build a validated identity from enrollment inputs.
    ///
    /// Rejects empty fields and fields containing the label delimiter or
    /// characters that would break a single-line CSV row.
    pub fn new(
        roll_number: &str,
        name: &str,
        department: &str,
        semester: &str,
    ) -> Result<Self, LabelError> {
        validate_field("roll_number", roll_number)?;
        validate_field("name", name)?;
        validate_field("department", department)?;
        validate_field("semester", semester)?;
        Ok(Self {
            roll_number: roll_number.to_string(),
            name: name.to_string(),
            department: department.to_string(),
            semester: semester.to_string(),
        })
    }

    /// Delimited composite form, e.g. `101_Alice_CS_5`.
    pub fn composite_label(&self) -> String {
        format!(
            "{}{d}{}{d}{}{d}{}",
            self.roll_number,
            self.name,
            self.department,
            self.semester,
            d = LABEL_DELIMITER
        )
    }

    /// Parse a legacy composite label.
    ///
    /// Four or more segments fill every field (extra segments are treated as
    /// part of the semester, from labels whose fields contained the
    /// delimiter). Two or three segments backfill the missing fields with
    /// `N/A`. Fewer than two segments is a parse failure.
    pub fn parse_label(label: &str) -> Result<Self, LabelError> {
        let parts: Vec<&str> = label.split(LABEL_DELIMITER).collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(LabelError::Malformed(label.to_string()));
        }
        Ok(Self {
            roll_number: parts[0].to_string(),
            name: parts[1].to_string(),
            department: parts.get(2).unwrap_or(&MISSING_FIELD).to_string(),
            semester: if parts.len() > 3 {
                parts[3..].join("_")
            } else {
                MISSING_FIELD.to_string()
            },
        })
    }
}

fn validate_field(field: &'static str, value: &str) -> Result<(), LabelError> {
    if value.trim().is_empty() {
        return Err(LabelError::EmptyField(field));
    }
    if value.contains(LABEL_DELIMITER) || value.contains([',', '"', '\n', '\r']) {
        return Err(LabelError::ReservedCharacter {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// A stored identity row, tagged by provenance.
///
/// `Known` rows carry structured fields written by this system. `Legacy`
/// rows predate structured storage and hold only the raw composite label,
/// which is parsed when the row is acted on (and may fail, skipping that
/// detection).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityRecord {
    Known(Identity),
    Legacy(String),
}

impl IdentityRecord {
    /// Resolve to a structured identity, parsing legacy labels on demand.
    pub fn resolve(&self) -> Result<Identity, LabelError> {
        match self {
            IdentityRecord::Known(id) => Ok(id.clone()),
            IdentityRecord::Legacy(label) => Identity::parse_label(label),
        }
    }

    /// Display form for overlays and logs.
    pub fn display_label(&self) -> String {
        match self {
            IdentityRecord::Known(id) => id.composite_label(),
            IdentityRecord::Legacy(label) => label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_label_round_trip() {
        let id = Identity::new("101", "Alice", "CS", "5").unwrap();
        assert_eq!(id.composite_label(), "101_Alice_CS_5");
        assert_eq!(Identity::parse_label("101_Alice_CS_5").unwrap(), id);
    }

    #[test]
    fn test_parse_label_backfills_missing_fields() {
        let id = Identity::parse_label("42_Bob").unwrap();
        assert_eq!(id.roll_number, "42");
        assert_eq!(id.name, "Bob");
        assert_eq!(id.department, "N/A");
        assert_eq!(id.semester, "N/A");

        let id = Identity::parse_label("42_Bob_EE").unwrap();
        assert_eq!(id.department, "EE");
        assert_eq!(id.semester, "N/A");
    }

    #[test]
    fn test_parse_label_extra_segments_join_semester() {
        let id = Identity::parse_label("7_Cara_ME_3_retake").unwrap();
        assert_eq!(id.semester, "3_retake");
    }

    #[test]
    fn test_parse_label_single_segment_fails() {
        assert!(matches!(
            Identity::parse_label("garbage"),
            Err(LabelError::Malformed(_))
        ));
        assert!(Identity::parse_label("_").is_err());
        assert!(Identity::parse_label("").is_err());
    }

    #[test]
    fn test_new_rejects_delimiter_in_field() {
        assert!(matches!(
            Identity::new("101", "Alice_B", "CS", "5"),
            Err(LabelError::ReservedCharacter { field: "name", .. })
        ));
    }

    #[test]
    fn test_new_rejects_csv_breaking_characters() {
        assert!(Identity::new("101", "Alice,B", "CS", "5").is_err());
        assert!(Identity::new("101", "Alice", "C\"S", "5").is_err());
        assert!(Identity::new("101", "Alice", "CS", " ").is_err());
    }

    #[test]
    fn test_record_resolve() {
        let known = IdentityRecord::Known(Identity::new("1", "A", "B", "C").unwrap());
        assert_eq!(known.resolve().unwrap().roll_number, "1");

        let legacy = IdentityRecord::Legacy("9_Zed".into());
        assert_eq!(legacy.resolve().unwrap().name, "Zed");

        let bad = IdentityRecord::Legacy("unparsable".into());
        assert!(bad.resolve().is_err());
    }
}
