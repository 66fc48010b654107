use super::record::RawRow;
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

/// Why a row was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViolationCause {
    #[error("field required")]
    MissingField,

    #[error("value is not a valid integer: {0}")]
    InvalidInteger(#[from] ParseIntError),

    #[error("value has the wrong shape for a {expected} field")]
    WrongShape { expected: &'static str },

    #[error("malformed row: {0}")]
    MalformedRow(String),
}

/// A row that failed required-field or type checks.
///
/// Carries everything needed to locate and diagnose the row without consulting logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// 1-based data-row ordinal in the source
    pub row: usize,
    /// Path of the failing field (`$row` for whole-row failures)
    pub field: String,
    /// Offending raw value, if the column was present
    pub raw_value: Option<String>,
    /// Raw contents of the whole row
    pub raw_row: Vec<(String, String)>,
    pub cause: ViolationCause,
}

impl SchemaViolation {
    pub fn new(row: &RawRow, field: impl Into<String>, cause: ViolationCause) -> Self {
        let field = field.into();
        let raw_value = row.get(&field).map(str::to_string);
        Self {
            row: row.ordinal,
            field,
            raw_value,
            raw_row: row.fields.clone(),
            cause,
        }
    }

    /// A violation for a row the CSV reader could not decode at all
    pub fn malformed(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            field: "$row".to_string(),
            raw_value: None,
            raw_row: Vec::new(),
            cause: ViolationCause::MalformedRow(message.into()),
        }
    }

    /// Multi-line report with the failing field and the full row contents.
    pub fn report(&self) -> String {
        let rule = "=".repeat(80);
        let mut lines = vec![
            String::new(),
            rule.clone(),
            format!("VALIDATION ERROR IN ROW {}", self.row),
            rule.clone(),
            String::new(),
            format!("Field: {}", self.field),
            format!("Error: {}", self.cause),
        ];
        if let Some(value) = &self.raw_value {
            lines.push(format!("Value: {:?}", value));
        }
        lines.push(String::new());
        lines.push("Row Data:".to_string());
        for (key, value) in &self.raw_row {
            lines.push(format!("{}: {}", key, value));
        }
        lines.push(rule);
        lines.join("\n")
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validation error in row {}: field '{}' {}",
            self.row, self.field, self.cause
        )?;
        if let Some(value) = &self.raw_value {
            write!(f, " (value {:?})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaViolation {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_captures_row_context() {
        let row = RawRow::from_header(12, ["id", "title"], ["abc", "Heat"]);
        let err = "abc".parse::<i64>().unwrap_err();
        let violation = SchemaViolation::new(&row, "id", err.into());

        assert_eq!(violation.row, 12);
        assert_eq!(violation.raw_value.as_deref(), Some("abc"));
        assert_eq!(violation.raw_row.len(), 2);
        assert!(violation.to_string().starts_with("Validation error in row 12: field 'id'"));

        let report = violation.report();
        assert!(report.contains("VALIDATION ERROR IN ROW 12"));
        assert!(report.contains("title: Heat"));
    }

    #[test]
    fn missing_field_has_no_raw_value() {
        let row = RawRow::from_header(1, ["id"], ["1"]);
        let violation = SchemaViolation::new(&row, "title", ViolationCause::MissingField);
        assert_eq!(violation.raw_value, None);
        assert_eq!(
            violation.to_string(),
            "Validation error in row 1: field 'title' field required"
        );
    }
}
