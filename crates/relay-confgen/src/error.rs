use std::fmt;

use thiserror::Error;

/// Reason a single form field failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldErrorKind {
    #[error("value is required")]
    Required,
    #[error("must be a valid number")]
    NotNumeric,
    #[error("must be at least {min}")]
    BelowMin { min: f64 },
    #[error("must be at most {max}")]
    AboveMax { max: f64 },
    #[error("missing required placeholder(s): {placeholders}")]
    MissingPlaceholders { placeholders: String },
}

/// One field-level violation: the machine-readable field key, the
/// human-facing label shown next to the field, and the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub label: &'static str,
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.label, self.field, self.kind)
    }
}

/// Exhaustive set of violations from one build attempt. No partial config
/// is ever produced alongside this.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("configuration is invalid: {} field error(s)", errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// Field keys named in the failure, in report order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }
}

/// Failure to ingest an externally supplied config file. The caller must
/// leave its current form state untouched when this is returned.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing required top-level section `{0}`")]
    MissingSection(&'static str),
}
