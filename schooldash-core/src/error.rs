//! Dataset load errors
//!
//! A load is all-or-nothing: any of these errors means no state was
//! committed and the previously loaded dataset (if any) is still in place.

use thiserror::Error;

/// Why a dataset could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The input text is not syntactically valid JSON
    #[error("failed to parse dataset JSON: {0}")]
    Parse(String),

    /// The input parsed, but its top level is not an array
    #[error("dataset must be a JSON array of objects (found {0})")]
    Format(String),

    /// The input is valid but yields zero records after normalization
    #[error("dataset contains no records")]
    EmptyDataset,
}

impl LoadError {
    /// True for the soft "no data" status, as opposed to a hard load failure
    pub fn is_soft(&self) -> bool {
        matches!(self, LoadError::EmptyDataset)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Parse(err.to_string())
    }
}

/// Human-readable name of a JSON value's kind, used in format errors
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
