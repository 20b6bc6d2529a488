use thiserror::Error;

/// Why a single row or binary record was rejected. A drop never aborts the
/// surrounding file; the record is reported and scanning continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DropReason {
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("field '{field}' is not a number: '{value}'")]
    InvalidNumber {
        field: &'static str,
        value: String,
    },

    #[error("signal sample '{token}' is not a number")]
    InvalidSignalSample { token: String },

    #[error("field '{field}' is not valid UTF-8: {message}")]
    InvalidText {
        field: &'static str,
        message: String,
    },

    #[error("row could not be read: {0}")]
    MalformedRow(String),
}
