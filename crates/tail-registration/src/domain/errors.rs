//! # Registration Errors
//!
//! Error types for each stage of the registration flow. Every error here is
//! recoverable: the form stays editable and nothing is retried automatically.

use bech32::primitives::decode::{CheckedHrpstringError, PaddingError};
use thiserror::Error;

use super::entities::FormField;

/// Message shown when the logo identifier cannot be decoded.
pub const INVALID_IDENTIFIER_MESSAGE: &str = "Invalid NFT ID";

/// Message shown when the registry accepted the request but returned neither a
/// transaction id nor an error.
pub const DUPLICATE_SUBMISSION_MESSAGE: &str = "Failed to submit TAIL record to mempool. \
You can only submit the same TAIL hash once. If you recently submitted a record you must \
wait for it to clear before submitting another.";

/// Errors from decoding or encoding a bech32m identifier.
///
/// The variants exist for logging; callers that only need a yes/no answer
/// treat them all the same.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// String longer than 90 characters
    #[error("Invalid identifier length: {0}")]
    InvalidLength(usize),

    /// Bad separator, character, case or checksum
    #[error("Malformed identifier: {0}")]
    Malformed(#[from] CheckedHrpstringError),

    /// Regrouping left non-zero or excess padding bits
    #[error("Invalid identifier padding: {0}")]
    InvalidPadding(#[from] PaddingError),

    #[error("Invalid human-readable part: {0}")]
    InvalidHrp(#[from] bech32::primitives::hrp::Error),

    #[error("bech32m encoding error: {0}")]
    Encode(#[from] bech32::EncodeError),

    /// Decoded payload has the wrong length for this domain
    #[error("Invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidDataLength { expected: usize, actual: usize },
}

/// A single failed validation rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Field the rule applies to
    pub field: FormField,
    /// Human readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Unknown category string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

/// Unknown form field name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown field: {0}")]
pub struct UnknownField(pub String);

/// Malformed wallet account string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid account {0:?}: expected namespace:reference:address")]
pub struct AccountParseError(pub String);

/// Failure while fetching a signing challenge.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChallengeFetchError {
    /// Transport or service failure, message surfaced as-is
    #[error("{0}")]
    Transport(String),
}

/// Errors that can occur while submitting a TAIL record.
///
/// `Display` yields the message shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// Logo identifier failed to decode; no request was sent
    #[error("{}", INVALID_IDENTIFIER_MESSAGE)]
    InvalidIdentifier(IdentifierError),

    /// Signature was empty
    #[error("Please enter signature")]
    MissingSignature,

    /// No live challenge for the current asset id and coin id
    #[error("No signing challenge is available for this asset id and coin id")]
    NoChallenge,

    /// Form fields failed validation
    #[error("Form has {} invalid field(s)", .0.len())]
    InvalidFields(Vec<FieldError>),

    /// Challenge was issued for a different asset id / coin id pair
    #[error("Signing challenge does not match the asset id and coin id")]
    ChallengeMismatch,

    /// Record already registered; further submissions are ignored
    #[error("TAIL record already submitted")]
    AlreadySubmitted,

    /// An earlier submission has not finished yet
    #[error("A submission is already in progress")]
    InProgress,

    /// Registry reported an explicit error
    #[error("{0}")]
    Rejected(String),

    /// Registry returned neither a transaction id nor an error
    #[error("{}", DUPLICATE_SUBMISSION_MESSAGE)]
    Duplicate,

    /// Request did not complete
    #[error("{0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::primitives::decode::ChecksumError;

    #[test]
    fn test_invalid_identifier_message_is_fixed() {
        for cause in [
            IdentifierError::Malformed(CheckedHrpstringError::Checksum(
                ChecksumError::InvalidResidue,
            )),
            IdentifierError::InvalidPadding(PaddingError::NonZero),
            IdentifierError::InvalidLength(91),
        ] {
            assert_eq!(
                SubmissionError::InvalidIdentifier(cause).to_string(),
                "Invalid NFT ID"
            );
        }
    }

    #[test]
    fn test_duplicate_message_verbatim() {
        assert_eq!(
            SubmissionError::Duplicate.to_string(),
            "Failed to submit TAIL record to mempool. You can only submit the same TAIL hash \
             once. If you recently submitted a record you must wait for it to clear before \
             submitting another."
        );
    }

    #[test]
    fn test_rejected_is_verbatim() {
        let err = SubmissionError::Rejected("bad signature".to_string());
        assert_eq!(err.to_string(), "bad signature");
    }
}
