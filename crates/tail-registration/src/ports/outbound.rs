//! # Outbound Ports (Driven Ports / SPI)
//!
//! The two remote services a registration talks to.

use thiserror::Error;

use crate::domain::entities::{ChallengeKey, ChallengeResponse, SignedSubmission, SubmitResponse};
use crate::domain::errors::{ChallengeFetchError, SubmissionError};

/// Error from a remote service call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Service could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Service answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Reply body was not the expected JSON
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Any other transport failure, including timeouts
    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl From<GatewayError> for ChallengeFetchError {
    fn from(error: GatewayError) -> Self {
        ChallengeFetchError::Transport(error.to_string())
    }
}

impl From<GatewayError> for SubmissionError {
    fn from(error: GatewayError) -> Self {
        SubmissionError::Transport(error.to_string())
    }
}

/// Authorization service issuing signing challenges.
#[async_trait::async_trait]
pub trait AuthorizationGateway: Send + Sync {
    /// Request the challenge for an asset hash / eve coin id pair.
    ///
    /// A reply without address or message is not an error.
    async fn fetch_challenge(&self, key: &ChallengeKey) -> Result<ChallengeResponse, GatewayError>;
}

/// Registry accepting signed TAIL records.
#[async_trait::async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Send one signed record.
    ///
    /// The signature travels as a request header.
    async fn submit_record(&self, submission: &SignedSubmission)
        -> Result<SubmitResponse, GatewayError>;
}
