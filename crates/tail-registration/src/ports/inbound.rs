//! # Inbound Ports (Driving Ports / API)
//!
//! Entry points for whatever drives a registration (CLI, session loop).

use crate::domain::entities::{Challenge, ChallengeKey, SubmissionReceipt};
use crate::domain::errors::{ChallengeFetchError, SubmissionError};
use crate::domain::validation::ValidatedFields;

/// TAIL registration API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait::async_trait]
pub trait TailRegistrationApi: Send + Sync {
    /// Fetch the signing challenge for `key`.
    ///
    /// `Ok(None)` means the service has nothing to sign for this pair.
    async fn request_challenge(
        &self,
        key: &ChallengeKey,
    ) -> Result<Option<Challenge>, ChallengeFetchError>;

    /// Assemble, sign and send a record.
    ///
    /// # Errors
    /// * `SubmissionError::InvalidIdentifier` - logo id did not decode, nothing sent
    /// * `SubmissionError::Rejected` / `Duplicate` - registry refused the record
    /// * `SubmissionError::Transport` - request did not complete
    async fn submit(
        &self,
        fields: &ValidatedFields,
        challenge: &Challenge,
        signature: &str,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}
