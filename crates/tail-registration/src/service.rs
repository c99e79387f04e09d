//! # TAIL Registration Service
//!
//! Application service implementing [`TailRegistrationApi`] over the two
//! outbound gateways.
//!
//! ## Architecture
//!
//! - Implements the inbound port (`TailRegistrationApi`)
//! - Uses the outbound ports (`AuthorizationGateway`, `RegistryGateway`)
//! - Delegates assembly and reply interpretation to the domain layer

use tracing::{info, warn};

use crate::domain::entities::{Challenge, ChallengeKey, SubmissionReceipt};
use crate::domain::errors::{ChallengeFetchError, SubmissionError};
use crate::domain::submission::{assemble, interpret_response};
use crate::domain::validation::ValidatedFields;
use crate::ports::inbound::TailRegistrationApi;
use crate::ports::outbound::{AuthorizationGateway, RegistryGateway};

/// TAIL Registration Service.
pub struct TailRegistrationService<A: AuthorizationGateway, R: RegistryGateway> {
    authorization: A,
    registry: R,
}

impl<A: AuthorizationGateway, R: RegistryGateway> TailRegistrationService<A, R> {
    /// Create a new service.
    ///
    /// # Arguments
    /// * `authorization` - issues signing challenges
    /// * `registry` - accepts signed records
    pub fn new(authorization: A, registry: R) -> Self {
        Self {
            authorization,
            registry,
        }
    }
}

#[async_trait::async_trait]
impl<A: AuthorizationGateway, R: RegistryGateway> TailRegistrationApi
    for TailRegistrationService<A, R>
{
    async fn request_challenge(
        &self,
        key: &ChallengeKey,
    ) -> Result<Option<Challenge>, ChallengeFetchError> {
        let response = self.authorization.fetch_challenge(key).await?;
        Ok(response.into_challenge(key.clone()))
    }

    async fn submit(
        &self,
        fields: &ValidatedFields,
        challenge: &Challenge,
        signature: &str,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let submission = assemble(fields, challenge, signature).inspect_err(|e| {
            warn!(hash = %fields.hash(), error = ?e, "Submission not sent");
        })?;

        let response = self.registry.submit_record(&submission).await?;
        let outcome = interpret_response(fields.hash(), response);

        match &outcome {
            Ok(receipt) => info!(hash = %receipt.hash, tx_id = %receipt.tx_id, "Registry accepted TAIL record"),
            Err(e) => warn!(hash = %fields.hash(), error = %e, "Registry refused TAIL record"),
        }
        outcome
    }
}
