//! # Submission Assembly
//!
//! Builds the signed add-TAIL request from validated fields and a live
//! challenge, and interprets the registry's reply.

use super::entities::{
    non_empty, Challenge, SignedSubmission, SubmissionReceipt, SubmissionRecord, SubmitResponse,
};
use super::errors::SubmissionError;
use super::identifier::decode_launcher_id;
use super::validation::ValidatedFields;

/// Assemble a signed submission.
///
/// Fails without touching the network if the signature is empty, the
/// challenge belongs to another asset id / coin id pair, or the logo id does
/// not decode.
pub fn assemble(
    fields: &ValidatedFields,
    challenge: &Challenge,
    signature: &str,
) -> Result<SignedSubmission, SubmissionError> {
    let signature = signature.trim();
    if signature.is_empty() {
        return Err(SubmissionError::MissingSignature);
    }
    if challenge.key() != &fields.challenge_key() {
        return Err(SubmissionError::ChallengeMismatch);
    }

    let launcher_id =
        decode_launcher_id(fields.logo()).map_err(SubmissionError::InvalidIdentifier)?;

    let record = SubmissionRecord {
        hash: fields.hash().to_string(),
        name: fields.name().to_string(),
        code: fields.code().to_string(),
        category: fields.category(),
        description: fields.description().to_string(),
        launcher_id: launcher_id.to_hex(),
        eve_coin_id: fields.coin().to_string(),
        website_url: fields.website_url().map(str::to_string),
        twitter_url: fields.twitter_url().map(str::to_string),
        discord_url: fields.discord_url().map(str::to_string),
    };

    Ok(SignedSubmission::new(record, signature.to_string()))
}

/// Interpret the registry reply for the record with asset hash `hash`.
///
/// A transaction id means success. Otherwise an explicit error is passed
/// through verbatim, and a reply with neither is the duplicate/mempool case.
pub fn interpret_response(
    hash: &str,
    response: SubmitResponse,
) -> Result<SubmissionReceipt, SubmissionError> {
    if let Some(tx_id) = non_empty(response.tx_id) {
        return Ok(SubmissionReceipt {
            hash: hash.to_string(),
            tx_id,
        });
    }
    match non_empty(response.error) {
        Some(error) => Err(SubmissionError::Rejected(error)),
        None => Err(SubmissionError::Duplicate),
    }
}
