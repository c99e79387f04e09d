//! # Registration Form
//!
//! The single state container behind a registration: raw field values, their
//! validation errors, the challenge state machine and the submission outcome.
//! Every edit re-runs validation over the whole form.

use tracing::{debug, info};

use super::coordinator::{ChallengeCoordinator, ChallengeState, FetchTicket};
use super::entities::{Challenge, FormField, SubmissionReceipt, TailForm};
use super::errors::{ChallengeFetchError, FieldError, SubmissionError};
use super::validation::{field_errors, validate, ValidatedFields};

/// Confirmation shown once the registry accepts a record.
pub const SUBMITTED_MESSAGE: &str = "TAIL record submitted to mempool";

/// Read-only view of a [`RegistrationForm`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub fields: TailForm,
    pub challenge: ChallengeState,
    pub field_errors: Vec<FieldError>,
    /// Alert text: last submission failure, else last challenge failure
    pub failure: Option<String>,
    /// Failed lookup for the current key
    pub challenge_failure: Option<String>,
    pub submitting: bool,
    /// Set once the record has been accepted
    pub receipt: Option<SubmissionReceipt>,
}

impl SessionSnapshot {
    /// Signature entry and the submit action are available.
    pub fn can_submit(&self) -> bool {
        !self.submitting && self.receipt.is_none() && self.challenge.challenge().is_some()
    }

    /// The record was accepted; the form no longer takes edits.
    pub fn is_inserted(&self) -> bool {
        self.receipt.is_some()
    }

    pub fn error_for(&self, field: FormField) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Everything a submission needs besides the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub fields: ValidatedFields,
    pub challenge: Challenge,
}

#[derive(Debug, Default)]
pub struct RegistrationForm {
    form: TailForm,
    errors: Vec<FieldError>,
    coordinator: ChallengeCoordinator,
    submitting: bool,
    submission_failure: Option<String>,
    receipt: Option<SubmissionReceipt>,
}

impl RegistrationForm {
    pub fn new() -> Self {
        let form = TailForm::new();
        Self {
            errors: field_errors(&form),
            form,
            ..Self::default()
        }
    }

    pub fn fields(&self) -> &TailForm {
        &self.form
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn challenge_state(&self) -> &ChallengeState {
        self.coordinator.state()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    /// Alert currently shown to the user, if any.
    pub fn failure(&self) -> Option<&str> {
        self.submission_failure
            .as_deref()
            .or_else(|| self.coordinator.failure())
    }

    /// Apply an edit. Returns a ticket when a challenge lookup must start.
    ///
    /// Edits after a successful submission are ignored.
    pub fn edit(&mut self, field: FormField, value: &str) -> Option<FetchTicket> {
        if self.receipt.is_some() {
            debug!(field = %field, "Ignoring edit after submission");
            return None;
        }
        self.form.set(field, value);
        self.errors = field_errors(&self.form);
        self.coordinator.on_field_changed(field, value)
    }

    /// Hand back the outcome of a challenge lookup.
    pub fn resolve_challenge(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Option<Challenge>, ChallengeFetchError>,
    ) -> bool {
        self.coordinator.resolve(ticket, result)
    }

    /// Start a submission of the current form.
    ///
    /// Requires valid fields, a live challenge and no submission in flight.
    /// On success the form stays in the submitting state until
    /// [`RegistrationForm::finish_submission`]. A refusal becomes the
    /// current failure.
    pub fn begin_submission(&mut self) -> Result<SubmissionRequest, SubmissionError> {
        let request = self.submission_request().inspect_err(|error| {
            debug!(error = %error, "Submission refused");
            self.submission_failure = Some(error.to_string());
        })?;

        self.submitting = true;
        self.submission_failure = None;
        Ok(request)
    }

    fn submission_request(&self) -> Result<SubmissionRequest, SubmissionError> {
        if self.receipt.is_some() {
            return Err(SubmissionError::AlreadySubmitted);
        }
        if self.submitting {
            return Err(SubmissionError::InProgress);
        }
        let fields = validate(&self.form).map_err(SubmissionError::InvalidFields)?;
        let challenge = self
            .coordinator
            .challenge()
            .cloned()
            .ok_or(SubmissionError::NoChallenge)?;
        Ok(SubmissionRequest { fields, challenge })
    }

    /// Record the outcome of a submission.
    ///
    /// On failure the field values and challenge are left as they were.
    pub fn finish_submission(&mut self, result: &Result<SubmissionReceipt, SubmissionError>) {
        self.submitting = false;
        match result {
            Ok(receipt) => {
                info!(hash = %receipt.hash, tx_id = %receipt.tx_id, "{}", SUBMITTED_MESSAGE);
                self.receipt = Some(receipt.clone());
                self.submission_failure = None;
            }
            Err(error) => {
                self.submission_failure = Some(error.to_string());
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            fields: self.form.clone(),
            challenge: self.coordinator.state().clone(),
            field_errors: self.errors.clone(),
            failure: self.failure().map(str::to_string),
            challenge_failure: self.coordinator.failure().map(str::to_string),
            submitting: self.submitting,
            receipt: self.receipt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChallengeResponse;
    use crate::domain::errors::DUPLICATE_SUBMISSION_MESSAGE;

    const NFT_ID: &str = "nft1qqqsyqcyq5rqwzqfpg9scrgwpugpzysnzs23v9ccrydpk8qarc0s9s222c";

    fn fill(form: &mut RegistrationForm) -> FetchTicket {
        form.edit(FormField::Name, "Spacebucks");
        form.edit(FormField::Code, "SBX");
        form.edit(FormField::Category, "meme");
        form.edit(FormField::Logo, NFT_ID);
        form.edit(FormField::Hash, &"a".repeat(64));
        form.edit(FormField::Coin, &"b".repeat(64))
            .expect("complete key issues a ticket")
    }

    fn sign_me(ticket: &FetchTicket) -> Option<Challenge> {
        ChallengeResponse {
            address: Some("xch1signer".into()),
            message: Some("sign-me".into()),
        }
        .into_challenge(ticket.key().clone())
    }

    fn ready_form() -> RegistrationForm {
        let mut form = RegistrationForm::new();
        let ticket = fill(&mut form);
        form.resolve_challenge(&ticket, Ok(sign_me(&ticket)));
        form
    }

    fn receipt() -> SubmissionReceipt {
        SubmissionReceipt {
            hash: "a".repeat(64),
            tx_id: "0xabc".into(),
        }
    }

    #[test]
    fn test_validation_tracks_edits() {
        let mut form = RegistrationForm::new();
        assert_eq!(form.errors().len(), 6);

        form.edit(FormField::Name, "Spacebucks");
        assert_eq!(form.errors().len(), 5);
        assert!(form.errors().iter().all(|e| e.field != FormField::Name));

        form.edit(FormField::Name, "");
        assert_eq!(form.snapshot().error_for(FormField::Name), Some("Please enter name"));
    }

    #[test]
    fn test_submission_gated_on_challenge() {
        let mut form = RegistrationForm::new();
        let ticket = fill(&mut form);
        assert!(form.errors().is_empty());

        assert_eq!(form.begin_submission(), Err(SubmissionError::NoChallenge));
        assert!(!form.snapshot().can_submit());

        form.resolve_challenge(&ticket, Ok(None));
        assert_eq!(form.begin_submission(), Err(SubmissionError::NoChallenge));

        form.edit(FormField::Coin, "");
        let ticket = form.edit(FormField::Coin, &"b".repeat(64)).unwrap();
        form.resolve_challenge(&ticket, Ok(sign_me(&ticket)));
        assert!(form.snapshot().can_submit());

        let request = form.begin_submission().unwrap();
        assert_eq!(request.challenge.message(), "sign-me");
        assert_eq!(request.fields.name(), "Spacebucks");
    }

    #[test]
    fn test_submission_gated_on_validation() {
        let mut form = ready_form();
        form.edit(FormField::Code, "TOOLONG");

        assert!(matches!(
            form.begin_submission(),
            Err(SubmissionError::InvalidFields(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn test_one_submission_at_a_time() {
        let mut form = ready_form();
        form.begin_submission().unwrap();
        assert!(form.snapshot().submitting);
        assert!(!form.snapshot().can_submit());
        assert_eq!(form.begin_submission(), Err(SubmissionError::InProgress));

        form.finish_submission(&Err(SubmissionError::Transport("timeout".into())));
        assert!(!form.snapshot().submitting);
        assert!(form.begin_submission().is_ok());
    }

    #[test]
    fn test_failure_keeps_form_state() {
        let mut form = ready_form();
        let before = form.fields().clone();

        form.begin_submission().unwrap();
        form.finish_submission(&Err(SubmissionError::Duplicate));

        assert_eq!(form.fields(), &before);
        assert_eq!(form.failure(), Some(DUPLICATE_SUBMISSION_MESSAGE));
        assert!(form.snapshot().can_submit());
    }

    #[test]
    fn test_success_locks_form() {
        let mut form = ready_form();
        form.begin_submission().unwrap();
        form.finish_submission(&Ok(receipt()));

        assert!(form.edit(FormField::Hash, &"c".repeat(64)).is_none());
        assert_eq!(form.fields().hash, "a".repeat(64));
        assert_eq!(form.begin_submission(), Err(SubmissionError::AlreadySubmitted));

        let snapshot = form.snapshot();
        assert!(snapshot.is_inserted());
        assert_eq!(snapshot.receipt.unwrap().tx_id, "0xabc");
        assert_eq!(snapshot.failure.as_deref(), Some("TAIL record already submitted"));
    }

    #[test]
    fn test_refused_submission_is_reported() {
        let mut form = RegistrationForm::new();
        form.edit(FormField::Name, "Spacebucks");

        let err = form.begin_submission().unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidFields(_)));
        assert_eq!(form.snapshot().failure, Some(err.to_string()));
        assert!(!form.snapshot().submitting);

        let mut form = ready_form();
        form.begin_submission().unwrap();
        assert_eq!(form.failure(), None);
        assert_eq!(form.begin_submission(), Err(SubmissionError::InProgress));
        assert_eq!(form.failure(), Some("A submission is already in progress"));

        form.finish_submission(&Ok(receipt()));
        assert_eq!(form.failure(), None);
    }

    #[test]
    fn test_submission_failure_outranks_challenge_failure() {
        let mut form = RegistrationForm::new();
        let ticket = fill(&mut form);
        form.resolve_challenge(
            &ticket,
            Err(ChallengeFetchError::Transport("auth down".into())),
        );
        assert_eq!(form.failure(), Some("auth down"));

        form.finish_submission(&Err(SubmissionError::Rejected("bad signature".into())));
        assert_eq!(form.failure(), Some("bad signature"));
        assert_eq!(form.snapshot().challenge_failure.as_deref(), Some("auth down"));
    }
}
