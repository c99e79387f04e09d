//! # Challenge Coordinator
//!
//! State machine tying edits of the `hash` and `coin` fields to challenge
//! lookups. It performs no I/O: an edit may yield a [`FetchTicket`], the
//! caller runs the request, and the outcome is handed back through
//! [`ChallengeCoordinator::resolve`].
//!
//! ```text
//!            key incomplete
//!   ┌──────────────────────────────────────────────┐
//!   ↓                                              │
//! [Idle] ──key complete──→ [Fetching(k)] ──resolve(k)──→ [Ready(k, challenge?)]
//!                              ↑                               │
//!                              └──── key changes to k' ────────┘
//! ```
//!
//! Results are applied last-key-wins: a ticket whose generation is no longer
//! current is dropped when it resolves, whatever order responses arrive in.

use tracing::{debug, warn};

use super::entities::{Challenge, ChallengeKey, FormField};
use super::errors::ChallengeFetchError;

/// Where the coordinator is for the current key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChallengeState {
    /// Key incomplete, nothing to fetch
    #[default]
    Idle,
    /// Waiting for the challenge of `key`
    Fetching { key: ChallengeKey },
    /// Lookup for `key` finished; `None` means nothing to sign
    Ready {
        key: ChallengeKey,
        challenge: Option<Challenge>,
    },
}

impl ChallengeState {
    /// Key this state belongs to, if any.
    pub fn key(&self) -> Option<&ChallengeKey> {
        match self {
            ChallengeState::Idle => None,
            ChallengeState::Fetching { key } | ChallengeState::Ready { key, .. } => Some(key),
        }
    }

    /// The live challenge, only in `Ready` with a challenge.
    pub fn challenge(&self) -> Option<&Challenge> {
        match self {
            ChallengeState::Ready {
                challenge: Some(challenge),
                ..
            } => Some(challenge),
            _ => None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, ChallengeState::Fetching { .. })
    }
}

/// Permission to run one challenge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: ChallengeKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &ChallengeKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Challenge state machine over the two watched fields.
#[derive(Debug, Default)]
pub struct ChallengeCoordinator {
    hash: String,
    coin_id: String,
    state: ChallengeState,
    generation: u64,
    failure: Option<String>,
}

impl ChallengeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ChallengeState {
        &self.state
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.state.challenge()
    }

    /// Message of the last failed lookup for the current key.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Key implied by the latest watched values, complete or not.
    pub fn current_key(&self) -> ChallengeKey {
        ChallengeKey::new(self.hash.clone(), self.coin_id.clone())
    }

    /// Feed an edit. Returns a ticket when a new lookup must start.
    ///
    /// Edits to fields other than `hash` and `coin` are ignored.
    pub fn on_field_changed(&mut self, field: FormField, value: &str) -> Option<FetchTicket> {
        match field {
            FormField::Hash => self.hash = value.to_string(),
            FormField::Coin => self.coin_id = value.to_string(),
            _ => return None,
        }
        self.reconcile()
    }

    /// Apply the outcome of a lookup.
    ///
    /// `Ok(None)` means the service had nothing to sign. Returns `false`,
    /// leaving the state untouched, if `ticket` is stale.
    pub fn resolve(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Option<Challenge>, ChallengeFetchError>,
    ) -> bool {
        let awaited = matches!(&self.state, ChallengeState::Fetching { key } if *key == ticket.key);
        if !awaited || ticket.generation != self.generation {
            warn!(
                key = %ticket.key,
                generation = ticket.generation,
                current_generation = self.generation,
                "Discarding stale challenge result"
            );
            return false;
        }

        let key = ticket.key.clone();
        match result {
            Ok(challenge) => {
                let challenge = challenge.filter(|c| c.key() == &key);
                debug!(key = %key, available = challenge.is_some(), "Challenge resolved");
                self.failure = None;
                self.state = ChallengeState::Ready { key, challenge };
            }
            Err(error) => {
                warn!(key = %key, error = %error, "Challenge request failed");
                self.failure = Some(error.to_string());
                self.state = ChallengeState::Ready {
                    key,
                    challenge: None,
                };
            }
        }
        true
    }

    fn reconcile(&mut self) -> Option<FetchTicket> {
        let key = self.current_key();

        if !key.is_complete() {
            if self.state != ChallengeState::Idle {
                debug!("Challenge key incomplete, clearing challenge");
            }
            self.state = ChallengeState::Idle;
            self.failure = None;
            return None;
        }

        if self.state.key() == Some(&key) {
            return None;
        }

        self.generation += 1;
        self.failure = None;
        self.state = ChallengeState::Fetching { key: key.clone() };
        debug!(key = %key, generation = self.generation, "Requesting challenge");

        Some(FetchTicket {
            key,
            generation: self.generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChallengeResponse;

    fn hash(c: char) -> String {
        c.to_string().repeat(64)
    }

    fn sign_me(ticket: &FetchTicket) -> Option<Challenge> {
        ChallengeResponse {
            address: Some("xch1signer".into()),
            message: Some("sign-me".into()),
        }
        .into_challenge(ticket.key().clone())
    }

    fn ready_coordinator() -> (ChallengeCoordinator, FetchTicket) {
        let mut coordinator = ChallengeCoordinator::new();
        assert!(coordinator.on_field_changed(FormField::Hash, &hash('a')).is_none());
        let ticket = coordinator
            .on_field_changed(FormField::Coin, &hash('b'))
            .expect("complete key issues a ticket");
        (coordinator, ticket)
    }

    #[test]
    fn test_incomplete_key_never_fetches() {
        let mut coordinator = ChallengeCoordinator::new();
        for len in [0, 1, 63, 65] {
            let value = "a".repeat(len);
            assert!(coordinator.on_field_changed(FormField::Hash, &value).is_none());
            assert!(coordinator.on_field_changed(FormField::Coin, &hash('b')).is_none());
            assert_eq!(coordinator.state(), &ChallengeState::Idle);
        }
    }

    #[test]
    fn test_complete_key_fetches_once() {
        let (mut coordinator, ticket) = ready_coordinator();
        assert_eq!(ticket.key(), &ChallengeKey::new(hash('a'), hash('b')));
        assert!(coordinator.state().is_fetching());

        // Same value again while outstanding
        assert!(coordinator.on_field_changed(FormField::Coin, &hash('b')).is_none());
        // Unrelated field
        assert!(coordinator.on_field_changed(FormField::Name, "x").is_none());

        assert!(coordinator.resolve(&ticket, Ok(sign_me(&ticket))));
        // Same value again after resolution
        assert!(coordinator.on_field_changed(FormField::Hash, &hash('a')).is_none());
        assert!(coordinator.challenge().is_some());
    }

    #[test]
    fn test_challenge_available() {
        let (mut coordinator, ticket) = ready_coordinator();
        assert!(coordinator.resolve(&ticket, Ok(sign_me(&ticket))));

        let challenge = coordinator.challenge().unwrap();
        assert_eq!(challenge.signing_address(), "xch1signer");
        assert_eq!(challenge.message(), "sign-me");
        assert_eq!(coordinator.failure(), None);
    }

    #[test]
    fn test_empty_response_is_not_an_error() {
        let (mut coordinator, ticket) = ready_coordinator();
        assert!(coordinator.resolve(&ticket, Ok(None)));

        assert!(matches!(
            coordinator.state(),
            ChallengeState::Ready { challenge: None, .. }
        ));
        assert_eq!(coordinator.failure(), None);
    }

    #[test]
    fn test_fetch_failure_surfaces_message() {
        let (mut coordinator, ticket) = ready_coordinator();
        let error = ChallengeFetchError::Transport("connection refused".into());
        assert!(coordinator.resolve(&ticket, Err(error)));

        assert!(coordinator.challenge().is_none());
        assert_eq!(coordinator.failure(), Some("connection refused"));
    }

    #[test]
    fn test_incomplete_key_clears_challenge() {
        let (mut coordinator, ticket) = ready_coordinator();
        coordinator.resolve(&ticket, Ok(sign_me(&ticket)));
        assert!(coordinator.challenge().is_some());

        assert!(coordinator.on_field_changed(FormField::Hash, "abc").is_none());
        assert_eq!(coordinator.state(), &ChallengeState::Idle);
        assert!(coordinator.challenge().is_none());
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let (mut coordinator, first) = ready_coordinator();
        let second = coordinator
            .on_field_changed(FormField::Hash, &hash('c'))
            .expect("new complete key issues a ticket");

        // First response arrives late
        assert!(!coordinator.resolve(&first, Ok(sign_me(&first))));
        assert!(coordinator.state().is_fetching());
        assert!(coordinator.challenge().is_none());

        assert!(coordinator.resolve(&second, Ok(None)));
        assert!(matches!(
            coordinator.state(),
            ChallengeState::Ready { challenge: None, key } if key.hash() == hash('c')
        ));
    }

    #[test]
    fn test_stale_result_after_key_cleared() {
        let (mut coordinator, ticket) = ready_coordinator();
        coordinator.on_field_changed(FormField::Coin, "");

        assert!(!coordinator.resolve(&ticket, Ok(sign_me(&ticket))));
        assert_eq!(coordinator.state(), &ChallengeState::Idle);
    }

    #[test]
    fn test_returning_to_previous_key_refetches() {
        let (mut coordinator, first) = ready_coordinator();
        coordinator.on_field_changed(FormField::Hash, "");
        let again = coordinator
            .on_field_changed(FormField::Hash, &hash('a'))
            .expect("key became complete again");

        assert_eq!(again.key(), first.key());
        assert!(again.generation() > first.generation());
        // The earlier ticket for the same key is no longer current
        assert!(!coordinator.resolve(&first, Ok(sign_me(&first))));
        assert!(coordinator.resolve(&again, Ok(sign_me(&again))));
    }

    #[test]
    fn test_duplicate_resolution_is_ignored() {
        let (mut coordinator, ticket) = ready_coordinator();
        assert!(coordinator.resolve(&ticket, Ok(sign_me(&ticket))));
        assert!(!coordinator.resolve(&ticket, Ok(None)));
        assert!(coordinator.challenge().is_some());
    }
}
