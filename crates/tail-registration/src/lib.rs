//! # TAIL Registration
//!
//! Registers a TAIL (token asset) record with a remote registry. The asset
//! owner proves control of the asset by signing a challenge issued for the
//! `(asset hash, eve coin id)` pair; the signed record is then submitted
//! together with the signature.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): bech32m identifier codec, field rules,
//!   challenge state machine, submission assembly. No I/O.
//! - **Ports Layer** (`ports/`): the registration API and the two remote
//!   services it depends on
//! - **Adapters Layer** (`adapters/`): reqwest client for both services
//! - **Service Layer** (`service.rs`): wires domain logic to ports
//! - **Session** (`session.rs`): async driver for interactive front ends
//!
//! ## Flow
//!
//! ```text
//! edit hash/coin ──→ ChallengeCoordinator ──ticket──→ AuthorizationGateway
//!                          ↑                                │
//!                          └──────── Option<Challenge> ─────┘
//! submit(signature) ──→ assemble ──→ RegistryGateway ──→ receipt | error
//! ```
//!
//! ## Guarantees
//!
//! - A challenge lookup starts only for a complete key, once per distinct key
//! - Results for a key that is no longer current are discarded
//! - A submission needs valid fields, a live challenge for the same key and a
//!   non-empty signature
//! - An undecodable logo NFT id fails with `Invalid NFT ID` before any request

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod session;

// Re-export public API
pub use adapters::HttpRegistryClient;
pub use config::{ConfigError, RegistrationConfig};
pub use domain::coordinator::{ChallengeCoordinator, ChallengeState, FetchTicket};
pub use domain::entities::{
    Category, Challenge, ChallengeKey, ChallengeResponse, FormField, LauncherId,
    SignedSubmission, SubmissionReceipt, SubmissionRecord, SubmitResponse, TailForm,
    WalletAccount,
};
pub use domain::errors::{
    ChallengeFetchError, FieldError, IdentifierError, SubmissionError,
    DUPLICATE_SUBMISSION_MESSAGE, INVALID_IDENTIFIER_MESSAGE,
};
pub use domain::form::{RegistrationForm, SessionSnapshot, SUBMITTED_MESSAGE};
pub use domain::identifier::{
    decode, decode_launcher_id, encode, encode_launcher_id, DecodedIdentifier,
};
pub use domain::validation::{field_errors, validate, ValidatedFields};
pub use ports::inbound::TailRegistrationApi;
pub use ports::outbound::{AuthorizationGateway, GatewayError, RegistryGateway};
pub use service::TailRegistrationService;
pub use session::{RegistrationSession, SessionCommand, SessionError, SessionHandle};
