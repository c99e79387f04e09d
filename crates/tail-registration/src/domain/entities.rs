//! # Domain Entities
//!
//! Core types for TAIL registration: form fields, challenge keys, challenges,
//! and the submission record sent to the registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{AccountParseError, UnknownCategory, UnknownField};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Asset hash length in characters.
pub const HASH_LEN: usize = 64;

/// Eve coin id length in characters.
pub const COIN_ID_LEN: usize = 64;

/// Length of a bech32m NFT id (`nft1` + 52 data + 6 checksum characters).
pub const LOGO_ID_LEN: usize = 62;

/// Launcher id length in bytes.
pub const LAUNCHER_ID_LEN: usize = 32;

/// Maximum name length in characters.
pub const NAME_MAX_LEN: usize = 100;

/// Maximum code length in characters.
pub const CODE_MAX_LEN: usize = 5;

/// Header carrying the signature on submission.
pub const SIGNATURE_HEADER: &str = "x-chia-signature";

/// Wallet namespace that supports registry signing.
pub const CHIA_NAMESPACE: &str = "chia";

// =============================================================================
// CATEGORY
// =============================================================================

/// TAIL category (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gaming,
    Event,
    Education,
    Meme,
    Stablecoin,
    Wrapped,
    Platform,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 7] = [
        Category::Gaming,
        Category::Event,
        Category::Education,
        Category::Meme,
        Category::Stablecoin,
        Category::Wrapped,
        Category::Platform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gaming => "gaming",
            Category::Event => "event",
            Category::Education => "education",
            Category::Meme => "meme",
            Category::Stablecoin => "stablecoin",
            Category::Wrapped => "wrapped",
            Category::Platform => "platform",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// =============================================================================
// FORM
// =============================================================================

/// Editable form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Hash,
    Name,
    Code,
    Category,
    Coin,
    Logo,
    WebsiteUrl,
    TwitterUrl,
    DiscordUrl,
    Description,
}

impl FormField {
    pub const ALL: [FormField; 10] = [
        FormField::Hash,
        FormField::Name,
        FormField::Code,
        FormField::Category,
        FormField::Coin,
        FormField::Logo,
        FormField::WebsiteUrl,
        FormField::TwitterUrl,
        FormField::DiscordUrl,
        FormField::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Hash => "hash",
            FormField::Name => "name",
            FormField::Code => "code",
            FormField::Category => "category",
            FormField::Coin => "coin",
            FormField::Logo => "logo",
            FormField::WebsiteUrl => "website_url",
            FormField::TwitterUrl => "twitter_url",
            FormField::DiscordUrl => "discord_url",
            FormField::Description => "description",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Raw, unvalidated form contents as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailForm {
    pub hash: String,
    pub name: String,
    pub code: String,
    pub category: String,
    pub coin: String,
    pub logo: String,
    pub website_url: String,
    pub twitter_url: String,
    pub discord_url: String,
    pub description: String,
}

impl TailForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value of one field.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        *self.slot_mut(field) = value.into();
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Hash => &self.hash,
            FormField::Name => &self.name,
            FormField::Code => &self.code,
            FormField::Category => &self.category,
            FormField::Coin => &self.coin,
            FormField::Logo => &self.logo,
            FormField::WebsiteUrl => &self.website_url,
            FormField::TwitterUrl => &self.twitter_url,
            FormField::DiscordUrl => &self.discord_url,
            FormField::Description => &self.description,
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, field: FormField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// The challenge key currently implied by the hash and coin fields.
    pub fn challenge_key(&self) -> ChallengeKey {
        ChallengeKey::new(self.hash.clone(), self.coin.clone())
    }

    fn slot_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Hash => &mut self.hash,
            FormField::Name => &mut self.name,
            FormField::Code => &mut self.code,
            FormField::Category => &mut self.category,
            FormField::Coin => &mut self.coin,
            FormField::Logo => &mut self.logo,
            FormField::WebsiteUrl => &mut self.website_url,
            FormField::TwitterUrl => &mut self.twitter_url,
            FormField::DiscordUrl => &mut self.discord_url,
            FormField::Description => &mut self.description,
        }
    }
}

// =============================================================================
// CHALLENGE
// =============================================================================

/// The (asset hash, eve coin id) pair a challenge is issued for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChallengeKey {
    hash: String,
    coin_id: String,
}

impl ChallengeKey {
    pub fn new(hash: impl Into<String>, coin_id: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            coin_id: coin_id.into(),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn coin_id(&self) -> &str {
        &self.coin_id
    }

    /// Only complete keys may be sent to the authorization service.
    pub fn is_complete(&self) -> bool {
        self.hash.chars().count() == HASH_LEN && self.coin_id.chars().count() == COIN_ID_LEN
    }
}

impl fmt::Display for ChallengeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", short(&self.hash), short(&self.coin_id))
    }
}

fn short(value: &str) -> String {
    if value.chars().count() > 12 {
        format!("{}..", value.chars().take(12).collect::<String>())
    } else {
        value.to_string()
    }
}

/// Authorization service reply for a challenge request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ChallengeResponse {
    /// Turn the reply into a challenge for `key`.
    ///
    /// Returns `None` unless both the address and the message are non-empty.
    pub fn into_challenge(self, key: ChallengeKey) -> Option<Challenge> {
        match (non_empty(self.address), non_empty(self.message)) {
            (Some(signing_address), Some(message)) => Some(Challenge {
                key,
                signing_address,
                message,
            }),
            _ => None,
        }
    }
}

/// A message the minting wallet must sign, and the address to sign it with.
///
/// Only obtainable from an authorization service reply, so holding one means
/// a challenge was actually issued for [`Challenge::key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    key: ChallengeKey,
    signing_address: String,
    message: String,
}

impl Challenge {
    pub fn key(&self) -> &ChallengeKey {
        &self.key
    }

    pub fn signing_address(&self) -> &str {
        &self.signing_address
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Canonical 32-byte launcher id decoded from the logo NFT id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LauncherId(pub [u8; LAUNCHER_ID_LEN]);

impl LauncherId {
    pub fn as_bytes(&self) -> &[u8; LAUNCHER_ID_LEN] {
        &self.0
    }

    /// Lowercase hex, two characters per byte.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for LauncherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Request body for the add-TAIL endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    pub hash: String,
    pub name: String,
    pub code: String,
    pub category: Category,
    pub description: String,
    #[serde(rename = "launcherId")]
    pub launcher_id: String,
    #[serde(rename = "eveCoinId")]
    pub eve_coin_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_url: Option<String>,
}

/// A record plus the signature authorizing it.
///
/// The signature is sent as the [`SIGNATURE_HEADER`] header, never in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSubmission {
    record: SubmissionRecord,
    signature: String,
}

impl SignedSubmission {
    pub(crate) fn new(record: SubmissionRecord, signature: String) -> Self {
        Self { record, signature }
    }

    pub fn record(&self) -> &SubmissionRecord {
        &self.record
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Registry reply to a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub tx_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Asset hash of the submitted record
    pub hash: String,
    /// Mempool transaction id
    pub tx_id: String,
}

// =============================================================================
// WALLET ACCOUNT
// =============================================================================

/// Connected wallet account, `namespace:reference:address`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAccount {
    pub namespace: String,
    pub reference: String,
    pub address: String,
}

impl WalletAccount {
    /// `namespace:reference`
    pub fn chain_id(&self) -> String {
        format!("{}:{}", self.namespace, self.reference)
    }

    /// Only chia accounts can sign registry challenges.
    pub fn is_chia(&self) -> bool {
        self.namespace == CHIA_NAMESPACE
    }
}

impl FromStr for WalletAccount {
    type Err = AccountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(reference), Some(address))
                if !namespace.is_empty() && !reference.is_empty() && !address.is_empty() =>
            {
                Ok(Self {
                    namespace: namespace.to_string(),
                    reference: reference.to_string(),
                    address: address.to_string(),
                })
            }
            _ => Err(AccountParseError(s.to_string())),
        }
    }
}

impl fmt::Display for WalletAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.reference, self.address)
    }
}

/// `None` for absent or empty strings.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
