//! # Identifier Codec
//!
//! Bech32m decoding of NFT ids into launcher ids.
//!
//! An NFT id such as `nft1qqqsyqcy…` is a human-readable part, the `1`
//! separator, a payload of 5-bit groups and a 6-group checksum. Decoding
//! verifies the checksum with the bech32m constant, then regroups the payload
//! into bytes without padding.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32m, Hrp};

use super::entities::{LauncherId, LAUNCHER_ID_LEN};
use super::errors::IdentifierError;

/// BIP-173 string length limit. The crate allows longer bech32m strings.
const MAX_LEN: usize = 90;

/// Result of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedIdentifier {
    /// Human-readable part, lowercased
    pub hrp: String,
    /// Payload regrouped into bytes
    pub bytes: Vec<u8>,
}

impl DecodedIdentifier {
    /// Lowercase hex rendering of the payload.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// Decode a bech32m identifier into its payload bytes.
///
/// Any structural, alphabet, checksum or padding failure is an error.
pub fn decode(identifier: &str) -> Result<DecodedIdentifier, IdentifierError> {
    let len = identifier.chars().count();
    if len > MAX_LEN {
        return Err(IdentifierError::InvalidLength(len));
    }

    let checked = CheckedHrpstring::new::<Bech32m>(identifier)?;
    // Leftover bits must be fewer than five and all zero
    checked.validate_segwit_padding()?;

    Ok(DecodedIdentifier {
        hrp: checked.hrp().to_lowercase(),
        bytes: checked.byte_iter().collect(),
    })
}

/// Decode an NFT id into a 32-byte launcher id.
pub fn decode_launcher_id(identifier: &str) -> Result<LauncherId, IdentifierError> {
    let decoded = decode(identifier)?;
    let actual = decoded.bytes.len();
    let bytes: [u8; LAUNCHER_ID_LEN] =
        decoded
            .bytes
            .try_into()
            .map_err(|_| IdentifierError::InvalidDataLength {
                expected: LAUNCHER_ID_LEN,
                actual,
            })?;
    Ok(LauncherId(bytes))
}

/// Encode bytes as a lowercase bech32m string with the given human-readable part.
pub fn encode(hrp: &str, bytes: &[u8]) -> Result<String, IdentifierError> {
    let hrp = Hrp::parse(hrp)?;
    let encoded = bech32::encode::<Bech32m>(hrp, bytes)?;
    if encoded.len() > MAX_LEN {
        return Err(IdentifierError::InvalidLength(encoded.len()));
    }
    Ok(encoded)
}

/// Render a launcher id as an `nft1…` identifier.
pub fn encode_launcher_id(launcher_id: &LauncherId) -> Result<String, IdentifierError> {
    encode("nft", launcher_id.as_bytes())
}
