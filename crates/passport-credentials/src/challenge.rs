use serde::{Deserialize, Serialize};

use passport_core::{SignatureType, RECORD_VERSION};
use passport_crypto::EthAddress;

use crate::error::CredentialError;

/// Provider type that requests a wallet-wide challenge instead of a
/// per-stamp one.
pub const BULK_CHALLENGE_TYPE: &str = "bulk";

/// Prefix of the `credentialSubject.provider` of every challenge credential.
pub const CHALLENGE_PROVIDER_PREFIX: &str = "challenge-";

/// Client request for a challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    #[serde(default)]
    pub address: String,
    #[serde(rename = "type", default)]
    pub provider_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<SignatureType>,
}

/// The challenge issued for one address and provider type. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    pub version: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    /// EIP-55 checksummed.
    pub address: String,
    pub challenge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<SignatureType>,
}

impl ChallengeRecord {
    pub fn signature_type(&self) -> SignatureType {
        self.signature_type.unwrap_or_default()
    }
}

/// The literal text a wallet signs for `provider_type`.
pub fn challenge_text(provider_type: &str, address: &EthAddress) -> String {
    if provider_type.eq_ignore_ascii_case(BULK_CHALLENGE_TYPE) {
        format!(
            "I commit that this wallet is under my control and that I wish to verify my stamps for Passport.\n\naddress: {}",
            address.to_checksum()
        )
    } else {
        format!(
            "I commit that this stamp is my unique and only {} verification for Passport.\n\naddress: {}",
            provider_type,
            address.to_checksum()
        )
    }
}

/// `credentialSubject.provider` of the challenge credential for `provider_type`.
pub fn challenge_provider(provider_type: &str) -> String {
    format!("{}{}", CHALLENGE_PROVIDER_PREFIX, provider_type)
}

/// Whether a challenge credential tagged `challenge_provider` may back a
/// stamp of `provider_type`. A bulk challenge covers every type; any other
/// challenge covers only the type it was issued for.
pub fn challenge_covers(challenge_provider: &str, provider_type: &str) -> bool {
    match challenge_provider.strip_prefix(CHALLENGE_PROVIDER_PREFIX) {
        Some(issued_for) => {
            issued_for.eq_ignore_ascii_case(BULK_CHALLENGE_TYPE) || issued_for == provider_type
        }
        None => false,
    }
}

/// Validate a challenge request and build its record.
///
/// Pure: the same payload always yields the same record.
pub fn build_challenge_record(payload: &ChallengePayload) -> Result<ChallengeRecord, CredentialError> {
    if payload.address.trim().is_empty() {
        return Err(CredentialError::Validation("missing address".into()));
    }
    if payload.provider_type.trim().is_empty() {
        return Err(CredentialError::Validation("missing type".into()));
    }

    let address = EthAddress::parse(&payload.address)
        .map_err(|e| CredentialError::Validation(e.to_string()))?;

    Ok(ChallengeRecord {
        version: RECORD_VERSION.to_string(),
        provider_type: payload.provider_type.clone(),
        address: address.to_checksum(),
        challenge: challenge_text(&payload.provider_type, &address),
        signature_type: payload.signature_type,
    })
}
