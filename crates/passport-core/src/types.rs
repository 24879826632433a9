use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Version tag written into challenge and proof records.
pub const RECORD_VERSION: &str = "0.0.0";

/// Claim fields produced by a provider once an external fact is verified.
///
/// Keys are kept sorted so every consumer sees the same canonical order,
/// regardless of how the record was assembled.
pub type ProofRecord = BTreeMap<String, String>;

/// Selects which of the two issuer keys signs a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureType {
    /// Ed25519 key, `did:key` issuer.
    #[default]
    #[serde(rename = "Ed25519", alias = "Default", alias = "default", alias = "ed25519")]
    Ed25519,
    /// secp256k1 key signing EIP-712 typed data, `did:ethr` issuer.
    #[serde(rename = "EIP712", alias = "eip712")]
    Eip712,
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::Eip712 => write!(f, "EIP712"),
        }
    }
}

impl FromStr for SignatureType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" | "default" => Ok(Self::Ed25519),
            "eip712" => Ok(Self::Eip712),
            _ => Err(CoreError::UnknownSignatureType(s.to_string())),
        }
    }
}

/// Why a credential failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationFailure {
    /// The proof does not verify against the key named by the issuer DID.
    InvalidSignature,
    /// The issuer DID is not one of the two trusted issuers.
    UntrustedIssuer,
    /// `expirationDate` is in the past.
    Expired,
    /// The signed challenge does not belong to the presented credential.
    ChallengeMismatch,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "InvalidSignature"),
            Self::UntrustedIssuer => write!(f, "UntrustedIssuer"),
            Self::Expired => write!(f, "Expired"),
            Self::ChallengeMismatch => write!(f, "ChallengeMismatch"),
        }
    }
}
