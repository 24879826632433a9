use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};

use passport_crypto::EthAddress;

use crate::did::pkh_address;
use crate::error::IdentityError;

/// JSON-LD context of every credential.
pub const CREDENTIALS_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// The claim-bearing part of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    /// `did:pkh` of the account the credential is about.
    pub id: String,
    /// Provider tag: a stamp provider name or `challenge-<type>`.
    pub provider: String,
    /// One-way hash (nullifier) of the verified claim. Stamps only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Literal challenge text the holder must sign. Challenges only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    /// Checksummed address that requested the challenge. Challenges only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Signature envelope attached to an issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProof {
    /// `Ed25519Signature2018` or `EthereumEip712Signature2021`.
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: DateTime<Utc>,
    pub proof_purpose: String,
    /// DID URL of the issuer key.
    pub verification_method: String,
    /// Hex-encoded signature.
    pub proof_value: String,
}

/// A credential document before the signer attaches a proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    pub issuer: String,
    pub issuance_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub credential_subject: CredentialSubject,
}

impl UnsignedCredential {
    /// Build a document. Timestamps are truncated to whole seconds so the
    /// JSON form and the signed form agree byte for byte.
    pub fn new(
        issuer: String,
        credential_subject: CredentialSubject,
        issuance_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            context: vec![CREDENTIALS_CONTEXT.to_string()],
            credential_type: vec!["VerifiableCredential".to_string()],
            issuer,
            issuance_date: truncate_to_seconds(issuance_date),
            expiration_date: truncate_to_seconds(expiration_date),
            credential_subject,
        }
    }

    /// Attach a proof.
    pub fn into_credential(self, proof: CredentialProof) -> Credential {
        Credential {
            context: self.context,
            credential_type: self.credential_type,
            issuer: self.issuer,
            issuance_date: self.issuance_date,
            expiration_date: self.expiration_date,
            credential_subject: self.credential_subject,
            proof,
        }
    }
}

/// An issued, signed Verifiable Credential. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    pub issuer: String,
    pub issuance_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub credential_subject: CredentialSubject,
    pub proof: CredentialProof,
}

impl Credential {
    /// The document without its proof, i.e. what was signed.
    pub fn document(&self) -> UnsignedCredential {
        UnsignedCredential {
            context: self.context.clone(),
            credential_type: self.credential_type.clone(),
            issuer: self.issuer.clone(),
            issuance_date: self.issuance_date,
            expiration_date: self.expiration_date,
            credential_subject: self.credential_subject.clone(),
        }
    }

    /// Whether `expirationDate` has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration_date
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The account address encoded in `credentialSubject.id`.
    pub fn subject_address(&self) -> Result<EthAddress, IdentityError> {
        pkh_address(&self.credential_subject.id)
    }
}

/// RFC 3339 form used for timestamps inside signed payloads.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn truncate_to_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(0).unwrap_or(t)
}
