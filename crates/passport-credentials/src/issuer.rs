use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use passport_core::{ProofRecord, SecretRedactor, SignatureType};
use passport_crypto::EthAddress;
use passport_identity::{
    pkh_did, Credential, CredentialSigner, CredentialSubject, IssuerKeyStore, UnsignedCredential,
};

use crate::challenge::{challenge_provider, ChallengeRecord};
use crate::error::CredentialError;
use crate::nullifier::Nullifier;

/// Lifetimes of issued credentials.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Lifetime of a challenge credential.
    pub challenge_ttl: Duration,
    /// Default lifetime of a stamp credential.
    pub stamp_ttl: Duration,
    /// Per-provider stamp lifetimes, keyed by provider type.
    pub provider_ttls: HashMap<String, Duration>,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            challenge_ttl: Duration::minutes(10),
            stamp_ttl: Duration::days(90),
            provider_ttls: HashMap::new(),
        }
    }
}

impl IssuerConfig {
    /// Stamp lifetime for `provider_type`.
    pub fn stamp_ttl_for(&self, provider_type: &str) -> Duration {
        self.provider_ttls
            .get(provider_type)
            .copied()
            .unwrap_or(self.stamp_ttl)
    }
}

/// A stamp credential together with the record it attests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedCredential {
    pub credential: Credential,
    pub record: ProofRecord,
    #[serde(default)]
    pub proofs: Vec<serde_json::Value>,
}

/// Issues challenge and stamp credentials signed with the service's keys.
pub struct CredentialIssuer {
    keys: Arc<IssuerKeyStore>,
    signer: Arc<dyn CredentialSigner>,
    config: IssuerConfig,
    redactor: SecretRedactor,
}

impl CredentialIssuer {
    pub fn new(
        keys: Arc<IssuerKeyStore>,
        signer: Arc<dyn CredentialSigner>,
        config: IssuerConfig,
    ) -> Self {
        Self {
            keys,
            signer,
            config,
            redactor: SecretRedactor::new(),
        }
    }

    /// Scrub these secrets from signing error messages.
    pub fn with_redactor(mut self, redactor: SecretRedactor) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Issue the credential a wallet signs to prove control of its address.
    pub fn issue_challenge_credential(
        &self,
        record: &ChallengeRecord,
    ) -> Result<Credential, CredentialError> {
        self.issue_challenge_credential_at(record, Utc::now())
    }

    pub fn issue_challenge_credential_at(
        &self,
        record: &ChallengeRecord,
        now: DateTime<Utc>,
    ) -> Result<Credential, CredentialError> {
        let address = parse_address(&record.address)?;
        let subject = CredentialSubject {
            id: pkh_did(&address),
            provider: challenge_provider(&record.provider_type),
            hash: None,
            challenge: Some(record.challenge.clone()),
            address: Some(address.to_checksum()),
        };
        let credential = self.sign(
            subject,
            record.signature_type(),
            now,
            expiry(now, self.config.challenge_ttl)?,
        )?;

        tracing::info!(
            issuer = %credential.issuer,
            subject = %credential.credential_subject.id,
            provider = %credential.credential_subject.provider,
            expires = %credential.expiration_date,
            "challenge credential issued"
        );
        Ok(credential)
    }

    /// Issue a stamp credential for a verified proof record.
    ///
    /// `record` must carry `address` and `type`; the subject holds only the
    /// nullifier, never the record's other fields.
    pub fn issue_hashed_credential(
        &self,
        record: &ProofRecord,
        hash: &Nullifier,
        signature_type: SignatureType,
    ) -> Result<IssuedCredential, CredentialError> {
        self.issue_hashed_credential_at(record, hash, signature_type, Utc::now())
    }

    pub fn issue_hashed_credential_at(
        &self,
        record: &ProofRecord,
        hash: &Nullifier,
        signature_type: SignatureType,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, CredentialError> {
        let address = record
            .get("address")
            .ok_or_else(|| CredentialError::Validation("record is missing address".into()))?;
        let provider_type = record
            .get("type")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CredentialError::Validation("record is missing type".into()))?;
        let address = parse_address(address)?;

        let subject = CredentialSubject {
            id: pkh_did(&address),
            provider: provider_type.clone(),
            hash: Some(hash.to_string()),
            challenge: None,
            address: None,
        };
        let ttl = self.config.stamp_ttl_for(provider_type);
        let credential = self.sign(subject, signature_type, now, expiry(now, ttl)?)?;

        tracing::info!(
            issuer = %credential.issuer,
            subject = %credential.credential_subject.id,
            provider = %provider_type,
            expires = %credential.expiration_date,
            "stamp credential issued"
        );

        Ok(IssuedCredential {
            credential,
            record: record.clone(),
            proofs: Vec::new(),
        })
    }

    fn sign(
        &self,
        subject: CredentialSubject,
        signature_type: SignatureType,
        issuance: DateTime<Utc>,
        expiration: DateTime<Utc>,
    ) -> Result<Credential, CredentialError> {
        let key = self.keys.issuer_key(signature_type);
        let document =
            UnsignedCredential::new(key.did().to_string(), subject, issuance, expiration);
        self.signer.sign(document, key).map_err(|e| {
            let message = self.redactor.redact(&e.to_string());
            tracing::error!(signature_type = %signature_type, error = %message, "credential signing failed");
            CredentialError::Signing(message)
        })
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, CredentialError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| CredentialError::Signing(format!("credential lifetime {} out of range", ttl)))
}

fn parse_address(address: &str) -> Result<EthAddress, CredentialError> {
    EthAddress::parse(address).map_err(|e| CredentialError::Validation(e.to_string()))
}
