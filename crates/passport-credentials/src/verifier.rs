use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use passport_core::{
    CoreError, ProofRecord, VerificationEvent, VerificationFailure, VerificationState,
    VerificationStateMachine,
};
use passport_crypto::{recover_personal_signer, EthAddress, RecoverableSignature};
use passport_identity::{format_timestamp, Credential, CredentialSigner, IssuerKeyStore};

use crate::error::CredentialError;

/// Outcome of verifying one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    /// `"<Reason>: <detail>"` for each failed check. Empty when valid.
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerificationFailure>,
    pub state: VerificationState,
    /// Subject fields of a valid credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ProofRecord>,
}

impl VerificationResult {
    fn invalid(reason: VerificationFailure, detail: String) -> Self {
        Self {
            valid: false,
            errors: vec![format!("{}: {}", reason, detail)],
            reason: Some(reason),
            state: VerificationState::Invalid(reason),
            record: None,
        }
    }
}

/// Verifies credentials against the two trusted issuers.
pub struct Verifier {
    keys: Arc<IssuerKeyStore>,
    signer: Arc<dyn CredentialSigner>,
}

impl Verifier {
    pub fn new(keys: Arc<IssuerKeyStore>, signer: Arc<dyn CredentialSigner>) -> Self {
        Self { keys, signer }
    }

    /// Verify a credential now.
    pub fn verify_credential(&self, credential: &Credential) -> VerificationResult {
        self.verify_credential_at(credential, Utc::now())
    }

    /// Verify a credential as of `now`. Failures are reported in the result.
    pub fn verify_credential_at(
        &self,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> VerificationResult {
        let result = match self.run_checks(credential, now) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "verification state machine rejected a step");
                VerificationResult::invalid(VerificationFailure::InvalidSignature, e.to_string())
            }
        };
        if !result.valid {
            tracing::debug!(
                issuer = %credential.issuer,
                subject = %credential.credential_subject.id,
                errors = ?result.errors,
                "credential failed verification"
            );
        }
        result
    }

    /// Verify a batch. One result per credential, in input order.
    pub fn verify_credentials(&self, credentials: &[Credential]) -> Vec<VerificationResult> {
        let now = Utc::now();
        credentials
            .iter()
            .map(|c| self.verify_credential_at(c, now))
            .collect()
    }

    /// Check that `signature` over `signed_message` proves control of the
    /// address the challenge credential was issued to, and return it.
    pub fn verify_challenge_and_get_address(
        &self,
        challenge: &Credential,
        signed_message: &str,
        signature: &str,
    ) -> Result<EthAddress, CredentialError> {
        if challenge.credential_subject.challenge.as_deref() != Some(signed_message) {
            return Err(CredentialError::Verification(
                VerificationFailure::ChallengeMismatch,
            ));
        }

        let recovered = RecoverableSignature::from_hex(signature)
            .and_then(|sig| recover_personal_signer(signed_message.as_bytes(), &sig))
            .map_err(|e| {
                tracing::debug!(error = %e, "challenge signature recovery failed");
                CredentialError::Verification(VerificationFailure::InvalidSignature)
            })?;

        let subject = challenge
            .subject_address()
            .map_err(|_| CredentialError::Verification(VerificationFailure::ChallengeMismatch))?;
        if recovered != subject {
            tracing::debug!(%recovered, %subject, "challenge signed by another account");
            return Err(CredentialError::Verification(
                VerificationFailure::ChallengeMismatch,
            ));
        }

        let result = self.verify_credential(challenge);
        if let Some(reason) = result.reason {
            return Err(CredentialError::Verification(reason));
        }

        Ok(recovered)
    }

    fn run_checks(
        &self,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<VerificationResult, CoreError> {
        let mut state = VerificationState::Received;

        if !self.signer.verify(credential) {
            return reject(
                state,
                VerificationFailure::InvalidSignature,
                format!("proof does not verify for issuer {}", credential.issuer),
            );
        }
        state = VerificationStateMachine::transition(state, VerificationEvent::SignatureVerified)?;

        if !self.keys.has_valid_issuer(&credential.issuer) {
            return reject(
                state,
                VerificationFailure::UntrustedIssuer,
                format!("{} is not a trusted issuer", credential.issuer),
            );
        }
        state = VerificationStateMachine::transition(state, VerificationEvent::IssuerTrusted)?;

        if credential.is_expired_at(now) {
            return reject(
                state,
                VerificationFailure::Expired,
                format!(
                    "credential expired at {}",
                    format_timestamp(&credential.expiration_date)
                ),
            );
        }
        state = VerificationStateMachine::transition(state, VerificationEvent::NotExpired)?;
        state = VerificationStateMachine::transition(state, VerificationEvent::Accept)?;

        Ok(VerificationResult {
            valid: true,
            errors: Vec::new(),
            reason: None,
            state,
            record: Some(subject_record(credential)),
        })
    }
}

fn reject(
    state: VerificationState,
    reason: VerificationFailure,
    detail: String,
) -> Result<VerificationResult, CoreError> {
    VerificationStateMachine::transition(state, VerificationEvent::Reject(reason))?;
    Ok(VerificationResult::invalid(reason, detail))
}

fn subject_record(credential: &Credential) -> ProofRecord {
    let subject = &credential.credential_subject;
    let mut record = ProofRecord::new();
    record.insert("id".into(), subject.id.clone());
    record.insert("provider".into(), subject.provider.clone());
    record.insert("issuer".into(), credential.issuer.clone());
    if let Some(hash) = &subject.hash {
        record.insert("hash".into(), hash.clone());
    }
    if let Some(challenge) = &subject.challenge {
        record.insert("challenge".into(), challenge.clone());
    }
    if let Some(address) = &subject.address {
        record.insert("address".into(), address.clone());
    }
    record
}
