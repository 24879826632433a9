//! The credential signing boundary.
//!
//! Everything above this module treats signing as opaque:
//! `sign(document, key) -> credential` and `verify(credential) -> bool`.
//! [`NativeSigner`] implements it with Ed25519 over canonical JSON and with
//! secp256k1 over an EIP-712 typed-data digest.

use chrono::Utc;

use passport_crypto::{
    canonical_json, sign, verify, Eip712Domain, RecoverableSignature, Signature, TypedStruct,
};

use crate::credentials::{format_timestamp, Credential, CredentialProof, UnsignedCredential};
use crate::did::{parse_ethr_did, parse_key_did, strip_fragment};
use crate::error::IdentityError;
use crate::issuer_keys::IssuerKey;

pub const ED25519_PROOF_TYPE: &str = "Ed25519Signature2018";
pub const EIP712_PROOF_TYPE: &str = "EthereumEip712Signature2021";
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// Produces and checks credential proofs.
pub trait CredentialSigner: Send + Sync {
    /// Sign a document with the given issuer key.
    fn sign(&self, document: UnsignedCredential, key: &IssuerKey)
        -> Result<Credential, IdentityError>;

    /// Whether the credential's proof verifies against the key its issuer
    /// DID names. Says nothing about whether that issuer is trusted.
    fn verify(&self, credential: &Credential) -> bool;
}

/// Native Ed25519 / EIP-712 signer.
pub struct NativeSigner {
    domain: Eip712Domain,
}

impl NativeSigner {
    pub fn new(domain: Eip712Domain) -> Self {
        Self { domain }
    }

    /// Canonical bytes covered by an Ed25519 proof: the document plus the
    /// proof options (everything in the proof except its value).
    fn ed25519_payload(
        document: &UnsignedCredential,
        proof: &CredentialProof,
    ) -> Result<Vec<u8>, IdentityError> {
        let payload = serde_json::json!({
            "document": serde_json::to_value(document)?,
            "proof": {
                "type": proof.proof_type,
                "created": format_timestamp(&proof.created),
                "proofPurpose": proof.proof_purpose,
                "verificationMethod": proof.verification_method,
            },
        });
        Ok(canonical_json(&payload))
    }

    /// EIP-712 digest covered by an EIP-712 proof. Optional subject fields
    /// are members of the type only when present.
    fn eip712_digest(&self, document: &UnsignedCredential, proof: &CredentialProof) -> [u8; 32] {
        let subject = &document.credential_subject;
        let subject_struct = TypedStruct::new("CredentialSubject")
            .string("id", subject.id.clone())
            .string("provider", subject.provider.clone())
            .optional_string("hash", subject.hash.as_deref())
            .optional_string("challenge", subject.challenge.as_deref())
            .optional_string("address", subject.address.as_deref());
        let proof_struct = TypedStruct::new("Proof")
            .string("type", proof.proof_type.clone())
            .string("created", format_timestamp(&proof.created))
            .string("proofPurpose", proof.proof_purpose.clone())
            .string("verificationMethod", proof.verification_method.clone());
        let message = TypedStruct::new("Document")
            .string_array("context", document.context.iter().cloned())
            .string_array("type", document.credential_type.iter().cloned())
            .string("issuer", document.issuer.clone())
            .string("issuanceDate", format_timestamp(&document.issuance_date))
            .string("expirationDate", format_timestamp(&document.expiration_date))
            .nested("credentialSubject", subject_struct)
            .nested("proof", proof_struct);
        self.domain.typed_data_hash(&message)
    }

    fn verify_ed25519(credential: &Credential) -> Result<(), IdentityError> {
        if strip_fragment(&credential.proof.verification_method) != credential.issuer {
            return Err(IdentityError::CredentialVerification(
                "verification method does not belong to issuer".into(),
            ));
        }
        let public_key = parse_key_did(&credential.issuer)?;
        let payload = Self::ed25519_payload(&credential.document(), &credential.proof)?;
        let signature = Signature::from_hex(&credential.proof.proof_value)?;
        verify(&payload, &signature, &public_key)?;
        Ok(())
    }

    fn verify_eip712(&self, credential: &Credential) -> Result<(), IdentityError> {
        if strip_fragment(&credential.proof.verification_method) != credential.issuer {
            return Err(IdentityError::CredentialVerification(
                "verification method does not belong to issuer".into(),
            ));
        }
        let expected = parse_ethr_did(&credential.issuer)?;
        let digest = self.eip712_digest(&credential.document(), &credential.proof);
        let signature = RecoverableSignature::from_hex(&credential.proof.proof_value)?;
        let recovered = signature.recover(&digest)?;
        if recovered != expected {
            return Err(IdentityError::CredentialVerification(format!(
                "recovered signer {} is not issuer {}",
                recovered, expected
            )));
        }
        Ok(())
    }
}

impl Default for NativeSigner {
    fn default() -> Self {
        Self::new(Eip712Domain::new("VerifiableCredential", "1", 1))
    }
}

impl CredentialSigner for NativeSigner {
    fn sign(
        &self,
        document: UnsignedCredential,
        key: &IssuerKey,
    ) -> Result<Credential, IdentityError> {
        if document.issuer != key.did() {
            return Err(IdentityError::Signing(format!(
                "document issuer {} does not match signing key {}",
                document.issuer,
                key.did()
            )));
        }

        let mut proof = CredentialProof {
            proof_type: String::new(),
            created: document.issuance_date.min(Utc::now()),
            proof_purpose: PROOF_PURPOSE.to_string(),
            verification_method: key.verification_method(),
            proof_value: String::new(),
        };

        match key {
            IssuerKey::Ed25519 { keypair, .. } => {
                proof.proof_type = ED25519_PROOF_TYPE.to_string();
                let payload = Self::ed25519_payload(&document, &proof)?;
                proof.proof_value = sign(&payload, keypair).to_hex();
            }
            IssuerKey::Eip712 { keypair, .. } => {
                proof.proof_type = EIP712_PROOF_TYPE.to_string();
                let digest = self.eip712_digest(&document, &proof);
                let signature = keypair
                    .sign_prehash(&digest)
                    .map_err(|e| IdentityError::Signing(e.to_string()))?;
                proof.proof_value = signature.to_hex();
            }
        }

        Ok(document.into_credential(proof))
    }

    fn verify(&self, credential: &Credential) -> bool {
        let result = match credential.proof.proof_type.as_str() {
            ED25519_PROOF_TYPE => Self::verify_ed25519(credential),
            EIP712_PROOF_TYPE => self.verify_eip712(credential),
            other => Err(IdentityError::CredentialVerification(format!(
                "unsupported proof type: {}",
                other
            ))),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(issuer = %credential.issuer, error = %e, "proof rejected");
                false
            }
        }
    }
}
