//! Detached Ed25519 signatures, as carried in `Ed25519Signature2018` proofs
//! and OPRF evaluation requests.

use ed25519_dalek::{Signer, Verifier};
use std::fmt;

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!(
                "ed25519 signature is {} bytes, expected {}",
                bytes.len(),
                SIGNATURE_LEN
            ))
        })?;
        Ok(Self(ed25519_dalek::Signature::from_bytes(&raw)))
    }

    /// Lower-case hex, no prefix. This is the `proofValue` encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse hex, with or without a `0x` prefix.
    pub fn from_hex(value: &str) -> Result<Self, CryptoError> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let bytes = hex::decode(digits)
            .map_err(|e| CryptoError::InvalidInput(format!("signature is not hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Sign `message` with `keypair`. Ed25519 is deterministic, so the same
/// payload and key always produce the same signature.
pub fn sign(message: &[u8], keypair: &KeyPair) -> Signature {
    Signature(keypair.signing_key().sign(message))
}

pub fn verify(message: &[u8], signature: &Signature, public_key: &PublicKey) -> Result<(), CryptoError> {
    public_key
        .verifying_key()
        .verify(message, &signature.0)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}
