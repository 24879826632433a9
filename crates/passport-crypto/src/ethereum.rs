//! Ethereum address handling and EIP-191 personal message signatures.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CryptoError;
use crate::hashing::keccak256;
use crate::keys::Secp256k1KeyPair;

/// A 20-byte Ethereum address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a secp256k1 public key: the last 20 bytes of
    /// keccak256 over the uncompressed point without its 0x04 tag.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let digest = keccak256(&point.as_bytes()[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    /// Parse a `0x`-prefixed hex address.
    ///
    /// All-lowercase and all-uppercase inputs are accepted as is. Mixed-case
    /// input must carry a correct EIP-55 checksum.
    pub fn parse(input: &str) -> Result<Self, CryptoError> {
        let trimmed = input.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| CryptoError::InvalidAddress(format!("missing 0x prefix: {}", input)))?;
        if hex_part.len() != 40 {
            return Err(CryptoError::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                hex_part.len()
            )));
        }
        let decoded = hex::decode(hex_part)
            .map_err(|e| CryptoError::InvalidAddress(format!("invalid hex: {}", e)))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        let address = Self(bytes);

        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *hex_part {
            return Err(CryptoError::InvalidChecksum(input.to_string()));
        }

        Ok(address)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Lower-case `0x` hex, the form used inside DIDs.
    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl FromStr for EthAddress {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EthAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A 65-byte `r || s || v` secp256k1 signature, as produced by wallets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: EcdsaSignature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    pub(crate) fn new(signature: EcdsaSignature, recovery_id: RecoveryId) -> Self {
        Self {
            signature,
            recovery_id,
        }
    }

    /// Encode as 65 bytes with `v` in the legacy 27/28 form.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&self.signature.to_bytes());
        out[64] = 27 + self.recovery_id.to_byte();
        out
    }

    /// Decode 65 bytes. `v` may be 0/1 or 27/28.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 65 {
            return Err(CryptoError::InvalidInput(format!(
                "recoverable signature must be 65 bytes, got {}",
                bytes.len()
            )));
        }
        let v = match bytes[64] {
            v @ 27..=28 => v - 27,
            v @ 0..=1 => v,
            other => {
                return Err(CryptoError::InvalidInput(format!(
                    "invalid recovery byte: {}",
                    other
                )))
            }
        };
        let recovery_id = RecoveryId::from_byte(v)
            .ok_or_else(|| CryptoError::InvalidInput(format!("invalid recovery id: {}", v)))?;
        let signature = EcdsaSignature::from_slice(&bytes[..64])
            .map_err(|e| CryptoError::InvalidInput(format!("invalid signature: {}", e)))?;
        Ok(Self {
            signature,
            recovery_id,
        })
    }

    /// `0x`-prefixed hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let trimmed = hex_str.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(trimmed)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid signature hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Recover the signer's address from a 32-byte digest.
    pub fn recover(&self, digest: &[u8; 32]) -> Result<EthAddress, CryptoError> {
        let key = VerifyingKey::recover_from_prehash(digest, &self.signature, self.recovery_id)
            .map_err(|e| CryptoError::RecoveryError(e.to_string()))?;
        Ok(EthAddress::from_verifying_key(&key))
    }
}

/// EIP-191 hash: keccak256("\x19Ethereum Signed Message:\n" || len || message).
pub fn hash_personal_message(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Sign a message the way a wallet's `personal_sign` does.
pub fn sign_personal_message(
    keypair: &Secp256k1KeyPair,
    message: &[u8],
) -> Result<RecoverableSignature, CryptoError> {
    keypair.sign_message(message)
}

/// Recover the address that `personal_sign`ed a message.
pub fn recover_personal_signer(
    message: &[u8],
    signature: &RecoverableSignature,
) -> Result<EthAddress, CryptoError> {
    signature.recover(&hash_personal_message(message))
}
