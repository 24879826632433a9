use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::ethereum::{hash_personal_message, EthAddress, RecoverableSignature};

pub const SECRET_KEY_LEN: usize = 32;

/// Ed25519 key of the default issuer and of the OPRF client.
/// `SigningKey` zeroizes itself on drop.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: &[u8; SECRET_KEY_LEN]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut seed = key_bytes(bytes)?;
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        Ok(kp)
    }

    /// Parse a hex seed as found in `IAM_ED25519_KEY`, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let mut bytes = decode_hex_key(hex_str)?;
        let kp = Self::from_bytes(&bytes);
        bytes.zeroize();
        kp
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// The seed, for `passport keygen` output.
    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_LEN] {
        self.signing_key.to_bytes()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

/// Ed25519 verifying key, as embedded in a `did:key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw = key_bytes(bytes)?;
        VerifyingKey::from_bytes(&raw)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(format!("not an ed25519 point: {}", e)))
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        self.0.as_bytes()
    }

    /// Hex form used as the OPRF `clientId`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }
}

/// secp256k1 key pair used for EIP-712 and EIP-191 signatures.
pub struct Secp256k1KeyPair {
    signing_key: k256::ecdsa::SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        Self {
            signing_key: k256::ecdsa::SigningKey::random(&mut OsRng),
        }
    }

    /// Create a key pair from a 32-byte secret scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        key_bytes(bytes)?;
        let signing_key = k256::ecdsa::SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid secp256k1 key: {}", e)))?;
        Ok(Self { signing_key })
    }

    /// Create a key pair from a hex-encoded secret, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let mut bytes = decode_hex_key(hex_str)?;
        let kp = Self::from_bytes(&bytes);
        bytes.zeroize();
        kp
    }

    /// The Ethereum address controlled by this key.
    pub fn address(&self) -> EthAddress {
        EthAddress::from_verifying_key(self.signing_key.verifying_key())
    }

    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_LEN] {
        self.signing_key.to_bytes().into()
    }

    /// Sign a 32-byte prehashed digest, producing an Ethereum-style
    /// recoverable signature.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::SigningError(e.to_string()))?;
        Ok(RecoverableSignature::new(signature, recovery_id))
    }

    /// EIP-191 `personal_sign` over a message.
    pub fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        self.sign_prehash(&hash_personal_message(message))
    }
}

fn key_bytes(bytes: &[u8]) -> Result<[u8; SECRET_KEY_LEN], CryptoError> {
    bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: SECRET_KEY_LEN,
        actual: bytes.len(),
    })
}

fn decode_hex_key(hex_str: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = hex_str.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(trimmed).map_err(|e| CryptoError::InvalidInput(format!("invalid hex key: {}", e)))
}
