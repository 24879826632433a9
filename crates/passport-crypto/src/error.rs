/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("signing failed: {0}")]
    SigningError(String),

    #[error("public key recovery failed: {0}")]
    RecoveryError(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("address checksum mismatch: {0}")]
    InvalidChecksum(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
