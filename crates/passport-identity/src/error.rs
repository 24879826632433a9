/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("unsupported DID method: {0}")]
    UnsupportedDidMethod(String),

    #[error("issuer key missing: {0}")]
    MissingIssuerKey(String),

    #[error("issuer key invalid: {0}")]
    InvalidIssuerKey(String),

    #[error("credential signing failed: {0}")]
    Signing(String),

    #[error("credential verification failed: {0}")]
    CredentialVerification(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] passport_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
