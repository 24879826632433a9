use passport_core::VerificationFailure;

/// Credential system errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("credential signing failed: {0}")]
    Signing(String),

    #[error("verification failed: {0}")]
    Verification(VerificationFailure),

    #[error("nullifier service error: {0}")]
    NullifierService(String),

    #[error("core error: {0}")]
    Core(#[from] passport_core::CoreError),

    #[error("identity error: {0}")]
    Identity(#[from] passport_identity::IdentityError),

    #[error("crypto error: {0}")]
    Crypto(#[from] passport_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
