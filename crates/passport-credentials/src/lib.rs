//! Passport Credentials: challenge builder, credential issuer, verifier and
//! nullifier generators.

pub mod challenge;
pub mod error;
pub mod issuer;
pub mod nullifier;
pub mod oprf;
pub mod verifier;

pub use challenge::{
    build_challenge_record, challenge_covers, challenge_provider, challenge_text, ChallengePayload,
    ChallengeRecord, BULK_CHALLENGE_TYPE,
};
pub use error::CredentialError;
pub use issuer::{CredentialIssuer, IssuedCredential, IssuerConfig};
pub use nullifier::{
    canonical_record, CompositeNullifier, LocalNullifier, Nullifier, NullifierGenerator,
};
pub use oprf::{OprfConfig, OprfNullifier};
pub use verifier::{VerificationResult, Verifier};
