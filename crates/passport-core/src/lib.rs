//! Passport Core: Shared types, errors, and the verification state machine
//! for the Passport credential service.

pub mod error;
pub mod redact;
pub mod types;
pub mod verification_state;

pub use error::CoreError;
pub use redact::{Secret, SecretRedactor};
pub use types::{ProofRecord, SignatureType, VerificationFailure, RECORD_VERSION};
pub use verification_state::{VerificationEvent, VerificationState, VerificationStateMachine};
