use crate::verification_state::VerificationState;

/// Core errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: VerificationState,
        to: VerificationState,
    },

    #[error("unknown signature type: {0}")]
    UnknownSignatureType(String),
}
