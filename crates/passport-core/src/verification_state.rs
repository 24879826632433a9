use std::fmt;

use crate::error::CoreError;
use crate::types::VerificationFailure;

/// The states a single credential verification passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VerificationState {
    /// Credential received, nothing checked yet.
    Received,
    /// The proof verified against the issuer DID's key.
    SignatureChecked,
    /// The issuer DID is trusted.
    IssuerChecked,
    /// The credential has not expired.
    ExpiryChecked,
    /// All checks passed. Final state.
    Valid,
    /// A check failed. Final state.
    Invalid(VerificationFailure),
}

impl VerificationState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Valid | Self::Invalid(_))
    }

    /// The failure reason, if verification ended in `Invalid`.
    pub fn failure(&self) -> Option<VerificationFailure> {
        match self {
            Self::Invalid(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "Received"),
            Self::SignatureChecked => write!(f, "SignatureChecked"),
            Self::IssuerChecked => write!(f, "IssuerChecked"),
            Self::ExpiryChecked => write!(f, "ExpiryChecked"),
            Self::Valid => write!(f, "Valid"),
            Self::Invalid(reason) => write!(f, "Invalid({})", reason),
        }
    }
}

/// Events produced by each verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationEvent {
    /// The signature check passed.
    SignatureVerified,
    /// The issuer check passed.
    IssuerTrusted,
    /// The expiry check passed.
    NotExpired,
    /// All checks are done; accept the credential.
    Accept,
    /// A check failed.
    Reject(VerificationFailure),
}

/// Drives a credential verification through its fixed check order.
///
/// Valid transitions:
/// - Received → SignatureChecked (SignatureVerified)
/// - SignatureChecked → IssuerChecked (IssuerTrusted)
/// - IssuerChecked → ExpiryChecked (NotExpired)
/// - ExpiryChecked → Valid (Accept)
/// - any non-final state → Invalid(reason) (Reject)
pub struct VerificationStateMachine;

impl VerificationStateMachine {
    /// Attempt a state transition based on an event.
    pub fn transition(
        current: VerificationState,
        event: VerificationEvent,
    ) -> Result<VerificationState, CoreError> {
        let new_state = match (current, event) {
            (VerificationState::Received, VerificationEvent::SignatureVerified) => {
                VerificationState::SignatureChecked
            }
            (VerificationState::SignatureChecked, VerificationEvent::IssuerTrusted) => {
                VerificationState::IssuerChecked
            }
            (VerificationState::IssuerChecked, VerificationEvent::NotExpired) => {
                VerificationState::ExpiryChecked
            }
            (VerificationState::ExpiryChecked, VerificationEvent::Accept) => {
                VerificationState::Valid
            }
            (state, VerificationEvent::Reject(reason)) if !state.is_final() => {
                VerificationState::Invalid(reason)
            }

            _ => {
                let target = match event {
                    VerificationEvent::SignatureVerified => VerificationState::SignatureChecked,
                    VerificationEvent::IssuerTrusted => VerificationState::IssuerChecked,
                    VerificationEvent::NotExpired => VerificationState::ExpiryChecked,
                    VerificationEvent::Accept => VerificationState::Valid,
                    VerificationEvent::Reject(reason) => VerificationState::Invalid(reason),
                };
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::trace!(
            from = %current,
            to = %new_state,
            event = ?event,
            "verification state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: VerificationState, event: VerificationEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
