//! Passport Identity Layer
//!
//! Identity primitives the credential service is built on:
//! - DID encodings (`did:key`, `did:ethr`, `did:pkh`)
//! - The Verifiable Credential document model
//! - The issuer key store holding the two trusted issuer keys
//! - The credential signer seam and its native Ed25519 / EIP-712 implementation

pub mod credentials;
pub mod did;
pub mod error;
pub mod issuer_keys;
pub mod signer;

pub use credentials::{
    format_timestamp, Credential, CredentialProof, CredentialSubject, UnsignedCredential,
    CREDENTIALS_CONTEXT,
};
pub use did::{ethr_did, key_did, parse_ethr_did, parse_key_did, pkh_address, pkh_did};
pub use error::IdentityError;
pub use issuer_keys::{IssuerKey, IssuerKeyStore};
pub use signer::{
    CredentialSigner, NativeSigner, ED25519_PROOF_TYPE, EIP712_PROOF_TYPE, PROOF_PURPOSE,
};
