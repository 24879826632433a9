pub mod eip712;
pub mod error;
pub mod ethereum;
pub mod hashing;
pub mod keys;
pub mod signing;

pub use eip712::{Eip712Domain, TypedStruct, TypedValue};
pub use error::CryptoError;
pub use ethereum::{
    hash_personal_message, recover_personal_signer, sign_personal_message, EthAddress,
    RecoverableSignature,
};
pub use hashing::{canonical_bytes, canonical_json, keccak256, keyed_hash, Hash};
pub use keys::{KeyPair, PublicKey, Secp256k1KeyPair};
pub use signing::{sign, verify, Signature};
