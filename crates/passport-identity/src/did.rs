//! DID encodings used by the credential service.
//!
//! - `did:key:z6Mk…` for Ed25519 issuers (multicodec `0xed01`, base58btc)
//! - `did:ethr:0x…` for secp256k1 issuers
//! - `did:pkh:eip155:<chain>:0x…` for credential subjects

use passport_crypto::{EthAddress, PublicKey};

use crate::error::IdentityError;

/// Multicodec prefix for an Ed25519 public key.
const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Chain id used when building subject DIDs.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Drop a `#fragment` from a DID URL.
pub fn strip_fragment(did: &str) -> &str {
    did.split('#').next().unwrap_or(did)
}

/// Encode an Ed25519 public key as `did:key`.
pub fn key_did(public_key: &PublicKey) -> String {
    let mut bytes = Vec::with_capacity(34);
    bytes.extend_from_slice(&ED25519_MULTICODEC);
    bytes.extend_from_slice(public_key.as_bytes());
    format!("did:key:z{}", bs58::encode(bytes).into_string())
}

/// Decode the Ed25519 public key behind a `did:key` (fragment allowed).
pub fn parse_key_did(did: &str) -> Result<PublicKey, IdentityError> {
    let did = strip_fragment(did);
    let encoded = did
        .strip_prefix("did:key:z")
        .ok_or_else(|| IdentityError::InvalidDid(format!("not a base58 did:key: {}", did)))?;
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| IdentityError::InvalidDid(format!("invalid base58 in {}: {}", did, e)))?;
    if bytes.len() != 34 || bytes[..2] != ED25519_MULTICODEC {
        return Err(IdentityError::UnsupportedDidMethod(format!(
            "did:key is not an Ed25519 key: {}",
            did
        )));
    }
    Ok(PublicKey::from_bytes(&bytes[2..])?)
}

/// Encode an Ethereum address as `did:ethr`.
pub fn ethr_did(address: &EthAddress) -> String {
    format!("did:ethr:{}", address.to_lower_hex())
}

/// Decode the address behind a `did:ethr`, with or without a network segment.
pub fn parse_ethr_did(did: &str) -> Result<EthAddress, IdentityError> {
    let did = strip_fragment(did);
    let rest = did
        .strip_prefix("did:ethr:")
        .ok_or_else(|| IdentityError::InvalidDid(format!("not a did:ethr: {}", did)))?;
    let address = rest.rsplit(':').next().unwrap_or(rest);
    Ok(EthAddress::parse(address)?)
}

/// Subject DID for an Ethereum account on mainnet.
pub fn pkh_did(address: &EthAddress) -> String {
    format!(
        "did:pkh:eip155:{}:{}",
        MAINNET_CHAIN_ID,
        address.to_lower_hex()
    )
}

/// Extract the account address from a `did:pkh:eip155:<chain>:<address>`.
///
/// Any numeric chain id is accepted; only the address is significant.
pub fn pkh_address(did: &str) -> Result<EthAddress, IdentityError> {
    let parts: Vec<&str> = did.split(':').collect();
    match parts.as_slice() {
        ["did", "pkh", "eip155", chain, address] => {
            if chain.is_empty() || !chain.chars().all(|c| c.is_ascii_digit()) {
                return Err(IdentityError::InvalidDid(format!(
                    "invalid chain id in {}",
                    did
                )));
            }
            Ok(EthAddress::parse(address)?)
        }
        _ => Err(IdentityError::InvalidDid(format!(
            "expected did:pkh:eip155:<chain>:<address>, got {}",
            did
        ))),
    }
}
