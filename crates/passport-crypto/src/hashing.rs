use serde::Serialize;
use serde_json::Value;
use sha3::{Digest, Keccak256};

use crate::error::CryptoError;

/// Keccak-256 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using Keccak-256 (the Ethereum variant, not NIST SHA3).
pub fn hash_bytes(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Alias kept for call sites that speak Ethereum.
pub fn keccak256(data: &[u8]) -> Hash {
    hash_bytes(data)
}

/// Keyed Keccak-256: H(len(secret) || secret || data).
///
/// The length prefix keeps `(secret, data)` splits unambiguous.
pub fn keyed_hash(secret: &[u8], data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update((secret.len() as u64).to_be_bytes());
    hasher.update(secret);
    hasher.update(data);
    hasher.finalize().into()
}

/// Serialize a JSON value with object keys sorted at every depth and no
/// insignificant whitespace.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

/// Canonical JSON bytes of any serializable value.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CryptoError> {
    let value = serde_json::to_value(value)?;
    Ok(canonical_json(&value))
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(Value::String(key.clone()).to_string().as_bytes());
                out.push(b':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
    }
}
