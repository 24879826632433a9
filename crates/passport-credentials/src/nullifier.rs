//! Nullifiers: one-way, versioned hashes of a verified claim.
//!
//! The same claim always yields the same nullifier for a given secret, so the
//! scorer can detect one external account backing several wallets without
//! ever seeing the account itself.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use passport_core::{ProofRecord, Secret};
use passport_crypto::keyed_hash;

use crate::error::CredentialError;

/// Version prefix of locally derived nullifiers.
pub const LOCAL_NULLIFIER_VERSION: &str = "v0.0.0";

/// A versioned nullifier string, `<version>:<base64>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nullifier(String);

impl Nullifier {
    pub fn new(version: &str, digest: &[u8]) -> Self {
        Self(format!("{}:{}", version, STANDARD.encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The version prefix, e.g. `v0.0.0` or `v1`.
    pub fn version(&self) -> &str {
        self.0.split(':').next().unwrap_or_default()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical bytes of a proof record: its entries in key order, as a JSON
/// array of `[key, value]` pairs.
pub fn canonical_record(record: &ProofRecord) -> Result<Vec<u8>, CredentialError> {
    let pairs: Vec<(&String, &String)> = record.iter().collect();
    Ok(serde_json::to_vec(&pairs)?)
}

/// Derives the nullifier for a proof record.
#[async_trait]
pub trait NullifierGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, record: &ProofRecord) -> Result<Nullifier, CredentialError>;
}

/// Keyed Keccak-256 over the canonical record with a service-held secret.
pub struct LocalNullifier {
    secret: Secret,
}

impl LocalNullifier {
    pub fn new(secret: Secret) -> Result<Self, CredentialError> {
        if secret.is_empty() {
            return Err(CredentialError::Validation(
                "nullifier secret must not be empty".into(),
            ));
        }
        Ok(Self { secret })
    }

    /// Synchronous form of [`NullifierGenerator::generate`].
    pub fn derive(&self, record: &ProofRecord) -> Result<Nullifier, CredentialError> {
        let canonical = canonical_record(record)?;
        let digest = keyed_hash(self.secret.expose().as_bytes(), &canonical);
        Ok(Nullifier::new(LOCAL_NULLIFIER_VERSION, &digest))
    }
}

#[async_trait]
impl NullifierGenerator for LocalNullifier {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(&self, record: &ProofRecord) -> Result<Nullifier, CredentialError> {
        self.derive(record)
    }
}

/// Tries each generator in order and returns the first success.
///
/// Fails with the last generator's error when every generator fails.
pub struct CompositeNullifier {
    generators: Vec<Arc<dyn NullifierGenerator>>,
}

impl CompositeNullifier {
    pub fn new(generators: Vec<Arc<dyn NullifierGenerator>>) -> Self {
        Self { generators }
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

#[async_trait]
impl NullifierGenerator for CompositeNullifier {
    fn name(&self) -> &str {
        "composite"
    }

    async fn generate(&self, record: &ProofRecord) -> Result<Nullifier, CredentialError> {
        let mut last_error = None;
        for generator in &self.generators {
            match generator.generate(record).await {
                Ok(nullifier) => return Ok(nullifier),
                Err(e) => {
                    tracing::warn!(
                        generator = generator.name(),
                        error = %e,
                        "nullifier generator failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            CredentialError::NullifierService("no nullifier generators configured".into())
        }))
    }
}
