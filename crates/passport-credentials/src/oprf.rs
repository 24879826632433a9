//! Remote nullifier derivation through an oblivious PRF relay.
//!
//! 2HashDH over ristretto255: the client hashes the canonical record to a
//! point `P`, sends `r·P` for a fresh scalar `r`, receives `k·r·P` from the
//! relay and unblinds it to `k·P`. The relay never sees the claim and the
//! client never sees `k`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use tokio::sync::OnceCell;

use passport_core::ProofRecord;
use passport_crypto::{keccak256, sign, KeyPair};

use crate::error::CredentialError;
use crate::nullifier::{canonical_record, Nullifier, NullifierGenerator};

/// Version prefix of OPRF-derived nullifiers.
pub const OPRF_NULLIFIER_VERSION: &str = "v1";

/// The only group the client speaks.
pub const OPRF_CURVE_ID: &str = "ristretto255";

const HASH_TO_GROUP_DST: &[u8] = b"passport-oprf-2hashdh-v1";

/// What the relay reports about itself at `GET /oprf/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayInfo {
    pub curve_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// Body of `POST /oprf/evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub curve_id: String,
    /// Hex Ed25519 public key of the client.
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// Base64 compressed blinded point.
    pub blinded: String,
    /// Hex Ed25519 signature over the compressed blinded point.
    pub signature: String,
}

/// Reply of `POST /oprf/evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    /// Base64 compressed evaluated point.
    pub evaluated: String,
}

/// OPRF client settings.
pub struct OprfConfig {
    pub relay_url: String,
    pub timeout: Duration,
    pub client_key: KeyPair,
}

/// Nullifier generator backed by a remote OPRF relay.
pub struct OprfNullifier {
    relay_url: String,
    client_key: KeyPair,
    http: reqwest::Client,
    info: OnceCell<RelayInfo>,
}

impl OprfNullifier {
    pub fn new(config: OprfConfig) -> Result<Self, CredentialError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CredentialError::NullifierService(e.to_string()))?;
        Ok(Self {
            relay_url: config.relay_url.trim_end_matches('/').to_string(),
            client_key: config.client_key,
            http,
            info: OnceCell::new(),
        })
    }

    /// Relay info, fetched on first use. Concurrent first callers share one
    /// fetch; a failed fetch leaves the cell empty for the next call.
    pub async fn relay_info(&self) -> Result<&RelayInfo, CredentialError> {
        self.info.get_or_try_init(|| self.fetch_info()).await
    }

    async fn fetch_info(&self) -> Result<RelayInfo, CredentialError> {
        let url = format!("{}/oprf/info", self.relay_url);
        let resp = self.http.get(&url).send().await.map_err(service_error)?;
        if !resp.status().is_success() {
            return Err(CredentialError::NullifierService(format!(
                "relay info returned {}",
                resp.status()
            )));
        }
        let info: RelayInfo = resp.json().await.map_err(service_error)?;
        if info.curve_id != OPRF_CURVE_ID {
            return Err(CredentialError::NullifierService(format!(
                "unsupported relay curve: {}",
                info.curve_id
            )));
        }
        tracing::info!(relay = %self.relay_url, key_id = ?info.key_id, "OPRF relay initialized");
        Ok(info)
    }

    async fn evaluate(
        &self,
        info: &RelayInfo,
        blinded: &RistrettoPoint,
    ) -> Result<RistrettoPoint, CredentialError> {
        let blinded_bytes = blinded.compress().to_bytes();
        let request = EvaluateRequest {
            curve_id: info.curve_id.clone(),
            client_id: self.client_key.public_key().to_hex(),
            key_id: info.key_id.clone(),
            blinded: STANDARD.encode(blinded_bytes),
            signature: sign(&blinded_bytes, &self.client_key).to_hex(),
        };

        let url = format!("{}/oprf/evaluate", self.relay_url);
        let resp = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(service_error)?;
        if !resp.status().is_success() {
            return Err(CredentialError::NullifierService(format!(
                "relay evaluate returned {}",
                resp.status()
            )));
        }
        let body: EvaluateResponse = resp.json().await.map_err(service_error)?;
        decode_point(&body.evaluated)
    }
}

#[async_trait]
impl NullifierGenerator for OprfNullifier {
    fn name(&self) -> &str {
        "oprf"
    }

    async fn generate(&self, record: &ProofRecord) -> Result<Nullifier, CredentialError> {
        let info = self.relay_info().await?;
        let canonical = canonical_record(record)?;

        let point = hash_to_group(&canonical);
        let blind = Scalar::random(&mut OsRng);
        let evaluated = self.evaluate(info, &(blind * point)).await?;
        let unblinded = blind.invert() * evaluated;

        let mut data = canonical;
        data.extend_from_slice(unblinded.compress().as_bytes());
        Ok(Nullifier::new(OPRF_NULLIFIER_VERSION, &keccak256(&data)))
    }
}

/// First hash of 2HashDH: canonical bytes to a group element.
pub fn hash_to_group(input: &[u8]) -> RistrettoPoint {
    let mut data = Vec::with_capacity(HASH_TO_GROUP_DST.len() + input.len());
    data.extend_from_slice(HASH_TO_GROUP_DST);
    data.extend_from_slice(input);
    RistrettoPoint::hash_from_bytes::<Sha512>(&data)
}

fn decode_point(encoded: &str) -> Result<RistrettoPoint, CredentialError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| CredentialError::NullifierService(format!("invalid point encoding: {}", e)))?;
    CompressedRistretto::from_slice(&bytes)
        .ok()
        .and_then(|c| c.decompress())
        .ok_or_else(|| CredentialError::NullifierService("relay returned an invalid point".into()))
}

fn service_error(e: reqwest::Error) -> CredentialError {
    if e.is_timeout() {
        CredentialError::NullifierService("relay request timed out".into())
    } else {
        CredentialError::NullifierService(e.to_string())
    }
}
