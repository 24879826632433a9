//! The provider seam: something that checks an external fact for an address
//! and returns the claim fields that fact yields.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use passport_core::{ProofRecord, SignatureType, RECORD_VERSION};
use passport_crypto::{CryptoError, EthAddress};

/// The part of a verify request a provider inspects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPayload {
    pub address: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<SignatureType>,
    /// Provider-specific proof material (OAuth codes and the like).
    #[serde(default)]
    pub proofs: BTreeMap<String, String>,
}

/// A provider's decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVerdict {
    pub valid: bool,
    /// Claim fields to hash into the nullifier. Present when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ProofRecord>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ProviderVerdict {
    pub fn valid(record: ProofRecord) -> Self {
        Self {
            valid: true,
            record: Some(record),
            errors: Vec::new(),
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            record: None,
            errors: vec![error.into()],
        }
    }
}

/// Verifies one kind of external fact.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The `type` this provider answers for.
    fn provider_type(&self) -> &str;

    async fn verify(&self, payload: &ProviderPayload) -> ProviderVerdict;
}

/// Providers keyed by type.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous one of the same type.
    pub fn register(&self, provider: Arc<dyn Provider>) {
        let provider_type = provider.provider_type().to_string();
        tracing::info!(provider = %provider_type, "provider registered");
        self.providers.insert(provider_type, provider);
    }

    pub fn get(&self, provider_type: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(provider_type).map(|p| p.value().clone())
    }

    /// Registered types, sorted.
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Accepts addresses on a fixed list.
pub struct AllowListProvider {
    provider_type: String,
    addresses: HashSet<EthAddress>,
}

impl AllowListProvider {
    pub fn new(provider_type: impl Into<String>, addresses: &[String]) -> Result<Self, CryptoError> {
        let addresses = addresses
            .iter()
            .map(|a| EthAddress::parse(a))
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self {
            provider_type: provider_type.into(),
            addresses,
        })
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[async_trait]
impl Provider for AllowListProvider {
    fn provider_type(&self) -> &str {
        &self.provider_type
    }

    async fn verify(&self, payload: &ProviderPayload) -> ProviderVerdict {
        let address = match EthAddress::parse(&payload.address) {
            Ok(address) => address,
            Err(e) => return ProviderVerdict::invalid(e.to_string()),
        };
        if !self.addresses.contains(&address) {
            return ProviderVerdict::invalid(format!(
                "{} is not on the {} allow list",
                address, self.provider_type
            ));
        }

        let mut record = ProofRecord::new();
        record.insert("type".into(), self.provider_type.clone());
        record.insert("address".into(), address.to_checksum());
        record.insert("version".into(), RECORD_VERSION.into());
        ProviderVerdict::valid(record)
    }
}
