//! Shared service state, built once at startup.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use passport_core::{Secret, SecretRedactor};
use passport_credentials::{
    CompositeNullifier, CredentialIssuer, IssuerConfig, LocalNullifier, NullifierGenerator,
    OprfConfig, OprfNullifier, Verifier,
};
use passport_crypto::KeyPair;
use passport_identity::{CredentialSigner, IssuerKeyStore, NativeSigner};

use crate::config::{IamConfig, NullifierMode};
use crate::providers::{AllowListProvider, ProviderRegistry};
use crate::scorer::ScorerClient;

pub struct AppState {
    pub keys: Arc<IssuerKeyStore>,
    pub issuer: CredentialIssuer,
    pub verifier: Verifier,
    pub nullifier: Arc<dyn NullifierGenerator>,
    pub providers: ProviderRegistry,
    pub scorer: Option<ScorerClient>,
    pub redactor: SecretRedactor,
}

impl AppState {
    /// Assemble state from already-built parts.
    pub fn new(
        keys: Arc<IssuerKeyStore>,
        issuer_config: IssuerConfig,
        nullifier: Arc<dyn NullifierGenerator>,
        providers: ProviderRegistry,
        scorer: Option<ScorerClient>,
        redactor: SecretRedactor,
    ) -> Self {
        let signer: Arc<dyn CredentialSigner> = Arc::new(NativeSigner::default());
        let issuer = CredentialIssuer::new(keys.clone(), signer.clone(), issuer_config)
            .with_redactor(redactor.clone());
        let verifier = Verifier::new(keys.clone(), signer);
        Self {
            keys,
            issuer,
            verifier,
            nullifier,
            providers,
            scorer,
            redactor,
        }
    }

    /// Build state from config, reading secrets from the environment.
    ///
    /// Missing or malformed issuer keys are fatal.
    pub fn from_config(config: &IamConfig) -> anyhow::Result<Self> {
        let mut redactor = SecretRedactor::new();

        let ed25519_hex = read_secret(&config.issuer.ed25519_key_env)?;
        let eip712_hex = read_secret(&config.issuer.eip712_key_env)?;
        redactor.add(&ed25519_hex);
        redactor.add(&eip712_hex);
        let keys = IssuerKeyStore::from_hex(ed25519_hex.expose(), eip712_hex.expose())
            .map_err(|e| anyhow::anyhow!(redactor.redact(&e.to_string())))?;

        let nullifier = build_nullifier(config, &mut redactor)?;

        let providers = ProviderRegistry::new();
        for list in &config.providers.allow_list {
            let provider = AllowListProvider::new(list.provider_type.clone(), &list.addresses)
                .with_context(|| format!("allow list for {}", list.provider_type))?;
            providers.register(Arc::new(provider));
        }

        let scorer = if config.scorer.enabled {
            let endpoint = config
                .scorer
                .endpoint
                .as_deref()
                .context("scorer.enabled is set but scorer.endpoint is missing")?;
            let api_key = read_secret(&config.scorer.api_key_env)?;
            redactor.add(&api_key);
            Some(ScorerClient::new(
                endpoint,
                api_key,
                Duration::from_millis(config.scorer.timeout_ms),
            )?)
        } else {
            None
        };

        tracing::info!(
            nullifier_mode = ?config.nullifier.mode,
            providers = providers.len(),
            scorer = scorer.is_some(),
            redacted_secrets = redactor.len(),
            "service state initialized"
        );

        Ok(Self::new(
            Arc::new(keys),
            config.issuer.issuer_config()?,
            nullifier,
            providers,
            scorer,
            redactor,
        ))
    }
}

fn build_nullifier(
    config: &IamConfig,
    redactor: &mut SecretRedactor,
) -> anyhow::Result<Arc<dyn NullifierGenerator>> {
    match config.nullifier.mode {
        NullifierMode::Local => local_nullifier(config, redactor),
        NullifierMode::Oprf => oprf_nullifier(config, redactor),
        NullifierMode::Fallback => {
            let remote = oprf_nullifier(config, redactor)?;
            let local = local_nullifier(config, redactor)?;
            Ok(Arc::new(CompositeNullifier::new(vec![remote, local])))
        }
    }
}

fn local_nullifier(
    config: &IamConfig,
    redactor: &mut SecretRedactor,
) -> anyhow::Result<Arc<dyn NullifierGenerator>> {
    let secret = read_secret(&config.nullifier.hash_secret_env)?;
    redactor.add(&secret);
    Ok(Arc::new(LocalNullifier::new(secret)?))
}

fn oprf_nullifier(
    config: &IamConfig,
    redactor: &mut SecretRedactor,
) -> anyhow::Result<Arc<dyn NullifierGenerator>> {
    let relay_url = config
        .nullifier
        .relay_url
        .clone()
        .context("nullifier.relay_url is required for OPRF mode")?;
    let client_hex = read_secret(&config.nullifier.client_key_env)?;
    redactor.add(&client_hex);
    let client_key = KeyPair::from_hex(client_hex.expose())
        .map_err(|e| anyhow::anyhow!("invalid OPRF client key: {}", e))?;
    Ok(Arc::new(OprfNullifier::new(OprfConfig {
        relay_url,
        timeout: Duration::from_millis(config.nullifier.timeout_ms),
        client_key,
    })?))
}

fn read_secret(var: &str) -> anyhow::Result<Secret> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(Secret::new(value.trim())),
        _ => anyhow::bail!("environment variable {} is not set", var),
    }
}
