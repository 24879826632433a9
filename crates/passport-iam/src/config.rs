//! IAM configuration loading and management.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use passport_credentials::IssuerConfig;

/// Full configuration for the IAM service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IamConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Issuer keys and credential lifetimes.
    #[serde(default)]
    pub issuer: IssuerSection,

    /// Nullifier derivation.
    #[serde(default)]
    pub nullifier: NullifierConfig,

    /// Scorer submission.
    #[serde(default)]
    pub scorer: ScorerConfig,

    /// Built-in providers.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// Listen port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerSection {
    /// Env var holding the hex Ed25519 issuer seed.
    #[serde(default = "default_ed25519_key_env")]
    pub ed25519_key_env: String,
    /// Env var holding the hex secp256k1 EIP-712 issuer secret.
    #[serde(default = "default_eip712_key_env")]
    pub eip712_key_env: String,
    /// Challenge credential lifetime in seconds.
    #[serde(default = "default_challenge_ttl_secs")]
    pub challenge_ttl_secs: u64,
    /// Default stamp credential lifetime in days.
    #[serde(default = "default_stamp_ttl_days")]
    pub stamp_ttl_days: u64,
    /// Stamp lifetime overrides in days, keyed by provider type.
    #[serde(default)]
    pub provider_ttl_days: HashMap<String, u64>,
}

/// How nullifiers are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NullifierMode {
    /// Keyed hash with a local secret.
    #[default]
    Local,
    /// Remote OPRF relay only.
    Oprf,
    /// OPRF relay, then the local secret if the relay fails.
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullifierConfig {
    #[serde(default)]
    pub mode: NullifierMode,
    /// Env var holding the local nullifier secret.
    #[serde(default = "default_hash_secret_env")]
    pub hash_secret_env: String,
    /// OPRF relay base URL.
    #[serde(default)]
    pub relay_url: Option<String>,
    /// Env var holding the hex Ed25519 seed the OPRF client signs with.
    #[serde(default = "default_oprf_client_key_env")]
    pub client_key_env: String,
    /// Relay request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Whether issued stamps are pushed to the scorer.
    #[serde(default)]
    pub enabled: bool,
    /// Scorer base URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Env var holding the scorer bearer token.
    #[serde(default = "default_scorer_api_key_env")]
    pub api_key_env: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    /// Address allow lists, one provider each.
    #[serde(default)]
    pub allow_list: Vec<AllowListConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowListConfig {
    /// Provider type the list answers for.
    #[serde(rename = "type")]
    pub provider_type: String,
    /// Member addresses.
    #[serde(default)]
    pub addresses: Vec<String>,
}

// Default value functions
fn default_api_addr() -> String {
    "0.0.0.0".into()
}
fn default_api_port() -> u16 {
    8003
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_ed25519_key_env() -> String {
    "IAM_ED25519_KEY".into()
}
fn default_eip712_key_env() -> String {
    "IAM_EIP712_KEY".into()
}
fn default_challenge_ttl_secs() -> u64 {
    600
}
fn default_stamp_ttl_days() -> u64 {
    90
}
fn default_hash_secret_env() -> String {
    "IAM_HASH_SECRET".into()
}
fn default_oprf_client_key_env() -> String {
    "IAM_OPRF_CLIENT_KEY".into()
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_scorer_api_key_env() -> String {
    "SCORER_API_KEY".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for IssuerSection {
    fn default() -> Self {
        Self {
            ed25519_key_env: default_ed25519_key_env(),
            eip712_key_env: default_eip712_key_env(),
            challenge_ttl_secs: default_challenge_ttl_secs(),
            stamp_ttl_days: default_stamp_ttl_days(),
            provider_ttl_days: HashMap::new(),
        }
    }
}

impl Default for NullifierConfig {
    fn default() -> Self {
        Self {
            mode: NullifierMode::default(),
            hash_secret_env: default_hash_secret_env(),
            relay_url: None,
            client_key_env: default_oprf_client_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key_env: default_scorer_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Upper bound on configured credential lifetimes.
pub const MAX_TTL_DAYS: u64 = 3650;

impl IssuerSection {
    /// Credential lifetimes for the issuer. Zero or out-of-range lifetimes
    /// are rejected.
    pub fn issuer_config(&self) -> anyhow::Result<IssuerConfig> {
        let challenge_secs = bounded(
            "issuer.challenge_ttl_secs",
            self.challenge_ttl_secs,
            86_400 * MAX_TTL_DAYS,
        )?;
        let challenge_ttl = Duration::seconds(challenge_secs as i64);
        let stamp_ttl = stamp_days("issuer.stamp_ttl_days", self.stamp_ttl_days)?;
        let provider_ttls = self
            .provider_ttl_days
            .iter()
            .map(|(provider, days)| -> anyhow::Result<(String, Duration)> {
                let field = format!("issuer.provider_ttl_days.{}", provider);
                Ok((provider.clone(), stamp_days(&field, *days)?))
            })
            .collect::<anyhow::Result<_>>()?;
        Ok(IssuerConfig {
            challenge_ttl,
            stamp_ttl,
            provider_ttls,
        })
    }
}

fn bounded(field: &str, value: u64, max: u64) -> anyhow::Result<u64> {
    if value == 0 || value > max {
        anyhow::bail!("{} must be between 1 and {}, got {}", field, max, value);
    }
    Ok(value)
}

fn stamp_days(field: &str, days: u64) -> anyhow::Result<Duration> {
    bounded(field, days, MAX_TTL_DAYS).map(|d| Duration::days(d as i64))
}

impl IamConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: IamConfig = toml::from_str(&contents)?;
            config.issuer.issuer_config()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `listen_addr:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.api.listen_addr, self.api.port)
    }
}
