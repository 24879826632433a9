//! Shared fixtures for the cross-crate tests.

use std::sync::Arc;

use passport_core::{ProofRecord, Secret, SecretRedactor, RECORD_VERSION};
use passport_credentials::{
    CredentialIssuer, IssuerConfig, LocalNullifier, NullifierGenerator, Verifier,
};
use passport_crypto::{sign_personal_message, Secp256k1KeyPair};
use passport_iam::providers::{AllowListProvider, ProviderRegistry};
use passport_iam::AppState;
use passport_identity::{Credential, CredentialSigner, IssuerKeyStore, NativeSigner};

pub const HASH_SECRET: &str = "integration-hash-secret";

/// Issuer and verifier sharing one key store.
pub struct TestService {
    pub keys: Arc<IssuerKeyStore>,
    pub issuer: CredentialIssuer,
    pub verifier: Verifier,
}

impl TestService {
    pub fn new() -> Self {
        Self::with_config(IssuerConfig::default())
    }

    pub fn with_config(config: IssuerConfig) -> Self {
        let keys = Arc::new(IssuerKeyStore::generate());
        let signer: Arc<dyn CredentialSigner> = Arc::new(NativeSigner::default());
        Self {
            issuer: CredentialIssuer::new(keys.clone(), signer.clone(), config),
            verifier: Verifier::new(keys.clone(), signer),
            keys,
        }
    }
}

impl Default for TestService {
    fn default() -> Self {
        Self::new()
    }
}

/// `personal_sign` the challenge text of `challenge` with `wallet`.
/// Returns `(message, signature)`.
pub fn sign_challenge(wallet: &Secp256k1KeyPair, challenge: &Credential) -> (String, String) {
    let message = challenge
        .credential_subject
        .challenge
        .clone()
        .unwrap_or_default();
    let signature = sign_personal_message(wallet, message.as_bytes())
        .expect("personal_sign")
        .to_hex();
    (message, signature)
}

/// The record a provider yields for `address`.
pub fn stamp_record(provider_type: &str, address: &str) -> ProofRecord {
    let mut record = ProofRecord::new();
    record.insert("type".into(), provider_type.into());
    record.insert("address".into(), address.into());
    record.insert("version".into(), RECORD_VERSION.into());
    record
}

/// IAM state with a local nullifier and one allow-list provider.
pub fn iam_state(
    provider_type: &str,
    members: &[String],
    nullifier: Option<Arc<dyn NullifierGenerator>>,
) -> AppState {
    let providers = ProviderRegistry::new();
    let provider = AllowListProvider::new(provider_type, members).expect("valid allow list");
    providers.register(Arc::new(provider));
    iam_state_with(providers, nullifier)
}

/// IAM state over the given providers. Without an explicit nullifier a
/// local one keyed with [`HASH_SECRET`] is used.
pub fn iam_state_with(
    providers: ProviderRegistry,
    nullifier: Option<Arc<dyn NullifierGenerator>>,
) -> AppState {
    let secret = Secret::new(HASH_SECRET);
    let redactor = SecretRedactor::new().with(&secret);
    let nullifier = match nullifier {
        Some(n) => n,
        None => Arc::new(LocalNullifier::new(secret).expect("non-empty secret")),
    };
    AppState::new(
        Arc::new(IssuerKeyStore::generate()),
        IssuerConfig::default(),
        nullifier,
        providers,
        None,
        redactor,
    )
}

/// Serve the IAM router on an ephemeral port. Returns its base URL.
pub async fn spawn_iam(state: AppState) -> String {
    let app = passport_iam::build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "test IAM server stopped");
        }
    });
    format!("http://{}", addr)
}
