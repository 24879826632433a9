//! Integration test: the IAM HTTP surface end to end, driven over a real
//! socket with reqwest.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use passport_core::ProofRecord;
use passport_crypto::Secp256k1KeyPair;
use passport_iam::api::API_PREFIX;
use passport_iam::providers::{
    AllowListProvider, Provider, ProviderPayload, ProviderRegistry, ProviderVerdict,
};
use passport_identity::Credential;
use passport_integration_tests::{
    iam_state, iam_state_with, sign_challenge, spawn_iam, HASH_SECRET,
};

/// Accepts every wallet and reports the same external account for all.
struct SharedAccountProvider;

#[async_trait]
impl Provider for SharedAccountProvider {
    fn provider_type(&self) -> &str {
        "Email"
    }

    async fn verify(&self, _payload: &ProviderPayload) -> ProviderVerdict {
        let mut record = ProofRecord::new();
        record.insert("email".into(), "alice@example.com".into());
        ProviderVerdict::valid(record)
    }
}

struct Client {
    base: String,
    http: reqwest::Client,
}

impl Client {
    async fn spawn(provider_type: &str, members: &[String]) -> Self {
        Self::serve(iam_state(provider_type, members, None)).await
    }

    async fn serve(state: passport_iam::AppState) -> Self {
        Self {
            base: spawn_iam(state).await,
            http: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self
            .http
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: &Value) -> (u16, Value) {
        let resp = self
            .http
            .post(format!("{}{}{}", self.base, API_PREFIX, path))
            .json(body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn challenge(&self, address: &str, provider_type: &str) -> Credential {
        let (status, body) = self
            .post(
                "/challenge",
                &json!({ "payload": { "address": address, "type": provider_type } }),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
        serde_json::from_value(body["credential"].clone()).unwrap()
    }

    async fn verify(
        &self,
        wallet: &Secp256k1KeyPair,
        claimed: &str,
        provider_type: &str,
    ) -> (u16, Value) {
        let challenge = self.challenge(claimed, provider_type).await;
        let (message, signature) = sign_challenge(wallet, &challenge);
        self.post(
            "/verify",
            &json!({
                "challenge": challenge,
                "signedChallenge": { "message": message, "signature": signature },
                "payload": { "address": claimed, "type": provider_type, "proofs": {} },
            }),
        )
        .await
    }
}

fn member() -> (Secp256k1KeyPair, String) {
    let wallet = Secp256k1KeyPair::generate();
    let address = wallet.address().to_checksum();
    (wallet, address)
}

#[tokio::test]
async fn test_health_and_issuers() {
    let client = Client::spawn("Allow", &[]).await;

    let (status, body) = client.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    let (status, body) = client.get(&format!("{}/issuers", API_PREFIX)).await;
    assert_eq!(status, 200);
    assert!(body["default"].as_str().unwrap().starts_with("did:key:z"));
    assert!(body["eip712"].as_str().unwrap().starts_with("did:ethr:0x"));
}

#[tokio::test]
async fn test_challenge_then_verify_issues_stamp() {
    let (wallet, address) = member();
    let client = Client::spawn("Allow", &[address.clone()]).await;

    let (status, body) = client.verify(&wallet, &address, "Allow").await;
    assert_eq!(status, 200, "{}", body);

    let stamp: Credential = serde_json::from_value(body["credential"].clone()).unwrap();
    assert_eq!(stamp.credential_subject.provider, "Allow");
    assert!(stamp
        .credential_subject
        .hash
        .as_deref()
        .unwrap()
        .starts_with("v0.0.0:"));
    assert_eq!(body["record"]["address"], address);
    assert_eq!(body["record"]["type"], "Allow");

    // The issued stamp passes the service's own batch check
    let (status, body) = client
        .post("/credentials/verify", &json!({ "credentials": [stamp] }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["results"][0]["valid"], true);
}

#[tokio::test]
async fn test_same_claim_from_two_wallets_same_hash() {
    let providers = ProviderRegistry::new();
    providers.register(Arc::new(SharedAccountProvider));
    let client = Client::serve(iam_state_with(providers, None)).await;

    let (first_wallet, first) = member();
    let (second_wallet, second) = member();
    let (status, a) = client.verify(&first_wallet, &first, "Email").await;
    assert_eq!(status, 200, "{}", a);
    let (status, b) = client.verify(&second_wallet, &second, "Email").await;
    assert_eq!(status, 200, "{}", b);

    assert_eq!(
        a["credential"]["credentialSubject"]["hash"],
        b["credential"]["credentialSubject"]["hash"]
    );
    assert_ne!(
        a["credential"]["credentialSubject"]["id"],
        b["credential"]["credentialSubject"]["id"]
    );
    assert_eq!(a["record"]["address"], first);
    assert_eq!(b["record"]["address"], second);
}

#[tokio::test]
async fn test_challenge_bound_to_its_type() {
    let (wallet, address) = member();
    let providers = ProviderRegistry::new();
    for t in ["Allow", "Google"] {
        providers.register(Arc::new(
            AllowListProvider::new(t, &[address.clone()]).unwrap(),
        ));
    }
    let client = Client::serve(iam_state_with(providers, None)).await;

    let challenge = client.challenge(&address, "Google").await;
    let (message, signature) = sign_challenge(&wallet, &challenge);
    let (status, body) = client
        .post(
            "/verify",
            &json!({
                "challenge": challenge,
                "signedChallenge": { "message": message, "signature": signature },
                "payload": { "address": address, "type": "Allow" },
            }),
        )
        .await;
    assert_eq!(status, 401, "{}", body);
    assert_eq!(body["error"], "verification failed: ChallengeMismatch");

    // A bulk challenge covers both types
    for t in ["Allow", "Google"] {
        let challenge = client.challenge(&address, "bulk").await;
        let (message, signature) = sign_challenge(&wallet, &challenge);
        let (status, body) = client
            .post(
                "/verify",
                &json!({
                    "challenge": challenge,
                    "signedChallenge": { "message": message, "signature": signature },
                    "payload": { "address": address, "type": t },
                }),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
    }
}

#[tokio::test]
async fn test_challenge_without_payload_is_400() {
    let client = Client::spawn("Allow", &[]).await;
    let (status, body) = client.post("/challenge", &json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid request: missing address");
}

#[tokio::test]
async fn test_challenge_rejects_bad_address() {
    let client = Client::spawn("Allow", &[]).await;
    let (status, body) = client
        .post(
            "/challenge",
            &json!({ "payload": { "address": "0xnope", "type": "Allow" } }),
        )
        .await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_verify_rejects_address_mismatch() {
    let (wallet, _) = member();
    let (_, someone_else) = member();
    let client = Client::spawn("Allow", &[someone_else.clone()]).await;

    // Challenge issued to someone else, signed by our wallet
    let (status, body) = client.verify(&wallet, &someone_else, "Allow").await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "verification failed: ChallengeMismatch");
}

#[tokio::test]
async fn test_verify_rejects_unknown_provider() {
    let (wallet, address) = member();
    let client = Client::spawn("Allow", &[address.clone()]).await;
    let (status, body) = client.verify(&wallet, &address, "Nonexistent").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Unknown provider: Nonexistent");
}

#[tokio::test]
async fn test_verify_rejects_outsider() {
    let (_, insider) = member();
    let (outsider_wallet, outsider) = member();
    let client = Client::spawn("Allow", &[insider]).await;
    let (status, body) = client.verify(&outsider_wallet, &outsider, "Allow").await;
    assert_eq!(status, 403);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Unable to verify proofs"));
}

#[tokio::test]
async fn test_batch_verification_over_http() {
    let (wallet, address) = member();
    let client = Client::spawn("Allow", &[address.clone()]).await;
    let (_, body) = client.verify(&wallet, &address, "Allow").await;
    let good: Credential = serde_json::from_value(body["credential"].clone()).unwrap();
    let mut tampered = good.clone();
    tampered.credential_subject.provider = "Other".into();

    let (status, body) = client
        .post(
            "/credentials/verify",
            &json!({ "credentials": [good, tampered] }),
        )
        .await;
    assert_eq!(status, 200);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["valid"], true);
    assert_eq!(results[1]["valid"], false);
    assert!(results[1]["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("InvalidSignature"));
}

#[tokio::test]
async fn test_error_bodies_never_leak_hash_secret() {
    let (wallet, address) = member();
    let (_, outsider) = member();
    let client = Client::spawn("Allow", &[address.clone()]).await;

    let mut bodies = Vec::new();
    bodies.push(client.verify(&wallet, &outsider, "Allow").await.1);
    bodies.push(client.verify(&wallet, &address, "Nonexistent").await.1);
    bodies.push(
        client
            .post(
                "/challenge",
                &json!({ "payload": { "address": HASH_SECRET, "type": "Allow" } }),
            )
            .await
            .1,
    );
    for body in bodies {
        assert!(!body.to_string().contains(HASH_SECRET), "{}", body);
    }
}
