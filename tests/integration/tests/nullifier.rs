//! Integration test: nullifier generation and its failure modes inside the
//! IAM service.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use passport_core::{ProofRecord, Secret};
use passport_credentials::{
    canonical_record, CompositeNullifier, CredentialError, LocalNullifier, NullifierGenerator,
    OprfConfig, OprfNullifier,
};
use passport_crypto::{KeyPair, Secp256k1KeyPair};
use passport_iam::api::API_PREFIX;
use passport_integration_tests::{iam_state, sign_challenge, spawn_iam, stamp_record, HASH_SECRET};

const DEAD_RELAY: &str = "http://127.0.0.1:1";

fn dead_oprf() -> Arc<dyn NullifierGenerator> {
    Arc::new(
        OprfNullifier::new(OprfConfig {
            relay_url: DEAD_RELAY.into(),
            timeout: Duration::from_millis(500),
            client_key: KeyPair::generate(),
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_local_nullifier_tracks_identity() {
    let local = LocalNullifier::new(Secret::new(HASH_SECRET)).unwrap();
    let address = Secp256k1KeyPair::generate().address().to_checksum();

    let a = local.generate(&stamp_record("Google", &address)).await.unwrap();
    let b = local.generate(&stamp_record("Google", &address)).await.unwrap();
    let other_provider = local.generate(&stamp_record("Github", &address)).await.unwrap();
    assert_eq!(a, b);
    assert_ne!(a, other_provider);
    assert_eq!(a.version(), "v0.0.0");

    // A different secret yields an unrelated hash for the same identity
    let peppered = LocalNullifier::new(Secret::new("another-secret")).unwrap();
    let c = peppered.generate(&stamp_record("Google", &address)).await.unwrap();
    assert_ne!(a, c);
}

#[tokio::test]
async fn test_local_nullifier_ignores_insertion_order() {
    let local = LocalNullifier::new(Secret::new(HASH_SECRET)).unwrap();
    let fields = [
        ("type", "Github"),
        ("address", "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
        ("version", "0.0.0"),
        ("login", "octocat"),
    ];
    let forward: ProofRecord = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut backward = ProofRecord::new();
    for (k, v) in fields.iter().rev() {
        backward.insert(k.to_string(), v.to_string());
    }
    assert_eq!(
        local.generate(&forward).await.unwrap(),
        local.generate(&backward).await.unwrap()
    );
}

#[test]
fn test_canonical_record_is_sorted_pairs() {
    let mut record = stamp_record("Google", "0xabc");
    record.insert("email".into(), "a@b.c".into());
    let bytes = canonical_record(&record).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        value,
        json!([
            ["address", "0xabc"],
            ["email", "a@b.c"],
            ["type", "Google"],
            ["version", "0.0.0"]
        ])
    );
}

#[tokio::test]
async fn test_fallback_to_local_when_relay_is_down() {
    let secret = Secret::new(HASH_SECRET);
    let local: Arc<dyn NullifierGenerator> = Arc::new(LocalNullifier::new(secret.clone()).unwrap());
    let composite = CompositeNullifier::new(vec![dead_oprf(), local.clone()]);

    let record = stamp_record("Google", &Secp256k1KeyPair::generate().address().to_checksum());
    let fallback = composite.generate(&record).await.unwrap();
    assert_eq!(fallback, local.generate(&record).await.unwrap());
}

#[tokio::test]
async fn test_oprf_only_fails_when_relay_is_down() {
    let record = stamp_record("Google", &Secp256k1KeyPair::generate().address().to_checksum());
    let err = dead_oprf().generate(&record).await.unwrap_err();
    assert!(matches!(err, CredentialError::NullifierService(_)));
}

#[tokio::test]
async fn test_iam_reports_bad_gateway_without_relay() {
    let wallet = Secp256k1KeyPair::generate();
    let address = wallet.address().to_checksum();
    let base = spawn_iam(iam_state("Allow", &[address.clone()], Some(dead_oprf()))).await;
    let http = reqwest::Client::new();

    let body: serde_json::Value = http
        .post(format!("{}{}/challenge", base, API_PREFIX))
        .json(&json!({ "payload": { "address": address, "type": "Allow" } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let challenge: passport_identity::Credential =
        serde_json::from_value(body["credential"].clone()).unwrap();
    let (message, signature) = sign_challenge(&wallet, &challenge);

    let resp = http
        .post(format!("{}{}/verify", base, API_PREFIX))
        .json(&json!({
            "challenge": challenge,
            "signedChallenge": { "message": message, "signature": signature },
            "payload": { "address": address, "type": "Allow" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("nullifier service error"));
}
