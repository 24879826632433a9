//! Integration test: challenge → signature → stamp → verification, across
//! passport-credentials, passport-identity and passport-crypto.

use chrono::Duration;

use passport_core::{Secret, SignatureType, VerificationFailure, VerificationState};
use passport_credentials::{
    build_challenge_record, ChallengePayload, CredentialError, IssuerConfig, LocalNullifier,
    Nullifier, NullifierGenerator,
};
use passport_crypto::Secp256k1KeyPair;
use passport_identity::Credential;
use passport_integration_tests::{sign_challenge, stamp_record, TestService};

// =========================================================================
// Full lifecycle
// =========================================================================

#[tokio::test]
async fn test_full_stamp_lifecycle() {
    let service = TestService::new();
    let wallet = Secp256k1KeyPair::generate();
    let address = wallet.address().to_checksum();

    // 1. Challenge
    let record = build_challenge_record(&ChallengePayload {
        address: address.to_lowercase(),
        provider_type: "Google".into(),
        signature_type: None,
    })
    .expect("challenge record");
    let challenge = service
        .issuer
        .issue_challenge_credential(&record)
        .expect("challenge credential");

    // 2. Wallet signs the challenge text; service recovers the address
    let (message, signature) = sign_challenge(&wallet, &challenge);
    let recovered = service
        .verifier
        .verify_challenge_and_get_address(&challenge, &message, &signature)
        .expect("challenge verifies");
    assert_eq!(recovered.to_checksum(), address);

    // 3. Provider record → nullifier → stamp
    let proof_record = stamp_record("Google", &address);
    let nullifier = LocalNullifier::new(Secret::new("pepper"))
        .unwrap()
        .generate(&proof_record)
        .await
        .unwrap();
    let issued = service
        .issuer
        .issue_hashed_credential(&proof_record, &nullifier, SignatureType::Ed25519)
        .expect("stamp");

    // 4. Stamp verifies and carries only the hash
    let result = service.verifier.verify_credential(&issued.credential);
    assert!(result.valid, "{:?}", result.errors);
    assert_eq!(result.state, VerificationState::Valid);
    let subject = &issued.credential.credential_subject;
    assert_eq!(subject.hash.as_deref(), Some(nullifier.as_str()));
    assert_eq!(
        subject.id,
        format!("did:pkh:eip155:1:{}", address.to_lowercase())
    );
    let json = serde_json::to_string(&issued.credential).unwrap();
    assert!(!json.contains("\"address\""));
}

#[test]
fn test_both_signature_types_issue_and_verify() {
    let service = TestService::new();
    let wallet = Secp256k1KeyPair::generate();
    let address = wallet.address().to_checksum();

    for signature_type in [SignatureType::Ed25519, SignatureType::Eip712] {
        let record = build_challenge_record(&ChallengePayload {
            address: address.clone(),
            provider_type: "bulk".into(),
            signature_type: Some(signature_type),
        })
        .unwrap();
        let challenge = service.issuer.issue_challenge_credential(&record).unwrap();
        assert_eq!(
            challenge.issuer,
            service.keys.issuer_did(signature_type),
            "issuer follows signature type"
        );
        assert!(service.verifier.verify_credential(&challenge).valid);

        let stamp = service
            .issuer
            .issue_hashed_credential(
                &stamp_record("Github", &address),
                &Nullifier::new("v0.0.0", b"h"),
                signature_type,
            )
            .unwrap();
        assert!(service.verifier.verify_credential(&stamp.credential).valid);
    }
}

// =========================================================================
// Expiry
// =========================================================================

#[test]
fn test_credentials_expire() {
    let service = TestService::new();
    let address = Secp256k1KeyPair::generate().address().to_checksum();
    let record = build_challenge_record(&ChallengePayload {
        address: address.clone(),
        provider_type: "Google".into(),
        signature_type: None,
    })
    .unwrap();
    let challenge = service.issuer.issue_challenge_credential(&record).unwrap();
    let stamp = service
        .issuer
        .issue_hashed_credential(
            &stamp_record("Google", &address),
            &Nullifier::new("v0.0.0", b"h"),
            SignatureType::Ed25519,
        )
        .unwrap()
        .credential;

    for vc in [&challenge, &stamp] {
        let late = service
            .verifier
            .verify_credential_at(vc, vc.expiration_date + Duration::seconds(1));
        assert!(!late.valid);
        assert_eq!(late.reason, Some(VerificationFailure::Expired));
        assert!(late.errors[0].starts_with("Expired: "));
    }
}

#[test]
fn test_custom_lifetimes() {
    let mut config = IssuerConfig {
        challenge_ttl: Duration::minutes(1),
        ..IssuerConfig::default()
    };
    config.provider_ttls.insert("Short".into(), Duration::days(1));
    let service = TestService::with_config(config);
    let address = Secp256k1KeyPair::generate().address().to_checksum();

    let stamp = service
        .issuer
        .issue_hashed_credential(
            &stamp_record("Short", &address),
            &Nullifier::new("v0.0.0", b"h"),
            SignatureType::Ed25519,
        )
        .unwrap()
        .credential;
    let after_a_day = stamp.issuance_date + Duration::days(1);
    assert!(!service.verifier.verify_credential_at(&stamp, after_a_day).valid);
    assert!(service
        .verifier
        .verify_credential_at(&stamp, after_a_day - Duration::seconds(1))
        .valid);
}

// =========================================================================
// Trust boundary
// =========================================================================

#[test]
fn test_only_two_trusted_issuers() {
    let ours = TestService::new();
    let theirs = TestService::new();
    let address = Secp256k1KeyPair::generate().address().to_checksum();

    let [a, b] = ours.keys.trusted_issuers();
    assert!(ours.keys.has_valid_issuer(a));
    assert!(ours.keys.has_valid_issuer(b));
    for did in theirs.keys.trusted_issuers() {
        assert!(!ours.keys.has_valid_issuer(did));
    }

    let foreign = theirs
        .issuer
        .issue_hashed_credential(
            &stamp_record("Google", &address),
            &Nullifier::new("v0.0.0", b"h"),
            SignatureType::Eip712,
        )
        .unwrap()
        .credential;
    assert!(theirs.verifier.verify_credential(&foreign).valid);
    let result = ours.verifier.verify_credential(&foreign);
    assert_eq!(result.reason, Some(VerificationFailure::UntrustedIssuer));
}

#[test]
fn test_tampering_any_subject_field_fails() {
    let service = TestService::new();
    let wallet = Secp256k1KeyPair::generate();
    let address = wallet.address().to_checksum();

    for signature_type in [SignatureType::Ed25519, SignatureType::Eip712] {
        let record = build_challenge_record(&ChallengePayload {
            address: address.clone(),
            provider_type: "Google".into(),
            signature_type: Some(signature_type),
        })
        .unwrap();
        let challenge = service.issuer.issue_challenge_credential(&record).unwrap();

        let mut edits: Vec<Box<dyn Fn(&mut Credential)>> = Vec::new();
        edits.push(Box::new(|c: &mut Credential| c.credential_subject.id.push('0')));
        edits.push(Box::new(|c: &mut Credential| c.credential_subject.provider = "challenge-Other".into()));
        edits.push(Box::new(|c: &mut Credential| c.credential_subject.challenge = Some("forged".into())));
        edits.push(Box::new(|c: &mut Credential| c.credential_subject.address = None));
        edits.push(Box::new(|c: &mut Credential| c.credential_subject.hash = Some("v0.0.0:eA==".into())));

        for edit in &edits {
            let mut tampered = challenge.clone();
            edit(&mut tampered);
            let result = service.verifier.verify_credential(&tampered);
            assert_eq!(
                result.reason,
                Some(VerificationFailure::InvalidSignature),
                "{} tamper should break the proof",
                signature_type
            );
        }
    }
}

#[test]
fn test_challenge_replayed_by_another_wallet() {
    let service = TestService::new();
    let victim = Secp256k1KeyPair::generate();
    let attacker = Secp256k1KeyPair::generate();

    let record = build_challenge_record(&ChallengePayload {
        address: victim.address().to_checksum(),
        provider_type: "Google".into(),
        signature_type: None,
    })
    .unwrap();
    let challenge = service.issuer.issue_challenge_credential(&record).unwrap();
    let (message, signature) = sign_challenge(&attacker, &challenge);

    let err = service
        .verifier
        .verify_challenge_and_get_address(&challenge, &message, &signature)
        .unwrap_err();
    assert!(matches!(
        err,
        CredentialError::Verification(VerificationFailure::ChallengeMismatch)
    ));
}

#[test]
fn test_batch_verification_continues() {
    let service = TestService::new();
    let address = Secp256k1KeyPair::generate().address().to_checksum();
    let good = service
        .issuer
        .issue_hashed_credential(
            &stamp_record("Google", &address),
            &Nullifier::new("v0.0.0", b"h"),
            SignatureType::Ed25519,
        )
        .unwrap()
        .credential;
    let mut tampered = good.clone();
    tampered.credential_subject.provider = "Twitter".into();

    let results = service
        .verifier
        .verify_credentials(&[tampered, good.clone(), good]);
    assert_eq!(results.len(), 3);
    assert!(!results[0].valid);
    assert!(results[1].valid && results[2].valid);
}
