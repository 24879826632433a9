//! HTTP API server for the IAM service.
//!
//! Challenge issuance, the verify-and-issue flow for stamps, and batch
//! credential verification.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use passport_core::{ProofRecord, SignatureType, VerificationFailure, RECORD_VERSION};
use passport_credentials::{
    build_challenge_record, challenge_covers, ChallengePayload, ChallengeRecord, CredentialError,
    IssuedCredential, VerificationResult,
};
use passport_crypto::EthAddress;
use passport_identity::Credential;

use crate::providers::ProviderPayload;
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v0.0.0";

// --- Request / response types ---

/// A missing `payload` deserializes as empty and fails validation with 400.
#[derive(Debug, Default, Deserialize)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub payload: ChallengePayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub credential: Credential,
    pub record: ChallengeRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedChallenge {
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub challenge: Credential,
    pub signed_challenge: SignedChallenge,
    pub payload: ProviderPayload,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCredentialsRequest {
    pub credentials: Vec<Credential>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyCredentialsResponse {
    pub results: Vec<VerificationResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssuersResponse {
    pub default: String,
    pub eip712: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// --- Handlers ---

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

pub async fn handle_issuers(State(state): State<Arc<AppState>>) -> Json<IssuersResponse> {
    Json(IssuersResponse {
        default: state.keys.issuer_did(SignatureType::Ed25519).to_string(),
        eip712: state.keys.issuer_did(SignatureType::Eip712).to_string(),
    })
}

pub async fn handle_challenge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let record =
        build_challenge_record(&req.payload).map_err(|e| credential_error(&state, e))?;
    let credential = state
        .issuer
        .issue_challenge_credential(&record)
        .map_err(|e| credential_error(&state, e))?;
    Ok(Json(ChallengeResponse { credential, record }))
}

pub async fn handle_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<IssuedCredential>, ApiError> {
    let span = tracing::info_span!(
        "verify",
        request_id = %Uuid::now_v7(),
        provider = %req.payload.provider_type
    );
    verify_and_issue(state, req).instrument(span).await
}

pub async fn handle_verify_credentials(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyCredentialsRequest>,
) -> Json<VerifyCredentialsResponse> {
    Json(VerifyCredentialsResponse {
        results: state.verifier.verify_credentials(&req.credentials),
    })
}

async fn verify_and_issue(
    state: Arc<AppState>,
    req: VerifyRequest,
) -> Result<Json<IssuedCredential>, ApiError> {
    let signer = state
        .verifier
        .verify_challenge_and_get_address(
            &req.challenge,
            &req.signed_challenge.message,
            &req.signed_challenge.signature,
        )
        .map_err(|e| credential_error(&state, e))?;

    let requested = EthAddress::parse(&req.payload.address)
        .map_err(|e| error(&state, StatusCode::BAD_REQUEST, e))?;
    if requested != signer {
        tracing::warn!(%signer, %requested, "challenge signer does not match payload address");
        return Err(error(
            &state,
            StatusCode::UNAUTHORIZED,
            "Invalid challenge signature: address mismatch",
        ));
    }

    let provider_type = req.payload.provider_type.as_str();
    if !challenge_covers(&req.challenge.credential_subject.provider, provider_type) {
        tracing::warn!(
            challenge = %req.challenge.credential_subject.provider,
            "challenge was issued for another provider type"
        );
        return Err(credential_error(
            &state,
            CredentialError::Verification(VerificationFailure::ChallengeMismatch),
        ));
    }

    let provider = state.providers.get(provider_type).ok_or_else(|| {
        error(
            &state,
            StatusCode::BAD_REQUEST,
            format!("Unknown provider: {}", provider_type),
        )
    })?;

    let verdict = provider.verify(&req.payload).await;
    if !verdict.valid {
        tracing::info!(errors = ?verdict.errors, "provider rejected claim");
        return Err(error(
            &state,
            StatusCode::FORBIDDEN,
            format!("Unable to verify proofs: {}", verdict.errors.join("; ")),
        ));
    }

    let hashed = hashed_record(verdict.record.unwrap_or_default(), provider_type);
    let hash = state
        .nullifier
        .generate(&hashed)
        .await
        .map_err(|e| credential_error(&state, e))?;
    let record = stamp_record(hashed, &signer);

    let issued = state
        .issuer
        .issue_hashed_credential(
            &record,
            &hash,
            req.payload.signature_type.unwrap_or_default(),
        )
        .map_err(|e| credential_error(&state, e))?;

    if let Some(scorer) = &state.scorer {
        if let Err(e) = scorer
            .submit_stamp(&signer.to_checksum(), provider_type, &issued.credential)
            .await
        {
            tracing::warn!(error = %state.redactor.redact(&e.to_string()), "scorer submission failed");
        }
    }

    Ok(Json(issued))
}

/// The record the nullifier is derived from: the provider's claim fields
/// plus `type` and `version`. The requesting wallet is not part of it, so
/// one claim backing several wallets yields one hash.
fn hashed_record(mut record: ProofRecord, provider_type: &str) -> ProofRecord {
    record.insert("type".into(), provider_type.to_string());
    record
        .entry("version".into())
        .or_insert_with(|| RECORD_VERSION.to_string());
    record
}

/// The record returned with the stamp: the hashed record bound to the
/// verified signer.
fn stamp_record(mut hashed: ProofRecord, address: &EthAddress) -> ProofRecord {
    hashed.insert("address".into(), address.to_checksum());
    hashed
}

fn error(state: &AppState, status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    let message = state.redactor.redact(&message.to_string());
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), error = %message, "request failed");
    } else {
        tracing::debug!(status = status.as_u16(), error = %message, "request rejected");
    }
    (status, Json(ErrorResponse { error: message }))
}

fn credential_error(state: &AppState, e: CredentialError) -> ApiError {
    let status = match &e {
        CredentialError::Validation(_) => StatusCode::BAD_REQUEST,
        CredentialError::Verification(_) => StatusCode::UNAUTHORIZED,
        CredentialError::NullifierService(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error(state, status, e)
}

// --- Server ---

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route(&format!("{}/issuers", API_PREFIX), get(handle_issuers))
        .route(&format!("{}/challenge", API_PREFIX), post(handle_challenge))
        .route(&format!("{}/verify", API_PREFIX), post(handle_verify))
        .route(
            &format!("{}/credentials/verify", API_PREFIX),
            post(handle_verify_credentials),
        )
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
