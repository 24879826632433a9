//! `passport challenge`: Request a challenge credential.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use passport_core::SignatureType;

use super::{bail_on_error, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct ChallengeArgs {
    /// Address to challenge.
    #[arg(short, long)]
    pub address: String,

    /// Provider type (e.g. Google, or `bulk` for all stamps).
    #[arg(short = 't', long = "type")]
    pub provider_type: String,

    /// Issuer key to sign with (Ed25519 or EIP712).
    #[arg(short, long)]
    pub signature_type: Option<SignatureType>,

    /// Write the response JSON to this file.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// IAM endpoint.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    address: &'a str,
    #[serde(rename = "type")]
    provider_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature_type: Option<SignatureType>,
}

#[derive(Serialize)]
struct ChallengeRequest<'a> {
    payload: Payload<'a>,
}

pub async fn run(args: &ChallengeArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v0.0.0/challenge", args.endpoint);
    let body = ChallengeRequest {
        payload: Payload {
            address: &args.address,
            provider_type: &args.provider_type,
            signature_type: args.signature_type,
        },
    };

    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&body).send().await;

    match resp {
        Ok(r) => {
            let data: serde_json::Value = bail_on_error("challenge", r).await?.json().await?;
            let challenge = data["credential"]["credentialSubject"]["challenge"]
                .as_str()
                .unwrap_or_default();
            println!("Challenge issued!");
            println!("  Issuer:   {}", data["credential"]["issuer"].as_str().unwrap_or_default());
            println!("  Expires:  {}", data["credential"]["expirationDate"].as_str().unwrap_or_default());
            println!();
            println!("Sign this message with {}:", args.address);
            println!();
            println!("{}", challenge);

            if let Some(out) = &args.out {
                std::fs::write(out, serde_json::to_string_pretty(&data)?)?;
                println!();
                println!("Saved response to {}", out.display());
            }
        }
        Err(e) => {
            println!("Could not reach IAM at {}", args.endpoint);
            println!("  Error: {}", e);
        }
    }

    Ok(())
}
