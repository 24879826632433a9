//! `passport verify`: Verify one or more credentials.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{bail_on_error, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Credential JSON, or a path to a file holding a credential, an array
    /// of credentials, or an IAM response with a `credential` field.
    #[arg(short, long)]
    pub credential: String,

    /// IAM endpoint.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct VerifyRequest {
    credentials: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct VerifyResponse {
    results: Vec<VerificationResult>,
}

#[derive(Deserialize)]
struct VerificationResult {
    valid: bool,
    #[serde(default)]
    errors: Vec<String>,
}

/// Read `input` as inline JSON or as a file and collect the credentials in it.
pub fn load_credentials(input: &str) -> anyhow::Result<Vec<serde_json::Value>> {
    let trimmed = input.trim_start();
    let text = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        input.to_string()
    } else {
        std::fs::read_to_string(Path::new(input))
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", input, e))?
    };
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("invalid credential JSON: {}", e))?;

    let credentials = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(ref obj) if obj.contains_key("credential") => {
            vec![obj["credential"].clone()]
        }
        other @ serde_json::Value::Object(_) => vec![other],
        _ => anyhow::bail!("expected a credential object or an array of credentials"),
    };
    if credentials.is_empty() {
        anyhow::bail!("no credentials to verify");
    }
    Ok(credentials)
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let credentials = load_credentials(&args.credential)?;
    let count = credentials.len();

    let url = format!("{}/api/v0.0.0/credentials/verify", args.endpoint);
    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .json(&VerifyRequest { credentials })
        .send()
        .await;

    match resp {
        Ok(r) => {
            let data: VerifyResponse = bail_on_error("verification", r).await?.json().await?;
            println!("Verified {} credential(s):", count);
            for (i, result) in data.results.iter().enumerate() {
                if result.valid {
                    println!("  [{}] valid", i);
                } else {
                    println!("  [{}] INVALID: {}", i, result.errors.join("; "));
                }
            }
        }
        Err(e) => {
            println!("Could not reach IAM at {}", args.endpoint);
            println!("  Error: {}", e);
        }
    }

    Ok(())
}
