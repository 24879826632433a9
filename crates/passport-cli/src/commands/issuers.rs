//! `passport issuers`: Show the issuer DIDs of a running IAM.

use clap::Args;
use serde::Deserialize;

use super::{bail_on_error, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct IssuersArgs {
    /// IAM endpoint.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct IssuersResponse {
    default: String,
    eip712: String,
}

pub async fn run(args: &IssuersArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v0.0.0/issuers", args.endpoint);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) => {
            let data: IssuersResponse = bail_on_error("issuer lookup", r).await?.json().await?;
            println!("Trusted issuers:");
            println!("  Default:  {}", data.default);
            println!("  EIP712:   {}", data.eip712);
        }
        Err(e) => {
            println!("Could not reach IAM at {}", args.endpoint);
            println!("  Error: {}", e);
            println!();
            println!("Is the service running? Start it with: passport-iam");
        }
    }

    Ok(())
}
