//! `passport keygen`: Generate fresh issuer and service keys.

use clap::Args;
use rand::RngCore;

use passport_crypto::{KeyPair, Secp256k1KeyPair};
use passport_identity::IssuerKeyStore;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Print only the `VAR=value` lines.
    #[arg(short, long)]
    pub quiet: bool,
}

/// A fresh set of service secrets, hex encoded.
pub struct GeneratedKeys {
    pub ed25519_key: String,
    pub eip712_key: String,
    pub hash_secret: String,
    pub oprf_client_key: String,
    pub default_issuer: String,
    pub eip712_issuer: String,
}

pub fn generate() -> GeneratedKeys {
    let ed25519 = KeyPair::generate();
    let eip712 = Secp256k1KeyPair::generate();
    let ed25519_key = hex::encode(ed25519.secret_bytes());
    let eip712_key = hex::encode(eip712.secret_bytes());

    let mut hash_secret = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut hash_secret);

    let store = IssuerKeyStore::new(ed25519, eip712);
    let [default_issuer, eip712_issuer] = store.trusted_issuers();

    GeneratedKeys {
        ed25519_key,
        eip712_key,
        hash_secret: hex::encode(hash_secret),
        oprf_client_key: hex::encode(KeyPair::generate().secret_bytes()),
        default_issuer: default_issuer.to_string(),
        eip712_issuer: eip712_issuer.to_string(),
    }
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    let keys = generate();
    println!("IAM_ED25519_KEY={}", keys.ed25519_key);
    println!("IAM_EIP712_KEY={}", keys.eip712_key);
    println!("IAM_HASH_SECRET={}", keys.hash_secret);
    println!("IAM_OPRF_CLIENT_KEY={}", keys.oprf_client_key);
    if !args.quiet {
        println!();
        println!("# Default issuer:  {}", keys.default_issuer);
        println!("# EIP712 issuer:   {}", keys.eip712_issuer);
    }
    Ok(())
}
