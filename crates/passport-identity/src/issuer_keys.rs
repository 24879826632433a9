use passport_core::SignatureType;
use passport_crypto::{KeyPair, Secp256k1KeyPair};

use crate::did::{ethr_did, key_did};
use crate::error::IdentityError;

/// One of the service's signing keys, with its DID derived once.
pub enum IssuerKey {
    Ed25519 { keypair: KeyPair, did: String },
    Eip712 { keypair: Secp256k1KeyPair, did: String },
}

impl IssuerKey {
    pub fn ed25519(keypair: KeyPair) -> Self {
        let did = key_did(&keypair.public_key());
        Self::Ed25519 { keypair, did }
    }

    pub fn eip712(keypair: Secp256k1KeyPair) -> Self {
        let did = ethr_did(&keypair.address());
        Self::Eip712 { keypair, did }
    }

    /// The issuer DID written into every credential this key signs.
    pub fn did(&self) -> &str {
        match self {
            Self::Ed25519 { did, .. } | Self::Eip712 { did, .. } => did,
        }
    }

    pub fn signature_type(&self) -> SignatureType {
        match self {
            Self::Ed25519 { .. } => SignatureType::Ed25519,
            Self::Eip712 { .. } => SignatureType::Eip712,
        }
    }

    /// DID URL of the verification method, used in `proof.verificationMethod`.
    pub fn verification_method(&self) -> String {
        match self {
            Self::Ed25519 { did, .. } => {
                let fragment = did.strip_prefix("did:key:").unwrap_or(did);
                format!("{}#{}", did, fragment)
            }
            Self::Eip712 { did, .. } => format!("{}#controller", did),
        }
    }
}

/// Holds the two trusted issuer keys for the process lifetime.
///
/// The store is the sole trust anchor: a credential is only accepted if its
/// issuer DID is one of the two DIDs held here.
pub struct IssuerKeyStore {
    default_key: IssuerKey,
    eip712_key: IssuerKey,
}

impl IssuerKeyStore {
    pub fn new(default_key: KeyPair, eip712_key: Secp256k1KeyPair) -> Self {
        let store = Self {
            default_key: IssuerKey::ed25519(default_key),
            eip712_key: IssuerKey::eip712(eip712_key),
        };
        tracing::info!(
            default_issuer = store.default_key.did(),
            eip712_issuer = store.eip712_key.did(),
            "issuer keys loaded"
        );
        store
    }

    /// Generate both keys randomly. Used by tests and `passport keygen`.
    pub fn generate() -> Self {
        Self::new(KeyPair::generate(), Secp256k1KeyPair::generate())
    }

    /// Load both keys from hex-encoded 32-byte secrets.
    pub fn from_hex(default_hex: &str, eip712_hex: &str) -> Result<Self, IdentityError> {
        let default_key = KeyPair::from_hex(default_hex)
            .map_err(|e| IdentityError::InvalidIssuerKey(format!("default key: {}", e)))?;
        let eip712_key = Secp256k1KeyPair::from_hex(eip712_hex)
            .map_err(|e| IdentityError::InvalidIssuerKey(format!("EIP712 key: {}", e)))?;
        Ok(Self::new(default_key, eip712_key))
    }

    /// Load both keys from environment variables holding hex secrets.
    pub fn from_env(default_var: &str, eip712_var: &str) -> Result<Self, IdentityError> {
        let default_hex = read_env(default_var)?;
        let eip712_hex = read_env(eip712_var)?;
        Self::from_hex(&default_hex, &eip712_hex)
    }

    /// The key selected by `signature_type`.
    pub fn issuer_key(&self, signature_type: SignatureType) -> &IssuerKey {
        match signature_type {
            SignatureType::Ed25519 => &self.default_key,
            SignatureType::Eip712 => &self.eip712_key,
        }
    }

    /// The cached issuer DID for `signature_type`.
    pub fn issuer_did(&self, signature_type: SignatureType) -> &str {
        self.issuer_key(signature_type).did()
    }

    /// Whether `did` is one of the two trusted issuers.
    pub fn has_valid_issuer(&self, did: &str) -> bool {
        did == self.default_key.did() || did == self.eip712_key.did()
    }

    /// Both trusted issuer DIDs, default first.
    pub fn trusted_issuers(&self) -> [&str; 2] {
        [self.default_key.did(), self.eip712_key.did()]
    }
}

fn read_env(var: &str) -> Result<String, IdentityError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(IdentityError::MissingIssuerKey(var.to_string())),
    }
}
