use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const REDACTED: &str = "[REDACTED]";

/// A secret string (API key, private key material).
///
/// Zeroized on drop; `Debug` never prints the value.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", REDACTED)
    }
}

/// Scrubs configured secret strings out of messages before they are logged
/// or returned to a client.
#[derive(Debug, Clone, Default)]
pub struct SecretRedactor {
    secrets: Vec<Secret>,
}

impl SecretRedactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret. Empty secrets are ignored.
    pub fn add(&mut self, secret: &Secret) {
        if secret.is_empty() {
            return;
        }
        let value = secret.expose();
        self.secrets.push(secret.clone());
        // Keys are often configured with a 0x prefix and echoed without it.
        if let Some(stripped) = value.strip_prefix("0x") {
            if !stripped.is_empty() {
                self.secrets.push(Secret::new(stripped));
            }
        }
    }

    /// Builder form of [`SecretRedactor::add`].
    pub fn with(mut self, secret: &Secret) -> Self {
        self.add(secret);
        self
    }

    /// Number of registered secret patterns.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Replace every occurrence of every registered secret.
    pub fn redact(&self, message: &str) -> String {
        let mut out = message.to_string();
        for secret in &self.secrets {
            if out.contains(secret.expose()) {
                out = out.replace(secret.expose(), REDACTED);
            }
        }
        out
    }
}
