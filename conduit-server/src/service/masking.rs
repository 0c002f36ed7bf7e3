//! Credential masking

use conduit_core::domain::credential::Credential;

/// Produces the copy of a credential that may leave the server
pub trait SecretMasker: Send + Sync {
    fn mask(&self, credential: &Credential) -> Credential;
}

/// Blanks the values of well-known secret keys
#[derive(Debug, Clone)]
pub struct DefaultSecretMasker {
    secret_keys: Vec<String>,
}

impl DefaultSecretMasker {
    pub const SECRET_KEYS: [&'static str; 5] =
        ["password", "private_key", "passphrase", "secret", "content"];

    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            secret_keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for DefaultSecretMasker {
    fn default() -> Self {
        Self::with_keys(Self::SECRET_KEYS)
    }
}

impl SecretMasker for DefaultSecretMasker {
    fn mask(&self, credential: &Credential) -> Credential {
        let mut masked = credential.clone();
        for (key, value) in masked.data.iter_mut() {
            if self.secret_keys.iter().any(|secret| secret == key) {
                value.clear();
            }
        }
        masked
    }
}
