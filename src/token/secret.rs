use secrecy::{ExposeSecret, SecretSlice, SecretString};
use std::{fmt, sync::Arc};

/// Shared HMAC key used by both the issuer and the verifier.
///
/// Read-only after start-up and cheap to clone. `Debug` never prints the bytes.
#[derive(Clone)]
pub struct SigningSecret(Arc<SecretSlice<u8>>);

impl SigningSecret {
    /// Wrap raw key bytes. Returns `None` for an empty key.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return None;
        }
        Some(Self(Arc::new(SecretSlice::from(bytes))))
    }

    /// Build a key from a configured secret string, using its UTF-8 bytes.
    #[must_use]
    pub fn from_secret_string(secret: &SecretString) -> Option<Self> {
        Self::new(secret.expose_secret().as_bytes().to_vec())
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(***)")
    }
}
