use thiserror::Error;

/// Reasons a request fails authentication.
///
/// Every variant is local to a single request. The gate decides how much of
/// the reason reaches the client; logs may keep the precise kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("malformed credential")]
    MalformedCredential,
    #[error("malformed token")]
    MalformedToken,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("token expired")]
    TokenExpired,
}

impl AuthError {
    /// Stable label used in log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::MalformedToken => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::TokenExpired => "token_expired",
        }
    }
}

/// Failures while minting a token. None of these are attacker controlled.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to encode token segment")]
    Encode(#[from] serde_json::Error),
    #[error("token lifetime must be at least one second")]
    InvalidLifetime,
    /// HMAC-SHA256 takes keys of any length and `SigningSecret` is never
    /// empty, so this only surfaces if the MAC construction changes.
    #[error("signing key rejected")]
    InvalidKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_distinct() {
        let kinds = [
            AuthError::MissingCredential.kind(),
            AuthError::MalformedCredential.kind(),
            AuthError::MalformedToken.kind(),
            AuthError::InvalidSignature.kind(),
            AuthError::UnsupportedAlgorithm("none".to_string()).kind(),
            AuthError::TokenExpired.kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unsupported_algorithm_display_names_alg() {
        let err = AuthError::UnsupportedAlgorithm("RS256".to_string());
        assert_eq!(err.to_string(), "unsupported algorithm: RS256");
    }
}
