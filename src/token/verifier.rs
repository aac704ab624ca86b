use std::{fmt, sync::Arc};
use tracing::{debug, Span};

use super::{
    codec::{self, Claims, Header, ALGORITHM},
    AuthError, Clock, SigningSecret, SystemClock,
};

/// Verify `token` against `secret` at `now_unix_seconds` and return its claims.
///
/// The signature covers the raw `header.claims` text and is checked before
/// either segment is decoded, so nothing unsigned is ever parsed.
///
/// # Errors
///
/// Checks run in order and stop at the first failure:
/// - not exactly three non-empty segments: `MalformedToken`
/// - signature mismatch: `InvalidSignature`
/// - header not decodable: `MalformedToken`; `alg` other than HS256: `UnsupportedAlgorithm`
/// - claims not decodable: `MalformedToken`
/// - `now_unix_seconds > exp`: `TokenExpired`
pub fn verify(
    token: &str,
    secret: &SigningSecret,
    now_unix_seconds: i64,
) -> Result<Claims, AuthError> {
    let segments = codec::split(token)?;

    if !codec::signature_matches(&segments.signing_input(), segments.signature, secret) {
        return Err(AuthError::InvalidSignature);
    }

    let header: Header = codec::b64d_json(segments.header)?;
    if header.alg != ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(header.alg));
    }

    let claims: Claims = codec::b64d_json(segments.claims)?;
    if now_unix_seconds > claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Verifies tokens with the process-wide secret.
pub struct TokenVerifier {
    secret: SigningSecret,
    clock: Arc<dyn Clock>,
    span: Span,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            clock: Arc::new(SystemClock),
            span: Span::none(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Span that receives this verifier's log events.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Verify `token` at the current time.
    ///
    /// # Errors
    ///
    /// See [`verify`].
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let _entered = self.span.enter();

        let result = verify(token, &self.secret, self.clock.now_unix());
        match &result {
            Ok(claims) => debug!(subject = %claims.sub, exp = claims.exp, "token verified"),
            Err(err) => debug!(kind = err.kind(), "token rejected"),
        }
        result
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}
