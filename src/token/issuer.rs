use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, Span};

use super::{
    codec::{self, Claims, Header},
    Clock, IssueError, SigningSecret, SystemClock,
};

/// Sign `claims` under the fixed HS256 header.
///
/// # Errors
///
/// Returns an error if a segment cannot be serialized or the key is rejected.
pub fn sign_claims(claims: &Claims, secret: &SigningSecret) -> Result<String, IssueError> {
    let header_b64 = codec::b64e_json(&Header::hs256())?;
    let claims_b64 = codec::b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature_b64 =
        codec::sign(&signing_input, secret).map_err(|_| IssueError::InvalidKey)?;

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Mint a token for `subject`, issued at `now` and valid for `lifetime`.
///
/// The subject is taken as-is; proving it belongs to the caller happens before
/// this is called.
///
/// # Errors
///
/// Returns `IssueError::InvalidLifetime` when `lifetime` is shorter than one
/// second, otherwise only on encoding faults.
pub fn issue(
    subject: &str,
    secret: &SigningSecret,
    lifetime: Duration,
    now_unix_seconds: i64,
) -> Result<String, IssueError> {
    let ttl = i64::try_from(lifetime.as_secs()).map_err(|_| IssueError::InvalidLifetime)?;
    if ttl < 1 {
        return Err(IssueError::InvalidLifetime);
    }

    let claims = Claims {
        sub: subject.to_string(),
        iat: now_unix_seconds,
        exp: now_unix_seconds.saturating_add(ttl),
    };

    sign_claims(&claims, secret)
}

/// Issues tokens with the process-wide secret and lifetime.
pub struct TokenIssuer {
    secret: SigningSecret,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
    span: Span,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: SigningSecret, lifetime: Duration) -> Self {
        Self {
            secret,
            lifetime,
            clock: Arc::new(SystemClock),
            span: Span::none(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Span that receives this issuer's log events.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mint a token for `subject` using the current time.
    ///
    /// # Errors
    ///
    /// See [`issue`].
    pub fn issue(&self, subject: &str) -> Result<String, IssueError> {
        let _entered = self.span.enter();
        let now = self.clock.now_unix();

        let token = issue(subject, &self.secret, self.lifetime, now)?;
        debug!(subject, iat = now, "token issued");
        Ok(token)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &self.secret)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
