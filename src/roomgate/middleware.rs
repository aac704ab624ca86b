//! Bearer-token gate for protected routes.
//!
//! Flow Overview: read `Authorization: Bearer <token>`, verify the token, and
//! store the subject as a [`VerifiedIdentity`] in the request extensions for
//! downstream handlers. Any failure ends the request with a 401 before the
//! protected handler runs.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        request::Parts,
        Extensions, HeaderMap, HeaderValue, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use std::sync::Arc;
use tracing::{debug, Span};

use super::handlers::ErrorResponse;
use crate::token::{AuthError, TokenVerifier};

const BEARER: &str = "bearer";

/// Subject of a successfully verified token, scoped to one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject: String,
}

impl VerifiedIdentity {
    /// Identity attached by the gate, or `None` when the gate did not run.
    #[must_use]
    pub fn from_extensions(extensions: &Extensions) -> Option<&Self> {
        extensions.get::<Self>()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for VerifiedIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_extensions(&parts.extensions)
            .cloned()
            .ok_or_else(|| {
                debug!("No verified identity on request");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("Authentication required")),
                )
            })
    }
}

#[derive(Clone, Debug)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
    span: Span,
}

impl AuthGate {
    #[must_use]
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self {
            verifier,
            span: Span::none(),
        }
    }

    /// Span that receives this gate's log events.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Authenticate a request from its headers.
    ///
    /// # Errors
    ///
    /// `MissingCredential` or `MalformedCredential` for a bad header, otherwise
    /// whatever the verifier reports.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<VerifiedIdentity, AuthError> {
        self.span.in_scope(|| {
            let result = extract_bearer(headers)
                .and_then(|token| self.verifier.verify(token))
                .map(|claims| VerifiedIdentity {
                    subject: claims.sub,
                });

            match &result {
                Ok(identity) => debug!(subject = %identity.subject, "request authenticated"),
                Err(err) => debug!(kind = err.kind(), "request rejected"),
            }
            result
        })
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive and must be followed by exactly one space.
fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(AuthError::MissingCredential);
    };
    if value.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let value = value.to_str().map_err(|_| AuthError::MalformedCredential)?;
    let Some((scheme, token)) = value.split_once(' ') else {
        return Err(AuthError::MalformedCredential);
    };
    if !scheme.eq_ignore_ascii_case(BEARER) || token.is_empty() || token.starts_with(' ') {
        return Err(AuthError::MalformedCredential);
    }

    Ok(token)
}

/// Client-facing message. Verification failures share one message so the
/// response does not reveal which check failed.
const fn public_message(err: &AuthError) -> &'static str {
    match err {
        AuthError::MissingCredential => "Authorization header required",
        AuthError::MalformedCredential => "Invalid authorization format",
        AuthError::MalformedToken
        | AuthError::InvalidSignature
        | AuthError::UnsupportedAlgorithm(_)
        | AuthError::TokenExpired => "Invalid or expired token",
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(public_message(&self))),
        )
            .into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

/// axum middleware enforcing the gate on every request it wraps.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.authenticate(request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Put every route of `router` behind the gate.
///
/// Uses `route_layer`, so paths the router does not know still answer 404.
pub fn protect<S>(router: Router<S>, gate: AuthGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(gate, require_auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{issue, FixedClock, SigningSecret};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        routing::get,
    };
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };
    use tower::ServiceExt;

    const NOW: i64 = 1_700_000_000;

    fn secret() -> SigningSecret {
        SigningSecret::new(b"gate-test-secret".to_vec()).expect("test secret is non-empty")
    }

    fn gate_at(now: i64) -> AuthGate {
        AuthGate::new(Arc::new(
            TokenVerifier::new(secret()).with_clock(Arc::new(FixedClock(now))),
        ))
    }

    fn token(sub: &str) -> String {
        issue(sub, &secret(), Duration::from_secs(3600), NOW).expect("issue test token")
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(value).expect("valid header value"),
        );
        headers
    }

    fn app(called: Arc<AtomicBool>) -> Router {
        let protected = Router::new().route(
            "/whoami",
            get(move |identity: VerifiedIdentity| {
                let called = called.clone();
                async move {
                    called.store(true, Ordering::SeqCst);
                    identity.subject
                }
            }),
        );
        protect(protected, gate_at(NOW))
    }

    #[test]
    fn extract_bearer_variants() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(AuthError::MissingCredential));
        assert_eq!(extract_bearer(&headers("")), Err(AuthError::MissingCredential));
        assert_eq!(extract_bearer(&headers("Bearer")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(&headers("Bearer ")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(&headers("Bearer  abc")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(&headers("Basic abc")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(&headers("Baerer abc")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(&headers("abc")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(&headers("bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(&headers("BEARER abc")), Ok("abc"));
    }

    #[test]
    fn authenticate_returns_subject() {
        let gate = gate_at(NOW);
        let identity = gate.authenticate(&headers(&format!("Bearer {}", token("+15555550100"))));
        assert_eq!(
            identity,
            Ok(VerifiedIdentity {
                subject: "+15555550100".to_string()
            })
        );
    }

    #[test]
    fn authenticate_passes_verifier_errors_through() {
        let gate = gate_at(NOW + 3601);
        let result = gate.authenticate(&headers(&format!("Bearer {}", token("a"))));
        assert_eq!(result, Err(AuthError::TokenExpired));

        let result = gate_at(NOW).authenticate(&headers("Bearer a.b"));
        assert_eq!(result, Err(AuthError::MalformedToken));
    }

    #[test]
    fn verifier_errors_share_one_message() {
        for err in [
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::UnsupportedAlgorithm("none".to_string()),
            AuthError::TokenExpired,
        ] {
            assert_eq!(public_message(&err), "Invalid or expired token");
        }
    }

    #[test]
    fn identity_absent_without_gate() {
        assert!(VerifiedIdentity::from_extensions(&Extensions::new()).is_none());
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() -> Result<(), Box<dyn std::error::Error>> {
        let called = Arc::new(AtomicBool::new(false));
        let response = app(called.clone())
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", token("user@example.com")))
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"user@example.com");
        assert!(called.load(Ordering::SeqCst));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_request_never_reaches_handler() -> Result<(), Box<dyn std::error::Error>> {
        let cases = [
            (None, "Authorization header required"),
            (Some("Token abc".to_string()), "Invalid authorization format"),
            (Some("Bearer a.b.c".to_string()), "Invalid or expired token"),
        ];

        for (header, message) in cases {
            let called = Arc::new(AtomicBool::new(false));
            let mut request = Request::builder().uri("/whoami");
            if let Some(value) = header {
                request = request.header(AUTHORIZATION, value);
            }
            let response = app(called.clone()).oneshot(request.body(Body::empty())?).await?;

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.headers().get(WWW_AUTHENTICATE),
                Some(&HeaderValue::from_static("Bearer"))
            );
            let body = to_bytes(response.into_body(), usize::MAX).await?;
            let body: serde_json::Value = serde_json::from_slice(&body)?;
            assert_eq!(body, serde_json::json!({ "error": message }));
            assert!(!called.load(Ordering::SeqCst));
        }
        Ok(())
    }

    #[tokio::test]
    async fn extractor_without_gate_rejects() -> Result<(), Box<dyn std::error::Error>> {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let app = Router::new().route(
            "/whoami",
            get(move |identity: VerifiedIdentity| {
                let flag = flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    identity.subject
                }
            }),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", token("user@example.com")))
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(body, serde_json::json!({ "error": "Authentication required" }));
        assert!(!called.load(Ordering::SeqCst));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
        let called = Arc::new(AtomicBool::new(false));
        let response = app(called)
            .oneshot(Request::builder().uri("/missing").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
