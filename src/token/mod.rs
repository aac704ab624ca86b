//! HS256 identity tokens.
//!
//! A token is `header.claims.signature`. The header is always
//! `{"alg":"HS256","typ":"JWT"}`, the claims carry only `sub`, `iat` and `exp`,
//! and the signature is HMAC-SHA256 over the first two segments keyed by a
//! single shared secret. Nothing is stored; any holder of the secret can verify.

mod clock;
mod codec;
mod error;
mod issuer;
mod secret;
mod verifier;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{Claims, Header, ALGORITHM, TOKEN_TYPE};
pub use error::{AuthError, IssueError};
pub use issuer::{issue, sign_claims, TokenIssuer};
pub use secret::SigningSecret;
pub use verifier::{verify, TokenVerifier};
