pub mod auth;
pub use self::auth::{send_otp, verify_otp};

pub mod health;
pub use self::health::health;

pub mod me;
pub use self::me::me;

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON error body shared by every endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub(crate) type ErrorReply = (StatusCode, Json<ErrorResponse>);

pub(crate) fn error_reply(status: StatusCode, message: &str) -> ErrorReply {
    (status, Json(ErrorResponse::new(message)))
}
