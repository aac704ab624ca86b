use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::roomgate::middleware::VerifiedIdentity;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Me {
    pub subject: String,
}

#[utoipa::path(
    get,
    path= "/api/me",
    responses (
        (status = 200, description = "Identity carried by the bearer token", body = Me),
        (status = 401, description = "Missing, malformed, invalid or expired token", body = super::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn me(identity: VerifiedIdentity) -> Json<Me> {
    Json(Me {
        subject: identity.subject,
    })
}
