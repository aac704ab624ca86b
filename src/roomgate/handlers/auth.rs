//! Passcode login.
//!
//! Flow Overview: `send-otp` asks the verification provider to deliver a
//! passcode to an email address or phone number; `verify-otp` checks the code
//! and, once the provider approves it, mints a signed token whose subject is
//! that address.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use super::{error_reply, ErrorReply};
use crate::{
    roomgate::otp::{OtpChannel, OtpProvider, OtpStatus},
    token::TokenIssuer,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SendOtpRequest {
    /// `email` or `sms`
    pub channel: String,
    /// Email address or phone number
    pub to: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SendOtpResponse {
    pub success: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpRequest {
    pub channel: String,
    pub to: String,
    pub otp: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct VerifyOtpResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ErrorReply> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(err) => {
            error!("Failed to decode request: {}", err);
            Err(error_reply(StatusCode::BAD_REQUEST, "Invalid request body"))
        }
    }
}

fn parse_channel(channel: &str) -> Result<OtpChannel, ErrorReply> {
    OtpChannel::parse(channel).ok_or_else(|| {
        error_reply(
            StatusCode::BAD_REQUEST,
            "Channel must be 'email' or 'sms'",
        )
    })
}

#[utoipa::path(
    post,
    path= "/api/auth/send-otp",
    request_body = SendOtpRequest,
    responses (
        (status = 200, description = "Passcode sent", body = SendOtpResponse),
        (status = 400, description = "Invalid body, channel or contact", body = super::ErrorResponse),
        (status = 500, description = "Verification provider failed", body = super::ErrorResponse),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn send_otp(
    Extension(provider): Extension<Arc<dyn OtpProvider>>,
    payload: Result<Json<SendOtpRequest>, JsonRejection>,
) -> Result<Json<SendOtpResponse>, ErrorReply> {
    let request = parse_body(payload)?;
    let channel = parse_channel(&request.channel)?;

    if request.to.is_empty() {
        return Err(error_reply(
            StatusCode::BAD_REQUEST,
            "Contact information (to) is required",
        ));
    }

    if let Err(err) = provider.send(channel, &request.to).await {
        error!(channel = channel.as_str(), "Failed to send OTP: {}", err);
        return Err(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to send OTP",
        ));
    }

    info!(channel = channel.as_str(), "OTP sent");
    debug!(to = %request.to, "OTP recipient");

    Ok(Json(SendOtpResponse { success: true }))
}

#[utoipa::path(
    post,
    path= "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses (
        (status = 200, description = "Passcode approved, token issued", body = VerifyOtpResponse),
        (status = 400, description = "Invalid body, channel, contact or code", body = super::ErrorResponse),
        (status = 401, description = "Passcode not approved", body = super::ErrorResponse),
        (status = 500, description = "Verification provider or token issuance failed", body = super::ErrorResponse),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn verify_otp(
    Extension(provider): Extension<Arc<dyn OtpProvider>>,
    Extension(issuer): Extension<Arc<TokenIssuer>>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<VerifyOtpResponse>, ErrorReply> {
    let request = parse_body(payload)?;
    let channel = parse_channel(&request.channel)?;

    if request.to.is_empty() || request.otp.is_empty() {
        return Err(error_reply(
            StatusCode::BAD_REQUEST,
            "Contact information and OTP are required",
        ));
    }

    match provider.check(&request.to, &request.otp).await {
        Ok(OtpStatus::Approved) => {}
        Ok(OtpStatus::NotApproved(status)) => {
            warn!(channel = channel.as_str(), status = %status, "OTP verification failed");
            return Err(error_reply(StatusCode::UNAUTHORIZED, "Invalid OTP"));
        }
        Err(err) => {
            error!(channel = channel.as_str(), "Failed to verify OTP: {}", err);
            return Err(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to verify OTP",
            ));
        }
    }

    info!(channel = channel.as_str(), "OTP verified");

    let token = issuer.issue(&request.to).map_err(|err| {
        error!("Failed to issue token: {}", err);
        error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue token")
    })?;

    Ok(Json(VerifyOtpResponse {
        success: true,
        token: Some(token),
    }))
}
