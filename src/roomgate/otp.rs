//! One-time passcode delivery through an external verification provider.
//!
//! The provider speaks the Twilio Verify v2 REST shape: a passcode is started
//! with `POST /v2/Services/{sid}/Verifications` and checked with
//! `POST /v2/Services/{sid}/VerificationCheck`; both answer `{"status": ...}`.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{fmt, future::Future, pin::Pin, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::APP_USER_AGENT;

const APPROVED: &str = "approved";

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("verification provider is not configured")]
    NotConfigured,
    #[error("invalid provider url")]
    Url(#[from] url::ParseError),
    #[error("provider request failed")]
    Http(#[from] reqwest::Error),
}

/// Delivery channel for a passcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpChannel {
    Email,
    Sms,
}

impl OtpChannel {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpStatus {
    Approved,
    /// Any other provider status, e.g. `pending` after a wrong code.
    NotApproved(String),
}

impl From<String> for OtpStatus {
    fn from(status: String) -> Self {
        if status == APPROVED {
            Self::Approved
        } else {
            Self::NotApproved(status)
        }
    }
}

pub type OtpFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, OtpError>> + Send + 'a>>;

/// Proves a caller controls an email address or phone number.
pub trait OtpProvider: Send + Sync {
    /// Deliver a fresh passcode to `to` over `channel`.
    fn send<'a>(&'a self, channel: OtpChannel, to: &'a str) -> OtpFuture<'a, ()>;

    /// Check `code` against the last passcode sent to `to`.
    fn check<'a>(&'a self, to: &'a str, code: &'a str) -> OtpFuture<'a, OtpStatus>;
}

#[derive(Deserialize, Debug)]
struct VerificationResponse {
    status: String,
}

/// HTTP client for the verification provider.
pub struct VerifyClient {
    client: Client,
    base_url: Url,
    service_sid: String,
    api_key: String,
    api_secret: SecretString,
}

impl VerifyClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        mut base_url: Url,
        service_sid: String,
        api_key: String,
        api_secret: SecretString,
    ) -> Result<Self, OtpError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            service_sid,
            api_key,
            api_secret,
        })
    }

    fn endpoint(&self, resource: &str) -> Result<Url, OtpError> {
        Ok(self
            .base_url
            .join(&format!("v2/Services/{}/{resource}", self.service_sid))?)
    }

    async fn post(&self, resource: &str, form: &[(&str, &str)]) -> Result<String, OtpError> {
        let response = self
            .client
            .post(self.endpoint(resource)?)
            .basic_auth(&self.api_key, Some(self.api_secret.expose_secret()))
            .form(form)
            .send()
            .await?
            .error_for_status()?;

        let body: VerificationResponse = response.json().await?;
        Ok(body.status)
    }

    #[instrument(skip(self, to))]
    async fn start_verification(&self, channel: OtpChannel, to: &str) -> Result<(), OtpError> {
        let status = self
            .post("Verifications", &[("To", to), ("Channel", channel.as_str())])
            .await?;
        debug!("Verification started with status {}", status);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn check_verification(&self, to: &str, code: &str) -> Result<OtpStatus, OtpError> {
        let status = self
            .post("VerificationCheck", &[("To", to), ("Code", code)])
            .await?;
        debug!("Verification check returned status {}", status);
        Ok(OtpStatus::from(status))
    }
}

impl OtpProvider for VerifyClient {
    fn send<'a>(&'a self, channel: OtpChannel, to: &'a str) -> OtpFuture<'a, ()> {
        Box::pin(self.start_verification(channel, to))
    }

    fn check<'a>(&'a self, to: &'a str, code: &'a str) -> OtpFuture<'a, OtpStatus> {
        Box::pin(self.check_verification(to, code))
    }
}

impl fmt::Debug for VerifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyClient")
            .field("base_url", &self.base_url.as_str())
            .field("service_sid", &self.service_sid)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish_non_exhaustive()
    }
}

/// Stand-in used when no provider credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

impl OtpProvider for UnconfiguredProvider {
    fn send<'a>(&'a self, _channel: OtpChannel, _to: &'a str) -> OtpFuture<'a, ()> {
        Box::pin(async { Err(OtpError::NotConfigured) })
    }

    fn check<'a>(&'a self, _to: &'a str, _code: &'a str) -> OtpFuture<'a, OtpStatus> {
        Box::pin(async { Err(OtpError::NotConfigured) })
    }
}
