//! Wire format: `b64url(header_json).b64url(claims_json).b64url(hmac_sha256)`,
//! base64url without padding throughout.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{digest::InvalidLength, Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{AuthError, SigningSecret};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "HS256";
pub const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    /// Missing or `null` reads as empty and is reported as unsupported.
    #[serde(default, deserialize_with = "null_as_default")]
    pub alg: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub typ: String,
}

impl Header {
    #[must_use]
    pub fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// Authenticated payload of a token. Field order is the serialized order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject identifier, e.g. a verified email address or phone number.
    pub sub: String,
    /// Issued-at (seconds since epoch). Informational; absent reads as 0.
    #[serde(default, deserialize_with = "null_as_default")]
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The three borrowed segments of a token string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segments<'a> {
    pub header: &'a str,
    pub claims: &'a str,
    pub signature: &'a str,
}

impl Segments<'_> {
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.claims)
    }
}

/// Split a token into exactly three non-empty segments.
pub(crate) fn split(token: &str) -> Result<Segments<'_>, AuthError> {
    let mut parts = token.split('.');
    let header = parts.next().ok_or(AuthError::MalformedToken)?;
    let claims = parts.next().ok_or(AuthError::MalformedToken)?;
    let signature = parts.next().ok_or(AuthError::MalformedToken)?;
    if parts.next().is_some() {
        return Err(AuthError::MalformedToken);
    }
    if header.is_empty() || claims.is_empty() || signature.is_empty() {
        return Err(AuthError::MalformedToken);
    }

    Ok(Segments {
        header,
        claims,
        signature,
    })
}

pub(crate) fn b64e_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

pub(crate) fn b64d_json<T: DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| AuthError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
}

/// HMAC-SHA256 over `signing_input`, base64url encoded.
pub(crate) fn sign(signing_input: &str, secret: &SigningSecret) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.expose())?;
    mac.update(signing_input.as_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(Base64UrlUnpadded::encode_string(&digest))
}

/// Recompute the signature and compare it to `signature` in constant time.
pub(crate) fn signature_matches(
    signing_input: &str,
    signature: &str,
    secret: &SigningSecret,
) -> bool {
    let Ok(expected) = sign(signing_input, secret) else {
        return false;
    };
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
