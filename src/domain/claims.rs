//! Unverified decoding of bearer-token claims.
//!
//! The payload segment of a compact token is read without checking the
//! signature. The result personalises the UI and hints at ownership; it is
//! never an authorization decision. Every mutating endpoint re-validates the
//! caller server-side.

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

/// Identity attributes read from a token payload.
///
/// Each field is independently optional: a payload that is a JSON object but
/// lacks `sub` still yields `Claims` with `subject == None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims {
    pub subject: Option<String>,
    pub account_name: Option<String>,
    pub email: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
}

impl Claims {
    pub fn display_name(&self) -> &str {
        self.account_name.as_deref().unwrap_or("Profile")
    }

    pub fn display_email(&self) -> &str {
        self.email.as_deref().unwrap_or("Email")
    }

    /// True when the token carries an expiry that lies before `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token has no payload segment")]
    MissingPayload,
    #[error("payload is not valid base64")]
    Base64,
    #[error("payload is not valid JSON: {0}")]
    Json(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Decode the claims of `token`, reporting why decoding failed.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let payload = token
        .trim()
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(DecodeError::MissingPayload)?;

    let bytes = decode_segment(payload).ok_or(DecodeError::Base64)?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|err| DecodeError::Json(err.to_string()))?;
    let Value::Object(object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    Ok(Claims {
        subject: scalar_field(&object, "sub"),
        account_name: string_field(&object, "account_name"),
        email: string_field(&object, "email"),
        expires_at: object
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok()),
    })
}

/// Decode the claims of `token`, treating any failure as "no identity".
pub fn extract_claims(token: &str) -> Option<Claims> {
    match decode_claims(token) {
        Ok(claims) => Some(claims),
        Err(err) => {
            debug!(target = "folio::claims", error = %err, "discarding undecodable token");
            None
        }
    }
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    [URL_SAFE_NO_PAD, URL_SAFE, STANDARD_NO_PAD, STANDARD]
        .iter()
        .find_map(|engine| engine.decode(segment).ok())
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn scalar_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn token_with_payload(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}
