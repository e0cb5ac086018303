//! Signed Tokens
//!
//! Compact three-part tokens shaped like HS256 JWTs:
//! `base64url(header).base64url(payload).base64url(hmac_sha256(secret, header.payload))`.
//!
//! Only HS256 is produced or accepted and the header is never inspected on
//! verification. The only claim with meaning is `exp` (Unix seconds).
//!
//! ## Failure model
//! [`verify`] and [`decode`] answer `None` for every failure. Callers learn
//! whether a token is usable, never why it is not; the reason is logged.
//!
//! ## Examples
//! ```rust
//! use platform::token::{self, Claims, SignOptions};
//!
//! let mut claims = Claims::new();
//! claims.insert("id".into(), "u1".into());
//!
//! let token = token::sign(&claims, b"topsecret", SignOptions::expires_in(60));
//! let verified = token::verify(&token, b"topsecret").unwrap();
//! assert_eq!(verified["id"], "u1");
//! assert!(token::verify(&token, b"wrongsecret").is_none());
//! ```

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::crypto::{from_base64url, hmac_sha256, to_base64url};

/// Token payload: an arbitrary JSON object
pub type Claims = Map<String, Value>;

/// Name of the expiry claim
pub const EXP_CLAIM: &str = "exp";

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Options for [`sign`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Lifetime in seconds from signing time; may be negative
    pub expires_in: Option<i64>,
}

impl SignOptions {
    pub fn expires_in(seconds: i64) -> Self {
        Self {
            expires_in: Some(seconds),
        }
    }
}

/// Reasons a token is rejected (internal; logged, never returned)
#[derive(Debug, Error)]
enum TokenError {
    #[error("token must have three non-empty segments, got {0}")]
    Malformed(usize),

    #[error("signature mismatch")]
    BadSignature,

    #[error("token expired at {exp} (now {now})")]
    Expired { exp: f64, now: i64 },

    #[error("segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("segment is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("segment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

impl TokenError {
    fn log(&self) {
        match self {
            TokenError::Base64(_)
            | TokenError::Utf8(_)
            | TokenError::Json(_)
            | TokenError::NotAnObject => {
                tracing::warn!(error = %self, "Failed to decode token payload");
            }
            _ => {
                tracing::debug!(error = %self, "Token rejected");
            }
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Sign `payload` with `secret`
///
/// With `expires_in`, an `exp` claim of `now + expires_in` is added,
/// replacing any `exp` already in the payload. The sum saturates at the
/// `i64` bounds.
pub fn sign(payload: &Claims, secret: &[u8], options: SignOptions) -> String {
    sign_at(payload, secret, options, Utc::now().timestamp())
}

/// [`sign`] with an explicit clock reading in Unix seconds
pub fn sign_at(payload: &Claims, secret: &[u8], options: SignOptions, now_secs: i64) -> String {
    let mut payload = payload.clone();
    if let Some(expires_in) = options.expires_in {
        payload.insert(EXP_CLAIM.to_string(), Value::from(now_secs.saturating_add(expires_in)));
    }

    let encoded_header = encode_segment(&HEADER);
    let encoded_payload = encode_segment(&payload);
    let signature = signature_for(&encoded_header, &encoded_payload, secret);

    format!("{}.{}.{}", encoded_header, encoded_payload, signature)
}

/// Verify signature and expiry, returning the payload when both hold
pub fn verify(token: &str, secret: &[u8]) -> Option<Claims> {
    verify_at(token, secret, Utc::now().timestamp())
}

/// [`verify`] with an explicit clock reading in Unix seconds
pub fn verify_at(token: &str, secret: &[u8], now_secs: i64) -> Option<Claims> {
    try_verify(token, secret, now_secs)
        .inspect_err(TokenError::log)
        .ok()
}

/// Read the payload without checking signature or expiry
///
/// For inspection only; never base a trust decision on the result.
pub fn decode(token: &str) -> Option<Claims> {
    let segment = token.split('.').nth(1).filter(|s| !s.is_empty());
    let Some(segment) = segment else {
        TokenError::Malformed(token.split('.').count()).log();
        return None;
    };
    decode_payload(segment).inspect_err(TokenError::log).ok()
}

// ============================================================================
// Internals
// ============================================================================

fn try_verify(token: &str, secret: &[u8], now_secs: i64) -> Result<Claims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = parts.as_slice() else {
        return Err(TokenError::Malformed(parts.len()));
    };
    if parts.iter().any(|p| p.is_empty()) {
        return Err(TokenError::Malformed(parts.len()));
    }

    if signature_for(header, payload, secret) != *signature {
        return Err(TokenError::BadSignature);
    }

    let claims = decode_payload(payload)?;
    if let Some(exp) = claims.get(EXP_CLAIM).and_then(exp_seconds) {
        if exp < now_secs as f64 {
            return Err(TokenError::Expired { exp, now: now_secs });
        }
    }
    Ok(claims)
}

/// Numeric reading of an `exp` claim
///
/// Numbers, numeric strings and booleans (as 1/0) take part in the expiry
/// check. Anything else has no numeric value and never expires the token.
fn exp_seconds(exp: &Value) -> Option<f64> {
    match exp {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn signature_for(encoded_header: &str, encoded_payload: &str, secret: &[u8]) -> String {
    let signing_input = format!("{}.{}", encoded_header, encoded_payload);
    to_base64url(&hmac_sha256(secret, signing_input.as_bytes()))
}

fn encode_segment<T: Serialize + ?Sized>(value: &T) -> String {
    let json = serde_json::to_vec(value).expect("string-keyed JSON values always serialize");
    to_base64url(&json)
}

fn decode_payload(segment: &str) -> Result<Claims, TokenError> {
    let bytes = from_base64url(segment)?;
    let text = String::from_utf8(bytes)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(TokenError::NotAnObject),
    }
}
