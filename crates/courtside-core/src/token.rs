//! Session tokens and the claims carried inside them.
//!
//! Tokens are JWTs minted by the backend. Decoding here reads the payload
//! segment only; the signature is **not** verified. The result is good enough
//! to pick a route or show a username, and nothing more: the backend remains
//! the only place where access is actually enforced.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64URL;
use chrono::{DateTime, TimeZone as _, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

// ─── Claims ──────────────────────────────────────────────────────────────────

/// The claims this client cares about. Unknown claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// Subject identity (the username).
  pub sub:            String,
  /// Team the token was minted for. The backend spells this
  /// `current_team_id`.
  #[serde(default, alias = "current_team_id", skip_serializing_if = "Option::is_none")]
  pub active_team_id: Option<String>,
  /// Expiry as seconds since the Unix epoch.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exp:            Option<i64>,
}

impl Claims {
  pub fn identity(&self) -> Identity {
    Identity { username: self.sub.clone() }
  }

  pub fn expires_at(&self) -> Option<DateTime<Utc>> {
    self.exp.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
  }

  /// A token without an `exp` claim never expires client-side.
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at().is_some_and(|at| at <= now)
  }
}

/// Read-only projection of the token's subject claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub username: String,
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Decode the payload segment of a JWT into [`Claims`].
///
/// Accepts padded and unpadded base64url.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
  let segments: Vec<&str> = token.trim().split('.').collect();
  if segments.len() != 3 {
    return Err(DecodeError::Segments(segments.len()));
  }

  let payload = B64URL.decode(segments[1].trim_end_matches('='))?;
  Ok(serde_json::from_slice(&payload)?)
}

/// Build an unsigned JWT carrying `claims`.
///
/// The signature segment is a fixed placeholder, which is all [`decode`]
/// needs. Used by tests and stub backends.
pub fn encode_unsigned(claims: &Claims) -> Result<String, DecodeError> {
  let header  = B64URL.encode(br#"{"alg":"none","typ":"JWT"}"#);
  let payload = B64URL.encode(serde_json::to_vec(claims)?);
  Ok(format!("{header}.{payload}.unsigned"))
}
