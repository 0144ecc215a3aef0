//! Error types for `courtside-core`.

use thiserror::Error;

/// Why a token could not be decoded into claims.
///
/// Never fatal: a token that fails to decode is kept, but has no identity and
/// is treated as anonymous by the route guard.
#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("token is not a three-part JWT (found {0} segments)")]
  Segments(usize),

  #[error("token payload is not valid base64url: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("token payload is not a valid claims object: {0}")]
  Claims(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("decode error: {0}")]
  Decode(#[from] DecodeError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
