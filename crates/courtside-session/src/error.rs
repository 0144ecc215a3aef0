//! Error type for `courtside-session`.

use courtside_core::backend::BackendError;
use thiserror::Error;

/// Everything a session operation can surface to its caller.
///
/// Undecodable tokens are not here: they are logged and the session simply
/// has no identity. Team-list refresh failures are not here either; refresh
/// never fails, it reports a [`RefreshOutcome`](crate::RefreshOutcome).
#[derive(Debug, Error)]
pub enum Error {
  /// Bad credentials, or the backend no longer accepts the token.
  #[error("authentication failed: {0}")]
  Auth(String),

  /// The backend refused to switch teams (e.g. not a member).
  #[error("team switch refused: {0}")]
  TeamSwitch(String),

  /// Transport failure. Safe to retry.
  #[error("network error: {0}")]
  Network(String),

  /// Any other backend rejection, with the server's message.
  #[error("backend error: {0}")]
  Backend(String),

  #[error("not signed in")]
  NotSignedIn,

  /// Input refused before reaching the backend.
  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("core error: {0}")]
  Core(#[from] courtside_core::Error),
}

impl Error {
  pub(crate) fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }

  /// Classify a failure of a call that only needs credentials.
  pub(crate) fn from_login(err: BackendError) -> Self {
    match err {
      BackendError::Unauthorized(m) | BackendError::Rejected { message: m, .. } => Self::Auth(m),
      BackendError::Network(m) => Self::Network(m),
      BackendError::Malformed(m) => Self::Backend(m),
    }
  }

  /// Classify a failure of `set-current-team`.
  pub(crate) fn from_switch(err: BackendError) -> Self {
    match err {
      BackendError::Unauthorized(m) => Self::Auth(m),
      BackendError::Rejected { message, .. } => Self::TeamSwitch(message),
      BackendError::Network(m) => Self::Network(m),
      BackendError::Malformed(m) => Self::Backend(m),
    }
  }

  /// Classify a failure of any other call.
  pub(crate) fn from_backend(err: BackendError) -> Self {
    match err {
      BackendError::Unauthorized(m) => Self::Auth(m),
      BackendError::Network(m) => Self::Network(m),
      BackendError::Rejected { message: m, .. } | BackendError::Malformed(m) => Self::Backend(m),
    }
  }

  /// Network failures are worth retrying as-is; nothing else is.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::Network(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
