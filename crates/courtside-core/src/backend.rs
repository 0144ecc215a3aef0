//! The `AuthBackend` trait: the REST collaborator that issues tokens.
//!
//! The session service only ever talks to the backend through this trait.
//! `courtside-http` implements it over HTTP; tests implement it in memory.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::team::Team;

// ─── Request / response shapes ───────────────────────────────────────────────

/// Credentials for a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
  pub username:  String,
  pub password:  String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub full_name: Option<String>,
}

/// Parameters for creating a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
  pub team_name:   String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sport_type:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl NewTeam {
  /// Trimmed copy, or why it cannot be sent. A blank description is dropped.
  pub fn normalized(&self) -> Result<Self, &'static str> {
    let team_name = self.team_name.trim();
    if team_name.is_empty() {
      return Err("team name is required");
    }
    let sport_type = match self.sport_type.as_deref().map(str::trim) {
      Some("") => return Err("sport type must not be blank"),
      other => other.map(str::to_string),
    };
    Ok(Self {
      team_name: team_name.to_string(),
      sport_type,
      description: self
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string),
    })
  }
}

/// Body returned by every token-minting endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
}

/// Body returned by the team listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamsResponse {
  #[serde(default)]
  pub teams: Vec<Team>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// How a backend call failed, as far as the session layer needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
  /// Credentials or token rejected (HTTP 401).
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  /// Any other non-success response, with the server's message.
  #[error("rejected ({status}): {message}")]
  Rejected { status: u16, message: String },

  /// The request never produced a response.
  #[error("network error: {0}")]
  Network(String),

  /// A success response whose body could not be understood.
  #[error("malformed response: {0}")]
  Malformed(String),
}

impl BackendError {
  /// The message worth showing a user.
  pub fn message(&self) -> &str {
    match self {
      Self::Unauthorized(m) | Self::Network(m) | Self::Malformed(m) => m,
      Self::Rejected { message, .. } => message,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the token-issuing backend.
///
/// Every call that mints a token returns the raw token string; decoding and
/// storing it is the caller's job.
pub trait AuthBackend: Send + Sync {
  /// `POST login`: exchange credentials for a token.
  fn login<'a>(
    &'a self,
    username: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<String, BackendError>> + Send + 'a;

  /// `POST register`: create an account. Some deployments sign the new
  /// user straight in and return a token; others return none.
  fn register<'a>(
    &'a self,
    registration: &'a Registration,
  ) -> impl Future<Output = Result<Option<String>, BackendError>> + Send + 'a;

  /// `GET user-teams`: teams visible to the token's subject.
  fn user_teams<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Vec<Team>, BackendError>> + Send + 'a;

  /// `POST set-current-team/{id}`: mint a token whose active team is
  /// `team_id`.
  fn set_current_team<'a>(
    &'a self,
    token: &'a str,
    team_id: &'a str,
  ) -> impl Future<Output = Result<String, BackendError>> + Send + 'a;

  /// `POST create-team`: create a team and mint a token for it.
  fn create_team<'a>(
    &'a self,
    token: &'a str,
    team: &'a NewTeam,
  ) -> impl Future<Output = Result<String, BackendError>> + Send + 'a;
}
