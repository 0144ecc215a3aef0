//! Async HTTP client for the Courtside REST API.

use std::time::Duration;

use courtside_core::{
  backend::{AuthBackend, BackendError, NewTeam, Registration, TeamsResponse, TokenResponse},
  team::Team,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

/// Connection settings for the Courtside API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Server root, e.g. `http://localhost:5000`. The `/api/...` paths are
  /// appended to it.
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:5000".to_string(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// [`AuthBackend`] over HTTP.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpBackend {
  client:   Client,
  base_url: Url,
}

impl HttpBackend {
  pub fn new(config: ApiConfig) -> Result<Self, BackendError> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {e}")))?;
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| BackendError::Network(format!("invalid base URL {:?}: {e}", config.base_url)))?;
    Ok(Self { client, base_url })
  }

  /// `<base>/api/<segments...>`, with each segment percent-encoded.
  pub(crate) fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().push("api").extend(segments);
    }
    url
  }

  fn bearer(req: RequestBuilder, token: &str) -> RequestBuilder { req.bearer_auth(token) }

  async fn send(req: RequestBuilder, what: &str) -> Result<Response, BackendError> {
    let resp = req
      .send()
      .await
      .map_err(|e| BackendError::Network(format!("{what} failed: {e}")))?;
    debug!(what, status = resp.status().as_u16(), "response");

    if resp.status().is_success() {
      Ok(resp)
    } else {
      Err(rejection(resp).await)
    }
  }

  async fn json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, BackendError> {
    resp
      .json()
      .await
      .map_err(|e| BackendError::Malformed(format!("deserialising {what}: {e}")))
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// FastAPI puts messages in `detail`; other handlers use `message`/`error`.
#[derive(Deserialize)]
struct ErrorBody {
  detail:  Option<serde_json::Value>,
  message: Option<String>,
  error:   Option<String>,
}

impl ErrorBody {
  fn into_message(self) -> Option<String> {
    match self.detail {
      Some(serde_json::Value::String(s)) => Some(s),
      Some(other) => Some(other.to_string()),
      None => self.message.or(self.error),
    }
  }
}

/// Turn a non-success response into a [`BackendError`], keeping the
/// server's message when it sent one.
async fn rejection(resp: Response) -> BackendError {
  let status = resp.status();
  let body   = resp.text().await.unwrap_or_default();
  let message = serde_json::from_str::<ErrorBody>(&body)
    .ok()
    .and_then(ErrorBody::into_message)
    .unwrap_or_else(|| {
      status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
    });

  if status == StatusCode::UNAUTHORIZED {
    BackendError::Unauthorized(message)
  } else {
    BackendError::Rejected {
      status: status.as_u16(),
      message,
    }
  }
}

// ─── AuthBackend impl ────────────────────────────────────────────────────────

/// Registration may or may not sign the user in.
#[derive(Deserialize)]
struct RegisterResponse {
  access_token: Option<String>,
}

impl AuthBackend for HttpBackend {
  /// `POST /api/login/login` (form-encoded, OAuth2 password flow)
  async fn login(&self, username: &str, password: &str) -> Result<String, BackendError> {
    let req = self
      .client
      .post(self.url(&["login", "login"]))
      .form(&[("username", username), ("password", password)]);
    let resp = Self::send(req, "POST /login/login").await?;
    let body: TokenResponse = Self::json(resp, "login token").await?;
    Ok(body.access_token)
  }

  /// `POST /api/login/register`
  async fn register(&self, registration: &Registration) -> Result<Option<String>, BackendError> {
    let req = self
      .client
      .post(self.url(&["login", "register"]))
      .json(registration);
    let resp = Self::send(req, "POST /login/register").await?;

    // An empty or token-less body just means "registered, not signed in".
    let body = resp
      .text()
      .await
      .map_err(|e| BackendError::Network(format!("reading register response: {e}")))?;
    Ok(
      serde_json::from_str::<RegisterResponse>(&body)
        .ok()
        .and_then(|r| r.access_token),
    )
  }

  /// `GET /api/teams/user-teams`
  async fn user_teams(&self, token: &str) -> Result<Vec<Team>, BackendError> {
    let req  = Self::bearer(self.client.get(self.url(&["teams", "user-teams"])), token);
    let resp = Self::send(req, "GET /teams/user-teams").await?;
    let body: TeamsResponse = Self::json(resp, "team list").await?;
    Ok(body.teams)
  }

  /// `POST /api/teams/set-current-team/{id}`
  async fn set_current_team(&self, token: &str, team_id: &str) -> Result<String, BackendError> {
    let url  = self.url(&["teams", "set-current-team", team_id]);
    let req  = Self::bearer(self.client.post(url), token);
    let resp = Self::send(req, "POST /teams/set-current-team").await?;
    let body: TokenResponse = Self::json(resp, "team switch token").await?;
    Ok(body.access_token)
  }

  /// `POST /api/teams/create-team`
  async fn create_team(&self, token: &str, team: &NewTeam) -> Result<String, BackendError> {
    let req = Self::bearer(
      self.client.post(self.url(&["teams", "create-team"])).json(team),
      token,
    );
    let resp = Self::send(req, "POST /teams/create-team").await?;
    let body: TokenResponse = Self::json(resp, "create team token").await?;
    Ok(body.access_token)
  }
}
