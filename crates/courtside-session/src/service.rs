//! [`SessionService`]: the session store and team context.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use courtside_core::{
  backend::{AuthBackend, BackendError, NewTeam, Registration},
  guard::{self, GuardState, Navigation, Route, SessionView},
  storage::{self, SessionStorage, StorageKey},
  team::{self, Team, TeamList},
  token::{self, Claims, Identity},
};
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use strum::IntoEnumIterator as _;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::{Error, Result};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A point-in-time copy of the session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
  #[serde(skip)]
  pub token:       Option<String>,
  /// `None` when there is no token or it failed to decode.
  pub claims:      Option<Claims>,
  pub teams:       TeamList,
  pub active_team: Option<Team>,
  /// Bumped on every token change.
  pub generation:  u64,
}

impl Session {
  pub fn identity(&self) -> Option<Identity> {
    self.claims.as_ref().map(Claims::identity)
  }

  pub fn view(&self) -> SessionView<'_> {
    SessionView {
      has_token: self.token.is_some(),
      claims:    self.claims.as_ref(),
      teams:     &self.teams,
    }
  }

  pub fn guard_state(&self, now: DateTime<Utc>) -> GuardState {
    GuardState::of(self.view(), now)
  }

  fn claimed_team(&self) -> Option<&str> {
    self.claims.as_ref()?.active_team_id.as_deref()
  }

  fn reconcile(&mut self) {
    if !self.teams.is_loaded() {
      return;
    }
    self.active_team =
      team::reconcile(self.claimed_team(), self.teams.teams(), self.active_team.as_ref());
  }
}

/// What a call to [`SessionService::refresh_teams`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
  /// No token; nothing fetched.
  Skipped,
  /// The fetched list replaced the cache.
  Applied,
  /// The token changed while the request was in flight; result dropped.
  Stale,
  /// The request failed; the cache is unchanged.
  Failed,
  /// The backend rejected the token; the session was cleared.
  SignedOut,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Owns the token, the derived identity, the cached team list and the active
/// team, and is the only place any of them change.
///
/// Construct with [`SessionService::init`] and hand it to whatever needs it.
/// Methods take `&self`; internal state sits behind a mutex that is never
/// held across an `.await`. Every change to the session holds `writes` from
/// the in-memory update until storage has caught up, so durable state always
/// matches the last change applied.
pub struct SessionService<B, S> {
  backend: B,
  storage: S,
  state:   Mutex<Session>,
  writes:  AsyncMutex<()>,
}

impl<B, S> SessionService<B, S>
where
  B: AuthBackend,
  S: SessionStorage,
{
  /// Hydrate the session from durable storage. Makes no network calls.
  pub async fn init(backend: B, storage: S) -> Result<Self> {
    let token = storage.get(StorageKey::Token).await.map_err(Error::storage)?;

    let mut session = Session {
      claims: token.as_deref().and_then(decode_logged),
      token,
      ..Session::default()
    };

    if session.token.is_some() {
      if let Some(raw) = storage.get(StorageKey::Teams).await.map_err(Error::storage)? {
        session.teams = storage::decode_teams(&raw).unwrap_or_else(|e| {
          warn!(error = %e, "discarding unreadable cached team list");
          TeamList::NotLoaded
        });
      }
      if let Some(raw) = storage.get(StorageKey::ActiveTeam).await.map_err(Error::storage)? {
        session.active_team = storage::decode_team(&raw)
          .inspect_err(|e| warn!(error = %e, "discarding unreadable cached active team"))
          .ok();
      }
      session.reconcile();
    }

    info!(
      signed_in = session.token.is_some(),
      teams = session.teams.teams().len(),
      "session hydrated"
    );

    Ok(Self {
      backend,
      storage,
      state: Mutex::new(session),
      writes: AsyncMutex::new(()),
    })
  }

  /// Drop in-memory state and invalidate in-flight refreshes. Durable
  /// storage is left alone, so a later `init` picks the session back up.
  pub fn teardown(&self) {
    let mut state = self.state();
    let generation = state.generation + 1;
    *state = Session { generation, ..Session::default() };
    debug!(generation, "session torn down");
  }

  fn state(&self) -> MutexGuard<'_, Session> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn snapshot(&self) -> Session { self.state().clone() }

  pub fn token(&self) -> Option<String> { self.state().token.clone() }

  /// The token together with the generation it belongs to.
  fn credentials(&self) -> Option<(String, u64)> {
    let state = self.state();
    Some((state.token.clone()?, state.generation))
  }

  /// Identity derived from the current token. Never fails: an undecodable
  /// token yields `None`.
  pub fn identity(&self) -> Option<Identity> { self.state().identity() }

  pub fn teams(&self) -> TeamList { self.state().teams.clone() }

  pub fn active_team(&self) -> Option<Team> { self.state().active_team.clone() }

  pub fn guard_state(&self) -> GuardState { self.state().guard_state(Utc::now()) }

  /// Evaluate the route guard for a navigation to `path`, right now.
  pub fn navigate(&self, path: &str) -> Navigation {
    self.navigate_at(path, Utc::now())
  }

  pub fn navigate_at(&self, path: &str, now: DateTime<Utc>) -> Navigation {
    let route = Route::from_path(path);
    let state = self.state().guard_state(now);
    let decision = guard::check(state, &route);
    debug!(path = route.path(), %state, ?decision, "navigation checked");
    decision
  }

  // ── Session store ─────────────────────────────────────────────────────────

  /// Replace the token. `None` signs out and clears the cached team list and
  /// active team along with it.
  ///
  /// A token that fails to decode is still stored; it just has no identity.
  pub async fn set_token(&self, token: Option<String>) -> Result<()> {
    let _writes = self.writes.lock().await;
    let snapshot = {
      let mut state = self.state();
      state.generation += 1;

      match token {
        Some(token) => {
          let claims = decode_logged(&token);
          let same_subject = match (&state.claims, &claims) {
            (Some(old), Some(new)) => old.sub == new.sub,
            _ => state.token.is_none(),
          };
          if !same_subject {
            state.teams = TeamList::NotLoaded;
            state.active_team = None;
          }
          debug!(
            fingerprint = %fingerprint(&token),
            generation = state.generation,
            "token replaced"
          );
          state.token = Some(token);
          state.claims = claims;
          state.reconcile();
        }
        None => {
          let generation = state.generation;
          *state = Session { generation, ..Session::default() };
          debug!(generation, "token cleared");
        }
      }
      state.clone()
    };

    self.persist(&snapshot).await
  }

  /// Sign out.
  pub async fn logout(&self) -> Result<()> {
    info!("signing out");
    self.set_token(None).await
  }

  pub async fn login(&self, username: &str, password: &str) -> Result<()> {
    let token = self
      .backend
      .login(username, password)
      .await
      .map_err(Error::from_login)?;
    info!(username, "signed in");
    self.adopt(token).await
  }

  /// Create an account. Returns `true` if the backend also signed the new
  /// user in.
  pub async fn register(&self, registration: &Registration) -> Result<bool> {
    let token = self
      .backend
      .register(registration)
      .await
      .map_err(Error::from_backend)?;
    info!(username = %registration.username, signed_in = token.is_some(), "registered");
    match token {
      Some(token) => {
        self.adopt(token).await?;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  // ── Team context ──────────────────────────────────────────────────────────

  /// Fetch the team list and replace the cache. Never returns an error.
  ///
  /// The result is applied only if the token is still the one the request
  /// was made with; otherwise it belongs to a superseded session and is
  /// dropped. A 401 for the current token signs the session out.
  pub async fn refresh_teams(&self) -> RefreshOutcome {
    let Some((token, generation)) = self.credentials() else {
      return RefreshOutcome::Skipped;
    };

    let teams = match self.backend.user_teams(&token).await {
      Ok(teams) => teams,
      Err(BackendError::Unauthorized(message)) => {
        warn!(%message, "token rejected while refreshing teams");
        return match self.revoke(generation).await {
          Ok(true) => RefreshOutcome::SignedOut,
          Ok(false) => RefreshOutcome::Stale,
          Err(e) => {
            warn!(error = %e, "failed to clear rejected session from storage");
            RefreshOutcome::SignedOut
          }
        };
      }
      Err(e) => {
        warn!(error = %e, "team list refresh failed; keeping cached list");
        return RefreshOutcome::Failed;
      }
    };

    let _writes = self.writes.lock().await;
    let snapshot = {
      let mut state = self.state();
      if state.generation != generation {
        debug!(
          requested = generation,
          current = state.generation,
          "dropping team list fetched for a superseded token"
        );
        return RefreshOutcome::Stale;
      }
      state.teams = TeamList::Loaded(teams);
      state.reconcile();
      debug!(
        teams = state.teams.teams().len(),
        active = state.active_team.as_ref().map(|t| t.id.as_str()),
        "team list refreshed"
      );
      state.clone()
    };

    if let Err(e) = self.persist(&snapshot).await {
      warn!(error = %e, "failed to persist refreshed team list");
    }
    RefreshOutcome::Applied
  }

  /// Set the active team directly. Local only; no network call.
  pub async fn set_active_team(&self, team: Option<Team>) -> Result<()> {
    let _writes = self.writes.lock().await;
    let snapshot = {
      let mut state = self.state();
      state.active_team = team;
      state.clone()
    };
    self.persist(&snapshot).await
  }

  /// Ask the backend for a token scoped to `team_id`, store it, then refresh
  /// the team list against it.
  ///
  /// On refusal nothing changes; if the backend rejects the token itself the
  /// session is cleared. The active team is not set here: it follows from the
  /// new token's claim when reconciliation runs.
  pub async fn switch_team(&self, team_id: &str) -> Result<()> {
    let (token, generation) = self.credentials().ok_or(Error::NotSignedIn)?;
    let minted = match self.backend.set_current_team(&token, team_id).await {
      Ok(minted) => minted,
      Err(e) => {
        warn!(team_id, error = %e, "team switch refused");
        return Err(self.rejected(generation, Error::from_switch(e)).await);
      }
    };

    info!(team_id, "switched team");
    self.adopt(minted).await
  }

  /// Create a team and move the session into it.
  ///
  /// Names are trimmed and a blank name or sport is refused before anything
  /// is sent.
  pub async fn create_team(&self, team: &NewTeam) -> Result<()> {
    let (token, generation) = self.credentials().ok_or(Error::NotSignedIn)?;
    let team = team.normalized().map_err(|m| Error::Invalid(m.to_string()))?;
    let minted = match self.backend.create_team(&token, &team).await {
      Ok(minted) => minted,
      Err(e) => return Err(self.rejected(generation, Error::from_backend(e)).await),
    };
    info!(team_name = %team.team_name, "created team");
    self.adopt(minted).await
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  /// Store a freshly minted token, then refresh the team list. The token
  /// write completes before the refresh reads it.
  async fn adopt(&self, token: String) -> Result<()> {
    self.set_token(Some(token)).await?;
    self.refresh_teams().await;
    Ok(())
  }

  /// Pass `err` through, first clearing the session if it says the token
  /// issued at `generation` is no longer accepted.
  async fn rejected(&self, generation: u64, err: Error) -> Error {
    if matches!(err, Error::Auth(_))
      && let Err(e) = self.revoke(generation).await
    {
      warn!(error = %e, "failed to clear rejected session from storage");
    }
    err
  }

  /// Sign out because the backend refused the token of `generation`. A newer
  /// token is left alone. Returns whether the session was cleared.
  async fn revoke(&self, generation: u64) -> Result<bool> {
    let _writes = self.writes.lock().await;
    let snapshot = {
      let mut state = self.state();
      if state.generation != generation {
        return Ok(false);
      }
      let generation = generation + 1;
      *state = Session { generation, ..Session::default() };
      warn!(generation, "session token rejected by backend; signed out");
      state.clone()
    };
    self.persist(&snapshot).await?;
    Ok(true)
  }

  /// Write the snapshot's token, team list and active team to storage.
  /// Callers hold `writes`.
  async fn persist(&self, session: &Session) -> Result<()> {
    if session.token.is_none() {
      for key in StorageKey::iter() {
        self.storage.remove(key).await.map_err(Error::storage)?;
      }
      return Ok(());
    }

    let writes = [
      (StorageKey::Token, session.token.clone()),
      (StorageKey::Teams, match &session.teams {
        TeamList::Loaded(teams) => Some(storage::encode_teams(teams)?),
        TeamList::NotLoaded => None,
      }),
      (StorageKey::ActiveTeam, session.active_team.as_ref().map(storage::encode_team).transpose()?),
    ];

    for (key, value) in writes {
      let written = match value {
        Some(value) => self.storage.set(key, value).await,
        None => self.storage.remove(key).await,
      };
      written.map_err(Error::storage)?;
    }
    Ok(())
  }
}

/// Decode a token, logging (not propagating) failure.
fn decode_logged(token: &str) -> Option<Claims> {
  token::decode(token)
    .inspect_err(|e| {
      warn!(fingerprint = %fingerprint(token), error = %e, "token could not be decoded")
    })
    .ok()
}

/// Short digest of a token, safe to log.
pub(crate) fn fingerprint(token: &str) -> String {
  let digest = Sha256::digest(token.as_bytes());
  hex::encode(&digest[..6])
}
