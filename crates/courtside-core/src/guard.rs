//! Route guard: gate each navigation on the current session state.
//!
//! The guard is a pure function of a [`SessionView`] and the clock. It is
//! re-evaluated on every navigation attempt; nothing here is cached.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::{
  team::TeamList,
  token::Claims,
};

// ─── Routes ──────────────────────────────────────────────────────────────────

pub const LOGIN_PATH: &str = "/";
pub const REGISTER_PATH: &str = "/register";
pub const CREATE_FIRST_TEAM_PATH: &str = "/create-first-team";

/// The console's views. Unknown paths are protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Login,
  Register,
  CreateFirstTeam,
  Tables,
  Dashboard,
  Assistant,
  Other(String),
}

impl Route {
  /// Map a path to a route, ignoring a trailing slash and any query string.
  pub fn from_path(path: &str) -> Self {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = match path.trim_end_matches('/') {
      "" => LOGIN_PATH,
      p => p,
    };
    match path {
      LOGIN_PATH | "/login" => Self::Login,
      REGISTER_PATH => Self::Register,
      CREATE_FIRST_TEAM_PATH => Self::CreateFirstTeam,
      "/tables" => Self::Tables,
      "/dashboard" => Self::Dashboard,
      "/assistant" => Self::Assistant,
      other => Self::Other(other.to_string()),
    }
  }

  pub fn path(&self) -> &str {
    match self {
      Self::Login => LOGIN_PATH,
      Self::Register => REGISTER_PATH,
      Self::CreateFirstTeam => CREATE_FIRST_TEAM_PATH,
      Self::Tables => "/tables",
      Self::Dashboard => "/dashboard",
      Self::Assistant => "/assistant",
      Self::Other(p) => p,
    }
  }

  /// Login and registration are reachable without a session.
  pub fn is_public(&self) -> bool { matches!(self, Self::Login | Self::Register) }

  pub fn is_team_setup(&self) -> bool { matches!(self, Self::CreateFirstTeam) }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// What the guard needs to know about a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
  pub has_token: bool,
  /// `None` when there is no token or it failed to decode.
  pub claims:    Option<&'a Claims>,
  pub teams:     &'a TeamList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
  /// No token, or a token that is undecodable or expired.
  Anonymous,
  /// Token present but no usable team claim.
  AuthenticatedNoTeam,
  /// Token present and its team claim resolves.
  AuthenticatedWithTeam,
}

impl GuardState {
  /// Classify a session.
  ///
  /// Fails closed: an undecodable or expired token is anonymous. A team
  /// claim counts as resolvable while the team list is still unloaded, so a
  /// fresh start does not bounce through team setup before the first fetch
  /// lands; once the list is loaded the claim must name a listed team.
  pub fn of(view: SessionView<'_>, now: DateTime<Utc>) -> Self {
    let Some(claims) = view.claims.filter(|_| view.has_token) else {
      return Self::Anonymous;
    };
    if claims.is_expired(now) {
      return Self::Anonymous;
    }

    let resolvable = claims.active_team_id.as_deref().is_some_and(|id| {
      !view.teams.is_loaded() || view.teams.find(id).is_some()
    });

    if resolvable {
      Self::AuthenticatedWithTeam
    } else {
      Self::AuthenticatedNoTeam
    }
  }
}

// ─── Decision ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "to", rename_all = "snake_case")]
pub enum Navigation {
  Render,
  Redirect(&'static str),
}

/// Decide what happens when navigating to `route` in `state`.
pub fn check(state: GuardState, route: &Route) -> Navigation {
  match state {
    GuardState::Anonymous if route.is_public() => Navigation::Render,
    GuardState::Anonymous => Navigation::Redirect(LOGIN_PATH),
    GuardState::AuthenticatedNoTeam if route.is_public() || route.is_team_setup() => {
      Navigation::Render
    }
    GuardState::AuthenticatedNoTeam => Navigation::Redirect(CREATE_FIRST_TEAM_PATH),
    GuardState::AuthenticatedWithTeam => Navigation::Render,
  }
}
