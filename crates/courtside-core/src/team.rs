//! Teams (tenant workspaces) and the active-team reconciliation rule.

use serde::{Deserialize, Serialize};

/// A tenant workspace grouping users and data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
  pub id:          String,
  pub name:        String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sport_type:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub schema_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl Team {
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id:          id.into(),
      name:        name.into(),
      sport_type:  None,
      schema_name: None,
      description: None,
    }
  }
}

// ─── Cached list ─────────────────────────────────────────────────────────────

/// The client's cached copy of the server-owned team list.
///
/// `NotLoaded` and `Loaded(vec![])` mean different things: the first is
/// "don't know yet", the second is "this user has no teams".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "teams", rename_all = "snake_case")]
pub enum TeamList {
  #[default]
  NotLoaded,
  Loaded(Vec<Team>),
}

impl TeamList {
  pub fn teams(&self) -> &[Team] {
    match self {
      Self::NotLoaded => &[],
      Self::Loaded(teams) => teams,
    }
  }

  pub fn is_loaded(&self) -> bool { matches!(self, Self::Loaded(_)) }

  pub fn find(&self, id: &str) -> Option<&Team> {
    self.teams().iter().find(|t| t.id == id)
  }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Decide which team is active, given the token's claim, the team list and
/// the currently active team.
///
/// In priority order:
/// 1. an empty list leaves no active team;
/// 2. a claim naming a listed team wins, since the token is the source of
///    truth;
/// 3. a current team that is still listed stays (with its listed data);
/// 4. otherwise the first listed team.
pub fn reconcile(
  claim:   Option<&str>,
  teams:   &[Team],
  current: Option<&Team>,
) -> Option<Team> {
  let first = teams.first()?;

  if let Some(id) = claim
    && let Some(team) = teams.iter().find(|t| t.id == id)
  {
    return Some(team.clone());
  }

  if let Some(current) = current
    && let Some(team) = teams.iter().find(|t| t.id == current.id)
  {
    return Some(team.clone());
  }

  Some(first.clone())
}
