//! The `SessionStorage` trait: durable client-side state.
//!
//! Plays the role a browser's local storage plays for a web console. The
//! session service persists three independent values through it (the token,
//! the active team and the cached team list) and hydrates them once at
//! startup. Implemented by `courtside-store-sqlite` and, for tests and
//! throwaway sessions, by [`MemoryStorage`].

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Arc, Mutex, PoisonError},
};

use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
  Result,
  team::{Team, TeamList},
};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// The persisted values. Each is readable and writable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StorageKey {
  Token,
  ActiveTeam,
  Teams,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A string key/value store that survives restarts.
///
/// All methods return `Send` futures so implementations can sit behind a
/// multi-threaded runtime.
pub trait SessionStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read a value. Returns `None` if nothing is stored under `key`.
  fn get(
    &self,
    key: StorageKey,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Write a value, replacing any previous one.
  fn set(
    &self,
    key: StorageKey,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a value. Removing an absent key is not an error.
  fn remove(
    &self,
    key: StorageKey,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Encoding ────────────────────────────────────────────────────────────────

pub fn encode_team(team: &Team) -> Result<String> {
  Ok(serde_json::to_string(team)?)
}

pub fn decode_team(raw: &str) -> Result<Team> {
  Ok(serde_json::from_str(raw)?)
}

/// Only a loaded list is ever persisted, so the stored form is a plain array.
pub fn encode_teams(teams: &[Team]) -> Result<String> {
  Ok(serde_json::to_string(teams)?)
}

pub fn decode_teams(raw: &str) -> Result<TeamList> {
  Ok(TeamList::Loaded(serde_json::from_str(raw)?))
}

// ─── In-memory implementation ────────────────────────────────────────────────

/// Process-local storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
  values: Arc<Mutex<HashMap<StorageKey, String>>>,
}

impl MemoryStorage {
  pub fn new() -> Self { Self::default() }

  /// Synchronous peek, for assertions.
  pub fn snapshot(&self, key: StorageKey) -> Option<String> {
    self
      .values
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&key)
      .cloned()
  }
}

impl SessionStorage for MemoryStorage {
  type Error = Infallible;

  async fn get(&self, key: StorageKey) -> Result<Option<String>, Infallible> {
    Ok(self.snapshot(key))
  }

  async fn set(&self, key: StorageKey, value: String) -> Result<(), Infallible> {
    self
      .values
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key, value);
    Ok(())
  }

  async fn remove(&self, key: StorageKey) -> Result<(), Infallible> {
    self
      .values
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&key);
    Ok(())
  }
}
