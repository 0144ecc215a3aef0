//! Session store and team context for Courtside clients.
//!
//! [`SessionService`] is generic over an [`AuthBackend`] and a
//! [`SessionStorage`], so the same logic runs against the real HTTP backend
//! and SQLite storage, or against in-memory doubles in tests.
//!
//! [`AuthBackend`]: courtside_core::backend::AuthBackend
//! [`SessionStorage`]: courtside_core::storage::SessionStorage

mod service;

pub mod error;

pub use error::{Error, Result};
pub use service::{RefreshOutcome, Session, SessionService};
