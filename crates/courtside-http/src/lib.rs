//! HTTP implementation of [`AuthBackend`] for the Courtside REST API.
//!
//! Transport concerns (timeouts, TLS) live here; the session layer only sees
//! [`BackendError`] values.
//!
//! [`AuthBackend`]: courtside_core::backend::AuthBackend
//! [`BackendError`]: courtside_core::backend::BackendError

mod client;

pub use client::{ApiConfig, HttpBackend};
