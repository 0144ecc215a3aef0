//! Core types and trait definitions for the Courtside session layer.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the token decoder, the team reconciliation rule, the route guard and
//! the two seams the session service is generic over: [`backend::AuthBackend`]
//! and [`storage::SessionStorage`].

// Native `async fn` in traits; the trait signatures spell out `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod backend;
pub mod error;
pub mod guard;
pub mod storage;
pub mod team;
pub mod token;

pub use error::{DecodeError, Error, Result};
