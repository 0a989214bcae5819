//! Core library for slotbook.
//!
//! Everything the terminal client needs that is not presentation:
//!
//! - `auth`: bearer-token decoding, persisted storage and the `SessionStore`
//! - `api`: the `ApiClient` gateway through which every network call passes
//! - `models`: users, slots, bookings and the paginated bookings envelope
//! - `messages`: short-lived user-facing notices
//! - `validation`: client-local form checks that never reach the network
//! - `config`: API base URL resolution and on-disk preferences

pub mod api;
pub mod auth;
pub mod config;
pub mod messages;
pub mod models;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionState, SessionStore};
pub use config::{ApiConfig, Config};
