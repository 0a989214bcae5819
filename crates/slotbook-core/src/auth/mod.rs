//! Authentication module for the current user's session.
//!
//! This module provides:
//! - `decode_expiry`: reads the `exp` claim out of a bearer token
//! - `SessionStorage`: durable key/value storage for `token` and `user`
//! - `SessionStore`: rehydration, login, logout and expiry teardown
//!
//! The store never exposes a half-present identity: a token without a
//! profile, an unreadable profile or an expired token all collapse to an
//! absent session and wipe storage.

pub mod session;
pub mod storage;
pub mod token;

pub use session::{Session, SessionState, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError, TOKEN_KEY, USER_KEY};
pub use token::decode_expiry;
