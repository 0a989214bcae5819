use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::storage::{SessionStorage, TOKEN_KEY, USER_KEY};
use super::token::decode_expiry;
use crate::models::{Role, User};

/// The authenticated identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
    /// Decoded from the token's `exp` claim. `None` only for sessions
    /// created by a login whose token carried no readable expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at.map(|exp| exp - now)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.time_until_expiry(now).map(|d| d.num_minutes().max(0))
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// Snapshot of the store handed to readers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// `initialize` has not completed yet.
    #[default]
    Loading,
    Absent,
    Active(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }
}

/// Single source of truth for who is logged in.
///
/// Either fully absent or fully present with an unexpired token; every
/// failure path collapses to absent. Mutations are serialized through the
/// internal lock, readers get cloned snapshots.
///
/// A store is retired when the shell replaces it. Calls still holding a
/// retired store can change its in-memory state but never the shared
/// storage, which by then belongs to the replacement.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    state: RwLock<SessionState>,
    retired: AtomicBool,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            state: RwLock::new(SessionState::Loading),
            retired: AtomicBool::new(false),
        }
    }

    /// Rehydrate from storage. Runs once; later calls return the current
    /// snapshot without touching storage.
    pub fn initialize(&self, now: DateTime<Utc>) -> SessionState {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if !state.is_loading() {
            return state.clone();
        }

        *state = match self.rehydrate(now) {
            Some(session) => {
                info!(user = %session.user.email, role = %session.user.role, "Session restored");
                SessionState::Active(session)
            }
            None => {
                self.clear_storage();
                SessionState::Absent
            }
        };
        state.clone()
    }

    fn rehydrate(&self, now: DateTime<Utc>) -> Option<Session> {
        let token = self.read_key(TOKEN_KEY)?;
        let user_json = self.read_key(USER_KEY)?;

        let user: User = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user profile is unreadable");
                return None;
            }
        };

        let Some(expires_at) = decode_expiry(&token) else {
            debug!("Stored token has no readable expiry");
            return None;
        };
        if expires_at <= now {
            info!(%expires_at, "Stored token has expired");
            return None;
        }

        Some(Session {
            token,
            user,
            expires_at: Some(expires_at),
        })
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => {
                debug!(key, "Storage key missing");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read storage");
                None
            }
        }
    }

    /// Activate a session from a successful login response. The token is
    /// trusted as issued; its expiry is only decoded for display and for
    /// the next rehydration.
    pub fn login(&self, token: String, user: User, role: Role) -> Session {
        let user = user.with_role(role);
        let session = Session {
            expires_at: decode_expiry(&token),
            token,
            user,
        };

        if self.is_retired() {
            warn!("Login finished on a retired session store, not persisting");
        } else {
            self.persist(&session);
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = SessionState::Active(session.clone());
        info!(user = %session.user.email, role = %session.user.role, "Logged in");
        session
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.storage.set(TOKEN_KEY, &session.token) {
            warn!(error = %e, "Failed to persist token");
        }
        match serde_json::to_string(&session.user) {
            Ok(json) => {
                if let Err(e) = self.storage.set(USER_KEY, &json) {
                    warn!(error = %e, "Failed to persist user profile");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize user profile"),
        }
    }

    /// Clear storage and drop the session. Safe to call when already absent.
    pub fn logout(&self) {
        if self.is_retired() {
            debug!("Logout on a retired session store, storage left alone");
        } else {
            self.clear_storage();
        }
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.is_active() {
            info!("Logged out");
        }
        *state = SessionState::Absent;
    }

    /// Log out if the active session's token has expired. Returns true when
    /// a session was torn down.
    pub fn expire_if_due(&self, now: DateTime<Utc>) -> bool {
        let expired = self
            .state
            .read()
            .map(|s| s.session().map(|sess| sess.is_expired(now)).unwrap_or(false))
            .unwrap_or(false);
        if expired {
            info!("Session token expired");
            self.logout();
        }
        expired
    }

    /// Detach this store from storage for good. Used when the shell
    /// replaces it with a fresh store over the same storage.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Bearer token of the active session, read at call time.
    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .session()
            .map(|s| s.token.clone())
    }

    fn clear_storage(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to clear storage key");
            }
        }
    }
}
