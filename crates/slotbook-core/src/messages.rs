//! Short-lived user-facing notices.
//!
//! A message disappears five seconds after it was added, or earlier when
//! dismissed. The queue takes the clock reading as an argument so the
//! lifetime is exact under test.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// How long a message stays visible.
pub const MESSAGE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub severity: Severity,
    created_at: Instant,
}

impl Message {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= MESSAGE_TTL
    }
}

#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: Vec<Message>,
    last_id: u64,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, severity: Severity) -> u64 {
        self.push_at(text, severity, Instant::now())
    }

    pub fn error(&mut self, text: impl Into<String>) -> u64 {
        self.push(text, Severity::Error)
    }

    pub fn success(&mut self, text: impl Into<String>) -> u64 {
        self.push(text, Severity::Success)
    }

    /// Add a message created at `now`. Ids come from the wall clock in
    /// milliseconds and never repeat or go backwards.
    pub fn push_at(&mut self, text: impl Into<String>, severity: Severity, now: Instant) -> u64 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let id = millis.max(self.last_id + 1);
        self.last_id = id;

        self.messages.push(Message {
            id,
            text: text.into(),
            severity,
            created_at: now,
        });
        id
    }

    /// Remove a message. Unknown or already-removed ids are ignored.
    pub fn dismiss(&mut self, id: u64) {
        self.messages.retain(|m| m.id != id);
    }

    /// Dismiss the most recent message, if any.
    pub fn dismiss_latest(&mut self) {
        self.messages.pop();
    }

    /// Drop every message whose lifetime has run out.
    pub fn prune(&mut self, now: Instant) {
        self.messages.retain(|m| !m.is_expired(now));
    }

    pub fn visible(&self, now: Instant) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| !m.is_expired(now))
    }

    pub fn latest(&self, now: Instant) -> Option<&Message> {
        self.visible(now).last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
