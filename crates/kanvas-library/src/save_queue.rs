//! Debounced persistence of the live world
//!
//! The queue never looks at store contents. It compares revision counters
//! with those of the last flush: a new revision opens (or restarts) a quiet
//! period, and a flush is due once the period has passed without further
//! changes.

use chrono::{DateTime, Duration, Utc};
use kanvas_core::AutosaveConfig;

/// Revision counters of the live stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Revisions {
    pub assets: u64,
    pub tags: u64,
}

#[derive(Debug, Clone)]
pub struct SaveQueue {
    enabled: bool,
    debounce: Duration,
    saved: Revisions,
    seen: Revisions,
    pending_since: Option<DateTime<Utc>>,
}

impl SaveQueue {
    pub fn new(config: &AutosaveConfig) -> Self {
        Self {
            enabled: config.enabled,
            debounce: i64::try_from(config.debounce_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .unwrap_or(Duration::MAX),
            saved: Revisions::default(),
            seen: Revisions::default(),
            pending_since: None,
        }
    }

    /// Whether `current` differs from what was last flushed
    pub fn is_dirty(&self, current: Revisions) -> bool {
        current != self.saved
    }

    /// Start of the running quiet period, if changes are waiting
    pub fn pending_since(&self) -> Option<DateTime<Utc>> {
        self.pending_since
    }

    /// Check whether a flush is due at `now`.
    ///
    /// Always `false` when autosave is disabled; [`mark_saved`](Self::mark_saved)
    /// after an explicit checkpoint still keeps the queue in step.
    pub fn poll(&mut self, current: Revisions, now: DateTime<Utc>) -> bool {
        if !self.is_dirty(current) {
            self.seen = current;
            self.pending_since = None;
            return false;
        }
        if current != self.seen || self.pending_since.is_none() {
            self.seen = current;
            self.pending_since = Some(now);
        }
        self.enabled
            && self
                .pending_since
                .is_some_and(|since| now - since >= self.debounce)
    }

    /// Record a completed flush
    pub fn mark_saved(&mut self, revisions: Revisions) {
        self.saved = revisions;
        self.seen = revisions;
        self.pending_since = None;
    }
}
