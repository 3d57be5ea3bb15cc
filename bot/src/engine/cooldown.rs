use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Default time a user must wait between two uses of the command.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    Allowed,
    Denied { remaining: Duration },
}

/// Per-user cooldown keyed by user id, with a fixed set of users that are
/// never held back.
///
/// Entries live in memory only and are never removed. Each check holds the
/// user's map entry across the read and the write, so two concurrent
/// requests from one user can't both get through.
pub struct CooldownTracker {
    last_used: DashMap<String, DateTime<Utc>>,
    window: Duration,
    privileged: HashSet<String>,
}

impl CooldownTracker {
    pub fn new(window: Duration, privileged: HashSet<String>) -> Self {
        Self {
            last_used: DashMap::new(),
            window,
            privileged,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_privileged(&self, user_id: &str) -> bool {
        self.privileged.contains(user_id)
    }

    /// Check whether `user_id` may proceed at `now`, recording `now` as the
    /// last use when it may. Privileged users are always allowed but still
    /// get their timestamp recorded.
    pub fn check_and_record(&self, user_id: &str, now: DateTime<Utc>) -> CooldownDecision {
        let privileged = self.is_privileged(user_id);

        match self.last_used.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let elapsed = now - *entry.get();
                if !privileged && elapsed < self.window {
                    return CooldownDecision::Denied {
                        remaining: self.window.checked_sub(&elapsed).unwrap_or(self.window),
                    };
                }
                entry.insert(now);
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
            }
        }

        CooldownDecision::Allowed
    }

    /// Last recorded use for `user_id`, if any.
    pub fn last_used(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.last_used.get(user_id).map(|t| *t)
    }

    pub fn len(&self) -> usize {
        self.last_used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_used.is_empty()
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_WINDOW_HOURS), HashSet::new())
    }
}
