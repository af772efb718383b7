//! Per-entity notification cooldown.
//!
//! The gate is entity-scoped rate limiting, not message-scoped: a
//! burst of findings for the same entity within the cooldown window
//! yields at most one notification. Share it across tasks as
//! `Arc<Mutex<AlertGate>>` and hold the lock across the call so the
//! check and the record stay one atomic step.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Minimum interval between two notifications for the same entity.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Tracks the last notification time per entity and suppresses
/// repeats inside the cooldown window.
#[derive(Debug)]
pub struct AlertGate {
    cooldown: chrono::Duration,
    last_sent: HashMap<String, DateTime<Utc>>,
}

impl AlertGate {
    /// Create a gate with the given cooldown window.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown: chrono::Duration::from_std(cooldown)
                .unwrap_or_else(|_| chrono::Duration::seconds(300)),
            last_sent: HashMap::new(),
        }
    }

    /// Check whether a notification for `entity_id` may go out at
    /// `now`, recording `now` as the last-sent time iff it may.
    ///
    /// The first call for an unseen entity always passes. Entries are
    /// never removed; growth is bounded by the deployment's entity
    /// cardinality.
    pub fn should_send(&mut self, entity_id: &str, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_sent.get(entity_id) {
            let elapsed = now.signed_duration_since(*last);
            if elapsed <= self.cooldown {
                tracing::info!(
                    entity = entity_id,
                    elapsed_secs = elapsed.num_seconds(),
                    "Notification suppressed by cooldown"
                );
                return false;
            }
        }
        self.last_sent.insert(entity_id.to_string(), now);
        true
    }
}

impl Default for AlertGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
