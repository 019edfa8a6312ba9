//! Process-lifetime pod identity.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Identifier generated once per process start, used to tell replicas apart.
#[derive(Debug, Clone)]
pub struct PodIdentity {
    id: Uuid,
    started_at: DateTime<Utc>,
}

impl PodIdentity {
    /// Generate a fresh identity stamped with the current time.
    pub fn generate() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Start time rendered as RFC3339 with millisecond precision.
    pub fn started_at_rfc3339(&self) -> String {
        self.started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Whole seconds elapsed since start. Never negative, even if the wall
    /// clock steps backwards.
    pub fn uptime_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }
}

/// Current time as RFC3339 with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
