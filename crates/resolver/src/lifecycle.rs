//! Health lifecycle: map a similarity score plus view history onto a state,
//! and decide when a shard must be purged.

use serde::{Deserialize, Serialize};

/// Scores at or above this are healthy; the summary is still trusted.
pub const HEALTHY_THRESHOLD: f64 = 0.8;
/// Scores below this are stale; the shard is flagged for deletion.
pub const STALE_THRESHOLD: f64 = 0.4;
/// Consecutive stale views before a read deletes the shard.
pub const DEFAULT_MAX_STALE_VIEWS: u32 = 3;

/// Stored health state. `Expired` is a deletion event, not a resting state,
/// so it does not appear here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    #[default]
    Healthy,
    Degraded,
    Stale,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Stale => "stale",
        }
    }

    /// Whether a stored summary can still be trusted at view time.
    /// Degraded and stale shards always show raw resolved content.
    pub fn shows_summary(&self) -> bool {
        matches!(self, HealthState::Healthy)
    }
}

/// State is a pure function of the current score; never sticky.
pub fn state_for_score(score: f64) -> HealthState {
    if score >= HEALTHY_THRESHOLD {
        HealthState::Healthy
    } else if score >= STALE_THRESHOLD {
        HealthState::Degraded
    } else {
        HealthState::Stale
    }
}

/// What a resolution decided about a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep the shard with the updated fields.
    Keep,
    /// This read exhausted the stale-view budget: delete the shard and tell
    /// the caller it is gone instead of showing stale content again.
    Expire,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub score: f64,
    pub state: HealthState,
    pub stale_view_count: u32,
    pub disposition: Disposition,
}

/// Consumes similarity scores and drives the decay/expiry lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleEngine {
    max_stale_views: u32,
}

impl Default for LifecycleEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STALE_VIEWS)
    }
}

impl LifecycleEngine {
    pub fn new(max_stale_views: u32) -> Self {
        Self {
            max_stale_views: max_stale_views.max(1),
        }
    }

    pub fn max_stale_views(&self) -> u32 {
        self.max_stale_views
    }

    /// Observe one resolution. Entering `Stale` from a non-stale state
    /// restarts the counter; every resolution observed while stale counts
    /// against the budget, and the view that reaches it expires the shard.
    pub fn observe(&self, previous: HealthState, previous_count: u32, score: f64) -> Observation {
        let state = state_for_score(score);
        if state != HealthState::Stale {
            return Observation {
                score,
                state,
                stale_view_count: 0,
                disposition: Disposition::Keep,
            };
        }

        let stale_view_count = if previous == HealthState::Stale {
            previous_count.saturating_add(1)
        } else {
            1
        };
        let disposition = if stale_view_count >= self.max_stale_views {
            Disposition::Expire
        } else {
            Disposition::Keep
        };
        Observation {
            score,
            state,
            stale_view_count,
            disposition,
        }
    }

    /// Stale views left before expiry, for warning messages.
    pub fn views_remaining(&self, stale_view_count: u32) -> u32 {
        self.max_stale_views.saturating_sub(stale_view_count)
    }
}
