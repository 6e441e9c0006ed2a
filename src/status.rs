//! Task lifecycle states and the derived-status resolver.
//!
//! Only `completed` is authoritative in storage. Every other state is a
//! function of the deadline and the current wall-clock time, so it is
//! recomputed on every read rather than cached: time advances whether or
//! not anything is written.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// How long before the deadline the execution window opens.
pub fn active_window() -> Duration {
    Duration::hours(1)
}

/// Lifecycle state of a task at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Upcoming,
    Active,
    Completed,
    Expired,
}

impl TaskStatus {
    /// Terminal states admit no further mutation.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Expired)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Upcoming => "upcoming",
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
            TaskStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the lifecycle state of `task` at instant `now`.
///
/// `now` is always an explicit argument so the resolver stays deterministic
/// under test; callers pass `Utc::now()` at the edge.
pub fn resolve_status(task: &Task, now: DateTime<Utc>) -> TaskStatus {
    if task.completed {
        return TaskStatus::Completed;
    }
    if now > task.deadline {
        return TaskStatus::Expired;
    }
    if now >= task.deadline - active_window() {
        return TaskStatus::Active;
    }
    TaskStatus::Upcoming
}
