//! Task data model.
//!
//! A task is a deadline-bound commitment, solo or shared with a group.
//! The nested collections (`members`, `updates`, `subtasks`,
//! `focus_sessions`) keep insertion order; ordering for display is a view
//! concern. The `completed` flag is the only lifecycle state trusted from
//! storage; see [`crate::status`] for how the rest is derived.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;

/// Whether a task is worked alone or with a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Solo,
    Group,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Solo => f.write_str("solo"),
            TaskKind::Group => f.write_str("group"),
        }
    }
}

/// A member of a group task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

/// A progress note posted during the execution window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A checkable step toward the commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// One time-boxed work interval logged against the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Duration in seconds
    pub duration: i64,
    pub completed: bool,
}

/// A deadline-bound commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Immutable once set: the user-authored statement of the deliverable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,
    pub kind: TaskKind,
    /// True once the task was explicitly completed. Terminal.
    #[serde(default)]
    pub completed: bool,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub creator_id: String,
    pub creator_name: String,
    /// Invite link, present iff `kind == Group`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_link: Option<String>,
    /// Present iff `kind == Group`; the creator is always the first entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<GroupMember>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<TaskUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_sessions: Vec<FocusSession>,
    /// Self-reported progress, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_progress: Option<u8>,
}

impl Task {
    /// Build a new task record. Group tasks seed the member roster with the
    /// creator; validation of title and deadline happens in the store.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: &str,
        description: &str,
        commitment: Option<String>,
        kind: TaskKind,
        deadline: DateTime<Utc>,
        creator: &Identity,
        created_at: DateTime<Utc>,
        group_link: Option<String>,
    ) -> Self {
        let members = match kind {
            TaskKind::Group => vec![GroupMember {
                id: creator.id.clone(),
                name: creator.name.clone(),
                joined_at: created_at,
            }],
            TaskKind::Solo => Vec::new(),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            commitment,
            kind,
            completed: false,
            deadline,
            created_at,
            creator_id: creator.id.clone(),
            creator_name: creator.name.clone(),
            group_link,
            members,
            updates: Vec::new(),
            subtasks: Vec::new(),
            focus_sessions: Vec::new(),
            manual_progress: None,
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }

    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    pub fn subtasks_done(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }

    /// Total seconds of logged focus work.
    pub fn total_focus_seconds(&self) -> i64 {
        self.focus_sessions.iter().map(|s| s.duration).sum()
    }

    /// Progress summary: the self-reported value wins; otherwise the
    /// completed-subtask fraction; otherwise zero.
    pub fn progress_percent(&self) -> u8 {
        if let Some(value) = self.manual_progress {
            return value.min(100);
        }
        if self.subtasks.is_empty() {
            return 0;
        }
        let done = self.subtasks_done() as u64;
        ((done * 100) / self.subtasks.len() as u64) as u8
    }

    /// Time left until the deadline, clamped at zero once passed.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.deadline - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }
}

/// The persisted shape of `tasks.json`: the whole collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskCollection {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}
