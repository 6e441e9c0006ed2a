//! Canonical mutation-gating table.
//!
//! Every mutating operation re-derives the task's status at the moment of
//! the write and checks it against this table. The table is the single
//! source of truth; individual operations never carry ad hoc status checks.
//!
//! | operation        | permitted statuses |
//! |------------------|--------------------|
//! | join             | upcoming           |
//! | leave            | upcoming, active   |
//! | post update      | active             |
//! | add subtask      | active             |
//! | toggle subtask   | active             |
//! | complete         | upcoming, active   |
//! | log focus        | active             |
//! | set progress     | upcoming, active   |

use crate::status::TaskStatus;

/// A mutating operation subject to status gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Join,
    Leave,
    PostUpdate,
    AddSubtask,
    ToggleSubtask,
    Complete,
    LogFocus,
    SetProgress,
}

impl Mutation {
    /// Statuses in which this mutation is permitted.
    pub fn permitted(self) -> &'static [TaskStatus] {
        use TaskStatus::{Active, Upcoming};
        match self {
            // Membership closes once the execution window opens.
            Mutation::Join => &[Upcoming],
            Mutation::Leave => &[Upcoming, Active],
            Mutation::PostUpdate => &[Active],
            Mutation::AddSubtask => &[Active],
            Mutation::ToggleSubtask => &[Active],
            // Completing an expired or already-completed task is rejected.
            Mutation::Complete => &[Upcoming, Active],
            Mutation::LogFocus => &[Active],
            Mutation::SetProgress => &[Upcoming, Active],
        }
    }

    pub fn allows(self, status: TaskStatus) -> bool {
        self.permitted().contains(&status)
    }

    /// Operation name used in error messages and JSON details.
    pub fn name(self) -> &'static str {
        match self {
            Mutation::Join => "join",
            Mutation::Leave => "leave",
            Mutation::PostUpdate => "post update",
            Mutation::AddSubtask => "add subtask",
            Mutation::ToggleSubtask => "toggle subtask",
            Mutation::Complete => "complete",
            Mutation::LogFocus => "log focus session",
            Mutation::SetProgress => "set progress",
        }
    }
}
