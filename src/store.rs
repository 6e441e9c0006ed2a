//! Task repository.
//!
//! Owns the durable task collection. Every operation loads the whole
//! collection, mutates the targeted record, and persists the whole
//! collection back atomically; there are no partial writes. Each mutation
//! re-derives the task's status at write time and checks it against the
//! gating table in [`crate::gate`], closing the read-think-write gap where
//! a status computed moments earlier has already been overtaken by the
//! clock.
//!
//! The store is process-local and single-writer. A server-backed or
//! multi-client deployment would have to replace the whole-collection
//! read-modify-write with per-task atomic updates plus optimistic
//! versioning.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gate::Mutation;
use crate::identity::Identity;
use crate::status::{resolve_status, TaskStatus};
use crate::storage::Storage;
use crate::task::{FocusSession, GroupMember, Subtask, Task, TaskCollection, TaskKind, TaskUpdate};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Parameters for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub commitment: Option<String>,
    pub kind: TaskKind,
    pub deadline: DateTime<Utc>,
}

/// Repository over the persisted task collection.
#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
    config: Config,
}

impl TaskStore {
    pub fn new(storage: Storage, config: Config) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Load the whole collection; a missing file is an empty collection.
    pub fn load(&self) -> Result<TaskCollection> {
        let path = self.storage.tasks_file();
        if !path.exists() {
            return Ok(TaskCollection::default());
        }
        self.storage.read_json(&path)
    }

    pub fn list(&self) -> Result<Vec<Task>> {
        Ok(self.load()?.tasks)
    }

    pub fn get(&self, task_id: &str) -> Result<Task> {
        self.load()?
            .get(task_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a task. The deadline must be strictly in the future; group
    /// tasks get an invite link and the creator seeded as first member.
    pub fn create_task(&self, params: NewTask, user: &Identity, now: DateTime<Utc>) -> Result<Task> {
        let title = params.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidArgument("title cannot be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(Error::InvalidArgument(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        let description = params.description.trim();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::InvalidArgument(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        if params.deadline <= now {
            return Err(Error::InvalidArgument(
                "deadline must be in the future".to_string(),
            ));
        }

        let commitment = params
            .commitment
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let mut task = Task::new(
            title,
            description,
            commitment,
            params.kind,
            params.deadline,
            user,
            now,
            None,
        );
        if params.kind == TaskKind::Group {
            task.group_link = Some(self.group_link(&task.id));
        }

        let mut collection = self.load()?;
        collection.tasks.push(task.clone());
        self.save(&collection)?;

        debug!(task_id = %task.id, kind = %task.kind, "task created");
        Ok(task)
    }

    /// Join a group task. Idempotent for existing members, but the status
    /// gate applies first: once the execution window opens, the roster is
    /// closed to everyone, members included.
    pub fn join_task(&self, task_id: &str, user: &Identity, now: DateTime<Utc>) -> Result<Task> {
        self.with_task(task_id, |task| {
            if task.kind != TaskKind::Group {
                return Err(Error::NotAGroupTask(task.id.clone()));
            }
            gate(task, Mutation::Join, now)?;

            if !task.is_member(&user.id) {
                task.members.push(GroupMember {
                    id: user.id.clone(),
                    name: user.name.clone(),
                    joined_at: now,
                });
            }
            Ok(task.clone())
        })
    }

    /// Leave a group task. The creator can never leave; anyone else may
    /// leave until the task reaches a terminal state.
    pub fn leave_task(&self, task_id: &str, user: &Identity, now: DateTime<Utc>) -> Result<Task> {
        self.with_task(task_id, |task| {
            if task.creator_id == user.id {
                return Err(Error::CreatorCannotLeave(task.id.clone()));
            }
            gate(task, Mutation::Leave, now)?;

            task.members.retain(|m| m.id != user.id);
            Ok(task.clone())
        })
    }

    /// Post a progress update. Only allowed inside the execution window.
    pub fn add_update(
        &self,
        task_id: &str,
        content: &str,
        user: &Identity,
        now: DateTime<Utc>,
    ) -> Result<TaskUpdate> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidArgument(
                "update content cannot be empty".to_string(),
            ));
        }

        self.with_task(task_id, |task| {
            gate(task, Mutation::PostUpdate, now)?;

            let update = TaskUpdate {
                id: Uuid::new_v4().to_string(),
                user_id: user.id.clone(),
                user_name: user.name.clone(),
                content: content.to_string(),
                timestamp: now,
            };
            task.updates.push(update.clone());
            Ok(update)
        })
    }

    pub fn add_subtask(&self, task_id: &str, title: &str, now: DateTime<Utc>) -> Result<Subtask> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidArgument(
                "subtask title cannot be empty".to_string(),
            ));
        }

        self.with_task(task_id, |task| {
            gate(task, Mutation::AddSubtask, now)?;

            let subtask = Subtask {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                completed: false,
            };
            task.subtasks.push(subtask.clone());
            Ok(subtask)
        })
    }

    pub fn toggle_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Subtask> {
        self.with_task(task_id, |task| {
            gate(task, Mutation::ToggleSubtask, now)?;

            let id = task.id.clone();
            let subtask = task
                .subtasks
                .iter_mut()
                .find(|s| s.id == subtask_id)
                .ok_or_else(|| Error::SubtaskNotFound {
                    task: id,
                    subtask: subtask_id.to_string(),
                })?;
            subtask.completed = !subtask.completed;
            Ok(subtask.clone())
        })
    }

    /// Mark the task completed. Terminal: no mutation is permitted
    /// afterwards, and an expired task can no longer be completed.
    pub fn complete_task(&self, task_id: &str, now: DateTime<Utc>) -> Result<Task> {
        self.with_task(task_id, |task| {
            gate(task, Mutation::Complete, now)?;
            task.completed = true;
            Ok(task.clone())
        })
    }

    /// Log a finished focus interval ending now.
    pub fn add_focus_session(
        &self,
        task_id: &str,
        duration_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<FocusSession> {
        if duration_seconds <= 0 {
            return Err(Error::InvalidArgument(
                "focus duration must be positive".to_string(),
            ));
        }

        self.with_task(task_id, |task| {
            gate(task, Mutation::LogFocus, now)?;

            let session = FocusSession {
                id: Uuid::new_v4().to_string(),
                start_time: now - Duration::seconds(duration_seconds),
                end_time: now,
                duration: duration_seconds,
                completed: true,
            };
            task.focus_sessions.push(session.clone());
            Ok(session)
        })
    }

    /// Overwrite the self-reported progress, clamped to 0-100.
    pub fn update_manual_progress(
        &self,
        task_id: &str,
        value: i64,
        now: DateTime<Utc>,
    ) -> Result<u8> {
        self.with_task(task_id, |task| {
            gate(task, Mutation::SetProgress, now)?;
            let clamped = value.clamp(0, 100) as u8;
            task.manual_progress = Some(clamped);
            Ok(clamped)
        })
    }

    /// Invite link for a task id, derived from the configured origin.
    pub fn group_link(&self, task_id: &str) -> String {
        format!(
            "{}/join/{}",
            self.config.links.base_url.trim_end_matches('/'),
            task_id
        )
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn save(&self, collection: &TaskCollection) -> Result<()> {
        self.storage.write_json(&self.storage.tasks_file(), collection)
    }

    /// Load, mutate one task, persist. The closure sees the task after the
    /// collection is loaded fresh, so any gate it applies uses current data.
    fn with_task<T>(
        &self,
        task_id: &str,
        f: impl FnOnce(&mut Task) -> Result<T>,
    ) -> Result<T> {
        let mut collection = self.load()?;
        let task = collection
            .get_mut(task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        let result = f(task)?;
        self.save(&collection)?;
        Ok(result)
    }
}

/// Re-derive the task's status and check it against the gating table.
fn gate(task: &Task, mutation: Mutation, now: DateTime<Utc>) -> Result<TaskStatus> {
    let status = resolve_status(task, now);
    if mutation.allows(status) {
        Ok(status)
    } else {
        debug!(task_id = %task.id, operation = mutation.name(), %status, "mutation gated");
        Err(Error::GateBlocked {
            task: task.id.clone(),
            operation: mutation.name(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, TaskStore) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        let store = TaskStore::new(storage, Config::default());
        (temp, store)
    }

    fn user(name: &str) -> Identity {
        Identity {
            id: format!("{name}-id"),
            name: name.to_string(),
        }
    }

    fn new_task(kind: TaskKind, minutes_ahead: i64, now: DateTime<Utc>) -> NewTask {
        NewTask {
            title: "write the draft".to_string(),
            description: String::new(),
            commitment: None,
            kind,
            deadline: now + Duration::minutes(minutes_ahead),
        }
    }

    #[test]
    fn create_rejects_empty_title_and_past_deadline() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let mut params = new_task(TaskKind::Solo, 90, now);
        params.title = "  ".to_string();
        assert!(matches!(
            store.create_task(params, &creator, now),
            Err(Error::InvalidArgument(_))
        ));

        let mut params = new_task(TaskKind::Solo, 90, now);
        params.deadline = now - Duration::seconds(1);
        assert!(matches!(
            store.create_task(params, &creator, now),
            Err(Error::InvalidArgument(_))
        ));

        // Deadline equal to now is not strictly future.
        let mut params = new_task(TaskKind::Solo, 90, now);
        params.deadline = now;
        assert!(store.create_task(params, &creator, now).is_err());
    }

    #[test]
    fn create_rejects_overlong_fields() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let mut params = new_task(TaskKind::Solo, 90, now);
        params.title = "x".repeat(101);
        assert!(store.create_task(params, &creator, now).is_err());

        let mut params = new_task(TaskKind::Solo, 90, now);
        params.description = "y".repeat(501);
        assert!(store.create_task(params, &creator, now).is_err());
    }

    #[test]
    fn group_task_gets_link_and_creator_roster() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Group, 120, now), &creator, now)
            .unwrap();

        assert_eq!(
            task.group_link.as_deref(),
            Some(format!("https://deadline.local/join/{}", task.id).as_str())
        );
        assert_eq!(task.members.len(), 1);
        assert_eq!(task.members[0].id, creator.id);

        let reloaded = store.get(&task.id).unwrap();
        assert_eq!(reloaded, task);
    }

    #[test]
    fn join_is_idempotent_per_member() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");
        let joiner = user("bob");

        let task = store
            .create_task(new_task(TaskKind::Group, 120, now), &creator, now)
            .unwrap();

        let joined = store.join_task(&task.id, &joiner, now).unwrap();
        assert_eq!(joined.members.len(), 2);

        let again = store.join_task(&task.id, &joiner, now).unwrap();
        let bob_entries = again.members.iter().filter(|m| m.id == joiner.id).count();
        assert_eq!(bob_entries, 1);
        assert_eq!(again.members.len(), 2);
    }

    #[test]
    fn join_closes_once_window_opens_even_for_members() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");
        let joiner = user("bob");

        let task = store
            .create_task(new_task(TaskKind::Group, 120, now), &creator, now)
            .unwrap();
        store.join_task(&task.id, &joiner, now).unwrap();

        let in_window = now + Duration::minutes(90);
        let err = store.join_task(&task.id, &joiner, in_window).unwrap_err();
        assert!(matches!(err, Error::GateBlocked { .. }));

        let past = now + Duration::minutes(121);
        assert!(store.join_task(&task.id, &joiner, past).is_err());
    }

    #[test]
    fn join_rejects_solo_tasks_and_unknown_ids() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let solo = store
            .create_task(new_task(TaskKind::Solo, 120, now), &creator, now)
            .unwrap();
        assert!(matches!(
            store.join_task(&solo.id, &user("bob"), now),
            Err(Error::NotAGroupTask(_))
        ));
        assert!(matches!(
            store.join_task("missing", &user("bob"), now),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[test]
    fn creator_can_never_leave() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Group, 120, now), &creator, now)
            .unwrap();
        assert!(matches!(
            store.leave_task(&task.id, &creator, now),
            Err(Error::CreatorCannotLeave(_))
        ));
    }

    #[test]
    fn member_can_leave_until_terminal() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");
        let joiner = user("bob");

        let task = store
            .create_task(new_task(TaskKind::Group, 120, now), &creator, now)
            .unwrap();
        store.join_task(&task.id, &joiner, now).unwrap();

        let left = store.leave_task(&task.id, &joiner, now).unwrap();
        assert_eq!(left.members.len(), 1);

        // Rejoin, then expire the task: leaving is now gated off.
        store.join_task(&task.id, &joiner, now).unwrap();
        let past = now + Duration::minutes(121);
        assert!(matches!(
            store.leave_task(&task.id, &joiner, past),
            Err(Error::GateBlocked { .. })
        ));
    }

    #[test]
    fn updates_require_the_execution_window() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Solo, 120, now), &creator, now)
            .unwrap();

        // Upcoming: rejected.
        assert!(matches!(
            store.add_update(&task.id, "early", &creator, now),
            Err(Error::GateBlocked { .. })
        ));

        // Active: accepted, attributed, timestamped.
        let active = now + Duration::minutes(70);
        let update = store
            .add_update(&task.id, "halfway there", &creator, active)
            .unwrap();
        assert_eq!(update.user_id, creator.id);
        assert_eq!(update.timestamp, active);
        assert_eq!(store.get(&task.id).unwrap().updates.len(), 1);

        // Expired: rejected.
        let past = now + Duration::minutes(121);
        assert!(store.add_update(&task.id, "too late", &creator, past).is_err());

        // Completed: rejected.
        store.complete_task(&task.id, active).unwrap();
        assert!(matches!(
            store.add_update(&task.id, "after the fact", &creator, active),
            Err(Error::GateBlocked { .. })
        ));
    }

    #[test]
    fn subtask_add_toggle_follow_the_same_gate() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Solo, 120, now), &creator, now)
            .unwrap();

        // Adding while upcoming is rejected, same as toggling.
        assert!(store.add_subtask(&task.id, "outline", now).is_err());

        let active = now + Duration::minutes(70);
        let subtask = store.add_subtask(&task.id, "outline", active).unwrap();
        assert!(!subtask.completed);

        let toggled = store.toggle_subtask(&task.id, &subtask.id, active).unwrap();
        assert!(toggled.completed);

        // Toggling again after expiry fails and leaves the flag unchanged.
        let past = now + Duration::minutes(121);
        assert!(matches!(
            store.toggle_subtask(&task.id, &subtask.id, past),
            Err(Error::GateBlocked { .. })
        ));
        let persisted = store.get(&task.id).unwrap();
        assert!(persisted.subtask(&subtask.id).unwrap().completed);
    }

    #[test]
    fn toggle_unknown_subtask_is_not_found() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Solo, 30, now), &creator, now)
            .unwrap();
        assert!(matches!(
            store.toggle_subtask(&task.id, "nope", now),
            Err(Error::SubtaskNotFound { .. })
        ));
    }

    #[test]
    fn completion_is_terminal_and_expired_cannot_complete() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Solo, 120, now), &creator, now)
            .unwrap();

        let done = store.complete_task(&task.id, now).unwrap();
        assert!(done.completed);

        // Second completion is a gate failure, not a silent rewrite.
        assert!(matches!(
            store.complete_task(&task.id, now),
            Err(Error::GateBlocked { .. })
        ));

        // A different task that expired can no longer be completed.
        let other = store
            .create_task(new_task(TaskKind::Solo, 10, now), &creator, now)
            .unwrap();
        let past = now + Duration::minutes(11);
        assert!(matches!(
            store.complete_task(&other.id, past),
            Err(Error::GateBlocked { .. })
        ));
    }

    #[test]
    fn focus_sessions_are_active_only_and_span_backwards() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Solo, 30, now), &creator, now)
            .unwrap();

        let session = store.add_focus_session(&task.id, 1500, now).unwrap();
        assert_eq!(session.end_time, now);
        assert_eq!(session.start_time, now - Duration::seconds(1500));
        assert!(session.completed);

        assert!(store.add_focus_session(&task.id, 0, now).is_err());

        let past = now + Duration::minutes(31);
        assert!(matches!(
            store.add_focus_session(&task.id, 300, past),
            Err(Error::GateBlocked { .. })
        ));
    }

    #[test]
    fn manual_progress_clamps_and_locks_with_the_task() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Solo, 120, now), &creator, now)
            .unwrap();

        // Allowed while upcoming: self-reported planning state.
        assert_eq!(store.update_manual_progress(&task.id, 250, now).unwrap(), 100);
        assert_eq!(store.update_manual_progress(&task.id, -5, now).unwrap(), 0);
        assert_eq!(store.update_manual_progress(&task.id, 40, now).unwrap(), 40);
        assert_eq!(store.get(&task.id).unwrap().manual_progress, Some(40));

        store.complete_task(&task.id, now).unwrap();
        assert!(matches!(
            store.update_manual_progress(&task.id, 90, now),
            Err(Error::GateBlocked { .. })
        ));
    }

    #[test]
    fn persisted_collection_round_trips_across_stores() {
        let (temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(
                NewTask {
                    title: "ship it".to_string(),
                    description: "the whole thing".to_string(),
                    commitment: Some("  a signed release  ".to_string()),
                    kind: TaskKind::Group,
                    deadline: now + Duration::minutes(30),
                },
                &creator,
                now,
            )
            .unwrap();
        store.add_update(&task.id, "progress", &creator, now).unwrap();
        store.add_focus_session(&task.id, 300, now).unwrap();

        // A second store over the same directory sees identical data.
        let second = TaskStore::new(
            Storage::new(temp.path().to_path_buf()),
            Config::default(),
        );
        let reloaded = second.get(&task.id).unwrap();
        assert_eq!(reloaded.commitment.as_deref(), Some("a signed release"));
        assert_eq!(reloaded.deadline, task.deadline);
        assert_eq!(reloaded.updates[0].timestamp, now);
        assert_eq!(reloaded.focus_sessions[0].duration, 300);
    }

    #[test]
    fn upcoming_task_turns_active_with_no_write() {
        let (_temp, store) = store();
        let now = Utc::now();
        let creator = user("ana");

        let task = store
            .create_task(new_task(TaskKind::Solo, 90, now), &creator, now)
            .unwrap();

        assert_eq!(resolve_status(&task, now), TaskStatus::Upcoming);
        let later = now + Duration::minutes(61);
        assert_eq!(
            resolve_status(&store.get(&task.id).unwrap(), later),
            TaskStatus::Active
        );
    }
}
