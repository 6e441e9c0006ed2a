//! Task command implementations.
//!
//! Each command resolves the data directory, loads config and identity,
//! applies the operation through the store, and emits one success envelope.
//! Timestamps are taken once per invocation so a command is internally
//! consistent.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::{self, Identity};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::status::{resolve_status, TaskStatus};
use crate::store::{NewTask, TaskStore};
use crate::storage::Storage;
use crate::task::{Task, TaskKind};
use crate::views::{self, format_time_left};

// =============================================================================
// Shared plumbing
// =============================================================================

pub(crate) fn open_store(data_dir: Option<&Path>) -> Result<TaskStore> {
    let storage = Storage::resolve(data_dir)?;
    let config = Config::load(&storage)?;
    Ok(TaskStore::new(storage, config))
}

pub(crate) fn resolve_user(store: &TaskStore, override_name: Option<&str>) -> Result<Identity> {
    identity::current_user(store.storage(), store.config(), override_name)
}

/// Parse a duration like "90s", "25m", "2h", "1d", "1w".
/// A bare number is minutes.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if s.is_empty() {
        return Err(Error::InvalidArgument("duration cannot be empty".to_string()));
    }

    let (num_str, unit) = if let Some(pos) = s.find(|c: char| !c.is_ascii_digit()) {
        (&s[..pos], &s[pos..])
    } else {
        (s, "m")
    };

    let num: i64 = num_str
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("invalid duration number: {num_str}")))?;
    if num <= 0 {
        return Err(Error::InvalidArgument(
            "duration must be positive".to_string(),
        ));
    }

    let duration = match unit.to_lowercase().as_str() {
        "s" | "sec" | "second" | "seconds" => Duration::seconds(num),
        "m" | "min" | "minute" | "minutes" => Duration::minutes(num),
        "h" | "hr" | "hour" | "hours" => Duration::hours(num),
        "d" | "day" | "days" => Duration::days(num),
        "w" | "week" | "weeks" => Duration::weeks(num),
        _ => {
            return Err(Error::InvalidArgument(format!(
                "invalid duration unit '{unit}'. Expected: s, m, h, d, w"
            )));
        }
    };

    Ok(duration)
}

/// Resolve the deadline from either an absolute RFC 3339 instant or a
/// relative offset from now. Exactly one must be given.
fn parse_deadline(
    absolute: Option<&str>,
    relative: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    match (absolute, relative) {
        (Some(_), Some(_)) => Err(Error::InvalidArgument(
            "pass either --deadline or --in, not both".to_string(),
        )),
        (None, None) => Err(Error::InvalidArgument(
            "a deadline is required: --deadline <rfc3339> or --in <duration>".to_string(),
        )),
        (Some(value), None) => DateTime::parse_from_rfc3339(value.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                Error::InvalidArgument(format!(
                    "invalid deadline '{value}': expected RFC 3339, e.g. 2026-09-01T17:00:00Z"
                ))
            }),
        (None, Some(value)) => Ok(now + parse_duration(value)?),
    }
}

// =============================================================================
// JSON payloads
// =============================================================================

#[derive(Serialize)]
struct TaskRow {
    id: String,
    title: String,
    kind: TaskKind,
    status: TaskStatus,
    deadline: String,
    time_left: String,
    progress: u8,
    members: usize,
}

impl TaskRow {
    fn build(task: &Task, status: TaskStatus, now: DateTime<Utc>) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            kind: task.kind,
            status,
            deadline: task.deadline.to_rfc3339(),
            time_left: format_time_left(task, status, now),
            progress: task.progress_percent(),
            members: task.members.len(),
        }
    }
}

#[derive(Serialize)]
struct TaskDetail {
    #[serde(flatten)]
    row: TaskRow,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    commitment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_link: Option<String>,
    subtasks_done: usize,
    subtasks_total: usize,
    focus_seconds: i64,
    creator: String,
}

// =============================================================================
// new
// =============================================================================

pub struct NewOptions {
    pub title: String,
    pub description: String,
    pub commitment: Option<String>,
    pub group: bool,
    pub deadline: Option<String>,
    pub due_in: Option<String>,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;
    let user = resolve_user(&store, options.user.as_deref())?;

    let deadline = parse_deadline(options.deadline.as_deref(), options.due_in.as_deref(), now)?;
    let kind = if options.group {
        TaskKind::Group
    } else {
        TaskKind::Solo
    };

    let task = store.create_task(
        NewTask {
            title: options.title,
            description: options.description,
            commitment: options.commitment,
            kind,
            deadline,
        },
        &user,
        now,
    )?;
    let status = resolve_status(&task, now);

    let mut human = HumanOutput::new(format!("Created {} task: {}", task.kind, task.title));
    human.push_summary("id", &task.id);
    human.push_summary("status", status.as_str());
    human.push_summary("deadline", task.deadline.to_rfc3339());
    human.push_summary("time left", format_time_left(&task, status, now));
    if let Some(link) = &task.group_link {
        human.push_summary("invite", link.clone());
    }
    if status == TaskStatus::Active {
        human.push_warning("deadline is under an hour away".to_string());
    }
    human.push_next_step(format!("dg show {}", task.id));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "new",
        &TaskRow::build(&task, status, now),
        Some(&human),
    )
}

// =============================================================================
// list
// =============================================================================

pub struct ListOptions {
    pub archive: bool,
    pub all: bool,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;
    let tasks = store.list()?;

    let mut selected = Vec::new();
    if !options.archive || options.all {
        selected.extend(views::dashboard(&tasks, now));
    }
    if options.archive || options.all {
        selected.extend(views::archive(&tasks, now));
    }

    let rows: Vec<TaskRow> = selected
        .iter()
        .map(|view| TaskRow::build(&view.task, view.status, now))
        .collect();

    let label = if options.all {
        "all"
    } else if options.archive {
        "archive"
    } else {
        "dashboard"
    };
    let mut human = HumanOutput::new(format!("Tasks ({label}): {}", rows.len()));
    for view in &selected {
        human.push_detail(format!(
            "[{}] {} {} ({})",
            view.status,
            format_time_left(&view.task, view.status, now),
            view.task.title,
            view.task.id,
        ));
    }
    if selected.is_empty() && !options.archive {
        human.push_next_step("dg new <title> --in <duration>".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "list",
        &rows,
        Some(&human),
    )
}

// =============================================================================
// show
// =============================================================================

pub struct ShowOptions {
    pub task: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;
    let task = store.get(&options.task)?;
    let status = resolve_status(&task, now);

    let detail = TaskDetail {
        row: TaskRow::build(&task, status, now),
        description: task.description.clone(),
        commitment: task.commitment.clone(),
        group_link: task.group_link.clone(),
        subtasks_done: task.subtasks_done(),
        subtasks_total: task.subtasks.len(),
        focus_seconds: task.total_focus_seconds(),
        creator: task.creator_name.clone(),
    };

    let mut human = HumanOutput::new(format!("{} [{}]", task.title, status));
    human.push_summary("id", &task.id);
    human.push_summary("kind", task.kind.to_string());
    human.push_summary("deadline", task.deadline.to_rfc3339());
    human.push_summary("time left", format_time_left(&task, status, now));
    human.push_summary("progress", format!("{}%", task.progress_percent()));
    human.push_summary("creator", &task.creator_name);
    if !task.description.is_empty() {
        human.push_summary("description", &task.description);
    }
    if let Some(commitment) = &task.commitment {
        human.push_summary("commitment", commitment);
    }
    if let Some(link) = &task.group_link {
        human.push_summary("invite", link);
    }
    if !task.members.is_empty() {
        let names: Vec<&str> = task.members.iter().map(|m| m.name.as_str()).collect();
        human.push_summary(
            format!("members ({})", task.members.len()),
            names.join(", "),
        );
    }
    if !task.subtasks.is_empty() {
        human.push_summary(
            "subtasks",
            format!("{}/{}", task.subtasks_done(), task.subtasks.len()),
        );
        for subtask in &task.subtasks {
            let mark = if subtask.completed { "x" } else { " " };
            human.push_detail(format!("[{mark}] {} ({})", subtask.title, subtask.id));
        }
    }
    if !task.focus_sessions.is_empty() {
        human.push_summary(
            "focus",
            format!(
                "{} sessions, {} min total",
                task.focus_sessions.len(),
                task.total_focus_seconds() / 60
            ),
        );
    }
    // Newest update first.
    for update in task.updates.iter().rev() {
        human.push_detail(format!(
            "{} {}: {}",
            update.timestamp.to_rfc3339(),
            update.user_name,
            update.content,
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "show",
        &detail,
        Some(&human),
    )
}

// =============================================================================
// join / leave
// =============================================================================

pub struct MembershipOptions {
    pub task: String,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_join(options: MembershipOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;
    let user = resolve_user(&store, options.user.as_deref())?;

    let task = store.join_task(&options.task, &user, now)?;
    let status = resolve_status(&task, now);

    let mut human = HumanOutput::new(format!("Joined: {}", task.title));
    human.push_summary("member", &user.name);
    human.push_summary("members", task.members.len().to_string());
    human.push_summary("time left", format_time_left(&task, status, now));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "join",
        &TaskRow::build(&task, status, now),
        Some(&human),
    )
}

pub fn run_leave(options: MembershipOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;
    let user = resolve_user(&store, options.user.as_deref())?;

    let task = store.leave_task(&options.task, &user, now)?;
    let status = resolve_status(&task, now);

    let mut human = HumanOutput::new(format!("Left: {}", task.title));
    human.push_summary("members", task.members.len().to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "leave",
        &TaskRow::build(&task, status, now),
        Some(&human),
    )
}

// =============================================================================
// post
// =============================================================================

pub struct PostOptions {
    pub task: String,
    pub content: String,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_post(options: PostOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;
    let user = resolve_user(&store, options.user.as_deref())?;

    let update = store.add_update(&options.task, &options.content, &user, now)?;

    let mut human = HumanOutput::new("Update posted");
    human.push_summary("id", &update.id);
    human.push_summary("by", &update.user_name);
    human.push_summary("at", update.timestamp.to_rfc3339());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "post",
        &update,
        Some(&human),
    )
}

// =============================================================================
// subtask add / toggle
// =============================================================================

pub struct SubtaskAddOptions {
    pub task: String,
    pub title: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_subtask_add(options: SubtaskAddOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;

    let subtask = store.add_subtask(&options.task, &options.title, now)?;

    let mut human = HumanOutput::new(format!("Subtask added: {}", subtask.title));
    human.push_summary("id", &subtask.id);
    human.push_next_step(format!("dg subtask toggle {} {}", options.task, subtask.id));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "subtask add",
        &subtask,
        Some(&human),
    )
}

pub struct SubtaskToggleOptions {
    pub task: String,
    pub subtask: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_subtask_toggle(options: SubtaskToggleOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;

    let subtask = store.toggle_subtask(&options.task, &options.subtask, now)?;
    let task = store.get(&options.task)?;

    let state = if subtask.completed { "done" } else { "open" };
    let mut human = HumanOutput::new(format!("Subtask {state}: {}", subtask.title));
    human.push_summary(
        "subtasks",
        format!("{}/{}", task.subtasks_done(), task.subtasks.len()),
    );
    human.push_summary("progress", format!("{}%", task.progress_percent()));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "subtask toggle",
        &subtask,
        Some(&human),
    )
}

// =============================================================================
// complete
// =============================================================================

pub struct CompleteOptions {
    pub task: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_complete(options: CompleteOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;

    let task = store.complete_task(&options.task, now)?;
    let status = resolve_status(&task, now);

    let mut human = HumanOutput::new(format!("Completed: {}", task.title));
    human.push_summary("id", &task.id);
    human.push_summary("status", status.as_str());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "complete",
        &TaskRow::build(&task, status, now),
        Some(&human),
    )
}

// =============================================================================
// focus
// =============================================================================

pub struct FocusOptions {
    pub task: String,
    pub duration: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_focus(options: FocusOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;

    let seconds = parse_duration(&options.duration)?.num_seconds();
    let session = store.add_focus_session(&options.task, seconds, now)?;
    let task = store.get(&options.task)?;

    let mut human = HumanOutput::new(format!("Focus session logged: {} min", seconds / 60));
    human.push_summary("id", &session.id);
    human.push_summary("from", session.start_time.to_rfc3339());
    human.push_summary("to", session.end_time.to_rfc3339());
    human.push_summary(
        "total focus",
        format!("{} min", task.total_focus_seconds() / 60),
    );

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "focus",
        &session,
        Some(&human),
    )
}

// =============================================================================
// progress
// =============================================================================

pub struct ProgressOptions {
    pub task: String,
    pub value: i64,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_progress(options: ProgressOptions) -> Result<()> {
    let now = Utc::now();
    let store = open_store(options.data_dir.as_deref())?;

    let stored = store.update_manual_progress(&options.task, options.value, now)?;

    #[derive(Serialize)]
    struct ProgressReport {
        task: String,
        progress: u8,
    }

    let mut human = HumanOutput::new(format!("Progress set: {stored}%"));
    if i64::from(stored) != options.value {
        human.push_warning(format!("value {} clamped to {stored}", options.value));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "progress",
        &ProgressReport {
            task: options.task,
            progress: stored,
        },
        Some(&human),
    )
}
