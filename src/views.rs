//! Derived views over the task collection.
//!
//! Views never mutate and never persist. They take the raw collection plus
//! a single `now` instant, resolve every task's status against that one
//! instant, and partition and order the results. Using one instant for the
//! whole pass keeps a listing internally consistent even when it straddles
//! a status boundary.

use chrono::{DateTime, Utc};

use crate::status::{resolve_status, TaskStatus};
use crate::task::Task;

/// A task paired with its status as of the view's instant.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub task: Task,
    pub status: TaskStatus,
}

/// Live tasks (upcoming or active), most urgent deadline first.
pub fn dashboard(tasks: &[Task], now: DateTime<Utc>) -> Vec<TaskView> {
    let mut views: Vec<TaskView> = tasks
        .iter()
        .map(|task| TaskView {
            task: task.clone(),
            status: resolve_status(task, now),
        })
        .filter(|view| !view.status.is_terminal())
        .collect();
    views.sort_by_key(|view| view.task.deadline);
    views
}

/// Finished tasks (completed or expired), most recent deadline first.
pub fn archive(tasks: &[Task], now: DateTime<Utc>) -> Vec<TaskView> {
    let mut views: Vec<TaskView> = tasks
        .iter()
        .map(|task| TaskView {
            task: task.clone(),
            status: resolve_status(task, now),
        })
        .filter(|view| view.status.is_terminal())
        .collect();
    views.sort_by_key(|view| std::cmp::Reverse(view.task.deadline));
    views
}

/// Countdown string for a deadline: `[<days>d ]HH:MM:SS`, or `EXPIRED`
/// once the deadline has passed on a task that never completed.
pub fn format_time_left(task: &Task, status: TaskStatus, now: DateTime<Utc>) -> String {
    if status == TaskStatus::Expired {
        return "EXPIRED".to_string();
    }
    let left = task.time_remaining(now);
    let total = left.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::identity::Identity;
    use crate::task::TaskKind;

    fn task_due_in(minutes: i64, now: DateTime<Utc>) -> Task {
        Task::new(
            &format!("due in {minutes}m"),
            "",
            None,
            TaskKind::Solo,
            now + Duration::minutes(minutes),
            &Identity {
                id: "u1".to_string(),
                name: "u".to_string(),
            },
            now,
            None,
        )
    }

    #[test]
    fn dashboard_orders_by_ascending_deadline() {
        let now = Utc::now();
        let tasks = vec![
            task_due_in(300, now),
            task_due_in(30, now),
            task_due_in(90, now),
        ];
        let views = dashboard(&tasks, now);
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].task.title, "due in 30m");
        assert_eq!(views[0].status, TaskStatus::Active);
        assert_eq!(views[1].task.title, "due in 90m");
        assert_eq!(views[2].task.title, "due in 300m");
    }

    #[test]
    fn archive_holds_terminal_tasks_newest_first() {
        let now = Utc::now();
        let mut done = task_due_in(30, now);
        done.completed = true;
        let expired_old = task_due_in(-600, now);
        let expired_recent = task_due_in(-10, now);

        let tasks = vec![expired_old.clone(), done.clone(), expired_recent.clone()];
        let views = archive(&tasks, now);
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].task.id, done.id);
        assert_eq!(views[1].task.id, expired_recent.id);
        assert_eq!(views[2].task.id, expired_old.id);

        assert!(dashboard(&tasks, now).is_empty());
    }

    #[test]
    fn partitions_are_disjoint_and_exhaustive() {
        let now = Utc::now();
        let mut done = task_due_in(500, now);
        done.completed = true;
        let tasks = vec![
            task_due_in(30, now),
            task_due_in(-5, now),
            done,
            task_due_in(240, now),
        ];
        let live = dashboard(&tasks, now);
        let finished = archive(&tasks, now);
        assert_eq!(live.len() + finished.len(), tasks.len());
        for view in &live {
            assert!(finished.iter().all(|f| f.task.id != view.task.id));
        }
    }

    #[test]
    fn countdown_formats_hours_and_days() {
        let now = Utc::now();

        let soon = task_due_in(30, now);
        assert_eq!(
            format_time_left(&soon, TaskStatus::Active, now),
            "00:30:00"
        );

        let mut far = task_due_in(0, now);
        far.deadline = now + Duration::days(2) + Duration::hours(3) + Duration::seconds(5);
        assert_eq!(
            format_time_left(&far, TaskStatus::Upcoming, now),
            "2d 03:00:05"
        );

        let gone = task_due_in(-1, now);
        assert_eq!(format_time_left(&gone, TaskStatus::Expired, now), "EXPIRED");
    }
}
