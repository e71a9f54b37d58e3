//! Completion state machine.
//!
//! Completing a task moves it from `Pending` to `Completed` and, for tasks
//! with a mechanical periodicity, appends a pending successor scheduled one
//! interval after the date just serviced. Nothing is ever removed: completed
//! records stay in the collection as history.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::dates::add_interval;
use crate::models::{MaintenanceTask, TaskId, TaskStatus};

/// Source of fresh task identifiers.
pub trait IdProvider {
    fn next_id(&mut self) -> TaskId;
}

/// Issues random UUID v4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn next_id(&mut self) -> TaskId {
        Uuid::new_v4().to_string()
    }
}

impl<F> IdProvider for F
where
    F: FnMut() -> TaskId,
{
    fn next_id(&mut self) -> TaskId {
        self()
    }
}

/// Builds the next occurrence of `task`, if its periodicity calls for one.
///
/// The base date is `next_date`, falling back to `last_date`. The successor
/// records the base date as serviced and is due one interval later.
pub fn successor_of(
    task: &MaintenanceTask,
    now: DateTime<Utc>,
    ids: &mut impl IdProvider,
) -> Option<MaintenanceTask> {
    let interval = task.periodicity.interval()?;
    let base = task.next_date.unwrap_or(task.last_date);
    let next_due = add_interval(base, interval)?;

    Some(MaintenanceTask {
        id: ids.next_id(),
        last_date: base,
        next_date: Some(next_due),
        status: TaskStatus::Pending,
        created_at: now,
        completed_at: None,
        ..task.clone()
    })
}

/// Marks the task with `id` as completed at `now` and appends its successor.
///
/// Unknown ids and tasks that are already completed leave the collection
/// untouched.
pub fn complete(
    id: &str,
    mut tasks: Vec<MaintenanceTask>,
    now: DateTime<Utc>,
    ids: &mut impl IdProvider,
) -> Vec<MaintenanceTask> {
    let Some(idx) = tasks.iter().position(|t| t.id == id) else {
        debug!(task = id, "complete: no such task");
        return tasks;
    };
    if tasks[idx].is_completed() {
        debug!(task = id, "complete: already completed");
        return tasks;
    }

    let target = &mut tasks[idx];
    target.status = TaskStatus::Completed;
    target.completed_at = Some(now);
    debug!(task = id, "task completed");

    let successor = successor_of(&tasks[idx], now, ids);
    if let Some(next) = successor {
        debug!(task = id, successor = %next.id, due = ?next.next_date, "spawned next occurrence");
        tasks.push(next);
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Periodicity;
    use chrono::{NaiveDate, TimeZone};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixed() -> impl FnMut() -> TaskId {
        let mut n = 0;
        move || {
            n += 1;
            format!("gen-{}", n)
        }
    }

    #[test]
    fn successor_copies_descriptive_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut task = MaintenanceTask::new("a", "Oil", "Vehicle", d(2024, 1, 1), now);
        task.periodicity = Periodicity::Every3Months;
        task.cost = Some(120.0);
        task.description = "5W-30".into();
        task.notifications_enabled = false;

        let next = successor_of(&task, now, &mut fixed()).unwrap();
        assert_eq!(next.id, "gen-1");
        assert_eq!(next.name, "Oil");
        assert_eq!(next.cost, Some(120.0));
        assert_eq!(next.description, "5W-30");
        assert!(!next.notifications_enabled);
        assert_eq!(next.last_date, d(2024, 1, 1));
        assert_eq!(next.next_date, Some(d(2024, 4, 1)));
    }

    #[test]
    fn custom_and_none_have_no_successor() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut task = MaintenanceTask::new("a", "Paint", "House", d(2024, 1, 1), now);
        assert!(successor_of(&task, now, &mut fixed()).is_none());
        task.periodicity = Periodicity::Custom;
        assert!(successor_of(&task, now, &mut fixed()).is_none());
    }

    #[test]
    fn completing_twice_does_not_spawn_again() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        let mut task = MaintenanceTask::new("a", "Oil", "Vehicle", d(2024, 1, 1), now);
        task.periodicity = Periodicity::Every30Days;

        let mut ids = fixed();
        let once = complete("a", vec![task], now, &mut ids);
        let twice = complete("a", once.clone(), later, &mut ids);
        assert_eq!(once, twice);
        assert_eq!(twice[0].completed_at, Some(now));
    }

    #[test]
    fn uuid_provider_issues_distinct_ids() {
        let mut ids = UuidProvider;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
