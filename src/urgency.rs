use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::days_remaining;
use crate::models::{MaintenanceTask, TaskId};

/// Window, in days, for the critical list and the "upcoming" counter.
pub const CRITICAL_WINDOW_DAYS: i64 = 7;

/// Window, in days, in which a pending task raises a warning.
pub const WARNING_WINDOW_DAYS: i64 = 3;

/// Severity of an alert.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum NotificationTier {
    Danger,
    Warning,
}

/// An alert raised for a single pending task.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Stable across recomputations: `{kind}-{task_id}`.
    pub id: String,
    pub task_id: TaskId,
    pub title: String,
    pub message: String,
    pub tier: NotificationTier,
    /// The due date that triggered the alert.
    pub date: NaiveDate,
    pub days: i64,
}

/// Computes the alerts for `tasks` as of `today`.
///
/// Only pending tasks with notifications enabled and a due date are
/// considered. Overdue and due-today tasks are `Danger`, tasks due within
/// the next three days are `Warning`. Results keep the input order.
pub fn classify(tasks: &[MaintenanceTask], today: NaiveDate) -> Vec<Notification> {
    tasks
        .iter()
        .filter(|t| t.is_pending() && t.notifications_enabled)
        .filter_map(|t| {
            let due = t.next_date?;
            let days = days_remaining(Some(due), today);
            let (kind, tier, title, message) = if days == 0 {
                (
                    "today",
                    NotificationTier::Danger,
                    "Due today",
                    format!("Maintenance \"{}\" is due today!", t.name),
                )
            } else if days < 0 {
                (
                    "overdue",
                    NotificationTier::Danger,
                    "Overdue",
                    format!("Maintenance \"{}\" is overdue by {} {}!", t.name, -days, plural_days(-days)),
                )
            } else if days <= WARNING_WINDOW_DAYS {
                (
                    "soon",
                    NotificationTier::Warning,
                    "Due soon",
                    format!("Maintenance \"{}\" is due in {} {}.", t.name, days, plural_days(days)),
                )
            } else {
                return None;
            };
            Some(Notification {
                id: format!("{}-{}", kind, t.id),
                task_id: t.id.clone(),
                title: title.to_string(),
                message,
                tier,
                date: due,
                days,
            })
        })
        .collect()
}

fn plural_days(n: i64) -> &'static str {
    if n == 1 { "day" } else { "days" }
}

/// Active tasks due within [`CRITICAL_WINDOW_DAYS`] (overdue included),
/// earliest first.
pub fn critical_tasks(tasks: &[MaintenanceTask], today: NaiveDate) -> Vec<&MaintenanceTask> {
    let mut critical: Vec<&MaintenanceTask> = tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter(|t| days_remaining(t.next_date, today) <= CRITICAL_WINDOW_DAYS)
        .collect();
    critical.sort_by_key(|t| t.next_date);
    critical
}

/// Sorts by due date ascending; tasks without a due date go last.
pub fn sort_by_due(tasks: &mut [MaintenanceTask]) {
    tasks.sort_by_key(|t| (t.next_date.is_none(), t.next_date));
}

/// Status as presented to the user, overdue derived from the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedStatus {
    Pending,
    Overdue,
    Completed,
}

pub fn derived_status(task: &MaintenanceTask, today: NaiveDate) -> DerivedStatus {
    if task.is_completed() {
        DerivedStatus::Completed
    } else if days_remaining(task.next_date, today) < 0 {
        DerivedStatus::Overdue
    } else {
        DerivedStatus::Pending
    }
}

/// Colour band for list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBand {
    Done,
    Overdue,
    Soon,
    Normal,
}

pub fn due_band(task: &MaintenanceTask, today: NaiveDate) -> DueBand {
    if task.is_completed() {
        return DueBand::Done;
    }
    let days = days_remaining(task.next_date, today);
    if days < 0 {
        DueBand::Overdue
    } else if days <= CRITICAL_WINDOW_DAYS {
        DueBand::Soon
    } else {
        DueBand::Normal
    }
}

/// Headline numbers for the dashboard.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Tasks not yet completed.
    pub total: usize,
    /// Active tasks due within the critical window, today included.
    pub upcoming: usize,
    pub overdue: usize,
    /// Cost summed over every task, completed ones included.
    pub total_cost: f64,
}

pub fn dashboard_stats(tasks: &[MaintenanceTask], today: NaiveDate) -> DashboardStats {
    let mut stats = DashboardStats::default();
    for t in tasks {
        stats.total_cost += t.cost.unwrap_or(0.0);
        if t.is_completed() {
            continue;
        }
        stats.total += 1;
        let days = days_remaining(t.next_date, today);
        if days < 0 {
            stats.overdue += 1;
        } else if days <= CRITICAL_WINDOW_DAYS {
            stats.upcoming += 1;
        }
    }
    stats
}

/// Number of active tasks per category, sorted by category name.
pub fn category_breakdown(tasks: &[MaintenanceTask]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in tasks.iter().filter(|t| !t.is_completed()) {
        *counts.entry(t.category.as_str()).or_default() += 1;
    }
    counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// The last `n` tasks with a positive cost, ordered by service date.
pub fn recent_costs(tasks: &[MaintenanceTask], n: usize) -> Vec<&MaintenanceTask> {
    let mut costed: Vec<&MaintenanceTask> = tasks
        .iter()
        .filter(|t| t.cost.unwrap_or(0.0) > 0.0)
        .collect();
    costed.sort_by_key(|t| t.last_date);
    let skip = costed.len().saturating_sub(n);
    costed.into_iter().skip(skip).collect()
}
