//! Queries over completed maintenance records.

use chrono::NaiveDate;

use crate::models::MaintenanceTask;

/// Criteria for the history view. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub category: Option<String>,
    /// Bounds on the scheduled due date. Records without one always pass.
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    /// Bounds on the date the work was done.
    pub done_from: Option<NaiveDate>,
    pub done_to: Option<NaiveDate>,
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
}

impl HistoryFilter {
    pub fn matches(&self, task: &MaintenanceTask) -> bool {
        if let Some(category) = &self.category {
            if &task.category != category {
                return false;
            }
        }
        if let Some(due) = task.next_date {
            if self.due_from.is_some_and(|from| due < from) {
                return false;
            }
            if self.due_to.is_some_and(|to| due > to) {
                return false;
            }
        }
        let done = done_date(task);
        if self.done_from.is_some_and(|from| done < from) || self.done_to.is_some_and(|to| done > to) {
            return false;
        }
        let cost = task.cost.unwrap_or(0.0);
        if self.min_cost.is_some_and(|min| cost < min) || self.max_cost.is_some_and(|max| cost > max) {
            return false;
        }
        true
    }
}

/// The day the work was done: completion date, or the service date for
/// records completed before completion timestamps were kept.
pub fn done_date(task: &MaintenanceTask) -> NaiveDate {
    task.completed_at
        .map(|at| at.date_naive())
        .unwrap_or(task.last_date)
}

/// Completed tasks matching `filter`, most recently completed first.
pub fn history<'a>(tasks: &'a [MaintenanceTask], filter: &HistoryFilter) -> Vec<&'a MaintenanceTask> {
    let mut done: Vec<&MaintenanceTask> = tasks
        .iter()
        .filter(|t| t.is_completed())
        .filter(|t| filter.matches(t))
        .collect();
    done.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    done
}

pub fn total_cost(tasks: &[&MaintenanceTask]) -> f64 {
    tasks.iter().map(|t| t.cost.unwrap_or(0.0)).sum()
}
