use std::io::{self, Write};
use std::path::Path;

use chrono::{Local, NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::{info, warn};

use crate::categories::{usage_count, CategoryRegistry};
use crate::dates::{days_remaining, parse_date, suggest_next_date, NEVER_EXPIRES};
use crate::error::{Error, Result};
use crate::history::{done_date, history, total_cost, HistoryFilter};
use crate::models::{CategoryDefinition, MaintenanceTask, Periodicity, TaskId, TaskStatus};
use crate::recurrence::{complete, IdProvider, UuidProvider};
use crate::storage::{export_backup, import_backup, JsonRepository, Repository};
use crate::urgency::{
    category_breakdown, classify, critical_tasks, dashboard_stats, due_band, recent_costs, sort_by_due, DueBand,
    Notification, NotificationTier,
};

/// Fields for a new task, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub name: String,
    pub category: String,
    /// Date of the service, `YYYY-MM-DD`.
    pub last_date: String,
    /// Due date; suggested from the periodicity when omitted.
    pub next_date: Option<String>,
    pub periodicity: Option<String>,
    pub cost: Option<f64>,
    pub description: Option<String>,
    pub notifications: bool,
    /// Record the task as already completed.
    pub done: bool,
}

/// Field replacements for an existing task. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub last_date: Option<String>,
    /// `""` or `"none"` clears the due date.
    pub next_date: Option<String>,
    pub periodicity: Option<String>,
    pub cost: Option<f64>,
    pub notifications: Option<bool>,
    pub status: Option<String>,
}

/// Filters for the pending list.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub all: bool,
    pub category: Option<String>,
    pub search: Option<String>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn days_label(days: i64) -> String {
    if days == NEVER_EXPIRES {
        "-".to_string()
    } else if days < 0 {
        format!("{}d overdue", days.abs())
    } else if days == 0 {
        "Today".to_string()
    } else {
        format!("{}d", days)
    }
}

fn band_color(band: DueBand) -> Color {
    match band {
        DueBand::Done => Color::Green,
        DueBand::Overdue => Color::Red,
        DueBand::Soon => Color::Yellow,
        DueBand::Normal => Color::Reset,
    }
}

fn format_cost(cost: Option<f64>) -> String {
    cost.map(|c| format!("{:.2}", c)).unwrap_or_else(|| "-".into())
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn parse_optional_date(raw: &str) -> Result<Option<NaiveDate>> {
    match raw.trim().to_lowercase().as_str() {
        "" | "none" => Ok(None),
        _ => parse_date(raw).map(Some),
    }
}

fn check_cost(cost: Option<f64>) -> Result<Option<f64>> {
    match cost {
        Some(c) if !c.is_finite() || c < 0.0 => Err(Error::InvalidInput(format!(
            "cost must be a non-negative amount, got {}",
            c
        ))),
        other => Ok(other),
    }
}

/// Resolves a full id or a unique id prefix.
pub fn resolve_id(tasks: &[MaintenanceTask], prefix: &str) -> Result<TaskId> {
    if let Some(t) = tasks.iter().find(|t| t.id == prefix) {
        return Ok(t.id.clone());
    }
    let matches: Vec<&MaintenanceTask> = tasks.iter().filter(|t| t.id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(Error::TaskNotFound(prefix.to_string())),
        many => Err(Error::AmbiguousId(prefix.to_string(), many.len())),
    }
}

fn canonical_category(registry: &CategoryRegistry, name: &str) -> Result<String> {
    registry
        .find_by_name(name)
        .map(|c| c.name.clone())
        .ok_or_else(|| Error::CategoryNotFound(name.trim().to_string()))
}

/// Adds a new task and returns its id.
///
/// When no due date is given it is suggested from the periodicity. A task
/// recorded as done goes through the completion engine, so a recurring one
/// immediately gets its next occurrence.
pub fn cmd_add(repo: &dyn Repository, input: TaskInput, silent: bool) -> Result<TaskId> {
    if input.name.trim().is_empty() {
        return Err(Error::InvalidInput("name is required".into()));
    }
    let registry = repo.load_categories()?;
    let category = canonical_category(&registry, &input.category)?;
    let last_date = parse_date(&input.last_date)?;
    let periodicity: Periodicity = match &input.periodicity {
        Some(p) => p.parse()?,
        None => Periodicity::None,
    };
    let next_date = match &input.next_date {
        Some(raw) => parse_optional_date(raw)?,
        None => suggest_next_date(last_date, periodicity),
    };
    let cost = check_cost(input.cost)?;

    let now = Utc::now();
    let mut ids = UuidProvider;
    let mut task = MaintenanceTask::new(ids.next_id(), input.name.trim(), category, last_date, now);
    task.next_date = next_date;
    task.periodicity = periodicity;
    task.cost = cost;
    task.description = input.description.unwrap_or_default();
    task.notifications_enabled = input.notifications;
    let id = task.id.clone();

    let mut tasks = repo.load()?;
    tasks.push(task);
    if input.done {
        tasks = complete(&id, tasks, now, &mut ids);
    }
    repo.save(&tasks)?;
    info!(task = %id, "task added");
    if !silent {
        println!("Task added (id = {})", short_id(&id));
    }
    Ok(id)
}

/// Marks a task as complete, spawning the next occurrence for recurring ones.
pub fn cmd_complete(repo: &dyn Repository, id: &str, silent: bool) -> Result<Option<MaintenanceTask>> {
    let tasks = repo.load()?;
    let id = resolve_id(&tasks, id)?;
    if tasks.iter().any(|t| t.id == id && t.is_completed()) {
        if !silent {
            println!("Task {} is already completed.", short_id(&id));
        }
        return Ok(None);
    }
    let before = tasks.len();
    let tasks = complete(&id, tasks, Utc::now(), &mut UuidProvider);
    repo.save(&tasks)?;

    let successor = if tasks.len() > before { tasks.last().cloned() } else { None };
    if !silent {
        println!("Task {} marked as complete.", short_id(&id));
        if let Some(next) = &successor {
            if let Some(due) = next.next_date {
                println!("Next occurrence ({}) due on {}", short_id(&next.id), due);
            }
        }
    }
    Ok(successor)
}

/// Removes a task by id.
pub fn cmd_remove(repo: &dyn Repository, id: &str, silent: bool) -> Result<()> {
    let mut tasks = repo.load()?;
    let id = resolve_id(&tasks, id)?;
    tasks.retain(|t| t.id != id);
    repo.save(&tasks)?;
    info!(task = %id, "task removed");
    if !silent {
        println!("Task {} removed.", short_id(&id));
    }
    Ok(())
}

/// Replaces fields of an existing task.
///
/// Switching the status to completed runs the completion engine; switching
/// back to pending clears the completion timestamp.
pub fn cmd_edit(repo: &dyn Repository, id: &str, edit: TaskEdit, silent: bool) -> Result<()> {
    let mut tasks = repo.load()?;
    let id = resolve_id(&tasks, id)?;
    let registry = repo.load_categories()?;

    let category = edit.category.as_deref().map(|c| canonical_category(&registry, c)).transpose()?;
    let last_date = edit.last_date.as_deref().map(parse_date).transpose()?;
    let next_date = edit.next_date.as_deref().map(parse_optional_date).transpose()?;
    let periodicity = edit.periodicity.as_deref().map(str::parse::<Periodicity>).transpose()?;
    let status = edit.status.as_deref().map(str::parse::<TaskStatus>).transpose()?;
    let cost = check_cost(edit.cost)?;

    let mut completing = false;
    if let Some(t) = tasks.iter_mut().find(|t| t.id == id) {
        if let Some(n) = edit.name { t.name = n; }
        if let Some(c) = category { t.category = c; }
        if let Some(d) = edit.description { t.description = d; }
        if let Some(d) = last_date { t.last_date = d; }
        if let Some(d) = next_date { t.next_date = d; }
        if let Some(p) = periodicity { t.periodicity = p; }
        if let Some(c) = cost { t.cost = Some(c); }
        if let Some(n) = edit.notifications { t.notifications_enabled = n; }
        match status {
            Some(TaskStatus::Completed) if t.is_pending() => completing = true,
            Some(TaskStatus::Pending) if t.is_completed() => {
                t.status = TaskStatus::Pending;
                t.completed_at = None;
            }
            _ => {}
        }
    }
    if completing {
        tasks = complete(&id, tasks, Utc::now(), &mut UuidProvider);
    }
    repo.save(&tasks)?;
    if !silent {
        println!("Task {} updated.", short_id(&id));
    }
    Ok(())
}

/// Applies the list filters and ordering without printing.
pub fn list_tasks(mut tasks: Vec<MaintenanceTask>, opts: &ListOptions) -> Vec<MaintenanceTask> {
    let search = opts.search.as_ref().map(|s| s.to_lowercase());
    tasks.retain(|t| {
        (opts.all || !t.is_completed())
            && opts.category.as_ref().map_or(true, |c| t.category.eq_ignore_ascii_case(c.trim()))
            && search.as_ref().map_or(true, |s| t.name.to_lowercase().contains(s))
    });
    sort_by_due(&mut tasks);
    tasks
}

/// Lists tasks in a formatted table, earliest due first.
pub fn cmd_list(repo: &dyn Repository, opts: &ListOptions) -> Result<()> {
    let tasks = list_tasks(repo.load()?, opts);
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(header(&["ID", "Name", "Category", "Last", "Next", "Time Left", "Every", "Cost", "Status"]));

    let today = today();
    for t in &tasks {
        let band = due_band(t, today);
        let days = days_remaining(t.next_date, today);
        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.name),
            Cell::new(&t.category),
            Cell::new(t.last_date),
            Cell::new(t.next_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(if t.is_completed() { "-".to_string() } else { days_label(days) }).fg(band_color(band)),
            Cell::new(t.periodicity.short()),
            Cell::new(format_cost(t.cost)),
            Cell::new(t.status).fg(band_color(band)),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Prints the current notifications and returns them.
pub fn cmd_alerts(repo: &dyn Repository, silent: bool) -> Result<Vec<Notification>> {
    let tasks = repo.load()?;
    let alerts = classify(&tasks, today());
    if silent {
        return Ok(alerts);
    }
    if alerts.is_empty() {
        println!("No alerts.");
        return Ok(alerts);
    }
    let mut table = new_table();
    table.set_header(header(&["Task", "Alert", "Due", "Message"]));
    for n in &alerts {
        let color = match n.tier {
            NotificationTier::Danger => Color::Red,
            NotificationTier::Warning => Color::Yellow,
        };
        table.add_row(vec![
            Cell::new(short_id(&n.task_id)),
            Cell::new(&n.title).fg(color),
            Cell::new(n.date),
            Cell::new(&n.message),
        ]);
    }
    println!("{table}");
    Ok(alerts)
}

/// Prints tasks due within the week, overdue ones first.
pub fn cmd_critical(repo: &dyn Repository) -> Result<()> {
    let tasks = repo.load()?;
    let today = today();
    let critical = critical_tasks(&tasks, today);
    if critical.is_empty() {
        println!("Nothing due in the next 7 days.");
        return Ok(());
    }
    let mut table = new_table();
    table.set_header(header(&["ID", "Name", "Category", "Due", "Time Left"]));
    for t in critical {
        let days = days_remaining(t.next_date, today);
        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.name),
            Cell::new(&t.category),
            Cell::new(t.next_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(days_label(days)).fg(band_color(due_band(t, today))),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Prints dashboard totals, the per-category breakdown and recent costs.
pub fn cmd_stats(repo: &dyn Repository) -> Result<()> {
    let tasks = repo.load()?;
    let stats = dashboard_stats(&tasks, today());

    let mut table = new_table();
    table.set_header(header(&["Active", "Next 7 days", "Overdue", "Total cost"]));
    table.add_row(vec![
        Cell::new(stats.total),
        Cell::new(stats.upcoming).fg(Color::Yellow),
        Cell::new(stats.overdue).fg(if stats.overdue > 0 { Color::Red } else { Color::Reset }),
        Cell::new(format!("{:.2}", stats.total_cost)),
    ]);
    println!("{table}");

    let breakdown = category_breakdown(&tasks);
    if !breakdown.is_empty() {
        let mut table = new_table();
        table.set_header(header(&["Category", "Active"]));
        for (name, count) in breakdown {
            table.add_row(vec![Cell::new(name), Cell::new(count)]);
        }
        println!("{table}");
    }

    let recent = recent_costs(&tasks, 5);
    if !recent.is_empty() {
        let mut table = new_table();
        table.set_header(header(&["Recent spend", "Serviced", "Cost"]));
        for t in recent {
            table.add_row(vec![Cell::new(&t.name), Cell::new(t.last_date), Cell::new(format_cost(t.cost))]);
        }
        println!("{table}");
    }
    Ok(())
}

/// Prints completed tasks matching `filter` and returns them.
pub fn cmd_history(repo: &dyn Repository, filter: &HistoryFilter, silent: bool) -> Result<Vec<MaintenanceTask>> {
    let tasks = repo.load()?;
    let found = history(&tasks, filter);
    let spent = total_cost(&found);
    let found: Vec<MaintenanceTask> = found.into_iter().cloned().collect();
    if silent {
        return Ok(found);
    }
    if found.is_empty() {
        println!("No completed maintenance found.");
        return Ok(found);
    }
    let mut table = new_table();
    table.set_header(header(&["ID", "Name", "Category", "Scheduled", "Done", "Cost"]));
    for t in &found {
        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.name),
            Cell::new(&t.category),
            Cell::new(t.next_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(done_date(t)).fg(Color::Green),
            Cell::new(format_cost(t.cost)),
        ]);
    }
    println!("{table}");
    println!("{} record(s), total spent {:.2}", found.len(), spent);
    Ok(found)
}

/// Adds a category, rejecting duplicate names.
pub fn cmd_category_add(repo: &dyn Repository, name: String, icon: Option<String>, color: Option<String>, silent: bool) -> Result<()> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput("category name is required".into()));
    }
    let mut registry = repo.load_categories()?;
    if registry.find_by_name(&name).is_some() {
        return Err(Error::InvalidInput(format!("category '{}' already exists", name)));
    }
    registry.upsert(CategoryDefinition {
        id: UuidProvider.next_id(),
        name: name.clone(),
        icon: icon.unwrap_or_else(|| "tag".into()),
        color: color.unwrap_or_else(|| "slate".into()),
    });
    repo.save_categories(&registry)?;
    if !silent {
        println!("Category '{}' added.", name);
    }
    Ok(())
}

/// Lists categories with the number of tasks referring to each.
pub fn cmd_category_list(repo: &dyn Repository) -> Result<()> {
    let registry = repo.load_categories()?;
    let tasks = repo.load()?;
    let mut table = new_table();
    table.set_header(header(&["Name", "Icon", "Color", "Tasks"]));
    for c in registry.all() {
        table.add_row(vec![
            Cell::new(&c.name),
            Cell::new(&c.icon),
            Cell::new(&c.color),
            Cell::new(usage_count(&c.name, &tasks)),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Removes a category unless a task still refers to it.
pub fn cmd_category_remove(repo: &dyn Repository, name: &str, silent: bool) -> Result<()> {
    let mut registry = repo.load_categories()?;
    let category = registry
        .find_by_name(name)
        .cloned()
        .ok_or_else(|| Error::CategoryNotFound(name.to_string()))?;
    let used = usage_count(&category.name, &repo.load()?);
    if used > 0 {
        warn!(category = %category.name, used, "refusing to delete category in use");
        return Err(Error::CategoryInUse(category.name, used));
    }
    registry.remove(&category.id);
    repo.save_categories(&registry)?;
    if !silent {
        println!("Category '{}' removed.", category.name);
    }
    Ok(())
}

/// Writes a JSON backup of all data to `path`.
pub fn cmd_export(repo: &dyn Repository, path: &Path, silent: bool) -> Result<()> {
    let backup = export_backup(repo, path, Utc::now())?;
    if !silent {
        println!("Exported {} task(s) to {}", backup.records.len(), path.display());
    }
    Ok(())
}

/// Replaces all data with the backup at `path`.
pub fn cmd_import(repo: &dyn Repository, path: &Path, silent: bool) -> Result<()> {
    let backup = import_backup(repo, path)?;
    if !silent {
        println!("Imported {} task(s) from {}", backup.records.len(), path.display());
    }
    Ok(())
}

/// Resets the database by deleting all tasks and categories.
pub fn cmd_reset(repo: &JsonRepository, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all maintenance records and categories? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    repo.delete_all()?;
    println!("Database reset successfully.");
    Ok(())
}
