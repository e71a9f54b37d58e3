use chrono::NaiveDate;
use upkeep::commands::*;
use upkeep::history::HistoryFilter;
use upkeep::models::{Periodicity, TaskStatus};
use upkeep::storage::{JsonRepository, MemoryRepository, Repository};
use upkeep::Error;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn input(name: &str, category: &str, last: &str, every: Option<&str>) -> TaskInput {
    TaskInput {
        name: name.into(),
        category: category.into(),
        last_date: last.into(),
        periodicity: every.map(String::from),
        notifications: true,
        ..Default::default()
    }
}

#[test]
fn test_add_and_list() {
    let repo = MemoryRepository::default();
    cmd_add(&repo, input("Oil change", "vehicle", "2024-03-01", Some("6m")), true).unwrap();
    cmd_add(&repo, input("Gutters", "House", "2024-01-01", Some("30d")), true).unwrap();

    let tasks = repo.load().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].category, "Vehicle");
    assert_eq!(tasks[0].periodicity, Periodicity::Every6Months);
    assert_eq!(tasks[0].next_date, Some(d(2024, 9, 1)));

    let listed = list_tasks(tasks, &ListOptions::default());
    assert_eq!(listed[0].name, "Gutters");

    let filtered = list_tasks(repo.load().unwrap(), &ListOptions { search: Some("OIL".into()), ..Default::default() });
    assert_eq!(filtered.len(), 1);
}

#[test]
fn test_add_validates_input() {
    let repo = MemoryRepository::default();
    let bad_category = cmd_add(&repo, input("Boat", "Marina", "2024-01-01", None), true);
    assert!(matches!(bad_category, Err(Error::CategoryNotFound(_))));

    let bad_date = cmd_add(&repo, input("Oil", "Vehicle", "01/02/2024", None), true);
    assert!(matches!(bad_date, Err(Error::InvalidDate(_))));

    let bad_every = cmd_add(&repo, input("Oil", "Vehicle", "2024-01-01", Some("weekly")), true);
    assert!(matches!(bad_every, Err(Error::InvalidPeriodicity(_))));

    let mut negative = input("Oil", "Vehicle", "2024-01-01", None);
    negative.cost = Some(-5.0);
    assert!(matches!(cmd_add(&repo, negative, true), Err(Error::InvalidInput(_))));

    assert!(repo.load().unwrap().is_empty());
}

#[test]
fn test_complete_recurring_task() {
    let repo = MemoryRepository::default();
    let mut new = input("Filter", "House", "2024-01-01", Some("30d"));
    new.next_date = Some("2024-02-01".into());
    let id = cmd_add(&repo, new, true).unwrap();

    let successor = cmd_complete(&repo, &id[..6], true).unwrap().expect("successor");
    assert_eq!(successor.next_date, Some(d(2024, 3, 2)));

    let tasks = repo.load().unwrap();
    assert_eq!(tasks.len(), 2);
    let done = tasks.iter().find(|t| t.id == id).unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert!(done.completed_at.is_some());

    // Completing again changes nothing.
    assert!(cmd_complete(&repo, &id, true).unwrap().is_none());
    assert_eq!(repo.load().unwrap().len(), 2);
}

#[test]
fn test_complete_unknown_id_is_error_at_cli() {
    let repo = MemoryRepository::default();
    assert!(matches!(cmd_complete(&repo, "nope", true), Err(Error::TaskNotFound(_))));
}

#[test]
fn test_add_done_spawns_next_occurrence() {
    let repo = MemoryRepository::default();
    let mut new = input("Generator check", "Generator", "2024-01-01", Some("1y"));
    new.done = true;
    cmd_add(&repo, new, true).unwrap();

    let tasks = repo.load().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks[0].is_completed());
    assert_eq!(tasks[1].last_date, d(2025, 1, 1));
    assert_eq!(tasks[1].next_date, Some(d(2026, 1, 1)));
}

#[test]
fn test_edit_status_transitions() {
    let repo = MemoryRepository::default();
    let id = cmd_add(&repo, input("Paint", "House", "2024-01-01", Some("custom")), true).unwrap();

    let done = TaskEdit { status: Some("completed".into()), cost: Some(300.0), ..Default::default() };
    cmd_edit(&repo, &id, done, true).unwrap();
    let tasks = repo.load().unwrap();
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].is_completed());
    assert_eq!(tasks[0].cost, Some(300.0));

    let reopen = TaskEdit { status: Some("pending".into()), next_date: Some("none".into()), ..Default::default() };
    cmd_edit(&repo, &id, reopen, true).unwrap();
    let tasks = repo.load().unwrap();
    assert!(tasks[0].is_pending());
    assert_eq!(tasks[0].completed_at, None);
    assert_eq!(tasks[0].next_date, None);
}

#[test]
fn test_ambiguous_prefix() {
    let repo = MemoryRepository::default();
    cmd_add(&repo, input("A", "House", "2024-01-01", None), true).unwrap();
    cmd_add(&repo, input("B", "House", "2024-01-01", None), true).unwrap();
    assert!(matches!(cmd_remove(&repo, "", true), Err(Error::AmbiguousId(_, 2))));
}

#[test]
fn test_category_in_use_cannot_be_removed() {
    let repo = MemoryRepository::default();
    cmd_category_add(&repo, "Boat".into(), Some("anchor".into()), None, true).unwrap();
    assert!(cmd_category_add(&repo, "boat".into(), None, None, true).is_err());
    let id = cmd_add(&repo, input("Hull", "Boat", "2024-01-01", None), true).unwrap();

    assert!(matches!(cmd_category_remove(&repo, "Boat", true), Err(Error::CategoryInUse(_, 1))));
    cmd_remove(&repo, &id, true).unwrap();
    cmd_category_remove(&repo, "Boat", true).unwrap();
    assert!(repo.load_categories().unwrap().find_by_name("Boat").is_none());
}

#[test]
fn test_history_filter() {
    let repo = MemoryRepository::default();
    let mut cheap = input("Bulb", "House", "2024-01-01", None);
    cheap.cost = Some(5.0);
    cheap.done = true;
    let mut pricey = input("Tires", "Vehicle", "2024-01-01", None);
    pricey.cost = Some(400.0);
    pricey.done = true;
    cmd_add(&repo, cheap, true).unwrap();
    cmd_add(&repo, pricey, true).unwrap();
    cmd_add(&repo, input("Open", "Vehicle", "2024-01-01", None), true).unwrap();

    let all = cmd_history(&repo, &HistoryFilter::default(), true).unwrap();
    assert_eq!(all.len(), 2);
    let filter = HistoryFilter { min_cost: Some(100.0), ..Default::default() };
    let found = cmd_history(&repo, &filter, true).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Tires");
}

#[test]
fn test_json_repository_export_import() {
    let dir = tempfile::tempdir().unwrap();
    let source = JsonRepository::new(dir.path().join("source"));
    cmd_category_add(&source, "Pool".into(), None, None, true).unwrap();
    cmd_add(&source, input("Chlorine", "Pool", "2024-05-01", Some("30d")), true).unwrap();

    let backup = dir.path().join("backup.json");
    cmd_export(&source, &backup, true).unwrap();

    let target = JsonRepository::new(dir.path().join("target"));
    cmd_import(&target, &backup, true).unwrap();
    assert_eq!(target.load().unwrap(), source.load().unwrap());
    assert!(target.load_categories().unwrap().find_by_name("pool").is_some());

    target.delete_all().unwrap();
    assert!(target.load().unwrap().is_empty());
}

#[test]
fn test_alerts_command_uses_classifier() {
    let repo = MemoryRepository::default();
    let today = chrono::Local::now().date_naive();
    let mut overdue = input("Smoke alarm", "House", "2020-01-01", None);
    overdue.next_date = Some((today - chrono::Duration::days(2)).to_string());
    cmd_add(&repo, overdue, true).unwrap();
    let mut muted = input("Muted", "House", "2020-01-01", None);
    muted.next_date = Some(today.to_string());
    muted.notifications = false;
    cmd_add(&repo, muted, true).unwrap();

    let alerts = cmd_alerts(&repo, true).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Overdue");
}
