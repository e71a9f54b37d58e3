use chrono::{Duration, Local, NaiveDate, Utc};
use upkeep::dates::{days_remaining, NEVER_EXPIRES};
use upkeep::models::{MaintenanceTask, TaskStatus};
use upkeep::urgency::{classify, critical_tasks, NotificationTier};

fn due(id: &str, today: NaiveDate, offset: i64) -> MaintenanceTask {
    let mut t = MaintenanceTask::new(id, id, "House", today - Duration::days(90), Utc::now());
    t.next_date = Some(today + Duration::days(offset));
    t
}

#[test]
fn test_days_remaining_sentinel() {
    let today = Local::now().date_naive();
    assert_eq!(days_remaining(None, today), NEVER_EXPIRES);
    assert_eq!(days_remaining(None, NaiveDate::MIN), 999);
}

#[test]
fn test_days_remaining_sign_convention() {
    let today = Local::now().date_naive();
    assert_eq!(days_remaining(Some(today), today), 0);
    assert_eq!(days_remaining(Some(today - Duration::days(5)), today), -5);
    assert_eq!(days_remaining(Some(today + Duration::days(5)), today), 5);
}

#[test]
fn test_disabled_notifications_never_alert() {
    let today = Local::now().date_naive();
    let tasks: Vec<MaintenanceTask> = [-30, -1, 0, 1, 3]
        .iter()
        .map(|offset| {
            let mut t = due(&format!("t{}", offset), today, *offset);
            t.notifications_enabled = false;
            t
        })
        .collect();
    assert!(classify(&tasks, today).is_empty());
}

#[test]
fn test_overdue_and_today_are_danger() {
    let today = Local::now().date_naive();
    let tasks = vec![due("late", today, -4), due("now", today, 0), due("soon", today, 2), due("far", today, 10)];
    let alerts = classify(&tasks, today);

    assert_eq!(alerts.len(), 3);
    let danger: Vec<&str> = alerts
        .iter()
        .filter(|n| n.tier == NotificationTier::Danger)
        .map(|n| n.task_id.as_str())
        .collect();
    assert_eq!(danger, vec!["late", "now"]);
    assert_eq!(alerts[0].days, -4);
    assert!(alerts[0].message.contains("overdue by 4 days"));
    assert_eq!(alerts[2].tier, NotificationTier::Warning);
}

#[test]
fn test_completed_tasks_leave_alerts_and_critical_view() {
    let today = Local::now().date_naive();
    let mut done = due("done", today, -1);
    done.status = TaskStatus::Completed;
    done.completed_at = Some(Utc::now());
    let tasks = vec![done, due("open", today, 6)];

    assert!(classify(&tasks, today).is_empty());
    let critical = critical_tasks(&tasks, today);
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].id, "open");
}

#[test]
fn test_classification_is_relative_to_today() {
    let today = Local::now().date_naive();
    let tasks = vec![due("a", today, 5)];
    assert!(classify(&tasks, today).is_empty());
    let later = classify(&tasks, today + Duration::days(5));
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].id, "today-a");
}
