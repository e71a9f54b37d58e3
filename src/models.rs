use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::lenient_date;
use crate::error::Error;

/// Opaque task identifier.
pub type TaskId = String;

/// How often a maintenance obligation recurs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Periodicity {
    #[default]
    #[serde(alias = "Nenhuma")]
    None,
    #[serde(alias = "30 dias")]
    Every30Days,
    #[serde(alias = "3 meses")]
    Every3Months,
    #[serde(alias = "6 meses")]
    Every6Months,
    #[serde(alias = "1 ano")]
    Every1Year,
    /// Recurs, but the interval is scheduled by hand.
    #[serde(alias = "Personalizado")]
    Custom,
}

impl Periodicity {
    pub const ALL: [Periodicity; 6] = [
        Periodicity::None,
        Periodicity::Every30Days,
        Periodicity::Every3Months,
        Periodicity::Every6Months,
        Periodicity::Every1Year,
        Periodicity::Custom,
    ];

    /// Short form used on the command line and in tables.
    pub fn short(&self) -> &'static str {
        match self {
            Periodicity::None => "none",
            Periodicity::Every30Days => "30d",
            Periodicity::Every3Months => "3m",
            Periodicity::Every6Months => "6m",
            Periodicity::Every1Year => "1y",
            Periodicity::Custom => "custom",
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Periodicity::None => "None",
            Periodicity::Every30Days => "30 days",
            Periodicity::Every3Months => "3 months",
            Periodicity::Every6Months => "6 months",
            Periodicity::Every1Year => "1 year",
            Periodicity::Custom => "Custom",
        };
        f.write_str(label)
    }
}

impl FromStr for Periodicity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Periodicity::None),
            "30d" | "30" | "every30days" | "monthly" => Ok(Periodicity::Every30Days),
            "3m" | "every3months" | "quarterly" => Ok(Periodicity::Every3Months),
            "6m" | "every6months" => Ok(Periodicity::Every6Months),
            "1y" | "every1year" | "yearly" | "annual" => Ok(Periodicity::Every1Year),
            "custom" => Ok(Periodicity::Custom),
            _ => Err(Error::InvalidPeriodicity(s.to_string())),
        }
    }
}

/// Stored lifecycle state. Overdue is never stored, see `urgency::derived_status`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "overdue")]
    Pending,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => f.write_str("Pending"),
            TaskStatus::Completed => f.write_str("Done"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(Error::InvalidInput(format!(
                "unknown status '{}', use pending or completed",
                s
            ))),
        }
    }
}

/// A single recurring or one-off maintenance obligation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTask {
    /// Unique identifier, never reused.
    pub id: TaskId,
    pub name: String,
    /// Name reference into the category registry.
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Date of the most recent service.
    pub last_date: NaiveDate,
    /// Date the next service is due.
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub next_date: Option<NaiveDate>,
    #[serde(default)]
    pub periodicity: Periodicity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default = "default_notifications")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// Set exactly when `status` is `Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Opaque references to attached files, carried through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

fn default_notifications() -> bool {
    true
}

impl MaintenanceTask {
    /// Creates a pending, non-recurring task with notifications enabled.
    pub fn new(
        id: impl Into<TaskId>,
        name: impl Into<String>,
        category: impl Into<String>,
        last_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        MaintenanceTask {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            description: String::new(),
            last_date,
            next_date: None,
            periodicity: Periodicity::None,
            cost: None,
            notifications_enabled: true,
            status: TaskStatus::Pending,
            created_at,
            completed_at: None,
            attachments: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

/// A user-defined grouping for tasks, referenced by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub id: String,
    pub name: String,
    /// Icon identifier chosen by the presentation layer.
    pub icon: String,
    /// Colour token chosen by the presentation layer.
    pub color: String,
}
