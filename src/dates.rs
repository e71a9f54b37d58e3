//! Calendar-date helpers shared by the recurrence engine and the urgency
//! classifier. All dates are local calendar days without a time component.

use chrono::{Days, Months, NaiveDate};

use crate::error::{Error, Result};
use crate::models::Periodicity;

/// Days remaining reported for a task with no due date.
pub const NEVER_EXPIRES: i64 = 999;

/// A mechanical recurrence step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Days(u64),
    Months(u32),
}

impl Periodicity {
    /// The interval between occurrences, if it is mechanically known.
    pub fn interval(&self) -> Option<Interval> {
        match self {
            Periodicity::Every30Days => Some(Interval::Days(30)),
            Periodicity::Every3Months => Some(Interval::Months(3)),
            Periodicity::Every6Months => Some(Interval::Months(6)),
            Periodicity::Every1Year => Some(Interval::Months(12)),
            Periodicity::None | Periodicity::Custom => None,
        }
    }
}

/// Adds `interval` to `date`.
///
/// Month steps keep the day of month and clamp to the last day of shorter
/// months (`2024-01-31 + 1 month = 2024-02-29`). Returns `None` when the
/// result falls outside the representable range.
pub fn add_interval(date: NaiveDate, interval: Interval) -> Option<NaiveDate> {
    match interval {
        Interval::Days(n) => date.checked_add_days(Days::new(n)),
        Interval::Months(n) => date.checked_add_months(Months::new(n)),
    }
}

/// Signed number of days from `today` until `date`.
///
/// `0` means due today, negative values are days overdue. A missing date
/// never expires and yields [`NEVER_EXPIRES`].
pub fn days_remaining(date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match date {
        Some(d) => (d - today).num_days(),
        None => NEVER_EXPIRES,
    }
}

/// Due date to pre-fill when a periodicity is picked for a task last
/// serviced on `last_date`.
pub fn suggest_next_date(last_date: NaiveDate, periodicity: Periodicity) -> Option<NaiveDate> {
    periodicity
        .interval()
        .and_then(|interval| add_interval(last_date, interval))
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Serde adapter for optional dates that treats empty or malformed values
/// as absent instead of failing the whole document.
pub(crate) mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|s| {
            // Accept full ISO timestamps as well, keeping only the date part.
            let day = s.get(..10).unwrap_or(&s);
            NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
        }))
    }
}
