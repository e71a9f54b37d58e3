//! # Upkeep
//!
//! Tracks recurring maintenance obligations (vehicle servicing, home upkeep)
//! and tells you what is due.
//!
//! The core is two pure functions over a task collection:
//!
//! *   [`recurrence::complete`] marks a task done and, for periodic tasks,
//!     appends the next occurrence scheduled one interval later.
//! *   [`urgency::classify`] buckets pending tasks into alert tiers relative
//!     to a given day, with [`dates::days_remaining`] as the shared helper.
//!
//! Storage, the command line and the terminal dashboard sit around that
//! core and only exchange whole collections with it.

pub mod categories;
pub mod commands;
pub mod dates;
pub mod error;
pub mod history;
pub mod models;
pub mod recurrence;
pub mod storage;
pub mod tui;
pub mod urgency;

pub use error::{Error, Result};
