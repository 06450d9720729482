//! Work calendar: hour grid configuration, working-day arithmetic, candidate
//! date sets and slot finding.

pub mod dates;
pub mod slots;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dates::build_candidate_dates;
pub use slots::{find_slot, overlaps};

/// Errors raised by calendar configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error(
        "invalid work calendar: need day_start <= lunch_start <= lunch_end <= day_end <= 24 \
         (got {day_start}, {lunch_start}, {lunch_end}, {day_end})"
    )]
    InvalidHours {
        day_start: u32,
        lunch_start: u32,
        lunch_end: u32,
        day_end: u32,
    },

    #[error("invalid work hours {0:?} (expected whole hours as HH:MM-HH:MM)")]
    InvalidWorkHours(String),
}

/// Hour grid of a working day.
///
/// A day has two bookable blocks: `[day_start, lunch_start)` and
/// `[lunch_end, day_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkCalendar {
    pub day_start: u32,
    pub lunch_start: u32,
    pub lunch_end: u32,
    pub day_end: u32,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            day_start: 9,
            lunch_start: 12,
            lunch_end: 13,
            day_end: 17,
        }
    }
}

impl WorkCalendar {
    /// Check the hour ordering.
    pub fn validate(&self) -> Result<(), CalendarError> {
        let ordered = self.day_start <= self.lunch_start
            && self.lunch_start <= self.lunch_end
            && self.lunch_end <= self.day_end
            && self.day_end <= 24;
        if ordered {
            Ok(())
        } else {
            Err(CalendarError::InvalidHours {
                day_start: self.day_start,
                lunch_start: self.lunch_start,
                lunch_end: self.lunch_end,
                day_end: self.day_end,
            })
        }
    }

    /// The two bookable blocks, morning first.
    pub fn blocks(&self) -> [(u32, u32); 2] {
        [
            (self.day_start, self.lunch_start),
            (self.lunch_end, self.day_end),
        ]
    }

    /// Total bookable hours in a day.
    pub fn capacity(&self) -> u32 {
        self.blocks()
            .iter()
            .map(|(start, end)| end.saturating_sub(*start))
            .sum()
    }

    /// The `"HH:MM-HH:MM"` range covering the whole working day.
    pub fn work_hours_range(&self) -> String {
        format!("{:02}:00-{:02}:00", self.day_start, self.day_end)
    }

    /// Parse a `"HH:MM-HH:MM"` range into a calendar.
    ///
    /// The lunch break of `self` is kept when it falls inside the range;
    /// otherwise the range becomes a single uninterrupted block.
    pub fn with_work_hours(&self, range: &str) -> Result<Self, CalendarError> {
        let invalid = || CalendarError::InvalidWorkHours(range.to_string());
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;
        let start = parse_whole_hour(start).ok_or_else(invalid)?;
        let end = parse_whole_hour(end).ok_or_else(invalid)?;
        if start >= end {
            return Err(invalid());
        }

        let calendar = if start <= self.lunch_start && self.lunch_end <= end {
            Self {
                day_start: start,
                lunch_start: self.lunch_start,
                lunch_end: self.lunch_end,
                day_end: end,
            }
        } else {
            Self {
                day_start: start,
                lunch_start: end,
                lunch_end: end,
                day_end: end,
            }
        };
        calendar.validate()?;
        Ok(calendar)
    }
}

fn parse_whole_hour(s: &str) -> Option<u32> {
    let (hour, minute) = s.trim().split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (minute == 0 && hour <= 24).then_some(hour)
}

/// Monday through Friday. Holidays are not considered.
pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The day after `date`, saturating at the end of chrono's range.
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

/// Monday and Sunday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let week = date.week(Weekday::Mon);
    (week.first_day(), week.last_day())
}
