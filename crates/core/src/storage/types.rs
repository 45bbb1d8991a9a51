use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::PeriodError;

/// A calendar month, addressed the way month lists are requested.
///
/// `month` is zero-based (0 = January, 11 = December).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    month: u32,
    year: i32,
}

impl MonthKey {
    /// Creates a month key, validating the zero-based month and the year.
    pub fn new(month: u32, year: i32) -> Result<Self, PeriodError> {
        if month > 11 {
            return Err(PeriodError::InvalidMonth(month));
        }
        if year <= 0 || NaiveDate::from_ymd_opt(year, month + 1, 1).is_none() {
            return Err(PeriodError::InvalidYear(year));
        }
        Ok(Self { month, year })
    }

    /// Returns the month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: date.month0(),
            year: date.year(),
        }
    }

    /// Zero-based month.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // Validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Returns true if `date` falls in this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.month0() == self.month && date.year() == self.year
    }

    /// The preceding month.
    pub fn previous(&self) -> Self {
        if self.month == 0 {
            Self {
                month: 11,
                year: self.year - 1,
            }
        } else {
            Self {
                month: self.month - 1,
                year: self.year,
            }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month + 1)
    }
}
