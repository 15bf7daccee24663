//! The in-world calendar.
//!
//! Dates are written `DDD-YYYY`: a zero-padded day of year (1-365)
//! followed by the year. There are no months and no leap years.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Days in a calendar year.
pub const DAYS_PER_YEAR: u32 = 365;

/// A day of the in-world calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameDate {
    day: u32,
    year: i32,
}

impl GameDate {
    /// Create a date, returning `None` when `day` is outside 1-365.
    pub fn new(day: u32, year: i32) -> Option<Self> {
        (1..=DAYS_PER_YEAR)
            .contains(&day)
            .then_some(Self { day, year })
    }

    /// Day of the year (1-365).
    pub fn day(&self) -> u32 {
        self.day
    }

    /// The year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Advance the calendar by a time skip.
    ///
    /// Hours never move the calendar. Overflowing days roll into the
    /// following years. A skip past the last representable year stops on
    /// its final day.
    pub fn apply_time_skip(&self, skip: TimeSkip) -> Self {
        let added = match skip.unit {
            TimeUnit::Hours => return *self,
            TimeUnit::Days => skip.amount,
            TimeUnit::Weeks => skip.amount.saturating_mul(7),
        };

        let offset = u64::from(self.day - 1) + u64::from(added);
        let per_year = u64::from(DAYS_PER_YEAR);
        let day = (offset % per_year) as u32 + 1;
        i32::try_from(offset / per_year)
            .ok()
            .and_then(|years| self.year.checked_add(years))
            .map_or(
                Self {
                    day: DAYS_PER_YEAR,
                    year: i32::MAX,
                },
                |year| Self { day, year },
            )
    }
}

impl Default for GameDate {
    fn default() -> Self {
        Self { day: 1, year: 1105 }
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}-{}", self.day, self.year)
    }
}

impl FromStr for GameDate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidDate(s.to_string());
        let (day, year) = s.trim().split_once('-').ok_or_else(invalid)?;
        let day: u32 = day.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        Self::new(day, year).ok_or_else(invalid)
    }
}

impl TryFrom<String> for GameDate {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GameDate> for String {
    fn from(date: GameDate) -> Self {
        date.to_string()
    }
}

/// The unit of a [`TimeSkip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Hours (`h`).
    #[serde(rename = "h")]
    Hours,
    /// Days (`d`).
    #[serde(rename = "d")]
    Days,
    /// Weeks (`w`).
    #[serde(rename = "w")]
    Weeks,
}

impl TimeUnit {
    /// Parse a unit suffix (`h`, `d`, `w`), case-insensitively.
    pub fn from_suffix(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            'w' => Some(Self::Weeks),
            _ => None,
        }
    }

    /// The single-letter suffix for this unit.
    pub fn suffix(self) -> char {
        match self {
            Self::Hours => 'h',
            Self::Days => 'd',
            Self::Weeks => 'w',
        }
    }
}

/// An amount of in-world time to skip, such as `+3d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSkip {
    /// How many units to skip.
    pub amount: u32,
    /// The unit of `amount`.
    pub unit: TimeUnit,
}

impl TimeSkip {
    /// Create a time skip.
    pub fn new(amount: u32, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    /// Parse `+3d`, `12h`, or `2w`. The leading `+` is optional.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('+').unwrap_or(s);
        let unit = TimeUnit::from_suffix(s.chars().last()?)?;
        let digits = &s[..s.len() - 1];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self::new(digits.parse().ok()?, unit))
    }
}

impl fmt::Display for TimeSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}{}", self.amount, self.unit.suffix())
    }
}
