//! Week keys: the `YYYY-MM-DD_YYYY-MM-DD` identifiers that name a flyer week.
//!
//! A week key is both the cache key ("has this week already been fetched?")
//! and the output directory name. The calendar default runs from the ISO-week
//! Monday to the following Saturday; site parsers may produce other windows
//! when the retailer's markup states them explicitly.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Longest validity window accepted from parsed markup. Anything wider is
/// treated as a mis-parse.
pub const MAX_SPAN_DAYS: i64 = 31;

static DASHED_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2})-(\d{2})-(\d{4}).{0,12}?(\d{2})-(\d{2})-(\d{4})").expect("valid regex")
});

static DOTTED_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})?\s*(?:-|–|bis)\s*(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})?",
    )
    .expect("valid regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeekKeyError {
    #[error("week key \"{0}\" is not in YYYY-MM-DD_YYYY-MM-DD form")]
    Malformed(String),

    #[error("week start {start} is after end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("week window {start}..{end} spans more than {max} days", max = MAX_SPAN_DAYS)]
    TooWide { start: NaiveDate, end: NaiveDate },
}

/// Inclusive date window identifying one flyer week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    start: NaiveDate,
    end: NaiveDate,
}

impl WeekKey {
    /// # Errors
    ///
    /// Returns [`WeekKeyError::Inverted`] when `start > end` and
    /// [`WeekKeyError::TooWide`] when the window exceeds [`MAX_SPAN_DAYS`].
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WeekKeyError> {
        if start > end {
            return Err(WeekKeyError::Inverted { start, end });
        }
        if (end - start).num_days() > MAX_SPAN_DAYS {
            return Err(WeekKeyError::TooWide { start, end });
        }
        Ok(Self { start, end })
    }

    /// Monday of `today`'s ISO week through the Saturday after it.
    #[must_use]
    pub fn calendar_default(today: NaiveDate) -> Self {
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        Self {
            start: monday,
            end: monday + Duration::days(5),
        }
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days between start and end (a Mon–Sat week is 5).
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Extend a six-day Monday–Saturday window to the following Sunday.
    /// Any other window is returned unchanged.
    #[must_use]
    pub fn extended_to_sunday(self) -> Self {
        if self.span_days() == 5 {
            Self {
                start: self.start,
                end: self.end + Duration::days(1),
            }
        } else {
            self
        }
    }

    /// Find a `DD-MM-YYYY … DD-MM-YYYY` pair (at most 12 characters apart),
    /// as used in retailer URL slugs.
    #[must_use]
    pub fn find_dashed_range(text: &str) -> Option<Self> {
        let caps = DASHED_RANGE_RE.captures(text)?;
        let num = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
        let (m1, m2) = (num(2)?, num(5)?);
        let y1 = i32::try_from(num(3)?).ok()?;
        let y2 = rolled_end_year(y1, i32::try_from(num(6)?).ok()?, m1, m2);
        Self::new(ymd(y1, m1, num(1)?)?, ymd(y2, m2, num(4)?)?).ok()
    }

    /// Find a `DD.MM.[YYYY] - DD.MM.[YYYY]` range (also `bis` / en-dash).
    ///
    /// Missing years are inferred: an end month numerically smaller than the
    /// start month rolls into the following year, and a range with no year at
    /// all is placed in the year that puts its start closest to `today`.
    #[must_use]
    pub fn find_dotted_range(text: &str, today: NaiveDate) -> Option<Self> {
        let caps = DOTTED_RANGE_RE.captures(text)?;
        let num = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
        let year = |i: usize| caps.get(i).and_then(|m| parse_year(m.as_str()));

        let (d1, m1, d2, m2) = (num(1)?, num(2)?, num(4)?, num(5)?);
        let rolls_over = m2 < m1;

        let (y1, y2) = match (year(3), year(6)) {
            (Some(y1), Some(y2)) => (y1, rolled_end_year(y1, y2, m1, m2)),
            (None, Some(y2)) => (if rolls_over { y2 - 1 } else { y2 }, y2),
            (Some(y1), None) => (y1, if rolls_over { y1 + 1 } else { y1 }),
            (None, None) => {
                let y1 = [today.year() - 1, today.year(), today.year() + 1]
                    .into_iter()
                    .filter_map(|y| ymd(y, m1, d1).map(|d| (y, (d - today).num_days().abs())))
                    .min_by_key(|(_, distance)| *distance)
                    .map(|(y, _)| y)?;
                (y1, if rolls_over { y1 + 1 } else { y1 })
            }
        };

        Self::new(ymd(y1, m1, d1)?, ymd(y2, m2, d2)?).ok()
    }
}

/// An end month before the start month lies in the following year, even
/// when the markup repeats the start year.
fn rolled_end_year(start_year: i32, end_year: i32, start_month: u32, end_month: u32) -> i32 {
    if end_month < start_month && end_year <= start_year {
        start_year + 1
    } else {
        end_year
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_year(raw: &str) -> Option<i32> {
    let y = raw.parse::<i32>().ok()?;
    Some(if raw.len() == 2 { 2000 + y } else { y })
}

impl std::fmt::Display for WeekKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

impl std::str::FromStr for WeekKey {
    type Err = WeekKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || WeekKeyError::Malformed(s.to_string());
        let (a, b) = s.split_once('_').ok_or_else(malformed)?;
        let start = NaiveDate::parse_from_str(a, "%Y-%m-%d").map_err(|_| malformed())?;
        let end = NaiveDate::parse_from_str(b, "%Y-%m-%d").map_err(|_| malformed())?;
        Self::new(start, end)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "week_test.rs"]
mod tests;
