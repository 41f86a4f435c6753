//! Calendar tags: month/day pairs independent of year.
//!
//! A tag is accepted as `M/D` or `MM/DD` and always rendered zero-padded,
//! so `7/4` and `07/04` land in the same group. February carries 29 days
//! regardless of year; `02/29` is an ordinary (sparse) tag.

use crate::error::ClimoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of days per month, with February fixed at 29.
const DAYS_IN_MONTH: [u8; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Total number of canonical tags (365 plus the leap day).
pub const TAG_COUNT: usize = 366;

/// A day of the year, identified by month and day only.
///
/// Ordering follows the calendar, so ordered maps keyed by tag iterate
/// from `01/01` to `12/31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarTag {
    month: u8,
    day: u8,
}

impl CalendarTag {
    /// Builds a tag from numeric parts.
    pub fn new(month: u8, day: u8) -> Result<Self, ClimoError> {
        if (1..=12).contains(&month) && day >= 1 && day <= DAYS_IN_MONTH[month as usize - 1] {
            Ok(Self { month, day })
        } else {
            Err(ClimoError::InvalidCalendarTag(format!("{}/{}", month, day)))
        }
    }

    /// Parses `M/D` or `MM/DD`.
    pub fn parse(input: &str) -> Result<Self, ClimoError> {
        let invalid = || ClimoError::InvalidCalendarTag(input.to_string());
        let trimmed = input.trim();

        let (month, day) = trimmed.split_once('/').ok_or_else(invalid)?;
        let month = parse_component(month).ok_or_else(invalid)?;
        let day = parse_component(day).ok_or_else(invalid)?;

        Self::new(month, day).map_err(|_| invalid())
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Whether this is February 29th.
    pub fn is_leap_day(&self) -> bool {
        self.month == 2 && self.day == 29
    }

    /// Zero-based position within [`canonical_tags`].
    pub fn day_index(&self) -> usize {
        let preceding: usize = DAYS_IN_MONTH[..self.month as usize - 1]
            .iter()
            .map(|&d| d as usize)
            .sum();
        preceding + self.day as usize - 1
    }
}

/// One or two ASCII digits.
fn parse_component(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for CalendarTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.day)
    }
}

impl FromStr for CalendarTag {
    type Err = ClimoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CalendarTag {
    type Error = ClimoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CalendarTag> for String {
    fn from(tag: CalendarTag) -> Self {
        tag.to_string()
    }
}

/// Every month/day pair of the year in calendar order, `02/29` included.
pub fn canonical_tags() -> impl Iterator<Item = CalendarTag> {
    DAYS_IN_MONTH
        .iter()
        .enumerate()
        .flat_map(|(m, &days)| (1..=days).map(move |day| CalendarTag { month: m as u8 + 1, day }))
}

/// Full month name for a 1-based month number.
pub fn month_name(month: u8) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_and_unpadded_normalize() {
        let a = CalendarTag::parse("7/4").unwrap();
        let b = CalendarTag::parse("07/04").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "07/04");
    }

    #[test]
    fn test_rejects_impossible_dates() {
        for bad in ["02/30", "04/31", "13/01", "00/10", "06/00", "7-4", "7/4/2020", "", "/", "a/b", "007/04"] {
            assert!(
                matches!(CalendarTag::parse(bad), Err(ClimoError::InvalidCalendarTag(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_leap_day_accepted() {
        let tag = CalendarTag::parse("2/29").unwrap();
        assert!(tag.is_leap_day());
        assert_eq!(tag.day_index(), 59);
    }

    #[test]
    fn test_canonical_tags() {
        let tags: Vec<_> = canonical_tags().collect();
        assert_eq!(tags.len(), TAG_COUNT);
        assert_eq!(tags[0].to_string(), "01/01");
        assert_eq!(tags[TAG_COUNT - 1].to_string(), "12/31");
        assert!(tags.windows(2).all(|w| w[0] < w[1]));
        for (i, tag) in tags.iter().enumerate() {
            assert_eq!(tag.day_index(), i);
        }
    }

    #[test]
    fn test_serde_uses_padded_string() {
        let tag = CalendarTag::parse("1/9").unwrap();
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"01/09\"");
        let back: CalendarTag = serde_json::from_str("\"1/9\"").unwrap();
        assert_eq!(back, tag);
        assert!(serde_json::from_str::<CalendarTag>("\"02/30\"").is_err());
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "Unknown");
    }
}
