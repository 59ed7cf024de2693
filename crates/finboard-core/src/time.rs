//! Calendar months and date ranges used for filtering and pivoting

use crate::error::CoreError;
use chrono::{Datelike, Months, NaiveDate};
use finboard_config::TimeRange;
use serde::{Deserialize, Serialize};

/// A calendar month, written `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(CoreError::InvalidMonth {
                value: format!("{}-{:02}", year, month),
            });
        }
        Ok(Self { year, month })
    }

    /// The month a date falls in
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// Day numbers `1..=days_in_month`
    pub fn days(&self) -> impl Iterator<Item = u32> {
        1..=self.days_in_month()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }
}

impl std::str::FromStr for CalendarMonth {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidMonth { value: s.to_string() };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl std::fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for CalendarMonth {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CalendarMonth> for String {
    fn from(month: CalendarMonth) -> Self {
        month.to_string()
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive reversed
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn for_month(month: CalendarMonth) -> Self {
        Self {
            start: month.first_day(),
            end: month.last_day(),
        }
    }

    /// Resolve a configured preset relative to `today`.
    ///
    /// `All` and `Custom` have no bounds of their own; they resolve to the
    /// current year so every query carries both dates.
    pub fn from_preset(range: TimeRange, today: NaiveDate) -> Self {
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        let year_end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
        match range {
            TimeRange::Month => Self::for_month(CalendarMonth::of(today)),
            TimeRange::Quarter => {
                let quarter_start = (today.month0() / 3) * 3 + 1;
                let start = NaiveDate::from_ymd_opt(today.year(), quarter_start, 1).unwrap_or(today);
                let end = start
                    .checked_add_months(Months::new(3))
                    .and_then(|d| d.pred_opt())
                    .unwrap_or(today);
                Self { start, end }
            }
            TimeRange::Year | TimeRange::All | TimeRange::Custom => Self {
                start: year_start,
                end: year_end,
            },
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| CoreError::InvalidDate {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_parse_and_display() {
        let month: CalendarMonth = "2025-07".parse().unwrap();
        assert_eq!(month.year(), 2025);
        assert_eq!(month.month(), 7);
        assert_eq!(month.to_string(), "2025-07");
    }

    #[test]
    fn test_month_parse_rejects_garbage() {
        assert!("2025-13".parse::<CalendarMonth>().is_err());
        assert!("2025-7".parse::<CalendarMonth>().is_err());
        assert!("July".parse::<CalendarMonth>().is_err());
    }

    #[test]
    fn test_month_bounds() {
        let feb_leap: CalendarMonth = "2024-02".parse().unwrap();
        assert_eq!(feb_leap.days_in_month(), 29);
        assert_eq!(feb_leap.last_day(), date(2024, 2, 29));

        let dec: CalendarMonth = "2025-12".parse().unwrap();
        assert_eq!(dec.last_day(), date(2025, 12, 31));
        assert_eq!(dec.days().count(), 31);
    }

    #[test]
    fn test_month_navigation() {
        let dec: CalendarMonth = "2025-12".parse().unwrap();
        assert_eq!(dec.succ().to_string(), "2026-01");
        assert_eq!(dec.succ().pred(), dec);
    }

    #[test]
    fn test_month_contains() {
        let month: CalendarMonth = "2025-07".parse().unwrap();
        assert!(month.contains(date(2025, 7, 31)));
        assert!(!month.contains(date(2025, 8, 1)));
        assert!(!month.contains(date(2024, 7, 8)));
    }

    #[test]
    fn test_range_presets() {
        let today = date(2025, 8, 14);

        let month = DateRange::from_preset(TimeRange::Month, today);
        assert_eq!(month, DateRange::new(date(2025, 8, 1), date(2025, 8, 31)));

        let quarter = DateRange::from_preset(TimeRange::Quarter, today);
        assert_eq!(quarter, DateRange::new(date(2025, 7, 1), date(2025, 9, 30)));

        let year = DateRange::from_preset(TimeRange::Year, today);
        assert_eq!(year.end, date(2025, 12, 31));
        assert_eq!(DateRange::from_preset(TimeRange::All, today), year);
    }

    #[test]
    fn test_range_swaps_reversed_bounds() {
        let range = DateRange::new(date(2025, 7, 31), date(2025, 7, 1));
        assert_eq!(range.start, date(2025, 7, 1));
        assert!(range.contains(date(2025, 7, 15)));
    }

    #[test]
    fn test_month_serde_as_string() {
        let month: CalendarMonth = serde_json::from_str("\"2025-07\"").unwrap();
        assert_eq!(serde_json::to_string(&month).unwrap(), "\"2025-07\"");
    }
}
