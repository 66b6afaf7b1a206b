//! Reporting periods and their resolution to concrete date ranges
//!
//! Resolution never fails: a missing or out-of-range year/month is replaced
//! by the current one, and an unknown period kind resolves as all-time.

use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Years outside this range are treated as absent
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Named reporting interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    #[default]
    All,
    Month,
    Year,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Lenient parse used for request input: unknown kinds become `All`
    pub fn parse_or_all(s: &str) -> Self {
        s.parse().unwrap_or(Self::All)
    }
}

impl std::str::FromStr for PeriodKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(format!("Unknown period kind: {}", s)),
        }
    }
}

impl std::fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requested reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Period {
    pub kind: PeriodKind,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl Period {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            kind: PeriodKind::Month,
            year: Some(year),
            month: Some(month),
        }
    }

    pub fn year(year: i32) -> Self {
        Self {
            kind: PeriodKind::Year,
            year: Some(year),
            month: None,
        }
    }
}

/// Inclusive date-time range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Everything up to `now`
    pub fn until(now: NaiveDateTime) -> Self {
        Self {
            start: NaiveDateTime::MIN,
            end: now,
        }
    }

    /// Whole days from `first` through `last`
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: end_of_day(last),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let at = date.and_time(NaiveTime::MIN);
        at >= self.start && at <= self.end
    }

    /// True for all-time ranges, where no lower bound applies
    pub fn is_open_start(&self) -> bool {
        self.start == NaiveDateTime::MIN
    }
}

/// Resolve a period against the local clock
pub fn resolve(period: &Period) -> DateRange {
    resolve_at(period, Local::now().naive_local())
}

/// Resolve a period against a fixed `now`
pub fn resolve_at(period: &Period, now: NaiveDateTime) -> DateRange {
    let year = period
        .year
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
        .unwrap_or_else(|| now.year());
    let month = period
        .month
        .filter(|m| (1..=12).contains(m))
        .unwrap_or_else(|| now.month());

    let resolved = match period.kind {
        PeriodKind::All => None,
        PeriodKind::Month => month_range(year, month),
        PeriodKind::Year => NaiveDate::from_ymd_opt(year, 1, 1)
            .zip(NaiveDate::from_ymd_opt(year, 12, 31))
            .map(|(first, last)| DateRange::days(first, last)),
    };

    resolved.unwrap_or_else(|| DateRange::until(now))
}

/// Full range of one calendar month
pub fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(DateRange::days(first, last_day_of_month(first)?))
}

/// First day of the month containing `date`
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`
pub fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// `YYYY-MM` key for the month containing `date`
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_all_runs_from_min_to_now() {
        let range = resolve_at(&Period::all(), now());
        assert_eq!(range.start, NaiveDateTime::MIN);
        assert_eq!(range.end, now());
        assert!(range.is_open_start());
    }

    #[test]
    fn test_month_bounds() {
        let range = resolve_at(&Period::month(2024, 4), now());
        assert_eq!(range.start, dt(2024, 4, 1, 0, 0, 0));
        assert_eq!(range.end, dt(2024, 4, 30, 23, 59, 59));
    }

    #[test]
    fn test_february_leap_and_common_years() {
        let leap = resolve_at(&Period::month(2024, 2), now());
        assert_eq!(leap.end, dt(2024, 2, 29, 23, 59, 59));

        let common = resolve_at(&Period::month(2023, 2), now());
        assert_eq!(common.end, dt(2023, 2, 28, 23, 59, 59));
    }

    #[test]
    fn test_december_rolls_over_cleanly() {
        let range = resolve_at(&Period::month(2024, 12), now());
        assert_eq!(range.end, dt(2024, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_year_bounds() {
        let range = resolve_at(&Period::year(2023), now());
        assert_eq!(range.start, dt(2023, 1, 1, 0, 0, 0));
        assert_eq!(range.end, dt(2023, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_invalid_month_substitutes_current() {
        let range = resolve_at(&Period::month(2024, 13), now());
        assert_eq!(range.start, dt(2024, 11, 1, 0, 0, 0));
        assert_eq!(range.end, dt(2024, 11, 30, 23, 59, 59));

        let zero = resolve_at(&Period::month(2024, 0), now());
        assert_eq!(zero.start, dt(2024, 11, 1, 0, 0, 0));
    }

    #[test]
    fn test_missing_fields_substitute_current() {
        let period = Period {
            kind: PeriodKind::Month,
            year: None,
            month: None,
        };
        let range = resolve_at(&period, now());
        assert_eq!(range.start, dt(2025, 11, 1, 0, 0, 0));
        assert_eq!(range.end, dt(2025, 11, 30, 23, 59, 59));
    }

    #[test]
    fn test_out_of_range_year_substitutes_current() {
        let range = resolve_at(&Period::year(-4), now());
        assert_eq!(range.start, dt(2025, 1, 1, 0, 0, 0));

        let range = resolve_at(&Period::year(20_000), now());
        assert_eq!(range.end, dt(2025, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_period_kind_parsing() {
        assert_eq!("MONTH".parse::<PeriodKind>().unwrap(), PeriodKind::Month);
        assert!("week".parse::<PeriodKind>().is_err());
        assert_eq!(PeriodKind::parse_or_all("week"), PeriodKind::All);
        assert_eq!(PeriodKind::parse_or_all("Year"), PeriodKind::Year);
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let range = month_range(2025, 3).unwrap();
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()));
    }

    #[test]
    fn test_month_key_format() {
        assert_eq!(month_key(NaiveDate::from_ymd_opt(987, 7, 4).unwrap()), "0987-07");
    }
}
