//! # Threshold Resolution
//!
//! Turns "N units ago" or a literal timestamp into the absolute cutoff instant that
//! drives selection. Month and year arithmetic is calendar-aware: stepping back from
//! the 31st lands on the last valid day of the target month.

use chrono::{DateTime, Days, Local, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::ValueEnum;

use crate::common::TimeAttribute;
use crate::error::{Result, RotateError};

/// Calendar or clock unit for relative thresholds.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// How a cutoff is expressed on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    /// `magnitude` units before now.
    Ago { unit: TimeUnit, magnitude: u32 },
    /// A fixed instant.
    At(DateTime<Utc>),
}

impl Threshold {
    /// Resolves against the local wall clock.
    pub fn resolve(&self) -> Result<DateTime<Utc>> {
        self.resolve_at(Local::now())
    }

    /// Resolves against an explicit `now`. Calendar steps happen in `now`'s time zone.
    pub fn resolve_at<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<DateTime<Utc>> {
        match self {
            Threshold::Ago { unit, magnitude } => {
                Ok(subtract(now, *unit, *magnitude)?.with_timezone(&Utc))
            }
            Threshold::At(at) => Ok(*at),
        }
    }
}

/// Subtracts `magnitude` units from `now`.
pub fn subtract<Tz: TimeZone>(
    now: DateTime<Tz>,
    unit: TimeUnit,
    magnitude: u32,
) -> Result<DateTime<Tz>> {
    let m = i64::from(magnitude);
    let stepped = match unit {
        TimeUnit::Year => magnitude
            .checked_mul(12)
            .and_then(|months| now.checked_sub_months(Months::new(months))),
        TimeUnit::Month => now.checked_sub_months(Months::new(magnitude)),
        TimeUnit::Day => now.checked_sub_days(Days::new(u64::from(magnitude))),
        TimeUnit::Hour => now.checked_sub_signed(chrono::Duration::hours(m)),
        TimeUnit::Minute => now.checked_sub_signed(chrono::Duration::minutes(m)),
        TimeUnit::Second => now.checked_sub_signed(chrono::Duration::seconds(m)),
        TimeUnit::Millisecond => now.checked_sub_signed(chrono::Duration::milliseconds(m)),
    };
    stepped.ok_or_else(|| {
        RotateError::Validation(format!("{magnitude} {unit:?} before now is out of range"))
    })
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a literal cutoff. Timestamps without an offset are local time.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });
    naive
        .and_then(|n| Local.from_local_datetime(&n).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| RotateError::InvalidTimestamp { input: input.to_string() })
}

/// Immutable (attribute, cutoff) pair, built once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionCriterion {
    pub attribute: TimeAttribute,
    pub cutoff: DateTime<Utc>,
}

impl RetentionCriterion {
    pub fn new(attribute: TimeAttribute, cutoff: DateTime<Utc>) -> Self {
        Self { attribute, cutoff }
    }

    pub fn resolve(attribute: TimeAttribute, threshold: &Threshold) -> Result<Self> {
        Ok(Self::new(attribute, threshold.resolve()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
    }

    #[test]
    fn one_month_before_march_31st_clamps_to_leap_day() {
        let cutoff = subtract(utc(2024, 3, 31, 0, 0, 0), TimeUnit::Month, 1).unwrap();
        assert_eq!(cutoff, utc(2024, 2, 29, 0, 0, 0));
    }

    #[test]
    fn one_year_before_leap_day_clamps_to_feb_28() {
        let cutoff = subtract(utc(2024, 2, 29, 12, 0, 0), TimeUnit::Year, 1).unwrap();
        assert_eq!(cutoff, utc(2023, 2, 28, 12, 0, 0));
    }

    #[test]
    fn clock_units_subtract_exactly() {
        let now = utc(2024, 1, 1, 0, 0, 0);
        assert_eq!(subtract(now, TimeUnit::Day, 400).unwrap(), utc(2022, 11, 27, 0, 0, 0));
        assert_eq!(subtract(now, TimeUnit::Hour, 25).unwrap(), utc(2023, 12, 30, 23, 0, 0));
        assert_eq!(subtract(now, TimeUnit::Minute, 90).unwrap(), utc(2023, 12, 31, 22, 30, 0));
        assert_eq!(subtract(now, TimeUnit::Second, 1).unwrap(), utc(2023, 12, 31, 23, 59, 59));
        assert_eq!(
            subtract(now, TimeUnit::Millisecond, 1500).unwrap(),
            utc(2023, 12, 31, 23, 59, 58) + chrono::Duration::milliseconds(500)
        );
    }

    #[test]
    fn zero_magnitude_is_now() {
        let now = utc(2024, 5, 5, 5, 5, 5);
        let threshold = Threshold::Ago { unit: TimeUnit::Year, magnitude: 0 };
        assert_eq!(threshold.resolve_at(now).unwrap(), now);
    }

    #[test]
    fn absolute_threshold_ignores_now() {
        let at = utc(2020, 1, 1, 0, 0, 0);
        assert_eq!(Threshold::At(at).resolve_at(utc(2024, 1, 1, 0, 0, 0)).unwrap(), at);
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        assert_eq!(parse_timestamp("2024-03-01T10:00:00+02:00").unwrap(), utc(2024, 3, 1, 8, 0, 0));
        assert_eq!(parse_timestamp("2024-03-01T10:00:00Z").unwrap(), utc(2024, 3, 1, 10, 0, 0));
    }

    #[test]
    fn parses_naive_forms_as_local_time() {
        let expected = Local
            .with_ymd_and_hms(2023, 7, 14, 8, 30, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_timestamp("2023-07-14 08:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2023-07-14T08:30:00").unwrap(), expected);
        assert!(parse_timestamp("2023-07-14").is_ok());
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        match parse_timestamp("last tuesday") {
            Err(RotateError::InvalidTimestamp { input }) => assert_eq!(input, "last tuesday"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
