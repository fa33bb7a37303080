//! Utilities for rebasing capture timestamps.
//!
//! A capture may span several days, months or years, so we never set the date
//! of each packet directly. Instead:
//!
//! 1. The offset between the date of the first packet and the requested date
//!    is computed once, component by component (a zero component means
//!    "keep the original").
//! 2. The same calendar offset, and then an optional fixed duration, is added
//!    to every packet, including the first one.
//!
//! Calendar addition normalizes overflowing dates: January 31 plus one month
//! is March 3 (or March 2 in a leap year).
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::error::{Error, Result};

/// The date requested by the user, 0 meaning "unchanged" for each component.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl TargetDate {
    pub fn is_unchanged(&self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }
}

/// A fixed offset applied to every capture timestamp.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DateOffset {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub duration: Option<Duration>,
}

impl DateOffset {
    /// Compute the offset from the timestamp of the first packet to `target`.
    pub fn between(first: DateTime<Utc>, target: TargetDate, duration: Option<Duration>) -> Self {
        let mut offset = DateOffset {
            duration,
            ..Default::default()
        };
        if target.year != 0 {
            offset.years = target.year - first.year();
        }
        if target.month != 0 {
            offset.months = target.month as i32 - first.month() as i32;
        }
        if target.day != 0 {
            offset.days = target.day as i32 - first.day() as i32;
        }
        offset
    }

    fn has_date_change(&self) -> bool {
        self.years != 0 || self.months != 0 || self.days != 0
    }

    /// True if applying the offset would not change any timestamp.
    pub fn is_noop(&self) -> bool {
        !self.has_date_change() && self.duration.map_or(true, |duration| duration.is_zero())
    }

    pub fn apply(&self, timestamp: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let mut rebased = timestamp;
        if self.has_date_change() {
            rebased = add_date(rebased, self.years, self.months, self.days)?;
        }
        if let Some(duration) = self.duration {
            rebased = rebased
                .checked_add_signed(duration)
                .ok_or(Error::TimestampOutOfRange)?;
        }
        Ok(rebased)
    }
}

/// Add a number of years, months and days to a timestamp, keeping the time of day.
pub fn add_date(
    timestamp: DateTime<Utc>,
    years: i32,
    months: i32,
    days: i32,
) -> Result<DateTime<Utc>> {
    let naive = timestamp.naive_utc();
    let total_months =
        (naive.year() as i64 + years as i64) * 12 + naive.month0() as i64 + months as i64;
    let year =
        i32::try_from(total_months.div_euclid(12)).map_err(|_| Error::TimestampOutOfRange)?;
    let month = total_months.rem_euclid(12) as u32 + 1;
    // Start from the first of the month so that overflowing days carry over.
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .zip(Duration::try_days(naive.day() as i64 - 1 + days as i64))
        .and_then(|(first, days)| first.checked_add_signed(days))
        .ok_or(Error::TimestampOutOfRange)?;
    Ok(date.and_time(naive.time()).and_utc())
}

/// Parse a signed sequence of decimal numbers with units, such as `1h30m` or `-2.5s`.
///
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
/// An empty string means no duration.
pub fn parse_duration(text: &str) -> Result<Option<Duration>> {
    if text.is_empty() {
        return Ok(None);
    }
    let invalid = || Error::InvalidDuration(text.to_string());

    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest == "0" {
        return Ok(Some(Duration::zero()));
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut nanos: i128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(number_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let unit_nanos: i128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3600 * 1_000_000_000,
            _ => return Err(invalid()),
        };
        nanos = scale_decimal(number, unit_nanos)
            .and_then(|value| nanos.checked_add(value))
            .ok_or_else(invalid)?;
        rest = tail;
    }

    if negative {
        nanos = -nanos;
    }
    i64::try_from(nanos)
        .map(|nanos| Some(Duration::nanoseconds(nanos)))
        .map_err(|_| invalid())
}

/// Multiply a decimal number such as `1.25` by `unit`, truncating below one unit of `unit`.
fn scale_decimal(number: &str, unit: i128) -> Option<i128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let mut value: i128 = if whole.is_empty() {
        0
    } else {
        whole.parse::<i128>().ok()?.checked_mul(unit)?
    };
    let mut scale = unit;
    for digit in fraction.chars() {
        scale /= 10;
        value = value.checked_add(digit.to_digit(10)? as i128 * scale)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::error::Error;
    use crate::timestamp::{add_date, parse_duration, DateOffset, TargetDate};

    fn ts(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap()
    }

    #[test]
    fn test_offset_year_only() {
        let first = ts(2014, 3, 15, 10, 20, 30);
        let target = TargetDate {
            year: 2020,
            ..Default::default()
        };
        let offset = DateOffset::between(first, target, None);
        assert_eq!(offset.years, 6);
        assert_eq!(offset.months, 0);
        assert_eq!(offset.days, 0);
        assert!(!offset.is_noop());

        let later = ts(2014, 11, 2, 23, 59, 59) + Duration::microseconds(123456);
        let rebased = offset.apply(later).unwrap();
        assert_eq!(
            rebased,
            ts(2020, 11, 2, 23, 59, 59) + Duration::microseconds(123456)
        );
    }

    #[test]
    fn test_offset_all_components() {
        let first = ts(2014, 3, 15, 0, 0, 0);
        let target = TargetDate {
            year: 2013,
            month: 12,
            day: 1,
        };
        let offset = DateOffset::between(first, target, None);
        assert_eq!((offset.years, offset.months, offset.days), (-1, 9, -14));
        assert_eq!(offset.apply(first).unwrap(), ts(2013, 12, 1, 0, 0, 0));
    }

    #[test]
    fn test_offset_noop() {
        let first = ts(2014, 3, 15, 0, 0, 0);
        let offset = DateOffset::between(first, TargetDate::default(), None);
        assert!(offset.is_noop());
        assert!(TargetDate::default().is_unchanged());

        // Requesting the date the capture already has is also a no-op.
        let same = TargetDate {
            year: 2014,
            month: 3,
            day: 15,
        };
        assert!(DateOffset::between(first, same, Some(Duration::zero())).is_noop());
    }

    #[test]
    fn test_offset_with_duration() {
        let first = ts(2014, 3, 15, 10, 0, 0);
        let offset = DateOffset::between(
            first,
            TargetDate {
                day: 16,
                ..Default::default()
            },
            Some(Duration::minutes(90)),
        );
        assert_eq!(offset.apply(first).unwrap(), ts(2014, 3, 16, 11, 30, 0));

        let offset = DateOffset::between(first, TargetDate::default(), Some(Duration::hours(-11)));
        assert_eq!(offset.apply(first).unwrap(), ts(2014, 3, 14, 23, 0, 0));
    }

    #[test]
    fn test_add_date_normalization() {
        assert_eq!(
            add_date(ts(2014, 1, 31, 8, 0, 0), 0, 1, 0).unwrap(),
            ts(2014, 3, 3, 8, 0, 0)
        );
        assert_eq!(
            add_date(ts(2016, 1, 31, 8, 0, 0), 0, 1, 0).unwrap(),
            ts(2016, 3, 2, 8, 0, 0)
        );
        assert_eq!(
            add_date(ts(2016, 2, 29, 0, 0, 0), 1, 0, 0).unwrap(),
            ts(2017, 3, 1, 0, 0, 0)
        );
        assert_eq!(
            add_date(ts(2014, 12, 15, 0, 0, 0), 0, 1, 0).unwrap(),
            ts(2015, 1, 15, 0, 0, 0)
        );
        assert_eq!(
            add_date(ts(2014, 1, 15, 0, 0, 0), 0, -1, 0).unwrap(),
            ts(2013, 12, 15, 0, 0, 0)
        );
        assert_eq!(
            add_date(ts(2014, 3, 1, 0, 0, 0), 0, 0, -1).unwrap(),
            ts(2014, 2, 28, 0, 0, 0)
        );
    }

    #[test]
    fn test_add_date_out_of_range() {
        assert_eq!(
            add_date(ts(2014, 1, 1, 0, 0, 0), i32::MAX, 0, 0),
            Err(Error::TimestampOutOfRange)
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("").unwrap(), None);
        assert_eq!(parse_duration("0").unwrap(), Some(Duration::zero()));
        assert_eq!(parse_duration("1h30m").unwrap(), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("90m").unwrap(), Some(Duration::minutes(90)));
        assert_eq!(
            parse_duration("-2.5s").unwrap(),
            Some(Duration::milliseconds(-2500))
        );
        assert_eq!(
            parse_duration("+1.5h").unwrap(),
            Some(Duration::minutes(90))
        );
        assert_eq!(
            parse_duration("300ms").unwrap(),
            Some(Duration::milliseconds(300))
        );
        assert_eq!(
            parse_duration("1us2ns").unwrap(),
            Some(Duration::nanoseconds(1002))
        );
        assert_eq!(
            parse_duration("1µs").unwrap(),
            Some(Duration::microseconds(1))
        );
        assert_eq!(parse_duration(".5s").unwrap(), Some(Duration::milliseconds(500)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        let near_overflow = format!("{}.9h", i128::MAX / 3_600_000_000_000);
        let texts = [
            "-",
            "10",
            "1x",
            "h",
            "1.2.3s",
            ".s",
            "1h30",
            "3000000000000h",
            near_overflow.as_str(),
        ];
        for text in texts {
            assert_eq!(
                parse_duration(text),
                Err(Error::InvalidDuration(text.to_string())),
                "{text}"
            );
        }
    }
}
