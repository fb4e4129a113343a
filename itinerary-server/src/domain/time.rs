//! Local time handling for itinerary legs.
//!
//! Legs are entered as a local calendar date ("YYYY-MM-DD"), a local
//! wall-clock time ("HH:MM") and a fixed UTC offset in fractional hours.
//! This module parses those pieces and converts them to UTC instants.
//! No timezone database is consulted: the offset is taken as given.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use std::fmt;

/// Smallest UTC offset accepted for a leg endpoint, in hours.
pub const MIN_OFFSET_HOURS: f64 = -12.0;

/// Largest UTC offset accepted for a leg endpoint, in hours.
pub const MAX_OFFSET_HOURS: f64 = 12.0;

/// Error returned when parsing an invalid date, time or offset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {reason}")]
pub struct TimeError {
    kind: &'static str,
    reason: &'static str,
}

impl TimeError {
    fn date(reason: &'static str) -> Self {
        Self {
            kind: "date",
            reason,
        }
    }

    fn time(reason: &'static str) -> Self {
        Self {
            kind: "time",
            reason,
        }
    }

    fn offset(reason: &'static str) -> Self {
        Self {
            kind: "offset",
            reason,
        }
    }

    /// Returns the reason the value was rejected.
    pub fn reason(&self) -> &'static str {
        self.reason
    }

    /// Returns true if a date failed to parse.
    pub fn is_date(&self) -> bool {
        self.kind == "date"
    }

    /// Returns true if a time of day failed to parse.
    pub fn is_time(&self) -> bool {
        self.kind == "time"
    }

    /// Returns true if an offset was out of range.
    pub fn is_offset(&self) -> bool {
        self.kind == "offset"
    }
}

/// A fixed UTC offset for one leg endpoint.
///
/// Stored at whole-second resolution so that fractional offsets such as
/// +5.5 (India) or +5.75 (Nepal) convert exactly.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::UtcOffset;
///
/// let india = UtcOffset::from_hours(5.5).unwrap();
/// assert_eq!(india.seconds(), 19_800);
/// assert_eq!(india.to_string(), "UTC+5:30");
///
/// assert!(UtcOffset::from_hours(13.0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtcOffset {
    seconds: i32,
}

impl UtcOffset {
    /// UTC itself.
    pub const UTC: UtcOffset = UtcOffset { seconds: 0 };

    /// Create an offset from fractional hours, validating the range.
    pub fn from_hours(hours: f64) -> Result<Self, TimeError> {
        if !hours.is_finite() {
            return Err(TimeError::offset("offset must be a finite number"));
        }
        if !(MIN_OFFSET_HOURS..=MAX_OFFSET_HOURS).contains(&hours) {
            return Err(TimeError::offset("offset must be between -12 and +12 hours"));
        }

        let seconds = (hours * 3600.0).round() as i32;
        Ok(Self { seconds })
    }

    /// Returns the offset in seconds east of UTC.
    pub fn seconds(&self) -> i32 {
        self.seconds
    }

    /// Returns the offset in fractional hours.
    pub fn hours(&self) -> f64 {
        f64::from(self.seconds) / 3600.0
    }

    /// Returns the offset as a chrono `Duration`.
    pub fn as_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.seconds))
    }

    /// Returns the equivalent chrono `FixedOffset`.
    pub fn to_fixed(&self) -> FixedOffset {
        // Range-checked at construction: |seconds| <= 12h < 24h
        FixedOffset::east_opt(self.seconds).unwrap_or_else(|| Utc.fix())
    }
}

impl Default for UtcOffset {
    fn default() -> Self {
        Self::UTC
    }
}

impl fmt::Debug for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UtcOffset({})", self)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds < 0 { '-' } else { '+' };
        let abs = self.seconds.unsigned_abs();
        let hours = abs / 3600;
        let minutes = (abs % 3600) / 60;
        if minutes == 0 {
            write!(f, "UTC{sign}{hours}")
        } else {
            write!(f, "UTC{sign}{hours}:{minutes:02}")
        }
    }
}

/// Parse a local calendar date in "YYYY-MM-DD" format.
///
/// The year is exactly four unsigned digits, which keeps every parsed date
/// far enough from chrono's limits that any offset can be applied to it.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::parse_date;
///
/// assert!(parse_date("2024-02-29").is_ok());
/// assert!(parse_date("2023-02-29").is_err()); // not a leap year
/// assert!(parse_date("29/02/2024").is_err());
/// assert!(parse_date("+262142-12-31").is_err());
/// ```
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TimeError::date("date is empty"));
    }

    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(TimeError::date("expected YYYY-MM-DD"));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| TimeError::date("expected a real calendar date as YYYY-MM-DD"))
}

/// Parse a local wall-clock time in "HH:MM" format.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::parse_hhmm;
///
/// // Valid times
/// assert!(parse_hhmm("00:00").is_ok());
/// assert!(parse_hhmm("23:59").is_ok());
///
/// // Invalid formats
/// assert!(parse_hhmm("1430").is_err());
/// assert!(parse_hhmm("14:3").is_err());
/// assert!(parse_hhmm("25:00").is_err());
/// ```
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, TimeError> {
    let s = s.trim();

    // Must be exactly 5 characters: HH:MM
    if s.len() != 5 {
        return Err(TimeError::time("expected HH:MM format"));
    }

    let bytes = s.as_bytes();

    if bytes[2] != b':' {
        return Err(TimeError::time("expected colon at position 2"));
    }

    let hour =
        parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::time("invalid hour digits"))?;
    if hour > 23 {
        return Err(TimeError::time("hour must be 0-23"));
    }

    let minute =
        parse_two_digits(&bytes[3..5]).ok_or_else(|| TimeError::time("invalid minute digits"))?;
    if minute > 59 {
        return Err(TimeError::time("minute must be 0-59"));
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| TimeError::time("invalid time"))
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// Convert a local date and time at a fixed offset to a UTC instant.
///
/// `utc = local - offset`. A fixed offset never produces an ambiguous or
/// skipped local time. Returns `None` only when the result falls outside
/// chrono's representable range, which a date from [`parse_date`] never
/// does.
pub fn checked_local_to_utc(
    date: NaiveDate,
    time: NaiveTime,
    offset: UtcOffset,
) -> Option<DateTime<Utc>> {
    date.and_time(time)
        .checked_sub_signed(offset.as_duration())
        .map(|utc| Utc.from_utc_datetime(&utc))
}

/// Like [`checked_local_to_utc`], but clamps to the nearest representable
/// instant instead of failing.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, offset: UtcOffset) -> DateTime<Utc> {
    checked_local_to_utc(date, time, offset).unwrap_or_else(|| {
        let edge = if offset.seconds() > 0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        };
        Utc.from_utc_datetime(&edge)
    })
}

/// Parse a local date, time and offset and convert them to a UTC instant.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::to_utc_instant;
///
/// // 22:00 at UTC-5 is 03:00 UTC the next day
/// let utc = to_utc_instant("2024-01-01", "22:00", -5.0).unwrap();
/// assert_eq!(utc.to_rfc3339(), "2024-01-02T03:00:00+00:00");
/// ```
pub fn to_utc_instant(date: &str, time: &str, offset_hours: f64) -> Result<DateTime<Utc>, TimeError> {
    let date = parse_date(date)?;
    let time = parse_hhmm(time)?;
    let offset = UtcOffset::from_hours(offset_hours)?;
    Ok(local_to_utc(date, time, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        let t = parse_hhmm("00:00").unwrap();
        assert_eq!(t.hour(), 0);
        assert_eq!(t.minute(), 0);

        let t = parse_hhmm("23:59").unwrap();
        assert_eq!(t.hour(), 23);
        assert_eq!(t.minute(), 59);

        let t = parse_hhmm("14:30").unwrap();
        assert_eq!(t.hour(), 14);
        assert_eq!(t.minute(), 30);
    }

    #[test]
    fn parse_invalid_time_format() {
        // Wrong length
        assert!(parse_hhmm("1430").is_err());
        assert!(parse_hhmm("14:3").is_err());
        assert!(parse_hhmm("14:300").is_err());
        assert!(parse_hhmm("").is_err());

        // Missing colon
        assert!(parse_hhmm("14-30").is_err());
        assert!(parse_hhmm("14.30").is_err());

        // Non-digit characters
        assert!(parse_hhmm("ab:cd").is_err());
        assert!(parse_hhmm("1a:30").is_err());
    }

    #[test]
    fn parse_invalid_time_values() {
        let err = parse_hhmm("24:00").unwrap_err();
        assert!(err.is_time());
        assert_eq!(err.reason(), "hour must be 0-23");

        let err = parse_hhmm("12:60").unwrap_err();
        assert_eq!(err.reason(), "minute must be 0-59");
        assert_eq!(err.to_string(), "invalid time: minute must be 0-59");
    }

    #[test]
    fn parse_dates() {
        assert_eq!(parse_date("2024-01-01").unwrap(), date(2024, 1, 1));
        assert_eq!(parse_date(" 2024-12-31 ").unwrap(), date(2024, 12, 31));

        let err = parse_date("2024-13-01").unwrap_err();
        assert!(err.is_date());
        assert!(parse_date("2024-04-31").is_err());
        assert!(parse_date("").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn parse_date_requires_four_digit_year() {
        let rejected = [
            "+262142-12-31",
            "-0001-01-01",
            "12024-01-01",
            "2024-1-01",
            "2024-01-1",
            "2024/01/01",
        ];
        for bad in rejected {
            let err = parse_date(bad).unwrap_err();
            assert!(err.is_date(), "{bad:?} should be rejected");
        }
        assert_eq!(parse_date("9999-12-31").unwrap(), date(9999, 12, 31));
        assert_eq!(parse_date("0001-01-01").unwrap(), date(1, 1, 1));
    }

    #[test]
    fn parse_time_trims_whitespace() {
        let t = parse_hhmm(" 10:00 ").unwrap();
        assert_eq!((t.hour(), t.minute()), (10, 0));
        assert!(parse_hhmm("  ").is_err());
        assert!(parse_hhmm(" 1:00 ").is_err());
    }

    #[test]
    fn utc_conversion_at_calendar_edge() {
        let time = parse_hhmm("23:00").unwrap();
        let west = UtcOffset::from_hours(-12.0).unwrap();
        let east = UtcOffset::from_hours(12.0).unwrap();

        assert_eq!(checked_local_to_utc(NaiveDate::MAX, time, west), None);
        assert_eq!(
            local_to_utc(NaiveDate::MAX, time, west),
            Utc.from_utc_datetime(&NaiveDateTime::MAX)
        );

        let early = parse_hhmm("01:00").unwrap();
        assert_eq!(checked_local_to_utc(NaiveDate::MIN, early, east), None);
        assert_eq!(
            local_to_utc(NaiveDate::MIN, early, east),
            Utc.from_utc_datetime(&NaiveDateTime::MIN)
        );

        assert!(checked_local_to_utc(NaiveDate::MAX, early, east).is_some());
    }

    #[test]
    fn offset_range() {
        assert!(UtcOffset::from_hours(-12.0).is_ok());
        assert!(UtcOffset::from_hours(12.0).is_ok());
        assert!(UtcOffset::from_hours(-12.5).is_err());
        assert!(UtcOffset::from_hours(12.25).is_err());
        assert!(UtcOffset::from_hours(f64::NAN).is_err());
        assert!(UtcOffset::from_hours(f64::INFINITY).unwrap_err().is_offset());
    }

    #[test]
    fn offset_fractional_hours() {
        assert_eq!(UtcOffset::from_hours(5.5).unwrap().seconds(), 19_800);
        assert_eq!(UtcOffset::from_hours(5.75).unwrap().seconds(), 20_700);
        assert_eq!(UtcOffset::from_hours(-9.5).unwrap().seconds(), -34_200);
        assert_eq!(UtcOffset::from_hours(9.5).unwrap().hours(), 9.5);
    }

    #[test]
    fn offset_display() {
        assert_eq!(UtcOffset::UTC.to_string(), "UTC+0");
        assert_eq!(UtcOffset::from_hours(-5.0).unwrap().to_string(), "UTC-5");
        assert_eq!(UtcOffset::from_hours(5.75).unwrap().to_string(), "UTC+5:45");
        assert_eq!(UtcOffset::from_hours(-3.5).unwrap().to_string(), "UTC-3:30");
    }

    #[test]
    fn offset_to_fixed() {
        let offset = UtcOffset::from_hours(-3.5).unwrap();
        assert_eq!(offset.to_fixed().local_minus_utc(), -12_600);
    }

    #[test]
    fn utc_conversion_subtracts_offset() {
        let utc = local_to_utc(
            date(2024, 1, 1),
            parse_hhmm("10:00").unwrap(),
            UtcOffset::from_hours(2.0).unwrap(),
        );
        assert_eq!(utc.to_rfc3339(), "2024-01-01T08:00:00+00:00");
    }

    #[test]
    fn utc_conversion_crosses_midnight() {
        // 22:00 at UTC-5 is 03:00 UTC next day
        let utc = to_utc_instant("2024-01-01", "22:00", -5.0).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-01-02T03:00:00+00:00");

        // 01:30 at UTC+5.5 is 20:00 UTC previous day
        let utc = to_utc_instant("2024-03-01", "01:30", 5.5).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-02-29T20:00:00+00:00");
    }

    #[test]
    fn utc_conversion_reports_first_bad_component() {
        assert!(to_utc_instant("2024-02-30", "10:00", 0.0).unwrap_err().is_date());
        assert!(to_utc_instant("2024-02-01", "10:70", 0.0).unwrap_err().is_time());
        assert!(to_utc_instant("2024-02-01", "10:00", 14.0).unwrap_err().is_offset());
    }

    #[test]
    fn utc_conversion_matches_fixed_offset() {
        let offset = UtcOffset::from_hours(9.5).unwrap();
        let d = date(2024, 6, 1);
        let t = parse_hhmm("07:15").unwrap();

        let via_chrono = offset
            .to_fixed()
            .from_local_datetime(&d.and_time(t))
            .single()
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(local_to_utc(d, t, offset), via_chrono);
    }
}
