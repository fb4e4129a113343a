//! Human-readable durations.

use chrono::Duration;

/// Shown in place of a duration that should never have been negative.
pub const INVALID_DURATION: &str = "Invalid time";

/// Format a duration as "H hours M minutes".
///
/// Seconds are truncated. Hours are not wrapped into days. A negative
/// duration is a caller bug; it renders as [`INVALID_DURATION`] rather
/// than panicking, since this is a display path.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use itinerary_server::itinerary::format_duration;
///
/// assert_eq!(format_duration(Duration::minutes(270)), "4 hours 30 minutes");
/// assert_eq!(format_duration(Duration::hours(25)), "25 hours 0 minutes");
/// assert_eq!(format_duration(Duration::minutes(-1)), "Invalid time");
/// ```
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::zero() {
        return INVALID_DURATION.to_string();
    }

    let total_minutes = duration.num_minutes();
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    format!("{hours} hours {minutes} minutes")
}
