//! Shared types for timezone resolution.

use serde::Serialize;

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A resolved UTC offset and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimezoneInfo {
    /// Offset in fractional hours east of UTC
    pub utc_offset_hours: f64,
    /// Zone identifier or descriptive label, for display only
    pub name: String,
    /// Name of the service that produced the offset
    pub source: &'static str,
}

/// A city resolved all the way to a UTC offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityTimezone {
    pub city: String,
    pub coordinates: Coordinates,
    pub timezone: TimezoneInfo,
}

/// Render an offset the way the form displays it: "UTC+5.5", "UTC-3".
pub fn offset_label(hours: f64) -> String {
    let sign = if hours >= 0.0 { "+" } else { "" };
    format!("UTC{sign}{hours}")
}
