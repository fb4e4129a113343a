//! Data transfer objects for web requests and responses.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::{RawLeg, Side};
use crate::itinerary::{CalculationResult, RawScheduledLeg, format_duration};
use crate::timezone::{CityTimezone, offset_label};

/// Request to calculate an itinerary with explicit dates.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub legs: Vec<RawLeg>,
}

/// Request to date an itinerary entered with times only, then calculate it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferRequest {
    /// Local date of the first departure, "YYYY-MM-DD"
    pub start_date: String,

    pub legs: Vec<RawScheduledLeg>,
}

/// A duration as both a number and display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationResult {
    /// Whole milliseconds
    pub millis: i64,

    /// "H hours M minutes"
    pub formatted: String,
}

impl From<Duration> for DurationResult {
    fn from(d: Duration) -> Self {
        Self {
            millis: d.num_milliseconds(),
            formatted: format_duration(d),
        }
    }
}

/// Totals for a calculated itinerary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResponse {
    pub total_air_time: DurationResult,
    pub total_layover_time: DurationResult,
    pub total_travel_time: DurationResult,

    /// One entry per connection, in itinerary order
    pub layovers: Vec<DurationResult>,
}

impl From<&CalculationResult> for CalculationResponse {
    fn from(result: &CalculationResult) -> Self {
        Self {
            total_air_time: result.total_air_time.into(),
            total_layover_time: result.total_layover_time.into(),
            total_travel_time: result.total_travel_time.into(),
            layovers: result.layovers.iter().copied().map(Into::into).collect(),
        }
    }
}

/// Inferred legs, with dates filled in, plus their totals.
#[derive(Debug, Serialize)]
pub struct InferResponse {
    pub legs: Vec<RawLeg>,
    pub result: CalculationResponse,
}

/// Query for a single city.
#[derive(Debug, Deserialize)]
pub struct TimezoneQuery {
    pub city: String,
}

/// Query for both endpoints of a leg.
#[derive(Debug, Deserialize)]
pub struct LegTimezoneQuery {
    pub departure: String,
    pub arrival: String,
}

/// A resolved city.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneResult {
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub utc_offset_hours: f64,

    /// Zone identifier, or "Estimated (UTC+h)"
    pub name: String,

    /// "UTC+5.5" style label for the offset
    pub label: String,

    /// Service that produced the offset
    pub source: String,
}

impl From<&CityTimezone> for TimezoneResult {
    fn from(resolved: &CityTimezone) -> Self {
        Self {
            city: resolved.city.clone(),
            lat: resolved.coordinates.lat,
            lon: resolved.coordinates.lon,
            utc_offset_hours: resolved.timezone.utc_offset_hours,
            name: resolved.timezone.name.clone(),
            label: offset_label(resolved.timezone.utc_offset_hours),
            source: resolved.timezone.source.to_string(),
        }
    }
}

/// Both endpoints of a leg, resolved.
#[derive(Debug, Serialize)]
pub struct LegTimezoneResponse {
    pub departure: TimezoneResult,
    pub arrival: TimezoneResult,
}

/// Auto-detect request from a city input as the user types.
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    /// 0-based leg index
    pub leg: usize,

    pub side: Side,

    /// Current contents of the input; blank cancels detection
    pub city: String,
}

/// Auto-detect outcome.
///
/// `superseded` means a newer request for the same field took over and the
/// caller should discard this answer.
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub superseded: bool,
    pub timezone: Option<TimezoneResult>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// "Did you mean" places for a city that was not found
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::{Coordinates, TimezoneInfo};

    #[test]
    fn calculate_request_accepts_both_offset_spellings() {
        let body = r#"{"legs": [{
            "departureCity": "Johannesburg",
            "departureDate": "2024-03-01",
            "departureTime": "10:00",
            "departureTimezoneUtcOffsetInHours": 2,
            "arrivalCity": "Luanda",
            "arrivalDate": "2024-03-01",
            "arrivalTime": "12:25",
            "arrivalOffsetHours": 1
        }]}"#;
        let req: CalculateRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.legs.len(), 1);
        assert_eq!(req.legs[0].departure_offset_hours, 2.0);
        assert_eq!(req.legs[0].arrival_offset_hours, 1.0);
    }

    #[test]
    fn calculation_response_shape() {
        let result = CalculationResult {
            total_air_time: Duration::minutes(985),
            total_layover_time: Duration::minutes(535),
            total_travel_time: Duration::minutes(1520),
            layovers: vec![Duration::minutes(230), Duration::minutes(305)],
        };
        let json = serde_json::to_value(CalculationResponse::from(&result)).unwrap();

        assert_eq!(json["totalAirTime"]["millis"], 985 * 60_000);
        assert_eq!(json["totalAirTime"]["formatted"], "16 hours 25 minutes");
        assert_eq!(json["totalTravelTime"]["formatted"], "25 hours 20 minutes");
        assert_eq!(json["layovers"][1]["formatted"], "5 hours 5 minutes");
    }

    #[test]
    fn timezone_result_from_resolution() {
        let resolved = CityTimezone {
            city: "Kolkata".into(),
            coordinates: Coordinates::new(22.57, 88.36),
            timezone: TimezoneInfo {
                utc_offset_hours: 5.5,
                name: "Asia/Kolkata".into(),
                source: "geonames",
            },
        };
        let json = serde_json::to_value(TimezoneResult::from(&resolved)).unwrap();
        assert_eq!(json["utcOffsetHours"], 5.5);
        assert_eq!(json["label"], "UTC+5.5");
        assert_eq!(json["source"], "geonames");
        assert_eq!(json["lat"], 22.57);
    }

    #[test]
    fn detect_request_side() {
        let req: DetectRequest =
            serde_json::from_str(r#"{"leg": 1, "side": "arrival", "city": "Lima"}"#).unwrap();
        assert_eq!(req.leg, 1);
        assert_eq!(req.side, Side::Arrival);
    }

    #[test]
    fn infer_request_camel_case() {
        let req: InferRequest = serde_json::from_str(
            r#"{"startDate": "2024-03-01", "legs": []}"#,
        )
        .unwrap();
        assert_eq!(req.start_date, "2024-03-01");
        assert!(req.legs.is_empty());
    }
}
