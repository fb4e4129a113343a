//! Flight leg types.
//!
//! A `Leg` is one flight segment from a departure endpoint to an arrival
//! endpoint. Each endpoint carries its own local date, local time and UTC
//! offset, so a leg converts to UTC without consulting any timezone data.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ItineraryError, Side};
use super::time::{UtcOffset, local_to_utc, parse_date, parse_hhmm};

/// One end of a leg: where, and at what local date and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    city: String,
    date: NaiveDate,
    time: NaiveTime,
    offset: UtcOffset,
}

impl Endpoint {
    /// Create an endpoint from already-validated parts.
    pub fn new(city: impl Into<String>, date: NaiveDate, time: NaiveTime, offset: UtcOffset) -> Self {
        Self {
            city: city.into(),
            date,
            time,
            offset,
        }
    }

    /// Returns the display name of the city.
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Returns the local calendar date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the local wall-clock time.
    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// Returns the UTC offset in effect at this endpoint.
    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Returns the instant this endpoint denotes, in UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        local_to_utc(self.date, self.time, self.offset)
    }
}

/// A single flight segment.
///
/// Construction does not check that the arrival follows the departure;
/// the calculator does, so that it can report which leg is wrong.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::{Endpoint, Leg, UtcOffset, parse_date, parse_hhmm};
///
/// let date = parse_date("2024-01-01").unwrap();
/// let leg = Leg::new(
///     Endpoint::new("Johannesburg", date, parse_hhmm("16:40").unwrap(), UtcOffset::from_hours(2.0).unwrap()),
///     Endpoint::new("Luanda", date, parse_hhmm("19:10").unwrap(), UtcOffset::from_hours(1.0).unwrap()),
/// );
///
/// assert_eq!(leg.duration(), chrono::Duration::minutes(210));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    departure: Endpoint,
    arrival: Endpoint,
}

impl Leg {
    /// Create a leg from its two endpoints.
    pub fn new(departure: Endpoint, arrival: Endpoint) -> Self {
        Self { departure, arrival }
    }

    /// Returns the departure endpoint.
    pub fn departure(&self) -> &Endpoint {
        &self.departure
    }

    /// Returns the arrival endpoint.
    pub fn arrival(&self) -> &Endpoint {
        &self.arrival
    }

    /// Returns the departure instant in UTC.
    pub fn departure_utc(&self) -> DateTime<Utc> {
        self.departure.to_utc()
    }

    /// Returns the arrival instant in UTC.
    pub fn arrival_utc(&self) -> DateTime<Utc> {
        self.arrival.to_utc()
    }

    /// Returns the flight duration.
    ///
    /// Negative or zero if the leg is invalid.
    pub fn duration(&self) -> Duration {
        self.arrival_utc().signed_duration_since(self.departure_utc())
    }
}

/// A leg as submitted by a user: unparsed dates and times.
///
/// Field names follow the JSON form (`departureCity`, `departureDate`, ...).
/// The longer `...TimezoneUtcOffsetInHours` spelling is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLeg {
    pub departure_city: String,
    pub departure_date: String,
    pub departure_time: String,
    #[serde(alias = "departureTimezoneUtcOffsetInHours")]
    pub departure_offset_hours: f64,
    pub arrival_city: String,
    pub arrival_date: String,
    pub arrival_time: String,
    #[serde(alias = "arrivalTimezoneUtcOffsetInHours")]
    pub arrival_offset_hours: f64,
}

impl RawLeg {
    /// Parse into a `Leg`, reporting failures against leg `index`.
    pub fn parse(&self, index: usize) -> Result<Leg, ItineraryError> {
        let departure = parse_endpoint(
            index,
            Side::Departure,
            &self.departure_city,
            &self.departure_date,
            &self.departure_time,
            self.departure_offset_hours,
        )?;
        let arrival = parse_endpoint(
            index,
            Side::Arrival,
            &self.arrival_city,
            &self.arrival_date,
            &self.arrival_time,
            self.arrival_offset_hours,
        )?;
        Ok(Leg::new(departure, arrival))
    }
}

impl From<&Leg> for RawLeg {
    fn from(leg: &Leg) -> Self {
        Self {
            departure_city: leg.departure.city.clone(),
            departure_date: leg.departure.date.format("%Y-%m-%d").to_string(),
            departure_time: leg.departure.time.format("%H:%M").to_string(),
            departure_offset_hours: leg.departure.offset.hours(),
            arrival_city: leg.arrival.city.clone(),
            arrival_date: leg.arrival.date.format("%Y-%m-%d").to_string(),
            arrival_time: leg.arrival.time.format("%H:%M").to_string(),
            arrival_offset_hours: leg.arrival.offset.hours(),
        }
    }
}

/// Parse one endpoint, checking date, then time, then offset.
fn parse_endpoint(
    leg: usize,
    side: Side,
    city: &str,
    date: &str,
    time: &str,
    offset_hours: f64,
) -> Result<Endpoint, ItineraryError> {
    let date = date_field(leg, side, date)?;
    let time = time_field(leg, side, time)?;
    let offset = offset_field(leg, side, offset_hours)?;
    Ok(Endpoint::new(city.trim(), date, time, offset))
}

fn date_field(leg: usize, side: Side, value: &str) -> Result<NaiveDate, ItineraryError> {
    parse_date(value).map_err(|_| ItineraryError::InvalidDate {
        leg,
        side,
        value: value.to_string(),
    })
}

pub(crate) fn time_field(leg: usize, side: Side, value: &str) -> Result<NaiveTime, ItineraryError> {
    parse_hhmm(value).map_err(|e| ItineraryError::InvalidTime {
        leg,
        side,
        value: value.to_string(),
        reason: e.reason(),
    })
}

pub(crate) fn offset_field(leg: usize, side: Side, hours: f64) -> Result<UtcOffset, ItineraryError> {
    UtcOffset::from_hours(hours).map_err(|_| ItineraryError::InvalidOffset { leg, side, hours })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(dep_date: &str, dep_time: &str, dep_off: f64, arr_date: &str, arr_time: &str, arr_off: f64) -> RawLeg {
        RawLeg {
            departure_city: "Johannesburg".into(),
            departure_date: dep_date.into(),
            departure_time: dep_time.into(),
            departure_offset_hours: dep_off,
            arrival_city: "Luanda".into(),
            arrival_date: arr_date.into(),
            arrival_time: arr_time.into(),
            arrival_offset_hours: arr_off,
        }
    }

    #[test]
    fn parse_valid_leg() {
        let leg = raw("2024-01-01", "16:40", 2.0, "2024-01-01", "19:10", 1.0)
            .parse(0)
            .unwrap();

        assert_eq!(leg.departure().city(), "Johannesburg");
        assert_eq!(leg.arrival().city(), "Luanda");
        assert_eq!(leg.departure_utc().to_rfc3339(), "2024-01-01T14:40:00+00:00");
        assert_eq!(leg.arrival_utc().to_rfc3339(), "2024-01-01T18:10:00+00:00");
        assert_eq!(leg.duration(), Duration::minutes(210));
    }

    #[test]
    fn parse_reports_leg_and_side() {
        let err = raw("2024-02-30", "16:40", 2.0, "2024-01-01", "19:10", 1.0)
            .parse(3)
            .unwrap_err();
        assert_eq!(
            err,
            ItineraryError::InvalidDate {
                leg: 3,
                side: Side::Departure,
                value: "2024-02-30".into(),
            }
        );

        let err = raw("2024-01-01", "16:40", 2.0, "2024-01-01", "7:10", 1.0)
            .parse(0)
            .unwrap_err();
        assert!(matches!(
            err,
            ItineraryError::InvalidTime {
                leg: 0,
                side: Side::Arrival,
                ..
            }
        ));

        let err = raw("2024-01-01", "16:40", -13.0, "2024-01-01", "19:10", 1.0)
            .parse(1)
            .unwrap_err();
        assert!(matches!(
            err,
            ItineraryError::InvalidOffset {
                leg: 1,
                side: Side::Departure,
                ..
            }
        ));
    }

    #[test]
    fn parse_does_not_check_ordering() {
        // Backwards legs are the calculator's concern
        let leg = raw("2024-01-01", "19:00", 0.0, "2024-01-01", "18:00", 0.0)
            .parse(0)
            .unwrap();
        assert!(leg.duration() < Duration::zero());
    }

    #[test]
    fn deserialize_camel_case() {
        let json = r#"{
            "departureCity": "Sao Paulo",
            "departureDate": "2024-01-02",
            "departureTime": "08:35",
            "departureOffsetHours": -3,
            "arrivalCity": "Santiago",
            "arrivalDate": "2024-01-02",
            "arrivalTime": "13:00",
            "arrivalOffsetHours": -3
        }"#;
        let leg: RawLeg = serde_json::from_str(json).unwrap();
        assert_eq!(leg.departure_city, "Sao Paulo");
        assert_eq!(leg.departure_offset_hours, -3.0);
    }

    #[test]
    fn deserialize_long_offset_names() {
        let json = r#"{
            "departureCity": "Luanda",
            "departureDate": "2024-01-01",
            "departureTime": "23:00",
            "departureTimezoneUtcOffsetInHours": 1,
            "arrivalCity": "Sao Paulo",
            "arrivalDate": "2024-01-02",
            "arrivalTime": "03:30",
            "arrivalTimezoneUtcOffsetInHours": -3
        }"#;
        let leg: RawLeg = serde_json::from_str(json).unwrap();
        assert_eq!(leg.arrival_offset_hours, -3.0);
        assert_eq!(leg.parse(0).unwrap().duration(), Duration::hours(8) + Duration::minutes(30));
    }

    #[test]
    fn raw_from_leg_roundtrips() {
        let original = raw("2024-01-01", "16:40", 5.5, "2024-01-02", "01:10", -3.5);
        let leg = original.parse(0).unwrap();
        assert_eq!(RawLeg::from(&leg), original);
    }
}
