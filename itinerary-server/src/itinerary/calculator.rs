//! Air, layover and travel time calculation.
//!
//! All arithmetic happens on UTC instants. Local times are only an input
//! format; comparing them directly would be wrong whenever two endpoints
//! sit in different timezones.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{ItineraryError, Leg, RawLeg};

use super::format::format_duration;

/// Aggregate durations for one itinerary.
///
/// All fields are non-negative magnitudes. `layovers` has one entry per
/// connection, i.e. `legs.len() - 1` entries (none for an empty itinerary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationResult {
    pub total_air_time: Duration,
    pub total_layover_time: Duration,
    pub total_travel_time: Duration,
    pub layovers: Vec<Duration>,
}

impl Default for CalculationResult {
    fn default() -> Self {
        Self {
            total_air_time: Duration::zero(),
            total_layover_time: Duration::zero(),
            total_travel_time: Duration::zero(),
            layovers: Vec::new(),
        }
    }
}

impl CalculationResult {
    /// Returns all durations rendered as "H hours M minutes".
    pub fn formatted(&self) -> FormattedResult {
        FormattedResult {
            total_air_time: format_duration(self.total_air_time),
            total_layover_time: format_duration(self.total_layover_time),
            total_travel_time: format_duration(self.total_travel_time),
            layovers: self.layovers.iter().copied().map(format_duration).collect(),
        }
    }
}

/// Display strings for a `CalculationResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedResult {
    pub total_air_time: String,
    pub total_layover_time: String,
    pub total_travel_time: String,
    pub layovers: Vec<String>,
}

/// Calculate air, layover and travel time for an ordered list of legs.
///
/// # Errors
///
/// - `NonPositiveFlightDuration` if a leg does not arrive strictly after it
///   departs (in UTC).
/// - `NegativeLayover` if a leg departs before the previous leg arrives.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::RawLeg;
/// use itinerary_server::itinerary::calculate_raw;
///
/// let legs = vec![RawLeg {
///     departure_city: "A".into(),
///     departure_date: "2024-01-01".into(),
///     departure_time: "10:00".into(),
///     departure_offset_hours: 0.0,
///     arrival_city: "B".into(),
///     arrival_date: "2024-01-01".into(),
///     arrival_time: "14:30".into(),
///     arrival_offset_hours: 0.0,
/// }];
///
/// let result = calculate_raw(&legs).unwrap();
/// assert_eq!(result.formatted().total_air_time, "4 hours 30 minutes");
/// assert_eq!(result.total_travel_time, result.total_air_time);
/// ```
pub fn calculate(legs: &[Leg]) -> Result<CalculationResult, ItineraryError> {
    let mut totals = Totals::default();
    for (i, leg) in legs.iter().enumerate() {
        totals.push(i, leg)?;
    }
    Ok(totals.finish())
}

/// Parse user-submitted legs and calculate.
///
/// Legs are parsed and checked one at a time, so the error reported is the
/// first problem in itinerary order: a backward first leg is reported before
/// a malformed date on the second.
pub fn calculate_raw(legs: &[RawLeg]) -> Result<CalculationResult, ItineraryError> {
    let mut totals = Totals::default();
    for (i, raw) in legs.iter().enumerate() {
        let leg = raw.parse(i)?;
        totals.push(i, &leg)?;
    }
    Ok(totals.finish())
}

/// Running totals while walking an itinerary in order.
#[derive(Default)]
struct Totals {
    result: CalculationResult,
    legs: usize,
    first_departure: Option<DateTime<Utc>>,
    prev_arrival: Option<DateTime<Utc>>,
}

impl Totals {
    /// Add leg `i`, which must follow every leg pushed so far.
    fn push(&mut self, i: usize, leg: &Leg) -> Result<(), ItineraryError> {
        let dep = leg.departure_utc();
        let arr = leg.arrival_utc();

        if arr <= dep {
            return Err(ItineraryError::NonPositiveFlightDuration { leg: i });
        }

        if let Some(prev) = self.prev_arrival {
            if dep < prev {
                return Err(ItineraryError::NegativeLayover { leg: i });
            }
            let layover = dep - prev;
            self.result.layovers.push(layover);
            self.result.total_layover_time += layover;
        }

        self.result.total_air_time += arr - dep;

        self.first_departure.get_or_insert(dep);
        self.prev_arrival = Some(arr);
        self.legs += 1;
        Ok(())
    }

    fn finish(mut self) -> CalculationResult {
        if let (Some(first), Some(last)) = (self.first_departure, self.prev_arrival) {
            self.result.total_travel_time = last - first;
        }

        debug!(
            legs = self.legs,
            air_mins = self.result.total_air_time.num_minutes(),
            layover_mins = self.result.total_layover_time.num_minutes(),
            travel_mins = self.result.total_travel_time.num_minutes(),
            "calculated itinerary"
        );

        self.result
    }
}
