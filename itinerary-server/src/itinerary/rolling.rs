//! Date inference for legs entered without dates.
//!
//! A traveller often knows only the trip's start date plus the local
//! departure and arrival times printed on each boarding pass. This module
//! assigns each endpoint the earliest local date consistent with travel
//! order, producing ordinary dated `Leg`s for `calculate`.
//!
//! Each search starts one day before the reference local date, because an
//! arrival west of the departure can carry an earlier local date (leaving
//! Tokyo at 01:00 on the 2nd lands in Honolulu on the 1st).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    Endpoint, ItineraryError, Leg, Side, UtcOffset, checked_local_to_utc, offset_field, time_field,
};

use super::calculator::{CalculationResult, calculate};

/// Default number of candidate days checked per search.
pub const DEFAULT_MAX_SEARCH_DAYS: u32 = 365;

/// One undated endpoint: a city, a local time and an offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEndpoint {
    pub city: String,
    pub time: NaiveTime,
    pub offset: UtcOffset,
}

impl ScheduledEndpoint {
    /// `None` past the edge of the calendar.
    fn utc_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        checked_local_to_utc(date, self.time, self.offset)
    }

    fn on(&self, date: NaiveDate) -> Endpoint {
        Endpoint::new(self.city.clone(), date, self.time, self.offset)
    }
}

/// A leg whose dates are yet to be inferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledLeg {
    pub departure: ScheduledEndpoint,
    pub arrival: ScheduledEndpoint,
}

/// User-submitted form of a `ScheduledLeg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScheduledLeg {
    pub departure_city: String,
    pub departure_time: String,
    #[serde(alias = "departureTimezoneUtcOffsetInHours")]
    pub departure_offset_hours: f64,
    pub arrival_city: String,
    pub arrival_time: String,
    #[serde(alias = "arrivalTimezoneUtcOffsetInHours")]
    pub arrival_offset_hours: f64,
}

impl RawScheduledLeg {
    /// Parse into a `ScheduledLeg`, reporting failures against leg `index`.
    pub fn parse(&self, index: usize) -> Result<ScheduledLeg, ItineraryError> {
        Ok(ScheduledLeg {
            departure: ScheduledEndpoint {
                city: self.departure_city.trim().to_string(),
                time: time_field(index, Side::Departure, &self.departure_time)?,
                offset: offset_field(index, Side::Departure, self.departure_offset_hours)?,
            },
            arrival: ScheduledEndpoint {
                city: self.arrival_city.trim().to_string(),
                time: time_field(index, Side::Arrival, &self.arrival_time)?,
                offset: offset_field(index, Side::Arrival, self.arrival_offset_hours)?,
            },
        })
    }
}

/// Rolling date inference settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInference {
    /// How many candidate dates a single search checks before giving up.
    pub max_days: u32,
}

impl Default for DateInference {
    fn default() -> Self {
        Self {
            max_days: DEFAULT_MAX_SEARCH_DAYS,
        }
    }
}

impl DateInference {
    /// Create settings with the default search window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of candidate dates checked per search.
    pub fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = max_days;
        self
    }

    /// Assign dates to every endpoint, starting on `start`.
    ///
    /// The first leg departs on `start`. Every arrival gets the earliest
    /// date that lands strictly after its departure; every later departure
    /// gets the earliest date not before the previous arrival.
    ///
    /// # Errors
    ///
    /// `DateSearchExhausted` if no date within `max_days` candidates works.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use itinerary_server::itinerary::{DateInference, RawScheduledLeg};
    ///
    /// let legs = vec![RawScheduledLeg {
    ///     departure_city: "Luanda".into(),
    ///     departure_time: "23:00".into(),
    ///     departure_offset_hours: 1.0,
    ///     arrival_city: "Sao Paulo".into(),
    ///     arrival_time: "03:30".into(),
    ///     arrival_offset_hours: -3.0,
    /// }
    /// .parse(0)
    /// .unwrap()];
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let dated = DateInference::new().infer(start, &legs).unwrap();
    ///
    /// // Overnight flight lands the next local day
    /// assert_eq!(dated[0].arrival().date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    /// ```
    pub fn infer(&self, start: NaiveDate, legs: &[ScheduledLeg]) -> Result<Vec<Leg>, ItineraryError> {
        let mut result = Vec::with_capacity(legs.len());
        let mut prev_arrival: Option<(NaiveDate, DateTime<Utc>)> = None;

        for (i, leg) in legs.iter().enumerate() {
            let exhausted = ItineraryError::DateSearchExhausted {
                leg: i,
                max_days: self.max_days,
            };

            let (dep_date, dep_utc) = match prev_arrival {
                None => {
                    let dep_utc = leg.departure.utc_on(start).ok_or_else(|| exhausted.clone())?;
                    (start, dep_utc)
                }
                Some((arr_date, arr_utc)) => self
                    .earliest_date(day_before(arr_date), |date| {
                        leg.departure.utc_on(date).filter(|&utc| utc >= arr_utc)
                    })
                    .ok_or_else(|| exhausted.clone())?,
            };

            let (arr_date, arr_utc) = self
                .earliest_date(day_before(dep_date), |date| {
                    leg.arrival.utc_on(date).filter(|&utc| utc > dep_utc)
                })
                .ok_or(exhausted)?;

            debug!(leg = i, %dep_date, %arr_date, "inferred leg dates");

            prev_arrival = Some((arr_date, arr_utc));
            result.push(Leg::new(leg.departure.on(dep_date), leg.arrival.on(arr_date)));
        }

        Ok(result)
    }

    /// Infer dates, then calculate.
    pub fn infer_and_calculate(
        &self,
        start: NaiveDate,
        legs: &[ScheduledLeg],
    ) -> Result<(Vec<Leg>, CalculationResult), ItineraryError> {
        let dated = self.infer(start, legs)?;
        let result = calculate(&dated)?;
        Ok((dated, result))
    }

    /// Walk forward from `from` until `accept` yields an instant, checking at
    /// most `max_days` dates.
    fn earliest_date<F>(&self, from: NaiveDate, accept: F) -> Option<(NaiveDate, DateTime<Utc>)>
    where
        F: Fn(NaiveDate) -> Option<DateTime<Utc>>,
    {
        let mut date = from;
        for checked in 0..self.max_days {
            if let Some(utc) = accept(date) {
                return Some((date, utc));
            }
            if checked + 1 < self.max_days {
                date = date.succ_opt()?;
            }
        }
        None
    }
}

fn day_before(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}
