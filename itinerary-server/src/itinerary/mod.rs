//! Itinerary time calculation.
//!
//! Turns an ordered list of legs into total air time, total layover time,
//! total travel time and per-connection layovers. Legs entered without
//! dates go through `DateInference` first.

mod calculator;
mod format;
mod rolling;

pub use calculator::{CalculationResult, FormattedResult, calculate, calculate_raw};
pub use format::{INVALID_DURATION, format_duration};
pub use rolling::{
    DEFAULT_MAX_SEARCH_DAYS, DateInference, RawScheduledLeg, ScheduledEndpoint, ScheduledLeg,
};
