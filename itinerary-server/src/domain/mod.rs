//! Domain types for the itinerary calculator.
//!
//! This module contains the value types that represent validated flight
//! legs. Parsing happens once, at the edge; code that receives a `Leg`
//! can trust that its dates, times and offsets are well-formed.

mod error;
mod leg;
mod time;

pub use error::{ItineraryError, Side};
pub use leg::{Endpoint, Leg, RawLeg};
pub(crate) use leg::{offset_field, time_field};
pub use time::{
    MAX_OFFSET_HOURS, MIN_OFFSET_HOURS, TimeError, UtcOffset, checked_local_to_utc, local_to_utc,
    parse_date, parse_hhmm, to_utc_instant,
};
