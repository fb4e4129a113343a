//! Domain error types.
//!
//! These errors describe invalid itinerary input. Every variant names the
//! offending leg by its 0-based index; the `Display` form is 1-based so it
//! can be shown directly next to the form field the user filled in.

use std::fmt;

/// Which end of a leg a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Departure,
    Arrival,
}

impl Side {
    /// Returns a lowercase label for messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Departure => "departure",
            Side::Arrival => "arrival",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while validating or calculating an itinerary.
///
/// Any of these aborts the whole calculation; there is no partial result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ItineraryError {
    /// A date did not parse to a real calendar date
    #[error("leg {}: invalid {side} date {value:?}", .leg + 1)]
    InvalidDate {
        leg: usize,
        side: Side,
        value: String,
    },

    /// A time did not parse as HH:MM
    #[error("leg {}: invalid {side} time {value:?} ({reason})", .leg + 1)]
    InvalidTime {
        leg: usize,
        side: Side,
        value: String,
        reason: &'static str,
    },

    /// A UTC offset was out of range or not a number
    #[error("leg {}: {side} UTC offset {hours} is outside -12..=+12 hours", .leg + 1)]
    InvalidOffset { leg: usize, side: Side, hours: f64 },

    /// Arrival is not strictly after departure
    #[error("leg {}: arrival must be after departure", .leg + 1)]
    NonPositiveFlightDuration { leg: usize },

    /// Leg departs before the previous leg arrives
    #[error("leg {}: departure must not be before the previous leg's arrival", .leg + 1)]
    NegativeLayover { leg: usize },

    /// Rolling date inference found no consistent date in its search window
    #[error("leg {}: no consistent date found within {max_days} days", .leg + 1)]
    DateSearchExhausted { leg: usize, max_days: u32 },
}

impl ItineraryError {
    /// Returns the 0-based index of the leg this error refers to.
    pub fn leg(&self) -> usize {
        match self {
            ItineraryError::InvalidDate { leg, .. }
            | ItineraryError::InvalidTime { leg, .. }
            | ItineraryError::InvalidOffset { leg, .. }
            | ItineraryError::NonPositiveFlightDuration { leg }
            | ItineraryError::NegativeLayover { leg }
            | ItineraryError::DateSearchExhausted { leg, .. } => *leg,
        }
    }
}
