//! Web layer for the itinerary calculator.
//!
//! Provides JSON endpoints for calculating itineraries and resolving city
//! timezones.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
