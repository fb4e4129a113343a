//! City timezone resolution.
//!
//! Turns a city name into a UTC offset so users need not know offsets by
//! heart. Resolution goes:
//!
//! 1. Geocode the name with Nominatim
//! 2. Ask GeoNames, then TimeAPI, for the standard offset at that point
//! 3. If neither answers, estimate from longitude and a regional table
//!
//! Offsets are fixed per city; DST is not modelled.

mod detect;
mod error;
mod estimate;
mod geocode;
mod geonames;
pub mod mock;
mod resolver;
mod timeapi;
mod types;

pub use detect::{AutoDetector, DetectField};
pub use error::TimezoneError;
pub use estimate::{ESTIMATE_SOURCE, estimate_offset, estimated_info};
pub use geocode::{DEFAULT_USER_AGENT, Geocoder, NominatimClient, NominatimConfig};
pub use geonames::{DEFAULT_USERNAME, GeoNamesClient, GeoNamesConfig};
pub use resolver::{CityResolver, MAX_SUGGESTIONS, OffsetSource, ResolverConfig, TimezoneResolver};
pub use timeapi::{TimeApiClient, TimeApiConfig};
pub use types::{CityTimezone, Coordinates, TimezoneInfo, offset_label};
