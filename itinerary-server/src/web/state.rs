//! Application state for the web layer.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::CachedResolver;
use crate::itinerary::DateInference;
use crate::timezone::AutoDetector;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Cached city timezone resolver
    pub timezones: Arc<CachedResolver>,

    /// Latest-wins detection for form inputs, backed by `timezones`
    pub detector: Arc<AutoDetector>,

    /// Rolling date inference settings
    pub inference: DateInference,
}

impl AppState {
    /// Create a new app state.
    pub fn new(timezones: CachedResolver, detect_debounce: Duration, inference: DateInference) -> Self {
        let timezones = Arc::new(timezones);
        let detector = AutoDetector::new(timezones.clone()).with_debounce(detect_debounce);

        Self {
            timezones,
            detector: Arc::new(detector),
            inference,
        }
    }
}
