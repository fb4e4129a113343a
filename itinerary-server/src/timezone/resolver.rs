//! City → UTC offset resolution chain.
//!
//! Geocode the city, then ask each offset source in priority order. A source
//! that errors or runs past its deadline is skipped. If every source fails,
//! the offset is estimated from the coordinates, so a city that geocodes
//! always resolves. A city that does not geocode is retried word by word
//! to offer suggestions.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::error::TimezoneError;
use super::estimate::estimated_info;
use super::geocode::Geocoder;
use super::types::{CityTimezone, Coordinates, TimezoneInfo};

/// Most suggestions offered for a city that does not geocode.
pub const MAX_SUGGESTIONS: usize = 5;

/// Words this short are not worth geocoding on their own.
const MIN_SUGGESTION_WORD_CHARS: usize = 3;

/// Looks up the UTC offset at a point.
pub trait OffsetSource: Send + Sync {
    /// Short service name used in logs and as `TimezoneInfo::source`.
    fn name(&self) -> &'static str;

    fn lookup(&self, at: Coordinates) -> BoxFuture<'_, Result<TimezoneInfo, TimezoneError>>;
}

/// Resolves a city name all the way to a UTC offset.
///
/// Implemented by [`TimezoneResolver`] and by the caching wrapper in front
/// of it, so callers such as the auto-detector work with either.
pub trait CityResolver: Send + Sync {
    fn resolve<'a>(&'a self, city: &'a str) -> BoxFuture<'a, Result<CityTimezone, TimezoneError>>;
}

/// Deadlines applied by the resolver on top of each client's own timeout.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Deadline for the geocoding step
    pub geocode_timeout: Duration,
    /// Deadline for each offset source attempt
    pub lookup_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            geocode_timeout: Duration::from_secs(5),
            lookup_timeout: Duration::from_secs(3),
        }
    }
}

impl ResolverConfig {
    pub fn with_geocode_timeout(mut self, timeout: Duration) -> Self {
        self.geocode_timeout = timeout;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

/// Resolves city names to UTC offsets with graceful fallback.
#[derive(Clone)]
pub struct TimezoneResolver {
    geocoder: Arc<dyn Geocoder>,
    sources: Vec<Arc<dyn OffsetSource>>,
    config: ResolverConfig,
}

impl TimezoneResolver {
    /// Create a resolver with no offset sources; add them with
    /// [`with_source`](Self::with_source) in priority order.
    pub fn new(geocoder: Arc<dyn Geocoder>, config: ResolverConfig) -> Self {
        Self {
            geocoder,
            sources: Vec::new(),
            config,
        }
    }

    /// Append an offset source. Earlier sources are tried first.
    pub fn with_source(mut self, source: Arc<dyn OffsetSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Names of the configured sources, in the order they are tried.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve a city name.
    ///
    /// Only geocoding failures are errors. Offset lookups always succeed,
    /// falling back to an estimate. A miss carries suggestions from
    /// [`suggest`](Self::suggest).
    pub async fn resolve_city(&self, city: &str) -> Result<CityTimezone, TimezoneError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(TimezoneError::EmptyQuery);
        }

        let coordinates = match self.geocode(city).await {
            Ok(coordinates) => coordinates,
            Err(TimezoneError::NotFound { city: missing, .. }) => {
                let suggestions = self.suggest(city).await;
                return Err(TimezoneError::NotFound {
                    city: missing,
                    suggestions,
                });
            }
            Err(e) => return Err(e),
        };

        let timezone = self.lookup(coordinates).await;

        Ok(CityTimezone {
            city: city.to_string(),
            coordinates,
            timezone,
        })
    }

    /// Geocode each word of `city` on its own and describe the hits.
    ///
    /// Words shorter than three characters are skipped, as is a word that
    /// is the whole query. Words that miss, fail or time out contribute
    /// nothing. At most [`MAX_SUGGESTIONS`] distinct places are returned.
    pub async fn suggest(&self, city: &str) -> Vec<String> {
        let mut tried = HashSet::new();
        let mut suggestions: Vec<String> = Vec::new();

        let words = city
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|word| word.chars().count() >= MIN_SUGGESTION_WORD_CHARS)
            .filter(|word| !word.eq_ignore_ascii_case(city.trim()));

        for word in words {
            if suggestions.len() >= MAX_SUGGESTIONS {
                break;
            }
            if !tried.insert(word.to_lowercase()) {
                continue;
            }

            match self.geocode(word).await {
                Ok(at) => {
                    let place = format!("{word} (lat: {:.2}, lon: {:.2})", at.lat, at.lon);
                    if !suggestions.contains(&place) {
                        suggestions.push(place);
                    }
                }
                Err(e) => debug!(word, error = %e, "no suggestion from word"),
            }
        }

        debug!(city, count = suggestions.len(), "collected suggestions");
        suggestions
    }

    async fn geocode(&self, query: &str) -> Result<Coordinates, TimezoneError> {
        let after = self.config.geocode_timeout;
        timeout(after, self.geocoder.geocode(query))
            .await
            .map_err(|_| TimezoneError::Timeout {
                service: self.geocoder.name(),
                after,
            })?
    }

    /// Find the offset at a point, trying each source then estimating.
    pub async fn lookup(&self, at: Coordinates) -> TimezoneInfo {
        let after = self.config.lookup_timeout;

        for source in &self.sources {
            match timeout(after, source.lookup(at)).await {
                Ok(Ok(info)) => {
                    debug!(
                        source = source.name(),
                        offset = info.utc_offset_hours,
                        zone = %info.name,
                        "resolved UTC offset"
                    );
                    return info;
                }
                Ok(Err(e)) => {
                    warn!(source = source.name(), error = %e, "offset lookup failed");
                }
                Err(_) => {
                    warn!(source = source.name(), ?after, "offset lookup timed out");
                }
            }
        }

        let info = estimated_info(at);
        debug!(
            lat = at.lat,
            lon = at.lon,
            offset = info.utc_offset_hours,
            "falling back to estimated offset"
        );
        info
    }
}

impl CityResolver for TimezoneResolver {
    fn resolve<'a>(&'a self, city: &'a str) -> BoxFuture<'a, Result<CityTimezone, TimezoneError>> {
        self.resolve_city(city).boxed()
    }
}
