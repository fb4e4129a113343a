//! Caching layer for city timezone resolutions.
//!
//! A city's standard offset practically never changes, and every
//! resolution costs a geocode plus at least one offset lookup against
//! rate-limited public services. Entries are keyed by the normalised city
//! name. Estimated offsets are not cached, so a service that recovers is
//! used on the next request.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::timezone::{
    CityResolver, CityTimezone, ESTIMATE_SOURCE, TimezoneError, TimezoneResolver,
};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

/// Normalise a city name for use as a cache key.
///
/// Case and runs of whitespace do not distinguish cities.
fn cache_key(city: &str) -> String {
    city.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Timezone resolver with caching.
pub struct CachedResolver {
    resolver: TimezoneResolver,
    cities: MokaCache<String, CityTimezone>,
}

impl CachedResolver {
    /// Create a new cached resolver.
    pub fn new(resolver: TimezoneResolver, config: &CacheConfig) -> Self {
        let cities = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { resolver, cities }
    }

    /// Resolve a city, using the cache if available.
    ///
    /// The returned `city` is always the caller's input (trimmed), even on a
    /// hit recorded under different capitalisation.
    pub async fn resolve_city(&self, city: &str) -> Result<CityTimezone, TimezoneError> {
        let key = cache_key(city);
        if key.is_empty() {
            return Err(TimezoneError::EmptyQuery);
        }

        if let Some(hit) = self.cities.get(&key).await {
            debug!(city = %key, "timezone cache hit");
            return Ok(CityTimezone {
                city: city.trim().to_string(),
                ..hit
            });
        }

        let resolved = self.resolver.resolve_city(city).await?;

        if resolved.timezone.source != ESTIMATE_SOURCE {
            self.cities.insert(key, resolved.clone()).await;
        }

        Ok(resolved)
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cities.invalidate_all();
    }
}

impl CityResolver for CachedResolver {
    fn resolve<'a>(&'a self, city: &'a str) -> BoxFuture<'a, Result<CityTimezone, TimezoneError>> {
        self.resolve_city(city).boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::timezone::mock::{FailingSource, FixedSource, StaticGeocoder};
    use crate::timezone::{Coordinates, ResolverConfig};

    fn geocoder() -> Arc<StaticGeocoder> {
        Arc::new(
            StaticGeocoder::new()
                .with_place("Santiago", Coordinates::new(-33.45, -70.67))
                .with_place("Sao Paulo", Coordinates::new(-23.55, -46.63)),
        )
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(86_400));
        assert_eq!(config.max_capacity, 10_000);
    }

    #[test]
    fn key_normalisation() {
        assert_eq!(cache_key("  Sao   Paulo "), "sao paulo");
        assert_eq!(cache_key("SANTIAGO"), "santiago");
        assert_eq!(cache_key(" \t "), "");
    }

    #[tokio::test]
    async fn second_lookup_is_a_hit() {
        let geocoder = geocoder();
        let resolver = TimezoneResolver::new(geocoder.clone(), ResolverConfig::default())
            .with_source(Arc::new(FixedSource::new("fixed", -4.0, "America/Santiago")));
        let cached = CachedResolver::new(resolver, &CacheConfig::default());

        let first = cached.resolve_city("Santiago").await.unwrap();
        let second = cached.resolve_city("  santiago ").await.unwrap();

        assert_eq!(geocoder.calls(), 1);
        assert_eq!(first.timezone, second.timezone);
        assert_eq!(second.city, "santiago");
    }

    #[tokio::test]
    async fn different_cities_are_separate_entries() {
        let geocoder = geocoder();
        let resolver = TimezoneResolver::new(geocoder.clone(), ResolverConfig::default())
            .with_source(Arc::new(FixedSource::new("fixed", -3.0, "America/Sao_Paulo")));
        let cached = CachedResolver::new(resolver, &CacheConfig::default());

        cached.resolve_city("Santiago").await.unwrap();
        cached.resolve_city("Sao  Paulo").await.unwrap();
        cached.resolve_city("sao paulo").await.unwrap();

        assert_eq!(geocoder.calls(), 2);
    }

    #[tokio::test]
    async fn estimates_are_not_cached() {
        let geocoder = geocoder();
        let resolver = TimezoneResolver::new(geocoder.clone(), ResolverConfig::default())
            .with_source(Arc::new(FailingSource::new("down")));
        let cached = CachedResolver::new(resolver, &CacheConfig::default());

        let first = cached.resolve_city("Santiago").await.unwrap();
        assert_eq!(first.timezone.source, ESTIMATE_SOURCE);
        cached.resolve_city("Santiago").await.unwrap();

        assert_eq!(geocoder.calls(), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let geocoder = geocoder();
        let resolver = TimezoneResolver::new(geocoder.clone(), ResolverConfig::default());
        let cached = CachedResolver::new(resolver, &CacheConfig::default());

        assert!(cached.resolve_city("Atlantis").await.is_err());
        assert!(cached.resolve_city("Atlantis").await.is_err());
        assert_eq!(geocoder.calls(), 2);
    }

    #[tokio::test]
    async fn blank_city_never_reaches_the_geocoder() {
        let geocoder = geocoder();
        let resolver = TimezoneResolver::new(geocoder.clone(), ResolverConfig::default());
        let cached = CachedResolver::new(resolver, &CacheConfig::default());

        let err = cached.resolve_city("   ").await.unwrap_err();
        assert!(matches!(err, TimezoneError::EmptyQuery));
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn invalidate_forces_a_refetch() {
        let geocoder = geocoder();
        let resolver = TimezoneResolver::new(geocoder.clone(), ResolverConfig::default())
            .with_source(Arc::new(FixedSource::new("fixed", -4.0, "America/Santiago")));
        let cached = CachedResolver::new(resolver, &CacheConfig::default());

        cached.resolve_city("Santiago").await.unwrap();
        cached.invalidate_cache();
        cached.resolve_city("Santiago").await.unwrap();

        assert_eq!(geocoder.calls(), 2);
    }
}
