//! Server configuration from environment variables.
//!
//! | Variable                   | Default                  |
//! |----------------------------|--------------------------|
//! | `ITINERARY_ADDR`           | `127.0.0.1:3000`         |
//! | `GEONAMES_USERNAME`        | `demo`                   |
//! | `NOMINATIM_USER_AGENT`     | `itinerary-server/<ver>` |
//! | `GEOCODE_TIMEOUT_SECS`     | `5`                      |
//! | `LOOKUP_TIMEOUT_SECS`      | `3`                      |
//! | `TIMEZONE_CACHE_TTL_SECS`  | `86400`                  |
//! | `TIMEZONE_CACHE_CAPACITY`  | `10000`                  |
//! | `DETECT_DEBOUNCE_MS`       | `0`                      |
//! | `MAX_SEARCH_DAYS`          | `365`                    |
//!
//! Unset and blank variables take the default. Anything else must parse.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::itinerary::DateInference;
use crate::timezone::{GeoNamesConfig, NominatimConfig, ResolverConfig, TimeApiConfig};

/// Default listen address.
const DEFAULT_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    3000,
);

/// A variable was set to something unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {key}={value:?}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub nominatim: NominatimConfig,
    pub geonames: GeoNamesConfig,
    pub timeapi: TimeApiConfig,
    pub resolver: ResolverConfig,
    pub cache: CacheConfig,
    pub detect_debounce: Duration,
    pub inference: DateInference,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR,
            nominatim: NominatimConfig::default(),
            geonames: GeoNamesConfig::default(),
            timeapi: TimeApiConfig::default(),
            resolver: ResolverConfig::default(),
            cache: CacheConfig::default(),
            detect_debounce: Duration::ZERO,
            inference: DateInference::default(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to read variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = parse_var(&var, "ITINERARY_ADDR")? {
            config.addr = addr;
        }
        if let Some(username) = var("GEONAMES_USERNAME") {
            config.geonames.username = username.trim().to_string();
        }
        if let Some(user_agent) = var("NOMINATIM_USER_AGENT") {
            config.nominatim.user_agent = user_agent.trim().to_string();
        }
        if let Some(secs) = seconds_var(&var, "GEOCODE_TIMEOUT_SECS")? {
            config = config.with_geocode_timeout(secs);
        }
        if let Some(secs) = seconds_var(&var, "LOOKUP_TIMEOUT_SECS")? {
            config = config.with_lookup_timeout(secs);
        }
        if let Some(ttl) = seconds_var(&var, "TIMEZONE_CACHE_TTL_SECS")? {
            config.cache.ttl = ttl;
        }
        if let Some(capacity) = parse_var(&var, "TIMEZONE_CACHE_CAPACITY")? {
            config.cache.max_capacity = capacity;
        }
        if let Some(ms) = parse_var::<u64>(&var, "DETECT_DEBOUNCE_MS")? {
            config.detect_debounce = Duration::from_millis(ms);
        }
        if let Some(days) = parse_var(&var, "MAX_SEARCH_DAYS")? {
            config.inference = config.inference.with_max_days(days);
        }

        Ok(config)
    }

    /// Set the geocoding deadline, on both the resolver and the HTTP client.
    pub fn with_geocode_timeout(mut self, timeout: Duration) -> Self {
        self.resolver.geocode_timeout = timeout;
        self.nominatim.timeout = timeout;
        self
    }

    /// Set the per-source offset lookup deadline, on the resolver and clients.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.resolver.lookup_timeout = timeout;
        self.geonames.timeout = timeout;
        self.timeapi.timeout = timeout;
        self
    }
}

fn parse_var<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = var(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError {
            key,
            value,
            reason: e.to_string(),
        })
}

/// A whole number of seconds, which must be positive.
fn seconds_var(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    match parse_var::<u64>(var, key)? {
        Some(0) => Err(ConfigError {
            key,
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        }),
        secs => Ok(secs.map(Duration::from_secs)),
    }
}
