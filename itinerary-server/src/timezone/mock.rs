//! In-memory geocoder and offset sources for running without network access.
//!
//! Lookups can be delayed to exercise timeouts and request ordering.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::error::TimezoneError;
use super::geocode::Geocoder;
use super::resolver::OffsetSource;
use super::types::{Coordinates, TimezoneInfo};

/// Geocoder backed by a fixed table of places, matched case-insensitively.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    places: HashMap<String, (Coordinates, Duration)>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a place answered after the default delay.
    pub fn with_place(self, name: &str, at: Coordinates) -> Self {
        let delay = self.delay;
        self.with_slow_place(name, at, delay)
    }

    /// Add a place answered after its own delay.
    pub fn with_slow_place(mut self, name: &str, at: Coordinates, delay: Duration) -> Self {
        self.places.insert(name.to_lowercase(), (at, delay));
        self
    }

    /// Delay every lookup, including misses, by at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        for (_, place_delay) in self.places.values_mut() {
            *place_delay = (*place_delay).max(delay);
        }
        self
    }

    /// Number of geocode calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for StaticGeocoder {
    fn name(&self) -> &'static str {
        "static"
    }

    fn geocode<'a>(&'a self, city: &'a str) -> BoxFuture<'a, Result<Coordinates, TimezoneError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            let city = city.trim();
            if city.is_empty() {
                return Err(TimezoneError::EmptyQuery);
            }
            match self.places.get(&city.to_lowercase()) {
                Some(&(at, delay)) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(at)
                }
                None => {
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    Err(TimezoneError::not_found(city))
                }
            }
        }
        .boxed()
    }
}

/// Offset source that always answers with the same zone.
#[derive(Debug)]
pub struct FixedSource {
    name: &'static str,
    info: TimezoneInfo,
    delay: Duration,
}

impl FixedSource {
    pub fn new(name: &'static str, utc_offset_hours: f64, zone: &str) -> Self {
        Self {
            name,
            info: TimezoneInfo {
                utc_offset_hours,
                name: zone.to_string(),
                source: name,
            },
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl OffsetSource for FixedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn lookup(&self, _at: Coordinates) -> BoxFuture<'_, Result<TimezoneInfo, TimezoneError>> {
        async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.info.clone())
        }
        .boxed()
    }
}

/// Offset source that always fails, as an unreachable service would.
#[derive(Debug)]
pub struct FailingSource {
    name: &'static str,
}

impl FailingSource {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl OffsetSource for FailingSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn lookup(&self, _at: Coordinates) -> BoxFuture<'_, Result<TimezoneInfo, TimezoneError>> {
        let err = TimezoneError::Api {
            status: 503,
            message: format!("{} is unavailable", self.name),
        };
        futures::future::ready(Err(err)).boxed()
    }
}
