//! City name geocoding via Nominatim (OpenStreetMap).

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use super::error::TimezoneError;
use super::types::Coordinates;

/// Default base URL for the Nominatim search API.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy requires an identifying User-Agent.
pub const DEFAULT_USER_AGENT: &str = concat!("itinerary-server/", env!("CARGO_PKG_VERSION"));

/// Turns a free-text city name into coordinates.
pub trait Geocoder: Send + Sync {
    /// Short service name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Look up the best match for `city`.
    ///
    /// Implementations return `NotFound` when nothing matches.
    fn geocode<'a>(&'a self, city: &'a str) -> BoxFuture<'a, Result<Coordinates, TimezoneError>>;
}

/// A single Nominatim search hit. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Value of the User-Agent header
    pub user_agent: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl NominatimConfig {
    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the User-Agent sent with every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Nominatim search client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: NominatimConfig) -> Result<Self, TimezoneError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    async fn search(&self, city: &str) -> Result<Coordinates, TimezoneError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(TimezoneError::EmptyQuery);
        }

        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", city), ("format", "json"), ("limit", "1")])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TimezoneError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_search(city, &body)
    }
}

impl Geocoder for NominatimClient {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    fn geocode<'a>(&'a self, city: &'a str) -> BoxFuture<'a, Result<Coordinates, TimezoneError>> {
        self.search(city).boxed()
    }
}

/// Parse a Nominatim search response body, taking the first hit.
fn parse_search(city: &str, body: &str) -> Result<Coordinates, TimezoneError> {
    let places: Vec<Place> = serde_json::from_str(body).map_err(|e| TimezoneError::Json {
        message: e.to_string(),
    })?;

    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| TimezoneError::not_found(city))?;

    let coordinate = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| TimezoneError::Json {
                message: format!("invalid {field} {value:?}"),
            })
    };

    let coordinates = Coordinates::new(
        coordinate("lat", &place.lat)?,
        coordinate("lon", &place.lon)?,
    );

    debug!(
        city,
        lat = coordinates.lat,
        lon = coordinates.lon,
        display_name = place.display_name.as_deref().unwrap_or(""),
        "geocoded city"
    );

    Ok(coordinates)
}
