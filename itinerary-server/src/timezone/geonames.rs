//! GeoNames timezone lookup.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;

use super::error::TimezoneError;
use super::resolver::OffsetSource;
use super::types::{Coordinates, TimezoneInfo};

const DEFAULT_BASE_URL: &str = "https://secure.geonames.org";

/// The public demo account. Heavily rate limited; configure a real one.
pub const DEFAULT_USERNAME: &str = "demo";

const SERVICE: &str = "geonames";

/// GeoNames `timezoneJSON` response.
///
/// Failures come back as 200 with only a `status` object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimezoneResponse {
    raw_offset: Option<f64>,
    timezone_id: Option<String>,
    status: Option<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    value: Option<u32>,
}

/// Configuration for the GeoNames client.
#[derive(Debug, Clone)]
pub struct GeoNamesConfig {
    /// Registered GeoNames account name
    pub username: String,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GeoNamesConfig {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME)
    }
}

impl GeoNamesConfig {
    /// Create a new config for the given account.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(3),
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// GeoNames timezone client.
#[derive(Debug, Clone)]
pub struct GeoNamesClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
}

impl GeoNamesClient {
    pub fn new(config: GeoNamesConfig) -> Result<Self, TimezoneError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            username: config.username,
        })
    }

    async fn fetch(&self, at: Coordinates) -> Result<TimezoneInfo, TimezoneError> {
        let url = format!("{}/timezoneJSON", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lng", at.lon.to_string()),
                ("username", self.username.clone()),
            ])
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
        parse_timezone(&body)
    }
}

impl OffsetSource for GeoNamesClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn lookup(&self, at: Coordinates) -> BoxFuture<'_, Result<TimezoneInfo, TimezoneError>> {
        self.fetch(at).boxed()
    }
}

/// Parse a `timezoneJSON` body.
///
/// Only `rawOffset` is used. It is the zone's standard offset, which matches
/// how legs are entered: one fixed offset per endpoint, no DST.
fn parse_timezone(body: &str) -> Result<TimezoneInfo, TimezoneError> {
    let response: TimezoneResponse =
        serde_json::from_str(body).map_err(|e| TimezoneError::Json {
            message: e.to_string(),
        })?;

    if let Some(status) = response.status {
        let message = match status.value {
            Some(code) => format!("{} (code {code})", status.message),
            None => status.message,
        };
        return Err(TimezoneError::Rejected {
            service: SERVICE,
            message,
        });
    }

    let utc_offset_hours = response
        .raw_offset
        .filter(|h| h.is_finite())
        .ok_or(TimezoneError::NoOffset { service: SERVICE })?;

    Ok(TimezoneInfo {
        utc_offset_hours,
        name: response
            .timezone_id
            .unwrap_or_else(|| super::types::offset_label(utc_offset_hours)),
        source: SERVICE,
    })
}
