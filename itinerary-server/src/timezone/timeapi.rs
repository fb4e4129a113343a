//! TimeAPI.io timezone lookup.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;

use super::error::TimezoneError;
use super::resolver::OffsetSource;
use super::types::{Coordinates, TimezoneInfo, offset_label};

const DEFAULT_BASE_URL: &str = "https://timeapi.io";

const SERVICE: &str = "timeapi";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoordinateResponse {
    time_zone: Option<String>,
    standard_utc_offset: Option<StandardOffset>,
}

/// The service has reported the standard offset both as "+05:30" and as
/// an object carrying total seconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StandardOffset {
    Text(String),
    Detailed { seconds: i64 },
}

impl StandardOffset {
    fn hours(&self) -> Option<f64> {
        match self {
            StandardOffset::Text(text) => parse_offset_text(text),
            StandardOffset::Detailed { seconds } => Some(*seconds as f64 / 3600.0),
        }
    }
}

/// Parse "+HH:MM", "-HH:MM" or "HH:MM" into fractional hours.
fn parse_offset_text(text: &str) -> Option<f64> {
    let text = text.trim();
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1.0, &text[1..]),
        b'-' => (-1.0, &text[1..]),
        _ => (1.0, text),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(sign * (hours as f64 + minutes as f64 / 60.0))
}

/// Configuration for the TimeAPI client.
#[derive(Debug, Clone)]
pub struct TimeApiConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TimeApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(3),
        }
    }
}

impl TimeApiConfig {
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

/// TimeAPI.io client.
#[derive(Debug, Clone)]
pub struct TimeApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl TimeApiClient {
    pub fn new(config: TimeApiConfig) -> Result<Self, TimezoneError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    async fn fetch(&self, at: Coordinates) -> Result<TimezoneInfo, TimezoneError> {
        let url = format!("{}/api/TimeZone/coordinate", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("latitude", at.lat), ("longitude", at.lon)])
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
        parse_coordinate(&body)
    }
}

impl OffsetSource for TimeApiClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn lookup(&self, at: Coordinates) -> BoxFuture<'_, Result<TimezoneInfo, TimezoneError>> {
        self.fetch(at).boxed()
    }
}

fn parse_coordinate(body: &str) -> Result<TimezoneInfo, TimezoneError> {
    let response: CoordinateResponse =
        serde_json::from_str(body).map_err(|e| TimezoneError::Json {
            message: e.to_string(),
        })?;

    let utc_offset_hours = response
        .standard_utc_offset
        .as_ref()
        .and_then(StandardOffset::hours)
        .ok_or(TimezoneError::NoOffset { service: SERVICE })?;

    Ok(TimezoneInfo {
        utc_offset_hours,
        name: response
            .time_zone
            .unwrap_or_else(|| offset_label(utc_offset_hours)),
        source: SERVICE,
    })
}
