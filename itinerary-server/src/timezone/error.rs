//! Timezone resolution error types.

use std::time::Duration;

/// Errors that can occur while resolving a city's UTC offset.
#[derive(Debug, thiserror::Error)]
pub enum TimezoneError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Service answered 200 but reported a failure in the body
    #[error("{service} rejected the request: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The geocoder had no match for the query
    #[error("no location found for {city:?}{}", did_you_mean(.suggestions))]
    NotFound {
        city: String,
        /// Places matched by parts of the query, best first
        suggestions: Vec<String>,
    },

    /// The city name was blank
    #[error("city name is empty")]
    EmptyQuery,

    /// The response carried no usable UTC offset
    #[error("{service} returned no usable UTC offset")]
    NoOffset { service: &'static str },

    /// The service did not answer in time
    #[error("{service} timed out after {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },
}

impl TimezoneError {
    /// A geocoding miss with no suggestions.
    pub fn not_found(city: impl Into<String>) -> Self {
        TimezoneError::NotFound {
            city: city.into(),
            suggestions: Vec::new(),
        }
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!("; did you mean one of: {}", suggestions.join("; "))
    }
}
