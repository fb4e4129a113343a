//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::domain::{ItineraryError, RawLeg, parse_date};
use crate::itinerary::calculate_raw;
use crate::timezone::{DetectField, TimezoneError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/itinerary/calculate", post(calculate_itinerary))
        .route("/itinerary/infer", post(infer_itinerary))
        .route("/timezone", get(resolve_timezone))
        .route("/timezone/leg", get(resolve_leg_timezones))
        .route("/timezone/detect", post(detect_timezone))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Parse a JSON body by hand so malformed input gets our error shape.
fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, body = %String::from_utf8_lossy(body), "rejected request body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

/// Calculate totals for legs with explicit dates.
async fn calculate_itinerary(body: Bytes) -> Result<Json<CalculationResponse>, AppError> {
    let req: CalculateRequest = parse_json(&body)?;
    let result = calculate_raw(&req.legs)?;
    Ok(Json(CalculationResponse::from(&result)))
}

/// Date legs entered with times only, then calculate totals.
async fn infer_itinerary(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<InferResponse>, AppError> {
    let req: InferRequest = parse_json(&body)?;

    let start = parse_date(&req.start_date).map_err(|e| AppError::BadRequest {
        message: format!("Invalid start date {:?}: {e}", req.start_date),
    })?;

    let legs = req
        .legs
        .iter()
        .enumerate()
        .map(|(i, leg)| leg.parse(i))
        .collect::<Result<Vec<_>, _>>()?;

    let (dated, result) = state.inference.infer_and_calculate(start, &legs)?;

    Ok(Json(InferResponse {
        legs: dated.iter().map(RawLeg::from).collect(),
        result: CalculationResponse::from(&result),
    }))
}

/// Resolve one city to its UTC offset.
async fn resolve_timezone(
    State(state): State<AppState>,
    Query(req): Query<TimezoneQuery>,
) -> Result<Json<TimezoneResult>, AppError> {
    let resolved = state.timezones.resolve_city(&req.city).await?;
    Ok(Json(TimezoneResult::from(&resolved)))
}

/// Resolve both ends of a leg concurrently.
async fn resolve_leg_timezones(
    State(state): State<AppState>,
    Query(req): Query<LegTimezoneQuery>,
) -> Result<Json<LegTimezoneResponse>, AppError> {
    let (departure, arrival) = tokio::join!(
        state.timezones.resolve_city(&req.departure),
        state.timezones.resolve_city(&req.arrival),
    );

    Ok(Json(LegTimezoneResponse {
        departure: TimezoneResult::from(&departure?),
        arrival: TimezoneResult::from(&arrival?),
    }))
}

/// Detect a city's timezone for a form field; newer requests win.
async fn detect_timezone(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DetectResponse>, AppError> {
    let req: DetectRequest = parse_json(&body)?;
    let field = DetectField::new(req.leg, req.side);

    if req.city.trim().is_empty() {
        state.detector.cancel(field);
        return Ok(Json(DetectResponse {
            superseded: false,
            timezone: None,
        }));
    }

    let found = state.detector.detect(field, &req.city).await?;

    Ok(Json(DetectResponse {
        superseded: found.is_none(),
        timezone: found.as_ref().map(TimezoneResult::from),
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound {
        message: String,
        suggestions: Vec<String>,
    },
    BadGateway { message: String },
    GatewayTimeout { message: String },
    Internal { message: String },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ItineraryError> for AppError {
    fn from(e: ItineraryError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<TimezoneError> for AppError {
    fn from(e: TimezoneError) -> Self {
        let message = e.to_string();
        match e {
            TimezoneError::EmptyQuery => AppError::BadRequest { message },
            TimezoneError::NotFound { city, suggestions } => AppError::NotFound {
                message: format!("no location found for {city:?}"),
                suggestions,
            },
            TimezoneError::Timeout { .. } => AppError::GatewayTimeout { message },
            TimezoneError::Http(ref err) if err.is_timeout() => {
                AppError::GatewayTimeout { message }
            }
            TimezoneError::Http(_)
            | TimezoneError::Api { .. }
            | TimezoneError::Rejected { .. }
            | TimezoneError::Json { .. } => AppError::BadGateway { message },
            TimezoneError::NoOffset { .. } => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let (message, suggestions) = match self {
            AppError::NotFound {
                message,
                suggestions,
            } => (message, suggestions),
            AppError::BadRequest { message }
            | AppError::BadGateway { message }
            | AppError::GatewayTimeout { message }
            | AppError::Internal { message } => (message, Vec::new()),
        };

        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, suggestions = suggestions.len(), "request rejected");
        }

        let body = Json(ErrorResponse {
            error: message,
            suggestions,
        });
        (status, body).into_response()
    }
}
