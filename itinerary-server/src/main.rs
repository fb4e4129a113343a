use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use itinerary_server::cache::CachedResolver;
use itinerary_server::config::AppConfig;
use itinerary_server::timezone::{
    DEFAULT_USERNAME, GeoNamesClient, NominatimClient, TimeApiClient, TimezoneResolver,
};
use itinerary_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    if config.geonames.username == DEFAULT_USERNAME {
        warn!("GEONAMES_USERNAME not set, using the rate-limited demo account");
    }

    // Geocoder, then offset sources in priority order
    let nominatim = NominatimClient::new(config.nominatim.clone()).expect("Failed to create Nominatim client");
    let geonames = GeoNamesClient::new(config.geonames.clone()).expect("Failed to create GeoNames client");
    let timeapi = TimeApiClient::new(config.timeapi.clone()).expect("Failed to create TimeAPI client");

    let resolver = TimezoneResolver::new(Arc::new(nominatim), config.resolver.clone())
        .with_source(Arc::new(geonames))
        .with_source(Arc::new(timeapi));
    info!(sources = ?resolver.source_names(), "timezone resolver ready");

    let timezones = CachedResolver::new(resolver, &config.cache);
    let state = AppState::new(timezones, config.detect_debounce, config.inference);
    let app = create_router(state);

    info!(addr = %config.addr, "itinerary calculator listening");
    info!("  GET  /health               - Health check");
    info!("  POST /itinerary/calculate  - Totals for dated legs");
    info!("  POST /itinerary/infer      - Date legs from times, then total");
    info!("  GET  /timezone?city=       - Resolve a city's UTC offset");
    info!("  GET  /timezone/leg         - Resolve both ends of a leg");
    info!("  POST /timezone/detect      - Latest-wins detection for a form field");

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
