//! Timezone auto-detection for itinerary form fields.
//!
//! Each endpoint of each leg is a field. Typing into a field issues a new
//! detection request; only the most recent request for a field may produce
//! a result. Older in-flight requests are dropped as soon as they are
//! superseded, which also cancels their outstanding HTTP calls.
//!
//! A field is only tracked while it has a request in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::Side;

use super::error::TimezoneError;
use super::resolver::CityResolver;
use super::types::CityTimezone;

/// One city input: a leg endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetectField {
    pub leg: usize,
    pub side: Side,
}

impl DetectField {
    pub fn new(leg: usize, side: Side) -> Self {
        Self { leg, side }
    }
}

/// Latest-wins city timezone detection.
pub struct AutoDetector {
    resolver: Arc<dyn CityResolver>,
    debounce: Duration,
    /// Ticket of the latest in-flight request per field.
    fields: Mutex<HashMap<DetectField, watch::Sender<u64>>>,
    next_ticket: AtomicU64,
}

impl AutoDetector {
    pub fn new(resolver: Arc<dyn CityResolver>) -> Self {
        Self {
            resolver,
            debounce: Duration::ZERO,
            fields: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Wait this long before resolving, so bursts of keystrokes only
    /// reach the network once.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Detect the timezone of `city` for `field`.
    ///
    /// Returns `Ok(None)` if a newer request for the same field arrived
    /// (or the field was cancelled) before this one finished.
    pub async fn detect(
        &self,
        field: DetectField,
        city: &str,
    ) -> Result<Option<CityTimezone>, TimezoneError> {
        let (ticket, mut rx) = self.issue(field);

        let work = async {
            if !self.debounce.is_zero() {
                tokio::time::sleep(self.debounce).await;
            }
            self.resolver.resolve(city).await
        };

        let outcome = tokio::select! {
            result = work => Some(result),
            () = superseded(&mut rx, ticket) => None,
        };

        match outcome {
            Some(result) if self.finish(field, ticket) => result.map(Some),
            _ => {
                debug!(leg = field.leg, side = %field.side, city, "detection superseded");
                Ok(None)
            }
        }
    }

    /// Drop any in-flight detection for `field`, e.g. when its input is cleared.
    pub fn cancel(&self, field: DetectField) {
        let mut fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
        // Dropping the sender wakes the in-flight request as superseded
        fields.remove(&field);
    }

    /// Issue a new ticket for `field`, superseding earlier requests.
    ///
    /// Tickets are unique across fields and over time, so a request that
    /// outlives its field's entry can never match a later one.
    fn issue(&self, field: DetectField) -> (u64, watch::Receiver<u64>) {
        let mut fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let sender = fields
            .entry(field)
            .or_insert_with(|| watch::channel(ticket).0);
        sender.send_replace(ticket);
        (ticket, sender.subscribe())
    }

    /// Stop tracking `field` if `ticket` is still its latest request.
    ///
    /// Returns whether the request was current.
    fn finish(&self, field: DetectField, ticket: u64) -> bool {
        let mut fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
        let current = fields
            .get(&field)
            .is_some_and(|sender| *sender.borrow() == ticket);
        if current {
            fields.remove(&field);
        }
        current
    }
}

/// Completes once the field moves past `ticket` or stops being tracked.
async fn superseded(rx: &mut watch::Receiver<u64>, ticket: u64) {
    loop {
        if rx.changed().await.is_err() {
            return;
        }
        if *rx.borrow_and_update() != ticket {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::mock::{FixedSource, StaticGeocoder};
    use crate::timezone::{Coordinates, ResolverConfig, TimezoneResolver};

    const FIELD: DetectField = DetectField {
        leg: 0,
        side: Side::Departure,
    };

    fn detector(geocoder: Arc<StaticGeocoder>) -> AutoDetector {
        let resolver = TimezoneResolver::new(geocoder, ResolverConfig::default())
            .with_source(Arc::new(FixedSource::new("fixed", 1.0, "Europe/Paris")));
        AutoDetector::new(Arc::new(resolver))
    }

    fn places() -> StaticGeocoder {
        StaticGeocoder::new()
            .with_place("Paris", Coordinates::new(48.86, 2.35))
            .with_slow_place("Lima", Coordinates::new(-12.05, -77.04), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn single_request_resolves() {
        let detector = detector(Arc::new(places()));
        let found = detector.detect(FIELD, "Paris").await.unwrap().unwrap();
        assert_eq!(found.city, "Paris");
        assert_eq!(found.timezone.utc_offset_hours, 1.0);
    }

    #[tokio::test]
    async fn newer_request_supersedes_in_flight_one() {
        let detector = detector(Arc::new(places()));

        let (older, newer) = tokio::join!(
            detector.detect(FIELD, "Lima"),
            detector.detect(FIELD, "Paris"),
        );

        assert_eq!(older.unwrap(), None);
        assert_eq!(newer.unwrap().unwrap().city, "Paris");
    }

    #[tokio::test]
    async fn fields_are_independent() {
        let detector = detector(Arc::new(places()));
        let arrival = DetectField::new(0, Side::Arrival);

        let (departure, arrival) = tokio::join!(
            detector.detect(FIELD, "Lima"),
            detector.detect(arrival, "Paris"),
        );

        assert_eq!(departure.unwrap().unwrap().city, "Lima");
        assert_eq!(arrival.unwrap().unwrap().city, "Paris");
    }

    #[tokio::test]
    async fn debounce_skips_superseded_lookups() {
        let geocoder = Arc::new(places());
        let detector = detector(geocoder.clone()).with_debounce(Duration::from_millis(50));

        let (first, second) = tokio::join!(
            detector.detect(FIELD, "Paris"),
            detector.detect(FIELD, "Paris"),
        );

        assert_eq!(first.unwrap(), None);
        assert!(second.unwrap().is_some());
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn cancel_drops_in_flight_request() {
        let detector = detector(Arc::new(places()));

        let (result, ()) = tokio::join!(detector.detect(FIELD, "Lima"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            detector.cancel(FIELD);
        });

        assert_eq!(result.unwrap(), None);
    }

    #[tokio::test]
    async fn cancel_of_unknown_field_is_a_no_op() {
        let detector = detector(Arc::new(places()));
        detector.cancel(DetectField::new(7, Side::Arrival));
        assert!(detector.detect(FIELD, "Paris").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn current_request_reports_errors() {
        let detector = detector(Arc::new(places()));
        let err = detector.detect(FIELD, "Atlantis").await.unwrap_err();
        assert!(matches!(err, TimezoneError::NotFound { .. }));
    }

    #[tokio::test]
    async fn sequential_requests_all_resolve() {
        let detector = detector(Arc::new(places()));
        assert!(detector.detect(FIELD, "Paris").await.unwrap().is_some());
        assert!(detector.detect(FIELD, "Lima").await.unwrap().is_some());
    }

    fn tracked(detector: &AutoDetector) -> usize {
        detector.fields.lock().unwrap().len()
    }

    #[tokio::test]
    async fn finished_fields_are_forgotten() {
        let detector = detector(Arc::new(places()));

        for leg in 0..500 {
            let field = DetectField::new(leg, Side::Arrival);
            assert!(detector.detect(field, "Paris").await.unwrap().is_some());
        }
        assert!(detector.detect(FIELD, "Atlantis").await.is_err());
        assert_eq!(tracked(&detector), 0);

        let (older, newer) = tokio::join!(
            detector.detect(FIELD, "Lima"),
            detector.detect(FIELD, "Paris"),
        );
        assert_eq!(older.unwrap(), None);
        assert!(newer.unwrap().is_some());
        assert_eq!(tracked(&detector), 0);
    }

    #[tokio::test]
    async fn cancelled_field_is_forgotten() {
        let detector = detector(Arc::new(places()));

        let (result, ()) = tokio::join!(detector.detect(FIELD, "Lima"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(tracked(&detector), 1);
            detector.cancel(FIELD);
        });

        assert_eq!(result.unwrap(), None);
        assert_eq!(tracked(&detector), 0);
    }

    #[tokio::test]
    async fn request_after_cancel_resolves() {
        let detector = detector(Arc::new(places()));

        let (cancelled, (), fresh) = tokio::join!(
            detector.detect(FIELD, "Lima"),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                detector.cancel(FIELD);
            },
            async {
                tokio::time::sleep(Duration::from_millis(40)).await;
                detector.detect(FIELD, "Paris").await
            },
        );

        assert_eq!(cancelled.unwrap(), None);
        assert_eq!(fresh.unwrap().unwrap().city, "Paris");
        assert_eq!(tracked(&detector), 0);
    }
}
