//! # Prometheus Metrics
//!
//! HTTP metrics (request counts, latency, errors) are recorded by
//! [`metrics_middleware`] on every request. Domain gauges (drivers,
//! shipments by status, offers by status) are refreshed from the store on
//! each `/metrics` scrape; see the handler in `lib.rs`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use convoy_store::StoreStats;
use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- HTTP (push, middleware) --
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    // -- Domain (pull, on scrape) --
    drivers_total: prometheus::Gauge,
    shipments_total: GaugeVec,
    offers_total: GaugeVec,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a metrics instance with a fresh registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("convoy_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "convoy_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new("convoy_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let drivers_total = prometheus::Gauge::new("convoy_drivers_total", "Registered drivers")
            .expect("metric can be created");

        let shipments_total = GaugeVec::new(
            Opts::new("convoy_shipments_total", "Shipments by status"),
            &["status"],
        )
        .expect("metric can be created");

        let offers_total = GaugeVec::new(
            Opts::new("convoy_offers_total", "Offers by status"),
            &["status"],
        )
        .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_errors_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(drivers_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(shipments_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(offers_total.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                drivers_total,
                shipments_total,
                offers_total,
            }),
        }
    }

    /// Total request count across all labels.
    pub fn requests(&self) -> u64 {
        sum_counters(&self.inner.http_requests_total)
    }

    /// Total 4xx/5xx count across all labels.
    pub fn errors(&self) -> u64 {
        sum_counters(&self.inner.http_errors_total)
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Replace the domain gauges with a fresh store snapshot.
    ///
    /// Every known status is written, so a status whose last row moved on
    /// reads zero instead of keeping its previous value.
    pub fn observe_store(&self, stats: &StoreStats) {
        self.inner.drivers_total.set(stats.drivers as f64);

        self.inner.shipments_total.reset();
        for status in convoy_state::ShipmentStatus::ALL {
            let n = stats.shipments.get(&status).copied().unwrap_or(0);
            self.inner
                .shipments_total
                .with_label_values(&[status.as_str()])
                .set(n as f64);
        }

        self.inner.offers_total.reset();
        for status in convoy_state::OfferStatus::ALL {
            let n = stats.offers.get(&status).copied().unwrap_or(0);
            self.inner
                .offers_total
                .with_label_values(&[status.as_str()])
                .set(n as f64);
        }
    }

    /// Gather all metrics and encode them in the Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_counters(vec: &IntCounterVec) -> u64 {
    vec.collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Replace identifier segments with `{id}` to bound label cardinality.
///
/// Bare integers (`/v1/offers/12`) and prefixed identifiers
/// (`/v1/offers/offer:12`) are both recognized.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let digits = segment.rsplit_once(':').map_or(segment, |(_, tail)| tail);
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Record request count, latency and errors for every request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        m.record_request(&method, &path, response.status().as_u16(), duration);
    }

    response
}
