//! Process-wide metrics registry for the exporter's own observability.

use prometheus::proto::MetricFamily;
use prometheus::{
    Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
    register_int_counter_vec_with_registry, register_int_gauge_vec_with_registry,
};
use std::sync::Arc;

use super::summary::DurationSummary;
use crate::client::ResourceKind;

pub const SCRAPE_TIME: &str = "gocardless_scrape_time";
pub const FETCH_FAILURES: &str = "gocardless_fetch_failures_total";
pub const EXPORTER_VERSION: &str = "gocardless_exporter_version_info";

/// Trait for recording exporter metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records the wall-clock duration of one scrape cycle.
    fn record_scrape_duration(&self, duration_secs: f64);

    /// Records a list request that produced no usable collection.
    fn record_fetch_failure(&self, resource: ResourceKind);
}

/// Prometheus registry plus the metrics that live across scrapes.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    scrape_time: DurationSummary,
    fetch_failures_total: IntCounterVec,
}

impl Metrics {
    /// Creates the registry and registers the long-lived metrics.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let scrape_time =
            DurationSummary::new(SCRAPE_TIME, "Timings for calls to the GoCardless API")?;
        registry.register(Box::new(scrape_time.clone()))?;

        let fetch_failures_total = register_int_counter_vec_with_registry!(
            Opts::new(
                FETCH_FAILURES,
                "Number of GoCardless list requests that failed"
            ),
            &["resource"],
            registry.clone()
        )?;
        // Start both series at zero so a scrape shows them before the first failure.
        for kind in [ResourceKind::Subscriptions, ResourceKind::Mandates] {
            fetch_failures_total.with_label_values(&[kind.as_str()]);
        }

        let version_info: IntGaugeVec = register_int_gauge_vec_with_registry!(
            Opts::new(EXPORTER_VERSION, "Version of the GoCardless exporter"),
            &["version"],
            registry.clone()
        )?;
        version_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1);

        Ok(Metrics {
            registry,
            scrape_time,
            fetch_failures_total,
        })
    }

    pub fn scrape_time(&self) -> &DurationSummary {
        &self.scrape_time
    }

    /// Renders the registry together with this cycle's families in text format.
    ///
    /// Families without samples are left out so that an unknown value is
    /// absent from the output rather than reported as zero.
    pub fn render(&self, scraped: Vec<MetricFamily>) -> prometheus::Result<String> {
        let mut families = self.registry.gather();
        families.extend(scraped);
        families.retain(|mf| !mf.get_metric().is_empty());
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl MetricsRecorder for Metrics {
    fn record_scrape_duration(&self, duration_secs: f64) {
        self.scrape_time.observe(duration_secs);
    }

    fn record_fetch_failure(&self, resource: ResourceKind) {
        self.fetch_failures_total
            .with_label_values(&[resource.as_str()])
            .inc();
    }
}
