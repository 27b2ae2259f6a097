//! Metrics collection and exposition for Prometheus.
//!
//! Membership gauges are computed fresh on every scrape by
//! [`MembershipCollector`]; the [`Metrics`] registry holds what outlives a
//! single scrape (timings, failure counts, version info).

mod collector;
mod recorder;
mod scrape;
mod summary;

pub use collector::MembershipCollector;
pub use recorder::{Metrics, MetricsRecorder};
pub use scrape::{
    MEMBERS_COUNT, SUBSCRIPTIONS_COUNT, SUBSCRIPTIONS_TOTAL_COUNT, ScrapeResult,
    SubscriptionTally, count_members,
};
pub use summary::DurationSummary;
