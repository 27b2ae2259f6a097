//! On-demand membership collector.
//!
//! Each call to [`MembershipCollector::collect`] runs one complete, read-only
//! cycle against the provider. Nothing from one cycle is kept for the next, so
//! overlapping scrapes need no coordination.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use prometheus::proto::MetricFamily;
use tracing::{debug, warn};

use super::recorder::{Metrics, MetricsRecorder};
use super::scrape::{ScrapeResult, SubscriptionTally, count_members};
use crate::client::{BillingApi, FetchError, ListFilters, Page, Resource};
use crate::models::Subscription;

pub struct MembershipCollector {
    api: Arc<dyn BillingApi>,
    filters: ListFilters,
    metrics: Metrics,
}

impl MembershipCollector {
    pub fn new(api: Arc<dyn BillingApi>, page_limit: u32, metrics: Metrics) -> Self {
        Self {
            api,
            filters: ListFilters::active(page_limit),
            metrics,
        }
    }

    pub fn filters(&self) -> &ListFilters {
        &self.filters
    }

    /// Runs one cycle and returns the membership gauge families.
    pub async fn collect(&self) -> Vec<MetricFamily> {
        self.scrape().await.to_families()
    }

    /// Runs one cycle: subscriptions first, then the mandates backing them.
    pub async fn scrape(&self) -> ScrapeResult {
        let started = Instant::now();
        let mut result = ScrapeResult::default();

        let subscriptions: Option<Vec<Subscription>> =
            match self.api.subscriptions(&self.filters).await {
                Ok(page) => Some(self.accept_page(page, &mut result)),
                Err(e) => {
                    self.report_failure(&e);
                    None
                }
            };

        result.subscriptions = subscriptions
            .as_deref()
            .map(SubscriptionTally::from_subscriptions);

        let mandate_ids: HashSet<&str> = subscriptions
            .iter()
            .flatten()
            .filter_map(Subscription::mandate_id)
            .collect();

        result.members_count = match self.api.mandates(&self.filters).await {
            Ok(page) => {
                let mandates = self.accept_page(page, &mut result);
                Some(count_members(&mandates, &mandate_ids))
            }
            Err(e) => {
                self.report_failure(&e);
                None
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.record_scrape_duration(elapsed);
        debug!(
            event_name = "collector.scrape.completed",
            event_domain = "collector",
            duration_seconds = elapsed,
            subscriptions_total = result.subscriptions_total(),
            members_count = result.members_count,
            "scrape cycle completed"
        );

        result
    }

    /// Unwraps a page, warning once if it came back full.
    fn accept_page<T: Resource>(&self, page: Page<T>, result: &mut ScrapeResult) -> Vec<T> {
        if page.is_truncated() {
            let resource = T::KIND;
            warn!(
                event_name = "collector.pagination.limit_reached",
                event_domain = "collector",
                resource = resource.as_str(),
                limit = page.limit,
                returned = page.items.len(),
                "page size limit reached, results may be incomplete"
            );
            result.truncated.push(resource);
        }
        page.items
    }

    fn report_failure(&self, error: &FetchError) {
        let resource = error.resource();
        self.metrics.record_fetch_failure(resource);
        warn!(
            event_name = "collector.fetch.failed",
            event_domain = "collector",
            resource = resource.as_str(),
            error = %error,
            "fetch failed, omitting its metrics for this cycle"
        );
    }
}
