//! Per-cycle aggregation of subscriptions and mandates.

use std::collections::{BTreeMap, HashSet};

use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};

use crate::client::ResourceKind;
use crate::models::{Mandate, Subscription};

pub const MEMBERS_COUNT: &str = "gocardless_members_count";
pub const SUBSCRIPTIONS_TOTAL_COUNT: &str = "gocardless_subscriptions_total_count";
pub const SUBSCRIPTIONS_COUNT: &str = "gocardless_subscriptions_count";

/// Active subscription counts, overall and per plan name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionTally {
    pub total: u64,
    pub by_plan: BTreeMap<String, u64>,
}

impl SubscriptionTally {
    pub fn from_subscriptions(subscriptions: &[Subscription]) -> Self {
        let mut by_plan = BTreeMap::new();
        for subscription in subscriptions {
            *by_plan
                .entry(subscription.plan_name().to_string())
                .or_insert(0u64) += 1;
        }
        Self {
            total: subscriptions.len() as u64,
            by_plan,
        }
    }
}

/// Counts distinct customers among the mandates whose ID is in `mandate_ids`.
pub fn count_members(mandates: &[Mandate], mandate_ids: &HashSet<&str>) -> u64 {
    mandates
        .iter()
        .filter(|mandate| mandate_ids.contains(mandate.id.as_str()))
        .filter_map(Mandate::customer_id)
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Outcome of one collection cycle.
///
/// `None` means the source fetch failed this cycle, which is reported as an
/// absent series. `Some(0)` is a successful fetch with nothing to count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeResult {
    pub members_count: Option<u64>,
    pub subscriptions: Option<SubscriptionTally>,
    /// Resources whose page came back full and may be missing records.
    pub truncated: Vec<ResourceKind>,
}

impl ScrapeResult {
    pub fn subscriptions_total(&self) -> Option<u64> {
        self.subscriptions.as_ref().map(|tally| tally.total)
    }

    /// Builds the three gauge families; failed sources leave theirs without samples.
    pub fn to_families(&self) -> Vec<MetricFamily> {
        let mut members = gauge_family(MEMBERS_COUNT, "Number of active members in GoCardless");
        let mut total = gauge_family(
            SUBSCRIPTIONS_TOTAL_COUNT,
            "Number of active subscriptions in GoCardless",
        );
        let mut by_name = gauge_family(
            SUBSCRIPTIONS_COUNT,
            "Number of active subscriptions by name in GoCardless",
        );

        if let Some(count) = self.members_count {
            members.mut_metric().push(gauge_sample(&[], count));
        }

        if let Some(tally) = &self.subscriptions {
            total.mut_metric().push(gauge_sample(&[], tally.total));
            for (plan, count) in &tally.by_plan {
                by_name
                    .mut_metric()
                    .push(gauge_sample(&[("name", plan.as_str())], *count));
            }
        }

        vec![members, total, by_name]
    }
}

fn gauge_family(name: &str, help: &str) -> MetricFamily {
    let mut family = MetricFamily::new();
    family.set_name(name.to_string());
    family.set_help(help.to_string());
    family.set_field_type(MetricType::GAUGE);
    family
}

fn gauge_sample(labels: &[(&str, &str)], value: u64) -> Metric {
    let mut metric = Metric::new();
    for (name, label_value) in labels {
        let mut pair = LabelPair::new();
        pair.set_name(name.to_string());
        pair.set_value(label_value.to_string());
        metric.mut_label().push(pair);
    }
    let mut gauge = Gauge::new();
    gauge.set_value(value as f64);
    metric.set_gauge(gauge);
    metric
}
