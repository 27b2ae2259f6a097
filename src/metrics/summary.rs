//! A count/sum summary, exposed with the Prometheus `summary` type.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use prometheus::core::{Collector, Desc};
use prometheus::proto::{Metric, MetricFamily, MetricType, Summary};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct SummaryState {
    count: u64,
    sum: f64,
}

/// Summary without quantiles: only `_count` and `_sum` are reported.
#[derive(Clone, Debug)]
pub struct DurationSummary {
    desc: Desc,
    state: Arc<Mutex<SummaryState>>,
}

impl DurationSummary {
    pub fn new(name: &str, help: &str) -> prometheus::Result<Self> {
        let desc = Desc::new(name.to_string(), help.to_string(), vec![], HashMap::new())?;
        Ok(Self {
            desc,
            state: Arc::new(Mutex::new(SummaryState::default())),
        })
    }

    pub fn observe(&self, value: f64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.count += 1;
        state.sum += value;
    }

    /// Returns `(count, sum)`.
    pub fn snapshot(&self) -> (u64, f64) {
        let state = *self.state.lock().unwrap_or_else(|e| e.into_inner());
        (state.count, state.sum)
    }
}

impl Collector for DurationSummary {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let (count, sum) = self.snapshot();

        let mut summary = Summary::new();
        summary.set_sample_count(count);
        summary.set_sample_sum(sum);

        let mut metric = Metric::new();
        metric.set_summary(summary);

        let mut family = MetricFamily::new();
        family.set_name(self.desc.fq_name.clone());
        family.set_help(self.desc.help.clone());
        family.set_field_type(MetricType::SUMMARY);
        family.mut_metric().push(metric);

        vec![family]
    }
}
