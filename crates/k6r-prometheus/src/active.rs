use std::sync::{Arc, OnceLock};

use prometheus::{IntGauge, core::Collector, core::Desc, proto::MetricFamily};

use k6r_core::ActiveGauge;

/// Gauge whose value is pulled from a bound callback on every scrape.
#[derive(Clone)]
pub(crate) struct ActiveCollector {
    gauge: IntGauge,
    source: Arc<OnceLock<ActiveGauge>>,
}

impl ActiveCollector {
    pub(crate) fn new(source: Arc<OnceLock<ActiveGauge>>) -> Result<Self, prometheus::Error> {
        let gauge = IntGauge::new("k6_runs_active", "Number of runs currently executing")?;
        Ok(Self { gauge, source })
    }
}

impl Collector for ActiveCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.gauge.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let value = self.source.get().map(|read| read()).unwrap_or(0);
        self.gauge.set(value);
        self.gauge.collect()
    }
}
