use crate::Error;
use kube::ResourceExt;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, histogram::Histogram},
    registry::{Registry, Unit},
};
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Clone)]
pub struct Metrics {
    pub reconcile: ReconcileMetrics,
    pub registry: Arc<Registry>,
}

impl Default for Metrics {
    fn default() -> Self {
        let mut registry = Registry::with_prefix("cloudflare_provider_reconcile");
        let reconcile = ReconcileMetrics::default().register(&mut registry);
        Self {
            registry: Arc::new(registry),
            reconcile,
        }
    }
}

#[derive(Clone)]
pub struct ReconcileMetrics {
    pub runs: Family<KindLabels, Counter>,
    pub failures: Family<ErrorLabels, Counter>,
    pub duration: Family<KindLabels, Histogram>,
}

impl Default for ReconcileMetrics {
    fn default() -> Self {
        Self {
            runs: Family::<KindLabels, Counter>::default(),
            failures: Family::<ErrorLabels, Counter>::default(),
            duration: Family::<KindLabels, Histogram>::new_with_constructor(|| {
                Histogram::new([0.01, 0.1, 0.25, 0.5, 1., 5., 15., 60.].into_iter())
            }),
        }
    }
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug, Default)]
pub struct KindLabels {
    pub kind: String,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug, Default)]
pub struct ErrorLabels {
    pub kind: String,
    pub instance: String,
    pub error: String,
}

impl ReconcileMetrics {
    /// Register API metrics to start tracking them.
    pub fn register(self, r: &mut Registry) -> Self {
        r.register_with_unit(
            "duration",
            "reconcile duration",
            Unit::Seconds,
            self.duration.clone(),
        );
        r.register("failures", "reconciliation errors", self.failures.clone());
        r.register("runs", "reconciliations", self.runs.clone());
        self
    }

    pub fn set_failure<K: ResourceExt>(&self, kind: &str, obj: &K, e: &Error) {
        self.failures
            .get_or_create(&ErrorLabels {
                kind: kind.to_string(),
                instance: obj.name_any(),
                error: e.metric_label(),
            })
            .inc();
    }

    pub fn count_and_measure(&self, kind: &str) -> ReconcileMeasurer {
        let labels = KindLabels { kind: kind.to_string() };
        self.runs.get_or_create(&labels).inc();
        ReconcileMeasurer {
            start: Instant::now(),
            metric: self.duration.get_or_create(&labels).clone(),
        }
    }
}

/// Smart function duration measurer
///
/// Relies on Drop to calculate duration and register the observation in the histogram
pub struct ReconcileMeasurer {
    start: Instant,
    metric: Histogram,
}

impl Drop for ReconcileMeasurer {
    fn drop(&mut self) {
        #[allow(clippy::cast_precision_loss)]
        let duration = self.start.elapsed().as_millis() as f64 / 1000.0;
        self.metric.observe(duration);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dns_record::DNSRecord;

    #[test]
    fn failures_are_counted_per_kind_and_instance() {
        let metrics = Metrics::default();
        let doc = DNSRecord::test();
        metrics.reconcile.set_failure("DNSRecord", &doc, &Error::NoZone);
        metrics.reconcile.set_failure("DNSRecord", &doc, &Error::NoZone);

        let labels = ErrorLabels {
            kind: "DNSRecord".into(),
            instance: "test".into(),
            error: "nozone".into(),
        };
        assert_eq!(metrics.reconcile.failures.get_or_create(&labels).get(), 2);
    }

    #[test]
    fn measuring_counts_a_run() {
        let metrics = Metrics::default();
        drop(metrics.reconcile.count_and_measure("Zone"));
        let labels = KindLabels { kind: "Zone".into() };
        assert_eq!(metrics.reconcile.runs.get_or_create(&labels).get(), 1);
    }
}
