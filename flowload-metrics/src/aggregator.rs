//! Process-wide metrics aggregator

use crate::sample::{MetricKind, MetricSample};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use tracing::warn;

/// Series key: metric name plus its tag set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub name: String,
    pub tags: BTreeMap<String, String>,
}

enum Series {
    Counter(AtomicU64),
    Trend(Mutex<Vec<f64>>),
    Rate {
        hits: AtomicU64,
        total: AtomicU64,
    },
}

impl Series {
    fn for_kind(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => Series::Counter(AtomicU64::new(0)),
            MetricKind::Trend => Series::Trend(Mutex::new(Vec::new())),
            MetricKind::Rate => Series::Rate {
                hits: AtomicU64::new(0),
                total: AtomicU64::new(0),
            },
        }
    }

    fn kind(&self) -> MetricKind {
        match self {
            Series::Counter(_) => MetricKind::Counter,
            Series::Trend(_) => MetricKind::Trend,
            Series::Rate { .. } => MetricKind::Rate,
        }
    }
}

/// Distribution statistics for a trend series
#[derive(Debug, Clone, PartialEq)]
pub struct TrendStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    sorted: Vec<f64>,
}

impl TrendStats {
    fn from_samples(mut samples: Vec<f64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let count = samples.len();
        let sum: f64 = samples.iter().sum();
        Some(Self {
            count,
            min: samples[0],
            max: samples[count - 1],
            avg: sum / count as f64,
            sorted: samples,
        })
    }

    /// Nearest-rank percentile over the sorted series
    pub fn percentile(&self, p: f64) -> f64 {
        let n = self.sorted.len();
        let rank = ((p / 100.0) * n as f64).ceil() as usize;
        self.sorted[rank.clamp(1, n) - 1]
    }
}

/// Aggregated view of one metric name (tags merged)
#[derive(Debug, Clone)]
pub enum MetricValue {
    Counter(u64),
    Trend(TrendStats),
    Rate { hits: u64, total: u64 },
}

impl MetricValue {
    /// Success ratio for rates, when any observations exist
    pub fn ratio(&self) -> Option<f64> {
        match self {
            MetricValue::Rate { hits, total } if *total > 0 => {
                Some(*hits as f64 / *total as f64)
            }
            _ => None,
        }
    }
}

/// Run-wide metric store
///
/// Append-only and order-independent: concurrent appends from all virtual
/// users are safe, reads happen once at teardown.
#[derive(Default)]
pub struct MetricsAggregator {
    series: RwLock<HashMap<SeriesKey, Series>>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample into the series for its (name, tags) key
    pub fn record(&self, sample: MetricSample) {
        let key = SeriesKey {
            name: sample.name,
            tags: sample.tags,
        };

        // Fast path: series already exists
        {
            let series = self.series.read().unwrap();
            if let Some(existing) = series.get(&key) {
                Self::append(existing, sample.kind, sample.value, &key.name);
                return;
            }
        }

        let mut series = self.series.write().unwrap();
        let entry = series
            .entry(key.clone())
            .or_insert_with(|| Series::for_kind(sample.kind));
        Self::append(entry, sample.kind, sample.value, &key.name);
    }

    /// Increment a counter tagged with a functional area
    pub fn add_counter(&self, name: &str, area: Option<&str>, value: u64) {
        self.record(Self::tagged(
            MetricSample::new(name, MetricKind::Counter, value as f64),
            area,
        ));
    }

    /// Append a trend sample tagged with a functional area
    pub fn record_trend(&self, name: &str, area: Option<&str>, value: f64) {
        self.record(Self::tagged(
            MetricSample::new(name, MetricKind::Trend, value),
            area,
        ));
    }

    /// Record a hit-or-miss observation tagged with a functional area
    pub fn record_rate(&self, name: &str, area: Option<&str>, hit: bool) {
        self.record(Self::tagged(
            MetricSample::new(name, MetricKind::Rate, if hit { 1.0 } else { 0.0 }),
            area,
        ));
    }

    fn tagged(sample: MetricSample, area: Option<&str>) -> MetricSample {
        match area {
            Some(area) => sample.with_tag("area", area),
            None => sample,
        }
    }

    fn append(series: &Series, kind: MetricKind, value: f64, name: &str) {
        if series.kind() != kind {
            warn!(
                "Dropping sample for '{}': recorded as {:?}, series is {:?}",
                name,
                kind,
                series.kind()
            );
            return;
        }
        match series {
            Series::Counter(counter) => {
                counter.fetch_add(value.max(0.0).round() as u64, Ordering::Relaxed);
            }
            Series::Trend(samples) => {
                samples.lock().unwrap().push(value);
            }
            Series::Rate { hits, total } => {
                total.fetch_add(1, Ordering::Relaxed);
                if value != 0.0 {
                    hits.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Aggregate every series sharing `name`, merging tags
    pub fn value_of(&self, name: &str) -> Option<MetricValue> {
        let series = self.series.read().unwrap();
        let matching: Vec<&Series> = series
            .iter()
            .filter(|(key, _)| key.name == name)
            .map(|(_, s)| s)
            .collect();

        let first = matching.first()?;
        match first.kind() {
            MetricKind::Counter => {
                let mut sum = 0u64;
                for s in &matching {
                    if let Series::Counter(counter) = s {
                        sum += counter.load(Ordering::Relaxed);
                    }
                }
                Some(MetricValue::Counter(sum))
            }
            MetricKind::Trend => {
                let mut all = Vec::new();
                for s in &matching {
                    if let Series::Trend(samples) = s {
                        all.extend_from_slice(&samples.lock().unwrap());
                    }
                }
                TrendStats::from_samples(all).map(MetricValue::Trend)
            }
            MetricKind::Rate => {
                let mut hit_sum = 0u64;
                let mut total_sum = 0u64;
                for s in &matching {
                    if let Series::Rate { hits, total } = s {
                        hit_sum += hits.load(Ordering::Relaxed);
                        total_sum += total.load(Ordering::Relaxed);
                    }
                }
                Some(MetricValue::Rate {
                    hits: hit_sum,
                    total: total_sum,
                })
            }
        }
    }

    /// All (key, aggregated value) pairs in name order, for the summary
    pub fn snapshot(&self) -> Vec<(SeriesKey, MetricValue)> {
        let series = self.series.read().unwrap();
        let mut keys: Vec<SeriesKey> = series.keys().cloned().collect();
        keys.sort();

        keys.into_iter()
            .map(|key| {
                let value = match series.get(&key).unwrap() {
                    Series::Counter(counter) => {
                        MetricValue::Counter(counter.load(Ordering::Relaxed))
                    }
                    Series::Trend(samples) => {
                        let samples = samples.lock().unwrap().clone();
                        match TrendStats::from_samples(samples) {
                            Some(stats) => MetricValue::Trend(stats),
                            None => MetricValue::Counter(0),
                        }
                    }
                    Series::Rate { hits, total } => MetricValue::Rate {
                        hits: hits.load(Ordering::Relaxed),
                        total: total.load(Ordering::Relaxed),
                    },
                };
                (key, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counter_sums_across_areas() {
        let aggregator = MetricsAggregator::new();
        aggregator.add_counter("requests", Some("sources"), 3);
        aggregator.add_counter("requests", Some("pipelines"), 4);

        match aggregator.value_of("requests") {
            Some(MetricValue::Counter(7)) => {}
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_rate_ratio() {
        let aggregator = MetricsAggregator::new();
        aggregator.record_rate("request_success", None, true);
        aggregator.record_rate("request_success", None, true);
        aggregator.record_rate("request_success", None, false);

        let value = aggregator.value_of("request_success").unwrap();
        let ratio = value.ratio().unwrap();
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_stats() {
        let aggregator = MetricsAggregator::new();
        for v in [100.0, 200.0, 300.0, 400.0] {
            aggregator.record_trend("http_req_duration", Some("tasks"), v);
        }

        match aggregator.value_of("http_req_duration").unwrap() {
            MetricValue::Trend(stats) => {
                assert_eq!(stats.count, 4);
                assert_eq!(stats.min, 100.0);
                assert_eq!(stats.max, 400.0);
                assert_eq!(stats.avg, 250.0);
                assert_eq!(stats.percentile(50.0), 200.0);
            }
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_kind_mismatch_dropped() {
        let aggregator = MetricsAggregator::new();
        aggregator.add_counter("requests", None, 1);
        aggregator.record(MetricSample::new("requests", MetricKind::Trend, 5.0));

        match aggregator.value_of("requests") {
            Some(MetricValue::Counter(1)) => {}
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_metric_is_none() {
        let aggregator = MetricsAggregator::new();
        assert!(aggregator.value_of("nope").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let aggregator = Arc::new(MetricsAggregator::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let aggregator = aggregator.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..1000 {
                    aggregator.add_counter("requests", Some("sources"), 1);
                    aggregator.record_trend("http_req_duration", None, i as f64);
                    aggregator.record_rate("request_success", None, i % 2 == 0);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        match aggregator.value_of("requests").unwrap() {
            MetricValue::Counter(n) => assert_eq!(n, 8000),
            other => panic!("unexpected value: {:?}", other),
        }
        match aggregator.value_of("http_req_duration").unwrap() {
            MetricValue::Trend(stats) => assert_eq!(stats.count, 8000),
            other => panic!("unexpected value: {:?}", other),
        }
    }
}
