//! End-of-run summary

use crate::aggregator::{MetricValue, MetricsAggregator};
use crate::threshold::{Threshold, ThresholdVerdict};

/// Final report: aggregated metrics plus threshold verdicts
///
/// The run's exit status is the logical AND of all threshold evaluations.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub scenario: String,
    pub verdicts: Vec<ThresholdVerdict>,
    metric_lines: Vec<String>,
}

impl RunSummary {
    /// Evaluate thresholds against the aggregator and snapshot all series
    pub fn build(
        scenario: &str,
        aggregator: &MetricsAggregator,
        thresholds: &[Threshold],
    ) -> Self {
        let verdicts = thresholds
            .iter()
            .map(|t| t.evaluate(aggregator))
            .collect();

        let metric_lines = aggregator
            .snapshot()
            .into_iter()
            .map(|(key, value)| {
                let tags = if key.tags.is_empty() {
                    String::new()
                } else {
                    let pairs: Vec<String> = key
                        .tags
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect();
                    format!("{{{}}}", pairs.join(","))
                };

                let rendered = match value {
                    MetricValue::Counter(n) => format!("count={}", n),
                    MetricValue::Trend(stats) => format!(
                        "count={} avg={:.1} min={:.1} p(50)={:.1} p(95)={:.1} max={:.1}",
                        stats.count,
                        stats.avg,
                        stats.min,
                        stats.percentile(50.0),
                        stats.percentile(95.0),
                        stats.max
                    ),
                    MetricValue::Rate { hits, total } => {
                        let ratio = if total > 0 {
                            hits as f64 / total as f64
                        } else {
                            0.0
                        };
                        format!("rate={:.2}% ({}/{})", ratio * 100.0, hits, total)
                    }
                };

                format!("{}{} {}", key.name, tags, rendered)
            })
            .collect();

        Self {
            scenario: scenario.to_string(),
            verdicts,
            metric_lines,
        }
    }

    /// Whether every threshold passed
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    /// Render the human-readable report
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== Run summary: {} ===\n", self.scenario));

        out.push_str("\nMetrics:\n");
        for line in &self.metric_lines {
            out.push_str(&format!("  {}\n", line));
        }

        out.push_str("\nThresholds:\n");
        for verdict in &self.verdicts {
            let mark = if verdict.passed { "✅" } else { "❌" };
            let observed = match verdict.observed {
                Some(o) => format!("{:.2}", o),
                None => "n/a".to_string(),
            };
            out.push_str(&format!(
                "  {} {} (observed {})\n",
                mark,
                verdict.threshold.describe(),
                observed
            ));
        }

        let overall = if self.passed() { "PASS" } else { "FAIL" };
        out.push_str(&format!("\nOverall: {}\n", overall));
        out
    }
}
