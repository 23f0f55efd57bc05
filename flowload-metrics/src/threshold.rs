//! Threshold expressions and end-of-run evaluation
//!
//! Expressions look like `p(95) < 500`, `rate > 0.95`, `avg < 300`,
//! `count >= 100`. A trailing `ms` on the bound is accepted and ignored;
//! durations are recorded in milliseconds already.

use crate::aggregator::{MetricValue, MetricsAggregator};
use thiserror::Error;

/// Statistic a threshold evaluates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stat {
    Percentile(f64),
    Avg,
    Min,
    Max,
    Count,
    Rate,
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn apply(&self, observed: f64, bound: f64) -> bool {
        match self {
            Op::Lt => observed < bound,
            Op::Le => observed <= bound,
            Op::Gt => observed > bound,
            Op::Ge => observed >= bound,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }
}

/// Threshold expression errors
#[derive(Debug, Error)]
pub enum ThresholdError {
    #[error("Malformed threshold expression '{0}': expected '<stat> <op> <value>'")]
    Malformed(String),

    #[error("Unknown statistic '{0}'")]
    UnknownStat(String),

    #[error("Unknown operator '{0}'")]
    UnknownOp(String),

    #[error("Invalid bound '{0}'")]
    InvalidBound(String),
}

/// A parsed, evaluatable threshold
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub metric: String,
    pub stat: Stat,
    pub op: Op,
    pub bound: f64,
}

impl Threshold {
    /// Parse an expression string against a metric name
    pub fn parse(metric: impl Into<String>, expression: &str) -> Result<Self, ThresholdError> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        let [stat_str, op_str, bound_str] = parts.as_slice() else {
            return Err(ThresholdError::Malformed(expression.to_string()));
        };

        let stat = Self::parse_stat(stat_str)?;
        let op = match *op_str {
            "<" => Op::Lt,
            "<=" => Op::Le,
            ">" => Op::Gt,
            ">=" => Op::Ge,
            other => return Err(ThresholdError::UnknownOp(other.to_string())),
        };
        let bound_str = bound_str.trim_end_matches("ms");
        let bound: f64 = bound_str
            .parse()
            .map_err(|_| ThresholdError::InvalidBound(bound_str.to_string()))?;

        Ok(Self {
            metric: metric.into(),
            stat,
            op,
            bound,
        })
    }

    fn parse_stat(input: &str) -> Result<Stat, ThresholdError> {
        if let Some(inner) = input
            .strip_prefix("p(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let p: f64 = inner
                .parse()
                .map_err(|_| ThresholdError::UnknownStat(input.to_string()))?;
            if !(0.0..=100.0).contains(&p) {
                return Err(ThresholdError::UnknownStat(input.to_string()));
            }
            return Ok(Stat::Percentile(p));
        }

        match input {
            "avg" => Ok(Stat::Avg),
            "min" => Ok(Stat::Min),
            "max" => Ok(Stat::Max),
            "count" => Ok(Stat::Count),
            "rate" => Ok(Stat::Rate),
            other => Err(ThresholdError::UnknownStat(other.to_string())),
        }
    }

    /// Evaluate against the aggregator's final state
    ///
    /// A metric with no recorded samples, or a statistic that does not fit
    /// the metric's kind, fails the threshold rather than silently passing.
    pub fn evaluate(&self, aggregator: &MetricsAggregator) -> ThresholdVerdict {
        let observed = aggregator
            .value_of(&self.metric)
            .and_then(|value| self.observe(&value));

        let passed = observed
            .map(|o| self.op.apply(o, self.bound))
            .unwrap_or(false);

        ThresholdVerdict {
            threshold: self.clone(),
            observed,
            passed,
        }
    }

    fn observe(&self, value: &MetricValue) -> Option<f64> {
        match (self.stat, value) {
            (Stat::Percentile(p), MetricValue::Trend(stats)) => Some(stats.percentile(p)),
            (Stat::Avg, MetricValue::Trend(stats)) => Some(stats.avg),
            (Stat::Min, MetricValue::Trend(stats)) => Some(stats.min),
            (Stat::Max, MetricValue::Trend(stats)) => Some(stats.max),
            (Stat::Count, MetricValue::Trend(stats)) => Some(stats.count as f64),
            (Stat::Count, MetricValue::Counter(n)) => Some(*n as f64),
            (Stat::Count, MetricValue::Rate { total, .. }) => Some(*total as f64),
            (Stat::Rate, MetricValue::Rate { .. }) => value.ratio(),
            _ => None,
        }
    }

    /// `metric: stat op bound` for logs and the summary
    pub fn describe(&self) -> String {
        let stat = match self.stat {
            Stat::Percentile(p) => format!("p({})", p),
            Stat::Avg => "avg".to_string(),
            Stat::Min => "min".to_string(),
            Stat::Max => "max".to_string(),
            Stat::Count => "count".to_string(),
            Stat::Rate => "rate".to_string(),
        };
        format!(
            "{}: {} {} {}",
            self.metric,
            stat,
            self.op.as_str(),
            self.bound
        )
    }
}

/// Outcome of evaluating one threshold
#[derive(Debug, Clone)]
pub struct ThresholdVerdict {
    pub threshold: Threshold,
    /// Observed statistic; `None` when the metric was never recorded or the
    /// statistic does not apply to its kind
    pub observed: Option<f64>,
    pub passed: bool,
}
