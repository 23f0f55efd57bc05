//! Declarative pass/fail thresholds
//!
//! Thresholds pair a metric name with an expression string such as
//! `p(95) < 500`, `rate > 0.95` or `count >= 100`. Expressions are parsed
//! and evaluated by the metrics crate; this module only carries the
//! declarations and rejects empty ones early.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// One declared threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Metric name the expression applies to
    pub metric: String,

    /// Expression, e.g. `p(95) < 500`
    pub expression: String,
}

impl ThresholdSpec {
    pub fn new(metric: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            expression: expression.into(),
        }
    }
}

impl Validatable for ThresholdSpec {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.metric, "metric", self.domain_name())?;
        validate_required_string(&self.expression, "expression", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "thresholds"
    }
}

/// Default threshold set applied when the config file declares none
pub fn default_thresholds() -> Vec<ThresholdSpec> {
    vec![
        ThresholdSpec::new("http_req_duration", "p(95) < 500"),
        ThresholdSpec::new("request_success", "rate > 0.95"),
        ThresholdSpec::new("requests", "count >= 100"),
        ThresholdSpec::new("workflow_health", "avg > 0.5"),
    ]
}
