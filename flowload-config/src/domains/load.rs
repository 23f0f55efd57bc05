//! Iteration mix and workflow simulator configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_unit_fraction, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-iteration behavior shared by every virtual user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Relative selection weights for the endpoint exercisers
    pub weights: WeightsConfig,

    /// Probability that an iteration additionally runs the end-to-end
    /// workflow simulator
    #[serde(default = "default_workflow_probability")]
    pub workflow_probability: f64,

    /// Lower bound of the randomized pause between iterations
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_sleep_min"
    )]
    pub sleep_min: Duration,

    /// Upper bound of the randomized pause between iterations
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_sleep_max"
    )]
    pub sleep_max: Duration,

    /// Workflow simulator settings
    pub workflow: WorkflowConfig,
}

/// Relative weights for picking an exerciser each iteration
///
/// Weights are plain integers; selection probability is weight over the sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub sources: u32,
    pub pipelines: u32,
    pub executions: u32,
    pub tasks: u32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            sources: 3,
            pipelines: 4,
            executions: 3,
            tasks: 2,
        }
    }
}

/// Workflow simulator settings: poll cadence and bound
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Maximum number of status polls before the run is marked timed out
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    /// Fixed wait between status polls
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_poll_interval"
    )]
    pub poll_interval: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_polls: default_max_polls(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            workflow_probability: default_workflow_probability(),
            sleep_min: default_sleep_min(),
            sleep_max: default_sleep_max(),
            workflow: WorkflowConfig::default(),
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_unit_fraction(
            self.workflow_probability,
            "workflow_probability",
            self.domain_name(),
        )?;

        if self.sleep_max < self.sleep_min {
            return Err(self.validation_error("sleep_max must not be less than sleep_min"));
        }

        let total_weight = self.weights.sources
            + self.weights.pipelines
            + self.weights.executions
            + self.weights.tasks;
        validate_positive(total_weight as u64, "sum of weights", self.domain_name())?;

        self.workflow.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

impl Validatable for WorkflowConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_polls as u64, "max_polls", self.domain_name())?;
        validate_positive(
            self.poll_interval.as_secs(),
            "poll_interval",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load.workflow"
    }
}

// Default value functions
fn default_workflow_probability() -> f64 {
    0.1
}

fn default_sleep_min() -> Duration {
    Duration::from_millis(500)
}

fn default_sleep_max() -> Duration {
    Duration::from_millis(1500)
}

fn default_max_polls() -> u32 {
    10
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}
