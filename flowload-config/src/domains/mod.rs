//! Domain-specific configuration modules

pub mod http;
pub mod load;
pub mod logging;
pub mod scenario;
pub mod target;
pub mod thresholds;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use scenario::{ScenarioProfile, ScenarioRegistry};
use thresholds::ThresholdSpec;

/// Root configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowloadConfig {
    /// Target API under test
    pub target: target::TargetConfig,

    /// HTTP client settings
    pub http: http::HttpConfig,

    /// Iteration mix and workflow settings
    pub load: load::LoadConfig,

    /// Logging settings
    pub logging: logging::LoggingConfig,

    /// User-defined scenario profiles, merged over the built-in presets
    pub scenarios: BTreeMap<String, ScenarioProfile>,

    /// Scenario executed when none is named on the command line
    #[serde(default = "default_scenario")]
    pub default_scenario: String,

    /// Pass/fail thresholds; defaults apply when the list is empty
    pub thresholds: Vec<ThresholdSpec>,
}

impl Default for FlowloadConfig {
    fn default() -> Self {
        Self {
            target: target::TargetConfig::default(),
            http: http::HttpConfig::default(),
            load: load::LoadConfig::default(),
            logging: logging::LoggingConfig::default(),
            scenarios: BTreeMap::new(),
            default_scenario: default_scenario(),
            thresholds: Vec::new(),
        }
    }
}

impl FlowloadConfig {
    /// Registry of built-in presets merged with configured profiles
    pub fn scenario_registry(&self) -> ScenarioRegistry {
        ScenarioRegistry::with_overrides(&self.scenarios)
    }

    /// Declared thresholds, falling back to the defaults when none are set
    pub fn effective_thresholds(&self) -> Vec<ThresholdSpec> {
        if self.thresholds.is_empty() {
            thresholds::default_thresholds()
        } else {
            self.thresholds.clone()
        }
    }

    /// Validate all configuration domains
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.http.validate()?;
        self.load.validate()?;
        self.logging.validate()?;
        self.scenario_registry().validate_all()?;
        for spec in &self.thresholds {
            spec.validate()?;
        }

        if self.scenario_registry().get(&self.default_scenario).is_none() {
            return Err(crate::error::ConfigError::UnknownScenario(
                self.default_scenario.clone(),
            ));
        }

        Ok(())
    }
}

// Default value functions
fn default_scenario() -> String {
    "smoke".to_string()
}
