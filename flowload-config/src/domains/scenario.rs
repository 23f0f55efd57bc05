//! Scenario profiles and the named profile registry
//!
//! A profile describes a load shape: how many virtual users (or iteration
//! starts per second) are active over time, stage by stage. Profiles are
//! passed unmodified to the scenario runner; everything here is declarative.

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Load shape executed by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    /// Constant pool of virtual users for the whole schedule
    FixedVus,
    /// Virtual user count interpolated linearly towards each stage target
    RampingVus,
    /// Iteration starts per second interpolated towards each stage target
    RampingArrivalRate,
}

/// One step of the stage schedule: ramp towards `target` over `duration`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stage {
    /// Length of this stage
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub duration: Duration,

    /// Stage target: virtual users, or iterations per second for
    /// arrival-rate profiles
    pub target: u64,
}

/// A named load shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioProfile {
    /// Executor kind
    pub kind: ScenarioKind,

    /// Ordered stage schedule; must be non-empty
    pub stages: Vec<Stage>,

    /// Value the first stage ramps from
    #[serde(default)]
    pub start_value: u64,

    /// Grace window for in-flight iterations after the schedule ends
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_graceful_stop"
    )]
    pub graceful_stop: Duration,

    /// Upper bound on concurrently running iterations for arrival-rate
    /// profiles; ignored by the VU-based kinds
    #[serde(default = "default_max_vus")]
    pub max_vus: u64,
}

impl ScenarioProfile {
    /// Total length of the stage schedule, excluding the graceful-stop window
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Largest stage target in the schedule
    pub fn peak_target(&self) -> u64 {
        self.stages
            .iter()
            .map(|s| s.target)
            .max()
            .unwrap_or(self.start_value)
            .max(self.start_value)
    }
}

impl Validatable for ScenarioProfile {
    fn validate(&self) -> ConfigResult<()> {
        if self.stages.is_empty() {
            return Err(self.validation_error("stages cannot be empty"));
        }
        if self.total_duration().is_zero() {
            return Err(self.validation_error("stage schedule has zero total duration"));
        }
        if self.kind == ScenarioKind::RampingArrivalRate && self.max_vus == 0 {
            return Err(self.validation_error("max_vus must be greater than 0"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenario"
    }
}

/// Named set of scenario profiles: built-in presets plus user-defined ones
#[derive(Debug, Clone)]
pub struct ScenarioRegistry {
    profiles: BTreeMap<String, ScenarioProfile>,
}

impl ScenarioRegistry {
    /// Registry containing only the built-in presets
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();

        // Single user, short run; wiring check rather than load
        profiles.insert(
            "smoke".to_string(),
            ScenarioProfile {
                kind: ScenarioKind::FixedVus,
                stages: vec![Stage {
                    duration: Duration::from_secs(30),
                    target: 1,
                }],
                start_value: 1,
                graceful_stop: default_graceful_stop(),
                max_vus: default_max_vus(),
            },
        );

        // Everyday traffic: ramp up, hold, ramp down
        profiles.insert(
            "average".to_string(),
            ScenarioProfile {
                kind: ScenarioKind::RampingVus,
                stages: vec![
                    Stage {
                        duration: Duration::from_secs(60),
                        target: 20,
                    },
                    Stage {
                        duration: Duration::from_secs(180),
                        target: 20,
                    },
                    Stage {
                        duration: Duration::from_secs(60),
                        target: 0,
                    },
                ],
                start_value: 0,
                graceful_stop: default_graceful_stop(),
                max_vus: default_max_vus(),
            },
        );

        // Arrival-rate stress ramp
        profiles.insert(
            "stress".to_string(),
            ScenarioProfile {
                kind: ScenarioKind::RampingArrivalRate,
                stages: vec![
                    Stage {
                        duration: Duration::from_secs(120),
                        target: 10,
                    },
                    Stage {
                        duration: Duration::from_secs(240),
                        target: 30,
                    },
                    Stage {
                        duration: Duration::from_secs(60),
                        target: 0,
                    },
                ],
                start_value: 1,
                graceful_stop: Duration::from_secs(60),
                max_vus: 100,
            },
        );

        // Sudden surge and recovery
        profiles.insert(
            "spike".to_string(),
            ScenarioProfile {
                kind: ScenarioKind::RampingVus,
                stages: vec![
                    Stage {
                        duration: Duration::from_secs(30),
                        target: 5,
                    },
                    Stage {
                        duration: Duration::from_secs(15),
                        target: 80,
                    },
                    Stage {
                        duration: Duration::from_secs(60),
                        target: 80,
                    },
                    Stage {
                        duration: Duration::from_secs(30),
                        target: 5,
                    },
                ],
                start_value: 0,
                graceful_stop: Duration::from_secs(60),
                max_vus: default_max_vus(),
            },
        );

        Self { profiles }
    }

    /// Built-in presets extended (and overridden) by user-defined profiles
    pub fn with_overrides(extra: &BTreeMap<String, ScenarioProfile>) -> Self {
        let mut registry = Self::builtin();
        for (name, profile) in extra {
            registry.profiles.insert(name.clone(), profile.clone());
        }
        registry
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Option<&ScenarioProfile> {
        self.profiles.get(name)
    }

    /// Iterate over (name, profile) pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScenarioProfile)> {
        self.profiles.iter()
    }

    /// Validate every registered profile
    pub fn validate_all(&self) -> ConfigResult<()> {
        for profile in self.profiles.values() {
            profile.validate()?;
        }
        Ok(())
    }
}

// Default value functions
fn default_graceful_stop() -> Duration {
    Duration::from_secs(30)
}

fn default_max_vus() -> u64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        let registry = ScenarioRegistry::builtin();
        assert!(registry.validate_all().is_ok());
        assert!(registry.get("smoke").is_some());
        assert!(registry.get("average").is_some());
        assert!(registry.get("stress").is_some());
        assert!(registry.get("spike").is_some());
    }

    #[test]
    fn test_empty_stages_rejected() {
        let profile = ScenarioProfile {
            kind: ScenarioKind::FixedVus,
            stages: vec![],
            start_value: 1,
            graceful_stop: Duration::from_secs(5),
            max_vus: 10,
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_zero_duration_schedule_rejected() {
        let profile = ScenarioProfile {
            kind: ScenarioKind::FixedVus,
            stages: vec![Stage {
                duration: Duration::ZERO,
                target: 3,
            }],
            start_value: 0,
            graceful_stop: Duration::from_secs(5),
            max_vus: 10,
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_peak_target_includes_start_value() {
        let profile = ScenarioProfile {
            kind: ScenarioKind::RampingVus,
            stages: vec![Stage {
                duration: Duration::from_secs(10),
                target: 2,
            }],
            start_value: 8,
            graceful_stop: Duration::from_secs(5),
            max_vus: 10,
        };
        assert_eq!(profile.peak_target(), 8);
    }

    #[test]
    fn test_user_profile_overrides_builtin() {
        let mut extra = BTreeMap::new();
        extra.insert(
            "smoke".to_string(),
            ScenarioProfile {
                kind: ScenarioKind::FixedVus,
                stages: vec![Stage {
                    duration: Duration::from_secs(5),
                    target: 2,
                }],
                start_value: 2,
                graceful_stop: Duration::from_secs(1),
                max_vus: 10,
            },
        );
        let registry = ScenarioRegistry::with_overrides(&extra);
        assert_eq!(registry.get("smoke").unwrap().stages[0].target, 2);
    }
}
