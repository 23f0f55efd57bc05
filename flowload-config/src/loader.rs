//! Configuration loading and environment variable handling

use crate::domains::FlowloadConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "FLOWLOAD".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<FlowloadConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: FlowloadConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<FlowloadConfig> {
        let mut config = FlowloadConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<FlowloadConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut FlowloadConfig) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("BASE_URL") {
            config.target.base_url = base_url;
        }

        if let Ok(username) = self.get_env_var("USERNAME") {
            config.target.username = username;
        }

        if let Ok(password) = self.get_env_var("PASSWORD") {
            config.target.password = password;
        }

        if let Ok(timeout) = self.get_env_var("HTTP_TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_TIMEOUT: {}", e)))?;
            config.http.timeout = std::time::Duration::from_secs(seconds);
        }

        if let Ok(scenario) = self.get_env_var("SCENARIO") {
            config.default_scenario = scenario;
        }

        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(probability) = self.get_env_var("WORKFLOW_PROBABILITY") {
            config.load.workflow_probability = probability.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid WORKFLOW_PROBABILITY: {}", e))
            })?;
        }

        Ok(())
    }

    /// Get an environment variable with the configured prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_overrides() {
        // Unique prefix keeps this test independent of the real environment
        std::env::set_var("FL_TEST_A_BASE_URL", "http://override:9000");
        std::env::set_var("FL_TEST_A_SCENARIO", "average");

        let config = ConfigLoader::with_prefix("FL_TEST_A").from_env().unwrap();
        assert_eq!(config.target.base_url, "http://override:9000");
        assert_eq!(config.default_scenario, "average");

        std::env::remove_var("FL_TEST_A_BASE_URL");
        std::env::remove_var("FL_TEST_A_SCENARIO");
    }

    #[test]
    fn test_invalid_env_override_rejected() {
        std::env::set_var("FL_TEST_B_HTTP_TIMEOUT", "soon");
        let result = ConfigLoader::with_prefix("FL_TEST_B").from_env();
        assert!(result.is_err());
        std::env::remove_var("FL_TEST_B_HTTP_TIMEOUT");
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
target:
  base_url: "http://api.example.test:8000"
  username: "perf"
  password: "perf-secret"
default_scenario: "stress"
thresholds:
  - metric: "http_req_duration"
    expression: "p(99) < 1500"
"#
        )
        .unwrap();

        let config = ConfigLoader::with_prefix("FL_TEST_C")
            .from_file(file.path())
            .unwrap();
        assert_eq!(config.target.username, "perf");
        assert_eq!(config.default_scenario, "stress");
        assert_eq!(config.thresholds.len(), 1);
        assert_eq!(config.effective_thresholds().len(), 1);
    }

    #[test]
    fn test_invalid_yaml_profile_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
scenarios:
  broken:
    kind: fixed-vus
    stages: []
"#
        )
        .unwrap();

        let result = ConfigLoader::with_prefix("FL_TEST_D").from_file(file.path());
        assert!(result.is_err());
    }
}
