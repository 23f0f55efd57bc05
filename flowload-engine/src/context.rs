//! Shared test context and fixture payload generation

use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Immutable context shared read-only by every virtual user
///
/// Built once during setup. Generated entity names combine the setup
/// timestamp, a per-run UUID fragment and a process-wide counter, so
/// concurrent virtual users and back-to-back runs cannot collide on names.
pub struct TestContext {
    /// Short unique fragment identifying this run
    pub run_id: String,
    /// When setup ran
    pub started_at: DateTime<Utc>,
    name_counter: AtomicU64,
}

impl TestContext {
    /// Generate a fresh context
    pub fn generate() -> Self {
        let run_id = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            run_id,
            started_at: Utc::now(),
            name_counter: AtomicU64::new(0),
        }
    }

    /// A name unique across virtual users and across runs
    pub fn unique_name(&self, prefix: &str) -> String {
        let seq = self.name_counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}-{}-{}-{}",
            prefix,
            self.started_at.format("%Y%m%d%H%M%S"),
            self.run_id,
            seq
        )
    }

    /// Payload for creating a data source
    pub fn source_payload(&self) -> JsonValue {
        json!({
            "name": self.unique_name("loadtest-source"),
            "type": "postgres",
            "config": {
                "host": "db.loadtest.internal",
                "port": 5432,
                "database": "loadtest",
                "ssl": false
            }
        })
    }

    /// Payload for creating a pipeline reading from `source_id`
    pub fn pipeline_payload(&self, source_id: &str) -> JsonValue {
        json!({
            "name": self.unique_name("loadtest-pipeline"),
            "source_id": source_id,
            "schedule": "manual",
            "transform": {
                "kind": "passthrough"
            }
        })
    }

    /// Payload for creating a maintenance task
    pub fn task_payload(&self) -> JsonValue {
        json!({
            "name": self.unique_name("loadtest-task"),
            "kind": "maintenance",
            "params": {}
        })
    }

    /// Update payload used by the exercisers' PUT calls
    pub fn update_payload(&self) -> JsonValue {
        json!({
            "description": format!("updated by load run {}", self.run_id)
        })
    }

    /// An id that most likely does not exist, for may-not-exist probes
    pub fn probe_id(&self) -> String {
        format!("probe-{}", self.run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unique_names_do_not_repeat() {
        let ctx = TestContext::generate();
        let names: HashSet<String> = (0..1000).map(|_| ctx.unique_name("x")).collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_names_differ_across_contexts() {
        let a = TestContext::generate();
        let b = TestContext::generate();
        assert_ne!(a.unique_name("x"), b.unique_name("x"));
    }

    #[test]
    fn test_pipeline_payload_references_source() {
        let ctx = TestContext::generate();
        let payload = ctx.pipeline_payload("src-9");
        assert_eq!(payload["source_id"], "src-9");
    }
}
