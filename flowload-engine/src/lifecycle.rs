//! Test environment lifecycle: one-time setup and best-effort teardown

use crate::context::TestContext;
use crate::error::EngineError;
use flowload_config::TargetConfig;
use flowload_http::ApiClient;
use flowload_metrics::{MetricsAggregator, RunSummary};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Delete paths for resources whose compensating delete failed
///
/// Workflow runs hand their failed deletes here; teardown makes one final
/// best-effort sweep. Draining is destructive, which makes a second
/// teardown a no-op.
#[derive(Default)]
pub struct Leftovers {
    paths: Mutex<Vec<String>>,
}

impl Leftovers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: String) {
        self.paths.lock().unwrap().push(path);
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut self.paths.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.paths.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything one iteration needs, cheap to clone into spawned tasks
///
/// The context is read-only; the aggregator is the only shared mutable
/// state and supports concurrent appends.
#[derive(Clone)]
pub struct IterationEnv {
    pub client: Arc<ApiClient>,
    pub metrics: Arc<MetricsAggregator>,
    pub ctx: Arc<TestContext>,
    pub leftovers: Arc<Leftovers>,
}

/// Acquire credentials and build the shared context
///
/// Authentication failure aborts the whole run; nothing else here can.
pub async fn setup(target: &TargetConfig, client: &ApiClient) -> Result<Arc<TestContext>, EngineError> {
    client
        .login(&target.username, &target.password)
        .await
        .map_err(EngineError::Auth)?;

    let ctx = TestContext::generate();
    info!("Test environment ready (run {})", ctx.run_id);
    Ok(Arc::new(ctx))
}

/// Best-effort cleanup plus the final metrics summary
///
/// Never fails; calling it twice is a no-op for the cleanup half because
/// the leftovers list drains on first use, and delete contracts treat 404
/// as already-gone.
pub async fn teardown(env: &IterationEnv, summary: &RunSummary) {
    let leftovers = env.leftovers.drain();
    if !leftovers.is_empty() {
        info!("Sweeping {} leftover resources", leftovers.len());
    }
    for path in leftovers {
        match env.client.delete(&path).await {
            Ok(response) if matches!(response.status, 204 | 404) => {}
            Ok(response) => debug!("Leftover sweep of {} answered {}", path, response.status),
            Err(error) => debug!("Leftover sweep of {} failed: {}", path, error),
        }
    }

    info!("Final metrics summary:\n{}", summary.render());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mock_env;
    use flowload_http::HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_setup_fails_fatally_without_auth() {
        let (env, mock) = mock_env();
        mock.respond(
            HttpMethod::Post,
            "/api/v1/auth/login",
            401,
            json!({"error": "nope"}),
        );

        let target = TargetConfig::default();
        let result = setup(&target, &env.client).await;
        assert!(matches!(result, Err(EngineError::Auth(_))));
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let (env, mock) = mock_env();
        env.leftovers.push("/api/v1/sources/s-1".to_string());
        env.leftovers.push("/api/v1/pipelines/p-1".to_string());

        let summary = RunSummary::build("smoke", &env.metrics, &[]);
        teardown(&env, &summary).await;
        assert_eq!(mock.requests_with_method(HttpMethod::Delete).len(), 2);
        assert!(env.leftovers.is_empty());

        // Second teardown finds nothing to sweep and does not panic
        teardown(&env, &summary).await;
        assert_eq!(mock.requests_with_method(HttpMethod::Delete).len(), 2);
    }
}
