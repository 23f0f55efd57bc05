//! Execution exerciser
//!
//! Works entirely against an id that may not exist: listing, status reads,
//! and cancel/retry actions all tolerate 404 and 409, mirroring how an
//! operator pokes at executions that may already be gone or terminal.

use super::CheckedApi;
use crate::lifecycle::IterationEnv;
use flowload_http::contract;

const AREA: &str = "executions";

pub(super) async fn exercise(env: &IterationEnv) -> bool {
    let mut api = CheckedApi::new(&env.client, &env.metrics, AREA);
    let probe = format!("/api/v1/executions/{}", env.ctx.probe_id());

    api.get("/api/v1/executions", contract::OK).await;
    api.get(&probe, contract::MAYBE_FOUND).await;
    api.post_empty(&format!("{}/cancel", probe), contract::ACTION_TOLERANT)
        .await;
    api.post_empty(&format!("{}/retry", probe), contract::ACTION_TOLERANT)
        .await;
    api.get(&probe, contract::MAYBE_FOUND).await;

    api.all_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names;
    use crate::testutil::mock_env;
    use flowload_http::HttpMethod;
    use flowload_metrics::MetricValue;
    use serde_json::json;

    #[tokio::test]
    async fn test_contract_violation_does_not_short_circuit() {
        let (env, mock) = mock_env();
        let probe = format!("/api/v1/executions/{}", env.ctx.probe_id());

        mock.respond(HttpMethod::Get, "/api/v1/executions", 200, json!([]));
        // Second of five calls violates its contract; the rest must still run
        mock.respond(HttpMethod::Get, &probe, 500, json!({"error": "boom"}));
        mock.respond(HttpMethod::Get, &probe, 200, json!({"status": "completed"}));
        mock.respond(
            HttpMethod::Post,
            &format!("{}/cancel", probe),
            409,
            json!({"error": "terminal"}),
        );
        mock.respond(
            HttpMethod::Post,
            &format!("{}/retry", probe),
            200,
            json!({"execution_id": "e-2"}),
        );

        let ok = exercise(&env).await;
        assert!(!ok);

        // Calls 3, 4 and 5 were still issued
        assert_eq!(mock.count(HttpMethod::Post, &format!("{}/cancel", probe)), 1);
        assert_eq!(mock.count(HttpMethod::Post, &format!("{}/retry", probe)), 1);
        assert_eq!(mock.count(HttpMethod::Get, &probe), 2);

        // Exactly one violation was recorded
        match env.metrics.value_of(names::REQUEST_FAILURES) {
            Some(MetricValue::Counter(1)) => {}
            other => panic!("unexpected failure count: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_contracts_satisfied() {
        let (env, mock) = mock_env();
        mock.respond(HttpMethod::Get, "/api/v1/executions", 200, json!([]));
        // Probe lookups answer the default 404, cancel/retry likewise;
        // every contract in this sequence tolerates that.
        let ok = exercise(&env).await;
        assert!(ok);
        assert_eq!(mock.requests().len(), 5);
    }
}
