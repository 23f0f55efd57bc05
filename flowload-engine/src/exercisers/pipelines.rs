//! Pipeline exerciser
//!
//! Builds a real dependency chain: a throwaway source feeds a throwaway
//! pipeline, the pipeline is triggered, then both are deleted newest
//! first. Unlike the workflow simulator this never polls the execution.

use super::CheckedApi;
use crate::lifecycle::IterationEnv;
use flowload_http::contract;

const AREA: &str = "pipelines";

pub(super) async fn exercise(env: &IterationEnv) -> bool {
    let mut api = CheckedApi::new(&env.client, &env.metrics, AREA);

    api.get("/api/v1/pipelines", contract::OK).await;

    let source_id = api
        .post("/api/v1/sources", &env.ctx.source_payload(), contract::CREATED)
        .await
        .and_then(|r| r.id());

    let mut pipeline_id = None;
    if let Some(source_id) = &source_id {
        pipeline_id = api
            .post(
                "/api/v1/pipelines",
                &env.ctx.pipeline_payload(source_id),
                contract::CREATED,
            )
            .await
            .and_then(|r| r.id());
    }

    if let Some(id) = &pipeline_id {
        api.get(&format!("/api/v1/pipelines/{}", id), contract::OK).await;
        api.put(
            &format!("/api/v1/pipelines/{}", id),
            &env.ctx.update_payload(),
            contract::OK,
        )
        .await;
        // Fire-and-forget: the execution is the API's to finish
        api.post_empty(
            &format!("/api/v1/pipelines/{}/execute", id),
            contract::ACCEPTED,
        )
        .await;
    }

    // Self-clean, newest first
    if let Some(id) = &pipeline_id {
        api.delete(&format!("/api/v1/pipelines/{}", id), contract::DELETED)
            .await;
    }
    if let Some(id) = &source_id {
        api.delete(&format!("/api/v1/sources/{}", id), contract::DELETED)
            .await;
    }

    api.all_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mock_env;
    use flowload_http::HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_full_chain_cleans_up_newest_first() {
        let (env, mock) = mock_env();
        mock.respond(HttpMethod::Get, "/api/v1/pipelines", 200, json!([]));
        mock.respond(HttpMethod::Post, "/api/v1/sources", 201, json!({"id": "s-1"}));
        mock.respond(HttpMethod::Post, "/api/v1/pipelines", 201, json!({"id": "p-1"}));
        mock.respond(HttpMethod::Get, "/api/v1/pipelines/p-1", 200, json!({"id": "p-1"}));
        mock.respond(HttpMethod::Put, "/api/v1/pipelines/p-1", 200, json!({"id": "p-1"}));
        mock.respond(
            HttpMethod::Post,
            "/api/v1/pipelines/p-1/execute",
            202,
            json!({"execution_id": "e-1"}),
        );
        mock.respond(HttpMethod::Delete, "/api/v1/pipelines/p-1", 204, json!(null));
        mock.respond(HttpMethod::Delete, "/api/v1/sources/s-1", 204, json!(null));

        let ok = exercise(&env).await;
        assert!(ok);

        let deletes = mock.requests_with_method(HttpMethod::Delete);
        assert_eq!(deletes.len(), 2);
        assert_eq!(deletes[0].path, "/api/v1/pipelines/p-1");
        assert_eq!(deletes[1].path, "/api/v1/sources/s-1");
    }

    #[tokio::test]
    async fn test_source_failure_skips_dependents() {
        let (env, mock) = mock_env();
        mock.respond(HttpMethod::Get, "/api/v1/pipelines", 200, json!([]));
        mock.respond(HttpMethod::Post, "/api/v1/sources", 500, json!({"error": "boom"}));

        let ok = exercise(&env).await;
        assert!(!ok);
        // Without a source there is no pipeline to create or delete
        assert_eq!(mock.count(HttpMethod::Post, "/api/v1/pipelines"), 0);
        assert!(mock.requests_with_method(HttpMethod::Delete).is_empty());
    }
}
