//! Data source exerciser

use super::CheckedApi;
use crate::lifecycle::IterationEnv;
use flowload_http::contract;

const AREA: &str = "sources";

/// List, create, read, update, probe and delete a data source
pub(super) async fn exercise(env: &IterationEnv) -> bool {
    let mut api = CheckedApi::new(&env.client, &env.metrics, AREA);

    api.get("/api/v1/sources", contract::OK).await;

    let created = api
        .post("/api/v1/sources", &env.ctx.source_payload(), contract::CREATED)
        .await;
    let id = created.as_ref().and_then(|r| r.id());

    if let Some(id) = &id {
        api.get(&format!("/api/v1/sources/{}", id), contract::OK).await;
        api.put(
            &format!("/api/v1/sources/{}", id),
            &env.ctx.update_payload(),
            contract::OK,
        )
        .await;
        api.post_empty(
            &format!("/api/v1/sources/{}/test-connection", id),
            contract::ACTION_OK,
        )
        .await;
        // Schema inference may not have run yet for a fresh source
        api.get(
            &format!("/api/v1/sources/{}/schema", id),
            contract::MAYBE_FOUND,
        )
        .await;
    }

    api.get(
        &format!("/api/v1/sources/{}", env.ctx.probe_id()),
        contract::MAYBE_FOUND,
    )
    .await;

    // Self-clean
    if let Some(id) = &id {
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
    async fn test_created_source_is_deleted_in_same_run() {
        let (env, mock) = mock_env();
        mock.respond(HttpMethod::Get, "/api/v1/sources", 200, json!([]));
        mock.respond(HttpMethod::Post, "/api/v1/sources", 201, json!({"id": "s-1"}));
        mock.respond(HttpMethod::Get, "/api/v1/sources/s-1", 200, json!({"id": "s-1"}));
        mock.respond(HttpMethod::Put, "/api/v1/sources/s-1", 200, json!({"id": "s-1"}));
        mock.respond(
            HttpMethod::Post,
            "/api/v1/sources/s-1/test-connection",
            200,
            json!({"ok": true}),
        );
        mock.respond(HttpMethod::Delete, "/api/v1/sources/s-1", 204, json!(null));

        let ok = exercise(&env).await;
        // Schema and probe lookups answer 404, which their contracts accept
        assert!(ok);
        assert_eq!(mock.count(HttpMethod::Delete, "/api/v1/sources/s-1"), 1);
    }

    #[tokio::test]
    async fn test_failed_create_skips_dependent_calls() {
        let (env, mock) = mock_env();
        mock.respond(HttpMethod::Get, "/api/v1/sources", 200, json!([]));
        mock.respond(HttpMethod::Post, "/api/v1/sources", 500, json!({"error": "boom"}));

        let ok = exercise(&env).await;
        assert!(!ok);
        // No id, so no per-resource calls and nothing to delete
        assert!(mock.requests_with_method(HttpMethod::Put).is_empty());
        assert!(mock.requests_with_method(HttpMethod::Delete).is_empty());
    }
}
