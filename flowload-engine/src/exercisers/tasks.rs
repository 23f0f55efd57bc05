//! Maintenance task exerciser

use super::CheckedApi;
use crate::lifecycle::IterationEnv;
use flowload_http::contract;

const AREA: &str = "tasks";

/// Create a task, run its analyze/fix actions, update and delete it
pub(super) async fn exercise(env: &IterationEnv) -> bool {
    let mut api = CheckedApi::new(&env.client, &env.metrics, AREA);

    api.get("/api/v1/tasks", contract::OK).await;

    let created = api
        .post("/api/v1/tasks", &env.ctx.task_payload(), contract::CREATED)
        .await;
    let id = created.as_ref().and_then(|r| r.id());

    if let Some(id) = &id {
        api.post_empty(&format!("/api/v1/tasks/{}/analyze", id), contract::ACTION_OK)
            .await;
        // Fixing a freshly created task may legitimately conflict
        api.post_empty(
            &format!("/api/v1/tasks/{}/fix", id),
            contract::ACTION_TOLERANT,
        )
        .await;
        api.put(
            &format!("/api/v1/tasks/{}", id),
            &env.ctx.update_payload(),
            contract::OK,
        )
        .await;
    }

    api.get(
        &format!("/api/v1/tasks/{}", env.ctx.probe_id()),
        contract::MAYBE_FOUND,
    )
    .await;

    // Self-clean
    if let Some(id) = &id {
        api.delete(&format!("/api/v1/tasks/{}", id), contract::DELETED)
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
    async fn test_task_lifecycle_self_cleans() {
        let (env, mock) = mock_env();
        mock.respond(HttpMethod::Get, "/api/v1/tasks", 200, json!([]));
        mock.respond(HttpMethod::Post, "/api/v1/tasks", 201, json!({"id": "t-1"}));
        mock.respond(
            HttpMethod::Post,
            "/api/v1/tasks/t-1/analyze",
            202,
            json!({"queued": true}),
        );
        mock.respond(
            HttpMethod::Post,
            "/api/v1/tasks/t-1/fix",
            409,
            json!({"error": "nothing to fix"}),
        );
        mock.respond(HttpMethod::Put, "/api/v1/tasks/t-1", 200, json!({"id": "t-1"}));
        mock.respond(HttpMethod::Delete, "/api/v1/tasks/t-1", 204, json!(null));

        let ok = exercise(&env).await;
        assert!(ok);
        assert_eq!(mock.count(HttpMethod::Delete, "/api/v1/tasks/t-1"), 1);
    }
}
