//! End-to-end workflow simulator
//!
//! A linear saga: create a source, create a pipeline over it, trigger an
//! execution, poll the execution to completion, then compensate by
//! deleting everything that was created, in reverse creation order. The
//! compensation step runs exactly once per run on every exit path; its
//! failures are absorbed and only handed to the leftovers sweep.

use crate::exercisers::CheckedApi;
use crate::lifecycle::IterationEnv;
use crate::names;
use flowload_config::WorkflowConfig;
use flowload_http::contract;
use tokio::time::sleep;
use tracing::debug;

const AREA: &str = "workflow";

/// Saga progression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Idle,
    CreatingSource,
    CreatingPipeline,
    Triggering,
    Polling,
    CleaningUp,
    Done,
}

/// Terminal result of one saga run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Still in flight; never observed on a finished run
    Pending,
    Completed,
    Failed,
    /// Poll bound exhausted without a terminal remote status
    TimedOut,
}

/// State of one saga run
///
/// `resource_ids` holds delete paths in creation order; compensation walks
/// it in reverse. Every id appended here gets a delete attempt before the
/// run is discarded.
#[derive(Debug)]
pub struct WorkflowRun {
    pub stage: WorkflowStage,
    pub resource_ids: Vec<String>,
    pub outcome: WorkflowOutcome,
    pub polls: u32,
    /// Graded health score: 1.0 complete, partial credit for partial progress
    pub score: f64,
}

/// Drives one saga run per invocation
pub struct WorkflowSimulator {
    config: WorkflowConfig,
}

impl WorkflowSimulator {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Run the saga once and fold its outcome into the metrics
    pub async fn run(&self, env: &IterationEnv) -> WorkflowRun {
        env.metrics.add_counter(names::WORKFLOW_RUNS, None, 1);

        let mut run = WorkflowRun {
            stage: WorkflowStage::Idle,
            resource_ids: Vec::new(),
            outcome: WorkflowOutcome::Pending,
            polls: 0,
            score: 0.0,
        };

        let mut api = CheckedApi::new(&env.client, &env.metrics, AREA);
        let (outcome, score) = self.advance(&mut api, env, &mut run).await;
        run.outcome = outcome;
        run.score = score;

        // Compensation runs exactly once, whatever preceded it
        run.stage = WorkflowStage::CleaningUp;
        self.compensate(env, &run.resource_ids).await;
        run.stage = WorkflowStage::Done;

        env.metrics.record_rate(
            names::WORKFLOW_SUCCESS,
            None,
            run.outcome == WorkflowOutcome::Completed,
        );
        env.metrics
            .record_trend(names::WORKFLOW_HEALTH, None, run.score);

        run
    }

    async fn advance(
        &self,
        api: &mut CheckedApi<'_>,
        env: &IterationEnv,
        run: &mut WorkflowRun,
    ) -> (WorkflowOutcome, f64) {
        run.stage = WorkflowStage::CreatingSource;
        let Some(source_id) = api
            .post("/api/v1/sources", &env.ctx.source_payload(), contract::CREATED)
            .await
            .and_then(|r| r.id())
        else {
            return (WorkflowOutcome::Failed, 0.0);
        };
        run.resource_ids.push(format!("/api/v1/sources/{}", source_id));

        run.stage = WorkflowStage::CreatingPipeline;
        let Some(pipeline_id) = api
            .post(
                "/api/v1/pipelines",
                &env.ctx.pipeline_payload(&source_id),
                contract::CREATED,
            )
            .await
            .and_then(|r| r.id())
        else {
            return (WorkflowOutcome::Failed, 0.3);
        };
        run.resource_ids
            .push(format!("/api/v1/pipelines/{}", pipeline_id));

        run.stage = WorkflowStage::Triggering;
        let Some(execution_id) = api
            .post_empty(
                &format!("/api/v1/pipelines/{}/execute", pipeline_id),
                contract::ACCEPTED,
            )
            .await
            .and_then(|r| r.execution_id())
        else {
            return (WorkflowOutcome::Failed, 0.3);
        };

        run.stage = WorkflowStage::Polling;
        let status_path = format!("/api/v1/executions/{}", execution_id);
        for _ in 0..self.config.max_polls {
            sleep(self.config.poll_interval).await;
            run.polls += 1;

            let response = api.get(&status_path, contract::OK).await;
            let status = response
                .as_ref()
                .and_then(|r| r.status_field().map(str::to_string));

            match status.as_deref() {
                Some("completed") => {
                    let records = response
                        .as_ref()
                        .and_then(|r| r.records_processed())
                        .unwrap_or(0);
                    env.metrics
                        .add_counter(names::RECORDS_PROCESSED, None, records);
                    return (WorkflowOutcome::Completed, 1.0);
                }
                Some("failed") => return (WorkflowOutcome::Failed, 0.5),
                // Still pending, or the status fetch itself misbehaved;
                // either way, keep polling until the bound
                _ => {}
            }
        }
        (WorkflowOutcome::TimedOut, 0.5)
    }

    /// Compensating deletes, most recently created first
    async fn compensate(&self, env: &IterationEnv, resource_ids: &[String]) {
        for path in resource_ids.iter().rev() {
            match env.client.delete(path).await {
                Ok(response) if matches!(response.status, 204 | 404) => {}
                Ok(response) => {
                    debug!("Compensating delete of {} answered {}", path, response.status);
                    env.leftovers.push(path.clone());
                }
                Err(error) => {
                    debug!("Compensating delete of {} failed: {}", path, error);
                    env.leftovers.push(path.clone());
                }
            }
        }
    }
}
