//! Endpoint exercisers
//!
//! One module per functional area. Every exerciser issues an ordered
//! sequence of contract-checked calls; a violation flips the local success
//! flag and execution continues with the remaining calls. Resources an
//! exerciser creates are deleted within the same call, so exercisers leave
//! nothing behind.

mod executions;
mod pipelines;
mod sources;
mod tasks;

use crate::dispatch::Area;
use crate::lifecycle::IterationEnv;
use crate::names;
use flowload_http::{ApiClient, ApiResponse, StatusContract};
use flowload_metrics::MetricsAggregator;
use serde_json::Value as JsonValue;
use std::time::Instant;
use tracing::debug;

/// Run the exerciser for `area` and fold its outcome into the metrics
pub async fn run(area: Area, env: &IterationEnv) -> bool {
    env.metrics.add_counter(names::REQUESTS, Some(area.as_str()), 1);

    let started = Instant::now();
    let ok = match area {
        Area::Sources => sources::exercise(env).await,
        Area::Pipelines => pipelines::exercise(env).await,
        Area::Executions => executions::exercise(env).await,
        Area::Tasks => tasks::exercise(env).await,
    };
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    env.metrics
        .record_trend(names::EXERCISER_DURATION, Some(area.as_str()), elapsed_ms);
    env.metrics
        .record_rate(names::EXERCISER_SUCCESS, Some(area.as_str()), ok);
    ok
}

/// Contract-checked call sequencer
///
/// Times each call, records the per-call metrics, and tracks the aggregate
/// success flag. A call returns its response only when the contract is
/// satisfied; violations and transport errors return `None` so dependent
/// calls can be skipped while independent ones continue.
pub struct CheckedApi<'a> {
    client: &'a ApiClient,
    metrics: &'a MetricsAggregator,
    area: &'static str,
    ok: bool,
}

impl<'a> CheckedApi<'a> {
    pub fn new(client: &'a ApiClient, metrics: &'a MetricsAggregator, area: &'static str) -> Self {
        Self {
            client,
            metrics,
            area,
            ok: true,
        }
    }

    pub async fn get(&mut self, path: &str, contract: StatusContract) -> Option<ApiResponse> {
        let started = Instant::now();
        let result = self.client.get(path).await;
        self.settle("GET", path, contract, started, result)
    }

    pub async fn post(
        &mut self,
        path: &str,
        body: &JsonValue,
        contract: StatusContract,
    ) -> Option<ApiResponse> {
        let started = Instant::now();
        let result = self.client.post(path, body).await;
        self.settle("POST", path, contract, started, result)
    }

    pub async fn post_empty(&mut self, path: &str, contract: StatusContract) -> Option<ApiResponse> {
        let started = Instant::now();
        let result = self.client.post_empty(path).await;
        self.settle("POST", path, contract, started, result)
    }

    pub async fn put(
        &mut self,
        path: &str,
        body: &JsonValue,
        contract: StatusContract,
    ) -> Option<ApiResponse> {
        let started = Instant::now();
        let result = self.client.put(path, body).await;
        self.settle("PUT", path, contract, started, result)
    }

    pub async fn delete(&mut self, path: &str, contract: StatusContract) -> Option<ApiResponse> {
        let started = Instant::now();
        let result = self.client.delete(path).await;
        self.settle("DELETE", path, contract, started, result)
    }

    /// Whether every call so far satisfied its contract
    pub fn all_ok(&self) -> bool {
        self.ok
    }

    fn settle(
        &mut self,
        method: &str,
        path: &str,
        contract: StatusContract,
        started: Instant,
        result: Result<ApiResponse, flowload_http::HttpError>,
    ) -> Option<ApiResponse> {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics
            .record_trend(names::HTTP_REQ_DURATION, Some(self.area), elapsed_ms);

        match result {
            Ok(response) if contract.matches(response.status) => {
                self.metrics
                    .record_rate(names::REQUEST_SUCCESS, Some(self.area), true);
                Some(response)
            }
            Ok(response) => {
                debug!(
                    "{} {} answered {}, expected {}",
                    method, path, response.status, contract
                );
                self.record_failure();
                None
            }
            Err(error) => {
                debug!("{} {} failed: {}", method, path, error);
                self.record_failure();
                None
            }
        }
    }

    fn record_failure(&mut self) {
        self.ok = false;
        self.metrics
            .add_counter(names::REQUEST_FAILURES, Some(self.area), 1);
        self.metrics
            .record_rate(names::REQUEST_SUCCESS, Some(self.area), false);
    }
}
