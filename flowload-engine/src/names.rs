//! Canonical metric names recorded by the engine

/// Exerciser invocations, tagged by area
pub const REQUESTS: &str = "requests";
/// Individual calls violating their status contract, tagged by area
pub const REQUEST_FAILURES: &str = "request_failures";
/// Per-call contract outcome
pub const REQUEST_SUCCESS: &str = "request_success";
/// Per-call wall time in milliseconds
pub const HTTP_REQ_DURATION: &str = "http_req_duration";
/// Whole-exerciser wall time in milliseconds, tagged by area
pub const EXERCISER_DURATION: &str = "exerciser_duration";
/// Aggregate exerciser outcome, tagged by area
pub const EXERCISER_SUCCESS: &str = "exerciser_success";
/// Iterations started
pub const ITERATIONS: &str = "iterations";
/// Arrival-rate iterations dropped because the VU pool was exhausted
pub const DROPPED_ITERATIONS: &str = "dropped_iterations";
/// Workflow saga runs started
pub const WORKFLOW_RUNS: &str = "workflow_runs";
/// Strict workflow outcome (completed or not)
pub const WORKFLOW_SUCCESS: &str = "workflow_success";
/// Graded workflow score: 1.0 complete, partial credit for partial progress
pub const WORKFLOW_HEALTH: &str = "workflow_health";
/// Work units reported by completed executions
pub const RECORDS_PROCESSED: &str = "records_processed";
