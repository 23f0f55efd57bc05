//! Load-generation and workflow-simulation engine
//!
//! Drives a pipeline-orchestration API with many independent virtual
//! users. Each iteration picks one endpoint exerciser through the weighted
//! dispatcher, runs it against the shared test context, occasionally runs
//! the end-to-end workflow saga, and sleeps a randomized pause. The
//! metrics aggregator is the only shared mutable state.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod exercisers;
pub mod lifecycle;
pub mod names;
pub mod runner;
pub mod workflow;

pub use context::TestContext;
pub use lifecycle::{IterationEnv, Leftovers};
pub use dispatch::{Area, WeightedChoice, WeightedTable};
pub use error::EngineError;
pub use runner::{execute, execute_with_transport};
pub use workflow::{WorkflowOutcome, WorkflowRun, WorkflowSimulator, WorkflowStage};

#[cfg(test)]
pub(crate) mod testutil {
    use crate::context::TestContext;
    use crate::lifecycle::{IterationEnv, Leftovers};
    use flowload_http::{ApiClient, MockTransport};
    use flowload_metrics::MetricsAggregator;
    use std::sync::Arc;

    /// An iteration environment wired to a scripted mock transport
    pub(crate) fn mock_env() -> (IterationEnv, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let client = Arc::new(ApiClient::with_transport(
            "http://target:8000",
            mock.clone(),
        ));
        let env = IterationEnv {
            client,
            metrics: Arc::new(MetricsAggregator::new()),
            ctx: Arc::new(TestContext::generate()),
            leftovers: Arc::new(Leftovers::new()),
        };
        (env, mock)
    }
}
