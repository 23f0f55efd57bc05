//! Scenario runner: virtual user scheduling and the iteration loop
//!
//! Virtual users are independent tokio tasks. Iterations within one VU are
//! strictly sequential; across VUs nothing is ordered or shared except the
//! metrics aggregator. The profile's stage schedule decides how many VUs
//! (or iteration starts per second) are active at any moment, and the
//! graceful-stop window bounds how long in-flight iterations may run after
//! the schedule ends before being abandoned.

use crate::dispatch::{self, Area, WeightedTable};
use crate::error::EngineError;
use crate::exercisers;
use crate::lifecycle::{self, IterationEnv, Leftovers};
use crate::names;
use crate::workflow::WorkflowSimulator;
use flowload_config::{
    ConfigError, FlowloadConfig, LoadConfig, ScenarioKind, ScenarioProfile,
    validation::Validatable,
};
use flowload_http::{ApiClient, ApiTransport};
use flowload_metrics::{MetricsAggregator, RunSummary, Threshold};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How often the ramp controllers re-interpolate the stage schedule
const CONTROL_TICK: Duration = Duration::from_millis(250);

/// Execute a scenario against the real HTTP transport
pub async fn execute(
    config: &FlowloadConfig,
    scenario: Option<&str>,
) -> Result<RunSummary, EngineError> {
    let client =
        ApiClient::new(&config.target.base_url, &config.http).map_err(EngineError::ClientSetup)?;
    execute_with_client(config, scenario, Arc::new(client)).await
}

/// Execute a scenario over an injected transport (tests use the mock)
pub async fn execute_with_transport(
    config: &FlowloadConfig,
    scenario: Option<&str>,
    transport: Arc<dyn ApiTransport>,
) -> Result<RunSummary, EngineError> {
    let client = ApiClient::with_transport(&config.target.base_url, transport);
    execute_with_client(config, scenario, Arc::new(client)).await
}

async fn execute_with_client(
    config: &FlowloadConfig,
    scenario: Option<&str>,
    client: Arc<ApiClient>,
) -> Result<RunSummary, EngineError> {
    let name = scenario.unwrap_or(&config.default_scenario).to_string();
    let registry = config.scenario_registry();
    let profile = registry
        .get(&name)
        .ok_or_else(|| ConfigError::UnknownScenario(name.clone()))?
        .clone();
    profile.validate()?;

    // Everything that can be misconfigured fails here, before any traffic
    let thresholds: Vec<Threshold> = config
        .effective_thresholds()
        .iter()
        .map(|spec| Threshold::parse(&spec.metric, &spec.expression))
        .collect::<Result<_, _>>()?;
    let table = Arc::new(dispatch::exerciser_table(&config.load.weights)?);

    let ctx = lifecycle::setup(&config.target, &client).await?;
    let env = IterationEnv {
        client,
        metrics: Arc::new(MetricsAggregator::new()),
        ctx,
        leftovers: Arc::new(Leftovers::new()),
    };

    info!(
        "Starting scenario '{}' ({:?}, {} stages, {:?} schedule, {:?} graceful stop)",
        name,
        profile.kind,
        profile.stages.len(),
        profile.total_duration(),
        profile.graceful_stop
    );

    let load = Arc::new(config.load.clone());
    match profile.kind {
        ScenarioKind::FixedVus | ScenarioKind::RampingVus => {
            run_vu_profile(&profile, &env, table, load).await
        }
        ScenarioKind::RampingArrivalRate => {
            run_arrival_profile(&profile, &env, table, load).await
        }
    }

    let summary = RunSummary::build(&name, &env.metrics, &thresholds);
    lifecycle::teardown(&env, &summary).await;
    Ok(summary)
}

/// Stage-schedule target at `elapsed`, linearly interpolated within a stage
pub(crate) fn target_at(profile: &ScenarioProfile, elapsed: Duration) -> f64 {
    let mut base = profile.start_value as f64;
    let mut offset = Duration::ZERO;

    for stage in &profile.stages {
        let end = offset + stage.duration;
        if elapsed < end {
            let span = stage.duration.as_secs_f64();
            let frac = if span > 0.0 {
                (elapsed - offset).as_secs_f64() / span
            } else {
                1.0
            };
            return base + (stage.target as f64 - base) * frac;
        }
        base = stage.target as f64;
        offset = end;
    }
    0.0
}

/// One iteration: weighted pick, exercise, maybe the workflow saga
async fn run_iteration(env: &IterationEnv, table: &WeightedTable<Area>, load: &LoadConfig) {
    env.metrics.add_counter(names::ITERATIONS, None, 1);

    let area = table.pick();
    exercisers::run(area, env).await;

    if fastrand::f64() < load.workflow_probability {
        WorkflowSimulator::new(load.workflow.clone()).run(env).await;
    }
}

/// Randomized pause between iterations of one virtual user
async fn pacing_sleep(load: &LoadConfig) {
    let min = load.sleep_min.as_millis() as u64;
    let max = load.sleep_max.as_millis() as u64;
    let millis = if max > min {
        fastrand::u64(min..=max)
    } else {
        min
    };
    sleep(Duration::from_millis(millis)).await;
}

/// Driver for the fixed and ramping VU profiles
async fn run_vu_profile(
    profile: &ScenarioProfile,
    env: &IterationEnv,
    table: Arc<WeightedTable<Area>>,
    load: Arc<LoadConfig>,
) {
    let total = profile.total_duration();
    let start = Instant::now();
    let deadline = start + total;

    let (tx, rx) = watch::channel(0u64);
    let mut vus: Vec<Option<JoinHandle<()>>> = Vec::new();

    loop {
        let elapsed = start.elapsed();
        if elapsed >= total {
            break;
        }

        let desired = match profile.kind {
            ScenarioKind::FixedVus => profile.stages[0].target as f64,
            _ => target_at(profile, elapsed),
        }
        .round() as u64;
        let _ = tx.send(desired);

        // Spawn (or respawn) every VU slot below the desired count; a VU
        // whose slot drops below the watermark exits after its iteration.
        for index in 0..desired as usize {
            if vus.len() <= index {
                vus.push(None);
            }
            let needs_spawn = match &vus[index] {
                Some(handle) => handle.is_finished(),
                None => true,
            };
            if needs_spawn {
                let env = env.clone();
                let table = table.clone();
                let load = load.clone();
                let rx = rx.clone();
                vus[index] = Some(tokio::spawn(async move {
                    vu_loop(index as u64, env, table, load, rx, deadline).await;
                }));
            }
        }

        sleep(CONTROL_TICK).await;
    }

    let _ = tx.send(0);
    let handles: Vec<JoinHandle<()>> = vus.into_iter().flatten().collect();
    graceful_join(handles, profile.graceful_stop).await;
}

async fn vu_loop(
    index: u64,
    env: IterationEnv,
    table: Arc<WeightedTable<Area>>,
    load: Arc<LoadConfig>,
    rx: watch::Receiver<u64>,
    deadline: Instant,
) {
    debug!("VU {} starting", index);
    while Instant::now() < deadline && *rx.borrow() > index {
        run_iteration(&env, &table, &load).await;
        pacing_sleep(&load).await;
    }
    debug!("VU {} stopping", index);
}

/// Driver for the ramping arrival-rate profile
///
/// Starts iterations at the interpolated rate, each on a slot from a
/// bounded VU pool. When the pool is exhausted the iteration is dropped
/// and counted rather than queued.
async fn run_arrival_profile(
    profile: &ScenarioProfile,
    env: &IterationEnv,
    table: Arc<WeightedTable<Area>>,
    load: Arc<LoadConfig>,
) {
    let total = profile.total_duration();
    let start = Instant::now();
    let pool = Arc::new(Semaphore::new(profile.max_vus as usize));
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    loop {
        let elapsed = start.elapsed();
        if elapsed >= total {
            break;
        }

        let rate = target_at(profile, elapsed);
        if rate <= f64::EPSILON {
            sleep(CONTROL_TICK).await;
            continue;
        }

        match pool.clone().try_acquire_owned() {
            Ok(permit) => {
                let env = env.clone();
                let table = table.clone();
                let load = load.clone();
                handles.push(tokio::spawn(async move {
                    run_iteration(&env, &table, &load).await;
                    drop(permit);
                }));
            }
            Err(_) => {
                env.metrics.add_counter(names::DROPPED_ITERATIONS, None, 1);
            }
        }

        handles.retain(|handle| !handle.is_finished());
        sleep(Duration::from_secs_f64(1.0 / rate)).await;
    }

    graceful_join(handles, profile.graceful_stop).await;
}

/// Wait out the graceful-stop window, then abandon what is still running
async fn graceful_join(mut handles: Vec<JoinHandle<()>>, grace: Duration) {
    let drained = tokio::time::timeout(grace, async {
        for handle in handles.iter_mut() {
            let _ = handle.await;
        }
    })
    .await;

    if drained.is_err() {
        let pending = handles.iter().filter(|h| !h.is_finished()).count();
        warn!(
            "Abandoning {} in-flight iterations after the graceful-stop window",
            pending
        );
        for handle in handles {
            handle.abort();
        }
    }
}
