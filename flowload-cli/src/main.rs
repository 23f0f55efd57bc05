use anyhow::{Context, Result};
use clap::Parser;
use flowload_config::{ConfigLoader, FlowloadConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Cli, Commands};

/// Threshold failures exit with 1, fatal errors with 2
const EXIT_THRESHOLDS_FAILED: i32 = 1;
const EXIT_FATAL: i32 = 2;

fn init_logging(cli_level: Option<&str>, config: &FlowloadConfig) {
    // Precedence: --log-level, then FLOWLOAD_LOG, then the config file
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env("FLOWLOAD_LOG")
            .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
    };

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format {
        flowload_config::LogFormat::Json => subscriber.json().init(),
        flowload_config::LogFormat::Text => subscriber.init(),
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let loader = ConfigLoader::new();
    let mut config = loader
        .load(cli.config.as_ref())
        .context("Failed to load configuration")?;

    init_logging(cli.log_level.as_deref(), &config);

    match cli.command.unwrap_or(Commands::Run {
        scenario: None,
        base_url: None,
    }) {
        Commands::Run { scenario, base_url } => {
            if let Some(base_url) = base_url {
                config.target.base_url = base_url;
                config.validate_all().context("Invalid target override")?;
            }

            let summary = flowload_engine::execute(&config, scenario.as_deref())
                .await
                .context("Load run failed")?;

            println!("{}", summary.render());
            if summary.passed() {
                info!("All thresholds passed");
                Ok(0)
            } else {
                error!("One or more thresholds failed");
                Ok(EXIT_THRESHOLDS_FAILED)
            }
        }

        Commands::ValidateConfig => {
            // Loading already validated every domain
            println!("Configuration is valid");
            Ok(0)
        }

        Commands::ListScenarios => {
            let registry = config.scenario_registry();
            for (name, profile) in registry.iter() {
                let marker = if *name == config.default_scenario {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "{:<12} {:?}, {} stages, {:?} schedule{}",
                    name,
                    profile.kind,
                    profile.stages.len(),
                    profile.total_duration(),
                    marker
                );
            }
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            std::process::exit(EXIT_FATAL);
        }
    }
}
