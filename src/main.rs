//! alertbox - replay alert scenarios against an in-memory notification surface.

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use alertbox::cli::{Cli, LogFormat};
use alertbox::config::Config;
use alertbox::scenario::{self, Scenario};
use alertbox::{initialize_metrics, register_metric_descriptions};

/// Initialize the tracing subscriber with the specified log format.
///
/// Logs go to stderr; stdout carries the scenario report.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format);

    let config = match &cli.config {
        Some(path) => {
            info!(config_path = %path.display(), "Loading configuration");
            match Config::load(path) {
                Ok(c) => c,
                Err(e) => {
                    error!(error = %e, path = %path.display(), "Failed to load configuration");
                    std::process::exit(1);
                }
            }
        }
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    // Fail fast on any invalid value.
    info!("Validating configuration");
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Configuration validation error");
        }
        error!(error_count = errors.len(), "Configuration validation failed");
        std::process::exit(1);
    }

    let scenario = match &cli.scenario {
        Some(path) => match Scenario::load(path) {
            Ok(s) => Some(s),
            Err(e) => {
                error!(error = %e, path = %path.display(), "Failed to load scenario");
                std::process::exit(1);
            }
        },
        None => None,
    };

    if cli.validate {
        match &cli.config {
            Some(path) => println!("Configuration is valid: {}", path.display()),
            None => println!("Configuration is valid: built-in defaults"),
        }
        println!("  Initial delay: {:?}", config.timings.init_delay);
        println!(
            "  Delay per visible alert: {:?}",
            config.timings.additional_delay_per_alert
        );
        println!(
            "  Custom severities: {} (unknown: {:?})",
            config.severities.custom.len(),
            config.severities.unknown
        );
        if let (Some(path), Some(scenario)) = (&cli.scenario, &scenario) {
            println!(
                "  Scenario: {} ({} steps)",
                path.display(),
                scenario.steps.len()
            );
        }
        return Ok(());
    }

    let Some(scenario) = scenario else {
        error!("No scenario given");
        std::process::exit(2);
    };

    let runtime_config = config.compile();

    register_metric_descriptions();
    let severity_names: Vec<String> = ["error", "info", "success"]
        .into_iter()
        .map(str::to_string)
        .chain(runtime_config.severities.custom_names().map(str::to_string))
        .collect();
    initialize_metrics(severity_names.iter().map(String::as_str));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(runtime_config, scenario))
}

/// Main async entry point.
async fn run(runtime_config: alertbox::config::RuntimeConfig, scenario: Scenario) -> Result<()> {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c signal");
            return;
        }
        info!("Received shutdown signal, stopping scenario");
        cancel_clone.cancel();
    });

    let report = match scenario::execute(runtime_config, &scenario, cancel).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Scenario failed");
            return Err(anyhow::anyhow!("Scenario failed: {}", e));
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(completed = report.completed, "alertbox finished");
    Ok(())
}
