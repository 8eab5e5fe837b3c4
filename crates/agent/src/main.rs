//! `solrmon-agent` -- Solr core health check for Xymon.
//!
//! Reads the Solr CoreAdmin status, evaluates every monitored core
//! against its thresholds and sends one green/yellow/red status to Xymon.
//! Meant to be run periodically by cron or the Xymon client scheduler.
//!
//! See [`AgentConfig::from_env`] for the environment variables.
//!
//! Exit codes: `0` report delivered, `1` Solr unreachable (a red report
//! was still delivered) or delivery failed, `2` invalid configuration.

use std::process::ExitCode;

use solrmon_agent::check::SolrCheck;
use solrmon_agent::config::AgentConfig;
use solrmon_agent::reporter::{DryRunReporter, Reporter, XymonReporter};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_CONFIG: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solrmon_agent=info,solrmon_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    tracing::info!(
        host = %config.hostname,
        service = %config.service,
        config_path = %config.config_path.display(),
        monitored_cores = config.thresholds.cores.len(),
        global_default = config.thresholds.default.is_some(),
        dry_run = config.dry_run,
        "Starting solrmon-agent",
    );

    let reporter: Box<dyn Reporter> = if config.dry_run {
        Box::new(DryRunReporter::new(config.xymon.lifetime.clone()))
    } else {
        Box::new(XymonReporter::from_config(&config.xymon))
    };

    let check = match SolrCheck::from_config(&config, reporter) {
        Ok(check) => check,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match check.run().await {
        Ok(outcome) if outcome.fetch_failed => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Failed to deliver status report");
            ExitCode::FAILURE
        }
    }
}
