mod main_runtime;

use branchwatch::api::create_router;
use branchwatch::cli::output::{self, OutputMode};
use branchwatch::cli::{Cli, Commands};
use branchwatch::config::AppConfig;
use branchwatch::domain::DateRange;
use branchwatch::error::{BranchwatchError, Result};
use branchwatch::Runtime;
use clap::Parser;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

use crate::main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    let mode = OutputMode::from_json_flag(cli.json);

    match cli.command {
        Commands::Serve { port } => {
            init_logging(&config.logging);
            run_server(config, port).await?;
        }
        Commands::Aggregate {
            start,
            end,
            category,
        } => {
            init_logging_simple();
            let runtime = Runtime::from_config(&config).await?;
            let report = runtime
                .orchestrator
                .aggregate(DateRange::new(start, end), category)
                .await;
            output::print_report(&report, mode)?;
        }
        Commands::Probe { branch } => {
            init_logging_simple();
            let runtime = Runtime::from_config(&config).await?;
            let statuses = match branch {
                Some(id) => match runtime.probe.probe_one(&id).await? {
                    Some(status) => vec![status],
                    None => {
                        output::print_error(&format!("branch {} is not registered", id));
                        return Ok(());
                    }
                },
                None => runtime.probe.probe_registry().await?,
            };
            output::print_statuses(&statuses, mode)?;
        }
        Commands::Stats => {
            init_logging_simple();
            let runtime = Runtime::from_config(&config).await?;
            let stats = runtime.probe.fleet_statistics().await?;
            output::print_statistics(&stats, mode)?;
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig, port: Option<u16>) -> Result<()> {
    let runtime = Runtime::from_config(&config).await?;
    let app = create_router(runtime.app_state());

    let host = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|e| BranchwatchError::InvalidConfig(format!("server.host: {}", e)))?;
    let addr = SocketAddr::new(host, port.unwrap_or(config.server.port));
    info!("Starting branchwatch API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
