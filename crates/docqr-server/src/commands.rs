//! Implementation of the `docqr` subcommands

use anyhow::Context;
use docqr_connection::{ConnectionManager, Prober};
use docqr_core::{Connection, DocqrError, is_srv_uri, sanitize_uri};
use docqr_drivers::DriverRegistry;
use docqr_services::{FileStorage, ImportService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cli::{Cli, Command};
use crate::config::ServerConfig;
use crate::logging::{self, LoggingConfig};
use crate::state::AppState;

/// Load configuration, set up logging and run the selected command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::load(&cli.options).context("invalid configuration")?;
    logging::init(LoggingConfig::from_server_config(&config))?;
    for notice in &config.notices {
        warn!("{notice}");
    }

    match cli.command() {
        Command::Serve => serve(config).await,
        Command::Diagnose { json } => diagnose(&config, json).await,
        Command::Check => check(&config).await,
        Command::Import { dir, base_url } => import(&config, dir, base_url).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    if let Some(warning) = config.public_url_warning() {
        warn!("{warning}");
    }
    let manager = connection_manager(&config)?;
    connect(&manager, &config).await?;

    let state = AppState::new(manager, &config);
    state.storage.ensure_root().await?;
    info!(upload_dir = %config.upload_dir.display(), "upload directory ready");

    crate::serve(&config, state).await
}

async fn diagnose(config: &ServerConfig, json: bool) -> anyhow::Result<()> {
    let report = Prober::new()
        .diagnose(&config.database_uri)
        .await
        .context("cannot diagnose the database connection string")?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }
    Ok(())
}

async fn check(config: &ServerConfig) -> anyhow::Result<()> {
    let manager = connection_manager(config)?;
    let connection = connect(&manager, config).await?;
    let documents = connection.documents().count().await?;

    println!(
        "connected to {} (database {}, {} document(s), {} attempt(s))",
        sanitize_uri(&config.database_uri),
        connection.database_name(),
        documents,
        manager.attempts_made()
    );

    manager.disconnect().await?;
    Ok(())
}

async fn import(
    config: &ServerConfig,
    dir: Option<PathBuf>,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| config.upload_dir.clone());
    let base_url = base_url.unwrap_or_else(|| config.base_url());

    let manager = connection_manager(config)?;
    let connection = connect(&manager, config).await?;

    let summary = ImportService::new(FileStorage::new(&dir))
        .import_directory(connection.documents(), &base_url)
        .await;
    manager.disconnect().await?;
    let summary = summary?;

    println!(
        "imported {}, skipped {}, failed {} from {}",
        summary.imported.len(),
        summary.skipped.len(),
        summary.failed.len(),
        dir.display()
    );
    for (file, reason) in &summary.failed {
        println!("  {file}: {reason}");
    }

    if !summary.failed.is_empty() {
        anyhow::bail!("{} file(s) could not be imported", summary.failed.len());
    }
    Ok(())
}

fn connection_manager(config: &ServerConfig) -> anyhow::Result<Arc<ConnectionManager>> {
    let driver = DriverRegistry::with_defaults()
        .for_uri(&config.database_uri)
        .context("unsupported database connection string")?;
    Ok(Arc::new(ConnectionManager::new(driver)))
}

/// Connect with retry. On exhaustion the prober runs once so the log
/// explains why the host could not be reached.
async fn connect(
    manager: &ConnectionManager,
    config: &ServerConfig,
) -> anyhow::Result<Arc<dyn Connection>> {
    if is_srv_uri(&config.database_uri) {
        info!("Using MongoDB Atlas cloud database");
    }
    info!(uri = %sanitize_uri(&config.database_uri), "connecting to database");

    match manager.connect(&config.database_uri, &config.retry).await {
        Ok(connection) => {
            info!(
                database = connection.database_name(),
                attempts = manager.attempts_made(),
                "database connected"
            );
            Ok(connection)
        }
        Err(e) => {
            if matches!(e, DocqrError::ConnectionExhausted { .. }) {
                error!(error = %e, "database unreachable, running diagnostics");
                match Prober::new().diagnose(&config.database_uri).await {
                    Ok(report) => error!("{report}"),
                    Err(probe_error) => warn!(error = %probe_error, "diagnostics failed"),
                }
            }
            Err(anyhow::Error::new(e).context("database connection failed"))
        }
    }
}
