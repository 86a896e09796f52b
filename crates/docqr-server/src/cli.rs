//! Command line interface of the `docqr` binary

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docqr", version, about = "PDF hosting with scannable download codes")]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Subcommand to run; `serve` when none is given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to the database and serve HTTP (default)
    Serve,
    /// Run network diagnostics against the database host
    Diagnose {
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
    /// Connect once with retry, report the outcome and exit
    Check,
    /// Register PDFs already present in the upload directory
    Import {
        #[arg(long, help = "Directory to scan instead of the upload directory")]
        dir: Option<PathBuf>,
        #[arg(long, help = "Base URL encoded in generated codes")]
        base_url: Option<String>,
    },
}

/// Settings that override the environment and the config file.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    #[arg(long, global = true, env = "DOCQR_CONFIG", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Database connection string")]
    pub database_uri: Option<String>,

    #[arg(long, global = true)]
    pub host: Option<String>,

    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[arg(long, global = true, help = "Directory uploaded files are stored in")]
    pub upload_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub max_upload_bytes: Option<usize>,

    #[arg(long, global = true, help = "Public base URL used in download codes")]
    pub public_url: Option<String>,

    #[arg(long, global = true)]
    pub retry_attempts: Option<u32>,

    #[arg(long, global = true)]
    pub retry_delay_secs: Option<u64>,

    #[arg(long, global = true, help = "Double the delay after each failed attempt")]
    pub retry_exponential: bool,

    #[arg(long, global = true, help = "Log as JSON instead of pretty text")]
    pub log_json: bool,
}
