use clap::Parser;
use docqr_server::{cli::Cli, commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    commands::run(Cli::parse()).await
}
