use anyhow::Result;
use clap::{Parser, Subcommand};
use guestbook_backend::api;
use guestbook_backend::bootstrap;
use guestbook_backend::config::GuestbookConfig;
use guestbook_backend::telemetry;
use guestbook_backend::utils;

#[derive(Parser)]
#[command(author, version, about = "Guestbook comment API server")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::print_banner();
    telemetry::init_tracing();

    let args = Args::parse();

    let config = GuestbookConfig::from_env()?;
    let resources = bootstrap::initialize(&config)?;
    tracing::info!(
        db_path = %config.paths.db_path.display(),
        first_run = resources.database_initialized,
        credentials_seeded = resources.credentials_seeded,
        "bootstrap complete"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, resources.database).await,
    }
}
