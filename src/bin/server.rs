use anyhow::Context;
use clap::Parser;
use trivia_api::db;
use trivia_api::server::app::{run_server, AppState};
use trivia_api::settings::Settings;
use trivia_api::telemetry::init_tracing;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Skip running database migrations on startup
    #[clap(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing("info,tower_http=debug");
    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load settings")?;

    let pool = db::establish_connection(&settings.database.path, settings.database.max_connections)
        .await
        .with_context(|| format!("Cannot open database {}", settings.database.path))?;

    if !cli.no_migrate {
        tracing::info!("Running db migrations...");
        db::run_migrations(&pool).await?;
    }

    run_server(AppState::new(pool), &settings.server).await
}
