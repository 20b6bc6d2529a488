use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vibra::routes;
use vibra::state::AppState;
use vibra_core::db;

#[derive(Parser, Debug)]
#[command(author, version, about = "Vibra signal ingestion CLI and API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the Vibra API server
    Serve,
    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => serve().await,
        Command::Migrate => {
            let pool = connect_pool().await?;
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
            Ok(())
        }
    }
}

async fn serve() -> Result<()> {
    let pool = connect_pool().await?;
    db::run_migrations(&pool).await?;

    let router = routes::router(AppState::new(pool));

    let bind_addr = std::env::var("VIBRA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}

async fn connect_pool() -> Result<db::DbPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("VIBRA_DATABASE_URL"))
        .context("DATABASE_URL (or VIBRA_DATABASE_URL) must be set")?;
    Ok(db::connect(&database_url).await?)
}
