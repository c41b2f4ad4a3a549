use std::sync::Arc;

use clap::Parser;

use crewdesk_api::tenant::PgTenantDirectory;
use crewdesk_api::{app, config, database, AppState};

#[derive(Parser)]
#[command(name = "crewdesk-api")]
#[command(about = "Multi-tenant business management backend")]
#[command(version)]
struct Args {
    #[arg(long, default_value = "0.0.0.0", help = "Address to bind")]
    bind: String,

    #[arg(long, help = "Port to listen on (falls back to PORT, then 3000)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = config::config();
    tracing::info!("Starting crewdesk-api in {:?} mode", config.environment);

    let pool = database::manager::connect().await?;
    sqlx::migrate!().run(&pool).await?;

    let state = AppState { db: pool.clone(), directory: Arc::new(PgTenantDirectory::new(pool)) };

    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse().ok()))
        .unwrap_or(3000);
    let bind_addr = format!("{}:{}", args.bind, port);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
