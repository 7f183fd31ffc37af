mod api;
mod health;
mod pdf;

use std::sync::Arc;

use anyhow::Result;
use tower_http::services::ServeDir;

use roofline_core::config::AppConfig;
use roofline_core::measure::EstimatedMeasurementProvider;
use roofline_db::{connect, migrations, seed_demo_dataset};

use crate::api::AppState;
use crate::pdf::ProposalRenderer;

fn init_logging(config: &AppConfig) {
    use roofline_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(None)?;
    init_logging(&config);

    let pool = connect(&config.database).await?;
    migrations::run_pending(&pool).await?;

    if std::env::var("ROOFLINE_SEED_DEMO").as_deref() == Ok("1") {
        let dataset = seed_demo_dataset(&pool).await?;
        tracing::info!(
            tenant_id = dataset.tenant_id.0,
            leads = dataset.lead_count,
            quotes = dataset.quotes.len(),
            "demo dataset seeded"
        );
    }

    let renderer = ProposalRenderer::new(
        config.documents.output_dir.clone(),
        config.documents.wkhtmltopdf_path.as_deref(),
    )?;
    let state = AppState::new(
        pool.clone(),
        Arc::new(EstimatedMeasurementProvider),
        Arc::new(renderer),
        config.documents.public_path.clone(),
    );

    let app = api::router(state)
        .merge(health::router(pool, config.documents.output_dir.clone()))
        .nest_service(&config.documents.public_path, ServeDir::new(&config.documents.output_dir));

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(bind_address = %address, "roofline-server started");

    axum::serve(listener, app).with_graceful_shutdown(wait_for_shutdown()).await?;
    tracing::info!("roofline-server stopping");

    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
