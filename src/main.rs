use barbell_engine::api::routes::create_routes;
use barbell_engine::api::state::AppState;
use barbell_engine::config::{run_migrations, AppConfig, DatabaseConfig};
use barbell_engine::store::memory::SystemClock;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let app_config = AppConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;

    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;

    let clock = Arc::new(SystemClock::from_env());
    let state = AppState::new(pool, &app_config, clock);
    let app = create_routes(state);

    let listener = TcpListener::bind(&app_config.server_address()).await?;
    info!("barbell-engine starting on http://{}", app_config.server_address());
    info!("health check available at http://{}/health", app_config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
