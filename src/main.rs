use webcare::{
    config::AppConfig,
    db,
    repositories::{SqliteCheckInRepository, SqliteUserRepository},
    routes,
    services::{
        create_email_service, CheckInService, Clock, EmailService, StalenessSweep, SweepScheduler,
        SystemClock, UserService,
    },
    AppState,
};

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webcare=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::from_env()?);

    // Database connection
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Initialize repositories
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let checkin_repository = Arc::new(SqliteCheckInRepository::new(pool.clone()));

    // Initialize services
    let user_service = Arc::new(UserService::new(
        user_repository.clone(),
        clock.clone(),
        config.default_warning_interval_hours,
    ));
    let checkin_service = Arc::new(CheckInService::new(checkin_repository, clock.clone()));

    let email_service: Arc<dyn EmailService> = create_email_service().into();
    let sweep = Arc::new(StalenessSweep::new(user_repository, email_service, clock));

    // Start the staleness sweep; the handle is shut down after the server stops
    let sweep_handle = SweepScheduler::spawn(sweep, config.sweep_interval);

    let app_state = AppState {
        config: config.clone(),
        user_service,
        checkin_service,
        pool: pool.clone(),
    };

    let app = routes::build_router(app_state);

    tracing::info!("Server running on http://{}", config.bind_addr);
    tracing::info!("Open {} to register", config.base_url);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweep_handle.shutdown().await;
    pool.close().await;

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
