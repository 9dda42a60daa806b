use smartlms::app::{AppContext, build_router};
use smartlms::core::auth::{JwtConfig, JwtService};
use smartlms::core::config::Config;
use smartlms::core::db::{
    DbConfig, NotificationRepository, ProgressRepository, ProjectRepository, ReminderRepository,
    TaskRepository, create_pool_with_migrations,
};
use smartlms::core::notifications::{ReminderPoller, ScheduleMode};
use smartlms::core::storage::{ObjectStorage, StorageConfig};
use tracing_subscriber::EnvFilter;

type StartupError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!("SmartLMS failed to start: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env();

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, jwt_secret={}, admin={}, reminder_test_mode={}",
        config.has_database(),
        config.has_jwt_secret(),
        config.has_admin_credentials(),
        config.reminder_test_mode
    );

    let pool = create_pool_with_migrations(&DbConfig::from_env()?).await?;
    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let storage = ObjectStorage::from_config(&StorageConfig::from_env()?)?;

    let poller = ReminderPoller::new(
        ReminderRepository::new(pool.clone()),
        NotificationRepository::new(pool.clone()),
        ProgressRepository::new(pool.clone()),
        ProjectRepository::new(pool.clone()),
        TaskRepository::new(pool.clone()),
        config.reminder_poll_interval(),
    );
    let scheduler = poller.status();
    poller.spawn();

    let app = build_router(&AppContext {
        pool,
        jwt_service,
        storage,
        admin: config.admin_credentials(),
        schedule_mode: ScheduleMode::from_test_flag(config.reminder_test_mode),
        scheduler,
    });

    let addr = config.server_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
