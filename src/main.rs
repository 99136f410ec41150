//! Artifact Locator - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artifact_locator::{
    api,
    config::Config,
    db,
    error::Result,
    nas,
    retry::RetryPolicy,
    services::{
        build_clock::JenkinsBuildClock,
        candidates::CandidateGenerator,
        dedup::DuplicateSuppressor,
        failure_monitor::{
            AlertHandler, FailureMonitor, LogAlertHandler, MonitorConfig, WebhookAlertHandler,
        },
        locator::Locator,
        path_store::{PathStore, PgPathStore},
        scheduler,
        verifier::ArtifactVerifier,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artifact_locator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting Artifact Locator");

    // Connect to database
    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // Select the NAS transport once; the choice is sticky for the
    // process lifetime.
    let transport = nas::select_transport(&config).await?;

    // Wire components explicitly; no hidden singletons.
    let retry = RetryPolicy::default();
    let store: Arc<dyn PathStore> = Arc::new(PgPathStore::new(db_pool.clone(), retry.clone()));
    let clock = Arc::new(JenkinsBuildClock::from_config(&config)?);
    let generator = CandidateGenerator::new(config.nas_base_path.clone(), config.candidate_date_spread);
    let verifier = ArtifactVerifier::new(transport, retry, config.nas_timeout());

    let mut alert_handlers: Vec<Arc<dyn AlertHandler>> = vec![Arc::new(LogAlertHandler)];
    if let Some(url) = &config.alert_webhook_url {
        alert_handlers.push(Arc::new(WebhookAlertHandler::new(url.clone())));
    }
    let monitor = Arc::new(FailureMonitor::new(
        MonitorConfig {
            consecutive_threshold: config.alert_consecutive_threshold,
            rate_threshold: config.alert_rate_threshold,
            min_samples: config.alert_min_samples,
            cooldown: chrono::Duration::minutes(config.alert_cooldown_minutes),
            ..MonitorConfig::default()
        },
        alert_handlers,
    ));

    let locator = Arc::new(Locator::new(
        store.clone(),
        clock,
        generator,
        verifier,
        monitor.clone(),
        config.resolve_ceiling(),
    ));

    let suppressor = Arc::new(DuplicateSuppressor::new(std::time::Duration::from_secs(
        config.dedup_ttl_secs,
    )));

    // Spawn background sweeps (duplicate keys, retention)
    scheduler::spawn_all(store.clone(), suppressor.clone(), &config);

    let state = Arc::new(api::AppState {
        config: config.clone(),
        db: db_pool,
        locator,
        store,
        suppressor,
        monitor,
    });

    // Build router
    let app = Router::new()
        .merge(api::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
