use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpResponse, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use lending_trust_service::{
    config::Config,
    db::{PgStore, Store},
    http,
    services::{
        BorrowService, NoopNotifier, NotificationDispatcher, SuspensionPolicy, TrustSafetyService,
        WebhookNotifier,
    },
    worker::spawn_safety_worker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    tracing::info!("Starting lending trust service...");

    let config = Config::from_env()?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        http_port = config.http_port,
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Database pool initialized");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations completed");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(Arc::new(pool)));

    let notifier: Arc<dyn NotificationDispatcher> = match &config.notification_webhook_url {
        Some(url) => {
            tracing::info!(endpoint = %url, "Webhook notifier enabled");
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        None => Arc::new(NoopNotifier),
    };

    let safety = Arc::new(
        TrustSafetyService::bootstrap(
            store.clone(),
            &config.system_reporter_email,
            SuspensionPolicy {
                trust_threshold: config.auto_suspend_threshold,
                duration_days: config.auto_suspend_days,
            },
        )
        .await?,
    );
    tracing::info!(reporter_id = %safety.system_reporter_id(), "Trust & safety service ready");

    let borrow = Arc::new(BorrowService::new(store.clone(), notifier));

    let worker = spawn_safety_worker(
        safety.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let bind_addr = ("0.0.0.0", config.http_port);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(safety.clone()))
            .app_data(web::Data::new(borrow.clone()))
            .route(
                "/health",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
            .configure(http::configure)
    })
    .bind(bind_addr)?
    .run();

    tracing::info!("Lending trust service is running on port {}", config.http_port);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
            }
        }
        _ = worker => {
            tracing::error!("Safety sweep worker exited unexpectedly");
        }
    }

    Ok(())
}
