//! Storefront - headless e-commerce backend

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};

use storefront::{
    adapters::{HttpContentStore, LogPublisher, NatsPublisher, StripeGateway},
    config::AppConfig,
    db::PgInstallmentStore,
    http::{self, AppState, Backends},
    ports::EventPublisher,
    telemetry,
    webhook::SignatureVerifier,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(config.json_logs);

    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await.context("connecting to PostgreSQL")?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let events: Arc<dyn EventPublisher> = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Arc::new(NatsPublisher::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, domain events will only be logged");
                Arc::new(LogPublisher)
            }
        },
        None => Arc::new(LogPublisher),
    };

    let client = reqwest::Client::builder().timeout(Duration::from_secs(15)).build()?;
    let backends = Backends {
        content: Arc::new(HttpContentStore::new(client.clone(), &config.content)),
        payments: Arc::new(StripeGateway::new(client, &config.payments)),
        installments: Arc::new(PgInstallmentStore::new(db.clone())),
        events,
    };
    let verifier = SignatureVerifier::new(config.payments.webhook_secret.clone(), config.payments.webhook_tolerance_secs);
    let state = AppState::new(db, backends, config.checkout.clone(), verifier);

    let addr = config.addr();
    tracing::info!("🚀 Storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, http::router(state)).await?;
    Ok(())
}
