use std::process::ExitCode;
use std::sync::Arc;

use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;

use catalog_refresh::adapters::http::{app_router, RefreshAppState};
use catalog_refresh::adapters::{
    InMemoryCircuitBreaker, MockProductApi, PaapiClient, PostgresProductRepository,
    PostgresRefreshJobRepository, SigV4Signer,
};
use catalog_refresh::application::RefreshProductsHandler;
use catalog_refresh::config::{AppConfig, DatabaseConfig, PaapiConfig};
use catalog_refresh::ports::{CircuitBreaker, ProductApi};
use catalog_refresh::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = telemetry::init(&config.server) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let breaker: Arc<dyn CircuitBreaker> = Arc::new(InMemoryCircuitBreaker::new(
        "paapi",
        config.circuit_breaker.breaker_config(),
    ));
    let api = build_api(&config.paapi, breaker.clone())?;

    let state = match &config.database {
        Some(database) => {
            let pool = connect(database).await?;
            let handler = RefreshProductsHandler::new(
                Arc::new(PostgresProductRepository::new(pool.clone())),
                Arc::new(PostgresRefreshJobRepository::new(pool)),
                api,
                breaker.clone(),
                config.refresh.settings(),
            );
            RefreshAppState::new(Arc::new(handler), breaker)
        }
        None => {
            tracing::warn!("No database configured; refresh triggers will be rejected");
            RefreshAppState::unconfigured("Database connection is not configured", breaker)
        }
    };

    let addr = config.server.socket_addr()?;
    let app = app_router(state, config.server.request_timeout());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_api(
    config: &PaapiConfig,
    breaker: Arc<dyn CircuitBreaker>,
) -> Result<Arc<dyn ProductApi>, Box<dyn std::error::Error>> {
    if config.use_mock {
        tracing::warn!("Using the scripted mock product API");
        return Ok(Arc::new(MockProductApi::new(breaker)));
    }

    let (Some(access_key), Some(secret_key), Some(client_config)) = (
        config.access_key.as_deref(),
        config.secret_key.as_ref(),
        config.client_config(),
    ) else {
        return Err("PA-API credentials are incomplete".into());
    };

    let signer = SigV4Signer::for_paapi(
        access_key,
        Secret::new(secret_key.expose_secret().clone()),
        config.region.clone(),
    );
    let client = PaapiClient::new(client_config, Arc::new(signer), breaker)?;
    Ok(Arc::new(client))
}

async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = config.pool_options().connect(&config.url).await?;
    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    Ok(pool)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
