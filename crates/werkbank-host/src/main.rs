use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use werkbank_core::time::SystemClock;
use werkbank_core::{CachedSettings, SettingsProvider};
use werkbank_db::SqliteSettings;

mod auth;
mod config;
mod health;
mod internal;
mod registry;
mod routes;
mod state;
mod token;

use config::HostConfig;
use health::HealthTracker;
use registry::ModuleRegistry;
use routes::ApiDoc;
use state::AppState;
use token::TokenValidator;

/// How long a settings read may be served from cache before the store is
/// consulted again.
const SETTINGS_TTL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match HostConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).ok();

    let store = match SqliteSettings::open(&config.database_url) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(error = %err, path = %config.database_url, "cannot open settings database");
            std::process::exit(1);
        }
    };

    let validator = match TokenValidator::new(&config.jwt_secret, &config.jwt_issuer) {
        Ok(validator) => Arc::new(validator),
        Err(err) => {
            tracing::error!(error = %err, "cannot build token validator");
            std::process::exit(1);
        }
    };

    let provider: Arc<dyn SettingsProvider> = store.clone();
    let state = AppState {
        registry: Arc::new(ModuleRegistry::new()),
        health: Arc::new(HealthTracker::new(Arc::new(SystemClock))),
        settings: Arc::new(CachedSettings::new(provider, SETTINGS_TTL)),
        store,
        validator,
    };

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route(
            "/metrics",
            get(move || {
                let rendered = handle.render();
                async move { rendered }
            }),
        )
        .route("/api/modules/register", post(routes::register_module))
        .route("/api/modules", get(routes::list_modules))
        .route("/api/modules/health", get(routes::modules_health))
        .route(
            "/api/modules/:name",
            get(routes::get_module).delete(routes::unregister_module),
        )
        .route("/api/setup/required", get(routes::setup_required))
        .route("/api/setup/complete", post(routes::setup_complete))
        // Outermost first: trace, then the gateway, then health tracking.
        .layer(middleware::from_fn_with_state(state.clone(), health::track_health))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_gateway))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("werkbank host listening on {}", config.addr);

    let server = axum::Server::bind(&config.addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!("server error: {}", e);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}
