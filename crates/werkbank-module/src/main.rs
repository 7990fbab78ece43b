use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use werkbank_core::{ModuleInfo, NavItem};
use werkbank_module::{health_router, HealthPulse, HttpRegistrar, ModuleHealthMonitor, MonitorConfig};

/// Minimal Faktura module process: serves its health endpoint and keeps its
/// registration with the host alive.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host_url =
        std::env::var("HOST_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
    let self_url =
        std::env::var("SELF_URL").unwrap_or_else(|_| "http://localhost:5101".to_string());

    let registrar = match HttpRegistrar::new(&host_url) {
        Ok(registrar) => registrar,
        Err(err) => {
            tracing::error!(error = %err, "cannot build registration client");
            std::process::exit(1);
        }
    };

    let pulse = Arc::new(HealthPulse::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let info_factory = move || module_info(&self_url);
    let monitor = ModuleHealthMonitor::new(
        MonitorConfig::default(),
        registrar,
        info_factory,
        pulse.clone(),
        shutdown_rx,
    )
    .spawn();

    let app = health_router("Faktura", pulse);

    let addr = SocketAddr::from(([127, 0, 0, 1], 5101));
    tracing::info!("faktura module listening on {}", addr);

    let server = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!("server error: {}", e);
    }

    // Stop the heartbeat before the process goes away.
    let _ = shutdown_tx.send(true);
    let _ = monitor.await;
}

fn module_info(self_url: &str) -> ModuleInfo {
    let version = std::env::var("MODULE_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
    ModuleInfo {
        module_name: "Faktura".to_string(),
        display_name: "Rechnungen".to_string(),
        version,
        logo_url: format!("{self_url}/logo.svg"),
        health_check_url: format!("{self_url}/health"),
        navigation_items: vec![NavItem::link("Rechnungen", "/faktura", "invoice")],
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
