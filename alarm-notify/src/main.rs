//! Alarm Notify Web Server - receives and verifies platform alarm notifications.
//!
//! Verified alarms are published to RabbitMQ when `CLOUDAMQP_URL` is set and
//! logged otherwise.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use alarm_notify::notify::ConfigError;
use alarm_notify::web::{router, LogDispatch};
use alarm_notify::{AlarmNotifyHandler, AppState, Config, DispatchTarget, Publisher, QueueDispatch};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        app_id_configured = config.app_id.is_some(),
        app_key_configured = config.app_key.is_some(),
        max_body_bytes = config.max_body_bytes,
        notify_path = %config.notify_path,
        rabbitmq_configured = config.cloudamqp_url.is_some(),
        "config_loaded"
    );

    let publisher = config.cloudamqp_url.clone().map(Publisher::new);
    let dispatch: Arc<dyn DispatchTarget> = match &publisher {
        Some(publisher) => {
            info!("rabbitmq_publisher_created");
            Arc::new(QueueDispatch::new(publisher.clone()))
        }
        None => Arc::new(LogDispatch),
    };

    // Missing credentials are a startup failure, never a per-request one.
    let app_id = config
        .app_id
        .clone()
        .ok_or(ConfigError::Missing("WECHAT_PAY_APP_ID"))?;
    let app_key = config
        .app_key
        .clone()
        .ok_or(ConfigError::Missing("WECHAT_PAY_APP_KEY"))?;
    let handler = AlarmNotifyHandler::new(app_id, app_key, dispatch)
        .context("Invalid alarm notification credentials")?
        .with_max_body_bytes(config.max_body_bytes);

    let app = router(AppState::new(handler), &config.notify_path)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(publisher) = publisher {
        publisher.close().await;
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
