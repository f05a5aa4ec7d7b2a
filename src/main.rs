use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{signal, sync::mpsc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use orderflow_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let gateway = Arc::new(api::gateway::HttpGateway::new(
        &cfg.gateway_base_url,
        Duration::from_secs(cfg.gateway_timeout_secs),
    )?);

    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = api::events::EventSender::new(event_tx);

    let orders = Arc::new(api::services::orders::OrderService::new(
        cfg.commission_rate(),
        cfg.cancellation_window(),
        Some(event_sender.clone()),
    ));
    let payments = Arc::new(api::services::payments::PaymentService::new(
        gateway.clone(),
        orders.clone(),
        Some(event_sender.clone()),
        cfg.health_check_attempts,
        Duration::from_millis(cfg.health_check_delay_ms),
    ));
    let promos = Arc::new(api::services::promotions::PromoService::new(gateway));

    tokio::spawn(api::events::process_events(
        event_rx,
        orders.clone(),
        Duration::from_secs(cfg.carrier_pickup_delay_secs),
    ));

    let state = api::AppState {
        config: cfg.clone(),
        services: api::services::AppServices {
            orders,
            payments,
            promos,
        },
        event_sender,
    };

    let app = api::app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port configuration")?;
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
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
    info!("shutdown signal received");
}
