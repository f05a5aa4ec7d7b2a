use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, Response, StatusCode},
    Router,
};
use orderflow_api::{
    config::AppConfig,
    events::{self, EventSender},
    gateway::HttpGateway,
    services::{orders::OrderService, payments::PaymentService, promotions::PromoService, AppServices},
    AppState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use wiremock::MockServer;

/// Test harness: the full router wired against a wiremock gateway backend.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub gateway: MockServer,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let gateway = MockServer::start().await;

        let cfg = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 18_080,
            gateway_base_url: gateway.uri(),
            gateway_timeout_secs: 5,
            health_check_attempts: 2,
            // Keep the retry fast in tests; the bound matters, not the wait.
            health_check_delay_ms: 10,
            commission_rate_bps: 500,
            cancellation_window_hours: 24,
            carrier_pickup_delay_secs: 0,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            log_json: false,
        };

        let client = Arc::new(
            HttpGateway::new(
                &cfg.gateway_base_url,
                Duration::from_secs(cfg.gateway_timeout_secs),
            )
            .expect("gateway client"),
        );

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);

        let orders = Arc::new(OrderService::new(
            cfg.commission_rate(),
            cfg.cancellation_window(),
            Some(event_sender.clone()),
        ));
        let payments = Arc::new(PaymentService::new(
            client.clone(),
            orders.clone(),
            Some(event_sender.clone()),
            cfg.health_check_attempts,
            Duration::from_millis(cfg.health_check_delay_ms),
        ));
        let promos = Arc::new(PromoService::new(client));

        let event_task = tokio::spawn(events::process_events(
            event_rx,
            orders.clone(),
            Duration::from_secs(cfg.carrier_pickup_delay_secs),
        ));

        let state = AppState {
            config: cfg,
            services: AppServices {
                orders,
                payments,
                promos,
            },
            event_sender,
        };
        let router = orderflow_api::app_router(state.clone());

        Self {
            router,
            state,
            gateway,
            _event_task: event_task,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                builder.body(Body::from(json.to_string())).unwrap()
            }
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, path, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json response body")
        };
        (status, json)
    }
}
