//! Orderflow API Library
//!
//! Order and payment lifecycle engine for a consumer marketplace: the
//! order state machine, the two-phase gateway capture protocol, promo
//! discounts, and merchant payout computation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod money;
pub mod services;

use serde::{Deserialize, Serialize};

pub use handlers::app_router;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub services: services::AppServices,
    pub event_sender: events::EventSender,
}

/// Uniform success envelope for API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Common pagination parameters for list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}
fn default_per_page() -> u64 {
    20
}
