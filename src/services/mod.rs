pub mod orders;
pub mod payments;
pub mod promotions;

use std::sync::Arc;

/// Aggregate of the engine's services, shared through [`crate::AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<orders::OrderService>,
    pub payments: Arc<payments::PaymentService>,
    pub promos: Arc<promotions::PromoService>,
}
