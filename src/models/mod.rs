pub mod order;
pub mod payment;
pub mod promo;

pub use order::{Order, OrderItem, OrderStatus};
pub use payment::{AttemptStatus, CheckoutIntent, PaymentAttempt, ReturnParams};
pub use promo::PromoApplication;
