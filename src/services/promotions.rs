use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    gateway::{ApplyPromoRequest, PromoBackend},
    models::promo::PromoApplication,
    money,
};

/// Promo-code validation and per-payer session discounts.
///
/// Discounts never stack: an applied code replaces the session's active
/// discount. Lookups are fail-open: a backend failure yields no discount
/// rather than blocking checkout.
pub struct PromoService {
    backend: Arc<dyn PromoBackend>,
    active: DashMap<Uuid, PromoApplication>,
}

impl PromoService {
    pub fn new(backend: Arc<dyn PromoBackend>) -> Self {
        Self {
            backend,
            active: DashMap::new(),
        }
    }

    /// Best active discount for a payer, refreshed from the backend.
    /// Best-effort: any failure logs and yields zero.
    #[instrument(skip(self), fields(payer_id = %payer_id))]
    pub async fn fetch_active_discount(&self, payer_id: Uuid) -> Decimal {
        match self.backend.active_discount(payer_id).await {
            Ok(response) if response.ok => {
                let percent = money::clamp_percent(response.best_percent.unwrap_or_default());
                if percent > Decimal::ZERO {
                    self.active.insert(
                        payer_id,
                        PromoApplication::new("active".to_string(), percent, None),
                    );
                }
                percent
            }
            Ok(_) => Decimal::ZERO,
            Err(e) => {
                warn!(error = %e, "promo discount lookup failed, continuing without discount");
                Decimal::ZERO
            }
        }
    }

    /// Validates and applies a promo code for a payer.
    ///
    /// The code is trimmed and rejected locally when empty. On success the
    /// session's active discount is replaced; on any failure the previously
    /// active discount is left untouched.
    #[instrument(skip(self), fields(payer_id = %payer_id))]
    pub async fn apply_code(
        &self,
        code: &str,
        payer_id: Uuid,
    ) -> Result<PromoApplication, ServiceError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Promo code is required".to_string(),
            ));
        }

        let response = self
            .backend
            .apply_code(ApplyPromoRequest {
                code: code.to_string(),
                user_id: payer_id,
            })
            .await?;

        if !response.ok {
            return Err(ServiceError::ValidationError(format!(
                "Promo code '{}' is not valid",
                code
            )));
        }

        let application = PromoApplication::new(
            code.to_string(),
            response.discount_percent.unwrap_or_default(),
            response.expires_at,
        );
        debug!(%code, percent = %application.discount_percent, "promo code applied");
        self.active.insert(payer_id, application.clone());
        Ok(application)
    }

    /// Current session discount for a payer; expired applications count as
    /// absent.
    pub fn active_discount(&self, payer_id: Uuid) -> Decimal {
        self.active
            .get(&payer_id)
            .filter(|promo| !promo.is_expired(Utc::now()))
            .map(|promo| promo.discount_percent)
            .unwrap_or(Decimal::ZERO)
    }
}
