use crate::core::{
    distance::distance_km,
    fees::{resolve_fee, NoTierMatch},
    geocode::CoordinateResolver,
    policy::check_eligibility,
};
use crate::models::{CustomerAddress, EligibilityReason, EligibilityResult, MerchantDeliveryConfig};
use std::sync::Arc;

/// Delivery eligibility orchestrator
///
/// # Pipeline Stages
/// 1. Skip everything when the merchant has no coordinates or radius
/// 2. Resolve the customer address (fail-open on any geocoding failure)
/// 3. Haversine distance to the merchant
/// 4. Radius policy
/// 5. Fee tier lookup
///
/// `evaluate` never fails: every degraded path is an explicit
/// [`EligibilityReason`].
#[derive(Clone)]
pub struct DeliveryEligibilityService {
    resolver: Arc<dyn CoordinateResolver>,
}

impl DeliveryEligibilityService {
    pub fn new(resolver: Arc<dyn CoordinateResolver>) -> Self {
        Self { resolver }
    }

    /// Decide whether an order can be delivered and what it costs
    pub async fn evaluate(
        &self,
        config: &MerchantDeliveryConfig,
        address: &CustomerAddress,
    ) -> EligibilityResult {
        // Stage 1: unconfigured merchants accept everything, no provider calls
        let Some((merchant_at, _)) = config.validation_target() else {
            tracing::debug!("Delivery validation disabled, accepting address");
            return EligibilityResult {
                eligible: true,
                distance_km: None,
                fee: config.manual_override_fee,
                reason: EligibilityReason::ValidationDisabled,
            };
        };

        // Stage 2: geocoding providers are third-party; an outage must not block checkout
        let customer_at = match self.resolver.resolve(address).await {
            Ok(coordinate) => coordinate,
            Err(failure) => {
                tracing::warn!("Geocoding failed, accepting order without validation: {}", failure);
                return EligibilityResult {
                    eligible: true,
                    distance_km: None,
                    fee: config.manual_override_fee,
                    reason: EligibilityReason::GeocodeFailed,
                };
            }
        };

        // Stage 3 & 4: distance and radius
        let distance = distance_km(merchant_at, customer_at);
        let (eligible, reason) = check_eligibility(config, distance);

        if !eligible {
            tracing::debug!("Customer {:.2} km away is outside the delivery radius", distance);
            return EligibilityResult {
                eligible: false,
                distance_km: Some(distance),
                fee: None,
                reason,
            };
        }

        // Stage 5: fee, with the flat fee standing in for an empty table
        let fee = if config.fee_tiers.is_empty() {
            config
                .manual_override_fee
                .ok_or(NoTierMatch { distance_km: distance })
        } else {
            resolve_fee(&config.fee_tiers, distance)
        };

        match fee {
            Ok(fee) => EligibilityResult {
                eligible: true,
                distance_km: Some(distance),
                fee: Some(fee),
                reason: EligibilityReason::Ok,
            },
            Err(no_match) => {
                tracing::warn!("{}, fee must be set manually", no_match);
                EligibilityResult {
                    eligible: true,
                    distance_km: Some(distance),
                    fee: None,
                    reason: EligibilityReason::NoTierMatch,
                }
            }
        }
    }
}
