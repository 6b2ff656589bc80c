use crate::models::{EligibilityReason, MerchantDeliveryConfig};

/// Whether the merchant has enough configuration to validate addresses
///
/// Merchants without coordinates or a radius accept every address.
#[inline]
pub fn is_validation_enabled(config: &MerchantDeliveryConfig) -> bool {
    config.validation_target().is_some()
}

/// Decide whether a customer at `distance_km` is inside the delivery area
///
/// The radius boundary is inclusive. Only call this once the distance is
/// known; geocoding failures are handled by the caller.
pub fn check_eligibility(
    config: &MerchantDeliveryConfig,
    distance_km: f64,
) -> (bool, EligibilityReason) {
    let Some((_, radius_km)) = config.validation_target() else {
        return (true, EligibilityReason::ValidationDisabled);
    };

    if distance_km <= radius_km {
        (true, EligibilityReason::Ok)
    } else {
        (false, EligibilityReason::OutOfRange)
    }
}
