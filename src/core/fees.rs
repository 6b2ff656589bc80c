use crate::models::FeeTier;
use thiserror::Error;

/// No configured tier covers the distance
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("no fee tier covers {distance_km:.2} km")]
pub struct NoTierMatch {
    pub distance_km: f64,
}

/// Look up the delivery fee for a distance in a merchant's tier table
///
/// Tiers are sorted ascending by upper bound here, so callers may pass them
/// in any order. The sort is stable: tiers sharing a bound keep their given
/// order and the first one wins. Upper bounds are inclusive.
///
/// Callers wanting a flat default fee must handle an empty table themselves.
pub fn resolve_fee(tiers: &[FeeTier], distance_km: f64) -> Result<f64, NoTierMatch> {
    let mut sorted: Vec<&FeeTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.max_distance_km.total_cmp(&b.max_distance_km));

    sorted
        .into_iter()
        .find(|tier| distance_km <= tier.max_distance_km)
        .map(|tier| tier.fee)
        .ok_or(NoTierMatch { distance_km })
}
