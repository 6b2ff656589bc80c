use serde::{Deserialize, Serialize};
use validator::Validate;

/// Geographic coordinate in decimal degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coordinate {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range or non-finite values
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self { latitude, longitude })
    }
}

/// One row of a merchant's delivery fee table
///
/// `max_distance_km` is an inclusive upper bound. An unbounded tier is
/// written as `null` (or omitted) and held as `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeeTier {
    #[serde(
        rename = "maxDistanceKm",
        default = "unbounded_km",
        with = "unbounded_km_serde"
    )]
    #[validate(range(exclusive_min = 0.0))]
    pub max_distance_km: f64,
    #[validate(range(min = 0.0))]
    pub fee: f64,
}

impl FeeTier {
    pub fn new(max_distance_km: f64, fee: f64) -> Self {
        Self { max_distance_km, fee }
    }

    /// Tier covering every distance
    pub fn unbounded(fee: f64) -> Self {
        Self {
            max_distance_km: f64::INFINITY,
            fee,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_distance_km == f64::INFINITY
    }
}

fn unbounded_km() -> f64 {
    f64::INFINITY
}

mod unbounded_km_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_infinite() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// Delivery settings owned by the merchant record
///
/// When either `coordinates` or `delivery_radius_km` is missing, address
/// validation is disabled for the merchant and every address is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MerchantDeliveryConfig {
    #[serde(default)]
    #[validate(nested)]
    pub coordinates: Option<Coordinate>,
    #[serde(rename = "deliveryRadiusKm", default)]
    #[validate(range(exclusive_min = 0.0))]
    pub delivery_radius_km: Option<f64>,
    #[serde(rename = "feeTiers", default)]
    #[validate(nested)]
    pub fee_tiers: Vec<FeeTier>,
    #[serde(rename = "manualOverrideFee", default)]
    #[validate(range(min = 0.0))]
    pub manual_override_fee: Option<f64>,
}

impl MerchantDeliveryConfig {
    /// Coordinates and radius, when both are configured and usable
    ///
    /// A non-positive or non-finite radius, or coordinates outside the valid
    /// ranges, count as "not configured" and disable validation.
    pub fn validation_target(&self) -> Option<(Coordinate, f64)> {
        let coordinates = self.coordinates?;
        let coordinates = Coordinate::new(coordinates.latitude, coordinates.longitude)?;
        let radius = self
            .delivery_radius_km
            .filter(|radius| radius.is_finite() && *radius > 0.0)?;

        Some((coordinates, radius))
    }
}

/// Customer delivery address as submitted at checkout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerAddress {
    #[serde(rename = "postalCode", alias = "cep", default)]
    #[validate(length(max = 16))]
    pub postal_code: Option<String>,
    #[serde(rename = "freeText", default)]
    #[validate(length(max = 512))]
    pub free_text: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub coordinates: Option<Coordinate>,
}

impl CustomerAddress {
    pub fn from_postal_code(postal_code: impl Into<String>) -> Self {
        Self {
            postal_code: Some(postal_code.into()),
            ..Self::default()
        }
    }

    pub fn from_free_text(free_text: impl Into<String>) -> Self {
        Self {
            free_text: Some(free_text.into()),
            ..Self::default()
        }
    }

    pub fn from_coordinates(coordinates: Coordinate) -> Self {
        Self {
            coordinates: Some(coordinates),
            ..Self::default()
        }
    }

    /// Free text with surrounding whitespace removed, if non-empty
    pub fn free_text(&self) -> Option<&str> {
        self.free_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Postal code as submitted, if non-empty
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Structured address returned by a postal-lookup provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl PostalAddress {
    /// Compose a geocoder query, e.g. "Rua da Aurora, Boa Vista, Recife - PE, Brasil"
    pub fn to_query(&self) -> String {
        let mut parts: Vec<String> = [&self.street, &self.neighborhood]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();

        let city = self.city.trim();
        let state = self.state.trim();
        match (city.is_empty(), state.is_empty()) {
            (false, false) => parts.push(format!("{} - {}", city, state)),
            (false, true) => parts.push(city.to_string()),
            (true, false) => parts.push(state.to_string()),
            (true, true) => {}
        }

        parts.push("Brasil".to_string());
        parts.join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.street.trim().is_empty()
            && self.neighborhood.trim().is_empty()
            && self.city.trim().is_empty()
            && self.state.trim().is_empty()
    }
}

/// Why an evaluation ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EligibilityReason {
    Ok,
    OutOfRange,
    NoTierMatch,
    GeocodeFailed,
    ValidationDisabled,
}

/// Outcome of one delivery evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub eligible: bool,
    #[serde(rename = "distanceKm")]
    pub distance_km: Option<f64>,
    pub fee: Option<f64>,
    pub reason: EligibilityReason,
}

impl EligibilityResult {
    /// The checkout UI should show a soft warning ("delivery fee estimated
    /// manually") instead of an error for these outcomes.
    pub fn needs_manual_review(&self) -> bool {
        matches!(
            self.reason,
            EligibilityReason::GeocodeFailed
                | EligibilityReason::NoTierMatch
                | EligibilityReason::ValidationDisabled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_range_checks() {
        assert!(Coordinate::new(-8.05, -34.9).is_some());
        assert!(Coordinate::new(90.0, 180.0).is_some());
        assert!(Coordinate::new(90.1, 0.0).is_none());
        assert!(Coordinate::new(0.0, -180.5).is_none());
        assert!(Coordinate::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_fee_tier_null_bound_is_unbounded() {
        let tier: FeeTier = serde_json::from_str(r#"{"maxDistanceKm": null, "fee": 12.5}"#).unwrap();
        assert!(tier.is_unbounded());

        let tier: FeeTier = serde_json::from_str(r#"{"fee": 7.0}"#).unwrap();
        assert!(tier.is_unbounded());

        let json = serde_json::to_value(FeeTier::unbounded(3.0)).unwrap();
        assert!(json["maxDistanceKm"].is_null());

        let json = serde_json::to_value(FeeTier::new(3.0, 5.0)).unwrap();
        assert_eq!(json["maxDistanceKm"], 3.0);
    }

    #[test]
    fn test_merchant_config_validation() {
        let config = MerchantDeliveryConfig {
            coordinates: Coordinate::new(-8.010445, -34.876913),
            delivery_radius_km: Some(5.0),
            fee_tiers: vec![FeeTier::new(3.0, 5.0), FeeTier::unbounded(10.0)],
            manual_override_fee: None,
        };
        assert!(config.validate().is_ok());

        let bad_radius = MerchantDeliveryConfig {
            delivery_radius_km: Some(0.0),
            ..config.clone()
        };
        assert!(bad_radius.validate().is_err());

        let bad_fee = MerchantDeliveryConfig {
            fee_tiers: vec![FeeTier::new(3.0, -1.0)],
            ..config
        };
        assert!(bad_fee.validate().is_err());
    }

    #[test]
    fn test_validation_target_requires_both_fields() {
        let mut config = MerchantDeliveryConfig {
            coordinates: Coordinate::new(-8.0, -34.9),
            ..Default::default()
        };
        assert!(config.validation_target().is_none());

        config.delivery_radius_km = Some(4.0);
        assert!(config.validation_target().is_some());
    }

    #[test]
    fn test_unusable_radius_counts_as_unconfigured() {
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = MerchantDeliveryConfig {
                coordinates: Coordinate::new(-8.0, -34.9),
                delivery_radius_km: Some(radius),
                ..Default::default()
            };
            assert!(config.validation_target().is_none(), "radius {} accepted", radius);
        }

        let off_the_map = MerchantDeliveryConfig {
            coordinates: Some(Coordinate { latitude: 91.0, longitude: -34.9 }),
            delivery_radius_km: Some(5.0),
            ..Default::default()
        };
        assert!(off_the_map.validation_target().is_none());
    }

    #[test]
    fn test_blank_address_fields_are_absent_not_invalid() {
        let address = CustomerAddress {
            postal_code: Some(String::new()),
            free_text: Some("  ".to_string()),
            coordinates: None,
        };

        assert!(address.validate().is_ok());
        assert_eq!(address.postal_code(), None);
        assert_eq!(address.free_text(), None);
    }

    #[test]
    fn test_postal_address_query() {
        let address = PostalAddress {
            street: "Rua da Aurora".to_string(),
            neighborhood: "Boa Vista".to_string(),
            city: "Recife".to_string(),
            state: "PE".to_string(),
        };
        assert_eq!(address.to_query(), "Rua da Aurora, Boa Vista, Recife - PE, Brasil");

        let sparse = PostalAddress {
            city: "Olinda".to_string(),
            ..Default::default()
        };
        assert_eq!(sparse.to_query(), "Olinda, Brasil");
    }

    #[test]
    fn test_customer_address_accepts_cep_alias() {
        let address: CustomerAddress = serde_json::from_str(r#"{"cep": "50050-000"}"#).unwrap();
        assert_eq!(address.postal_code(), Some("50050-000"));
        assert_eq!(address.free_text(), None);
    }

    #[test]
    fn test_reason_wire_format() {
        let json = serde_json::to_string(&EligibilityReason::ValidationDisabled).unwrap();
        assert_eq!(json, "\"VALIDATION_DISABLED\"");

        let json = serde_json::to_string(&EligibilityReason::Ok).unwrap();
        assert_eq!(json, "\"OK\"");
    }

    #[test]
    fn test_manual_review_flags() {
        let result = EligibilityResult {
            eligible: true,
            distance_km: None,
            fee: None,
            reason: EligibilityReason::GeocodeFailed,
        };
        assert!(result.needs_manual_review());

        let ok = EligibilityResult {
            reason: EligibilityReason::Ok,
            ..result
        };
        assert!(!ok.needs_manual_review());
    }
}
