// Core algorithm exports
pub mod distance;
pub mod eligibility;
pub mod fees;
pub mod geocode;
pub mod policy;

pub use distance::{distance_km, haversine_distance};
pub use eligibility::DeliveryEligibilityService;
pub use fees::{resolve_fee, NoTierMatch};
pub use geocode::{normalize_postal_code, CoordinateResolver, ForwardGeocoder, GeocodeFailure, GeocodeResolver, PostalLookup};
pub use policy::{check_eligibility, is_validation_enabled};
