// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Coordinate, CustomerAddress, EligibilityReason, EligibilityResult, FeeTier, MerchantDeliveryConfig, PostalAddress};
pub use requests::EvaluateDeliveryRequest;
pub use responses::{ErrorResponse, EvaluateDeliveryResponse, HealthResponse};
