//! Entrega Algo - Delivery eligibility engine for food-ordering checkout
//!
//! Given a merchant's delivery settings and a customer's address or CEP,
//! decides whether the order can be delivered and which fee applies.
//! Geocoding providers are third-party and unreliable, so every failure
//! degrades to accepting the order with an explicit reason.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{DeliveryEligibilityService, GeocodeResolver, CoordinateResolver, GeocodeFailure, distance::distance_km, fees::resolve_fee};
pub use models::{Coordinate, CustomerAddress, EligibilityReason, EligibilityResult, FeeTier, MerchantDeliveryConfig};
