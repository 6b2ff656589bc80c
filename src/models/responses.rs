use serde::{Deserialize, Serialize};
use crate::models::domain::EligibilityResult;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Evaluate delivery response
///
/// `manualReview` tells the checkout UI to show a soft warning rather than
/// an error (geocoding failed, no tier matched, or validation disabled).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateDeliveryResponse {
    #[serde(flatten)]
    pub result: EligibilityResult,
    #[serde(rename = "manualReview")]
    pub manual_review: bool,
}

impl From<EligibilityResult> for EvaluateDeliveryResponse {
    fn from(result: EligibilityResult) -> Self {
        Self {
            manual_review: result.needs_manual_review(),
            result,
        }
    }
}
