use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{CustomerAddress, MerchantDeliveryConfig};

/// Request to evaluate delivery with an inline merchant configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EvaluateDeliveryRequest {
    #[validate(nested)]
    #[serde(alias = "merchantConfig", rename = "merchant")]
    pub merchant: MerchantDeliveryConfig,
    #[validate(nested)]
    #[serde(alias = "customerAddress", rename = "address")]
    pub address: CustomerAddress,
}
