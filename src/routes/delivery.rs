use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::DeliveryEligibilityService;
use crate::models::{CustomerAddress, ErrorResponse, EvaluateDeliveryRequest, EvaluateDeliveryResponse, HealthResponse};
use crate::services::{MerchantConfigStore, StoreError};
use std::sync::Arc;
use uuid::Uuid;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: DeliveryEligibilityService,
    pub store: Arc<dyn MerchantConfigStore>,
}

/// Configure all delivery-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/delivery/evaluate", web::post().to(evaluate_inline))
        .route("/merchants/{merchant_id}/delivery/evaluate", web::post().to(evaluate_for_merchant));
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Evaluate delivery against a merchant configuration supplied by the caller
///
/// POST /api/v1/delivery/evaluate
///
/// Request body:
/// ```json
/// {
///   "merchant": {
///     "coordinates": { "latitude": -8.010445, "longitude": -34.876913 },
///     "deliveryRadiusKm": 5.0,
///     "feeTiers": [{ "maxDistanceKm": 3.0, "fee": 5.0 }, { "maxDistanceKm": null, "fee": 10.0 }],
///     "manualOverrideFee": 8.0
///   },
///   "address": { "postalCode": "50050-000", "freeText": "Rua da Aurora, 100" }
/// }
/// ```
async fn evaluate_inline(
    state: web::Data<AppState>,
    req: web::Json<EvaluateDeliveryRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for evaluate request: {:?}", errors);
        return validation_error(errors);
    }

    let result = state.service.evaluate(&req.merchant, &req.address).await;

    tracing::info!(
        "Evaluated inline delivery: eligible={}, reason={:?}, distance_km={:?}",
        result.eligible,
        result.reason,
        result.distance_km
    );

    HttpResponse::Ok().json(EvaluateDeliveryResponse::from(result))
}

/// Evaluate delivery for a stored merchant
///
/// POST /api/v1/merchants/{merchantId}/delivery/evaluate
///
/// Request body: a customer address
/// ```json
/// { "postalCode": "50050-000" }
/// ```
async fn evaluate_for_merchant(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    address: web::Json<CustomerAddress>,
) -> impl Responder {
    let merchant_id = path.into_inner();

    if let Err(errors) = address.validate() {
        return validation_error(errors);
    }

    let config = match state.store.delivery_config(merchant_id).await {
        Ok(config) => config,
        Err(StoreError::NotFound(message)) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Merchant not found".to_string(),
                message,
                status_code: 404,
            });
        }
        Err(e) => {
            tracing::error!("Failed to load delivery config for merchant {}: {}", merchant_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load merchant configuration".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let result = state.service.evaluate(&config, &address).await;

    tracing::info!(
        "Evaluated delivery for merchant {}: eligible={}, reason={:?}, distance_km={:?}",
        merchant_id,
        result.eligible,
        result.reason,
        result.distance_km
    );

    HttpResponse::Ok().json(EvaluateDeliveryResponse::from(result))
}
