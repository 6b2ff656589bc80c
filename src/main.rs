use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use entrega_algo::config::Settings;
use entrega_algo::core::{CoordinateResolver, DeliveryEligibilityService};
use entrega_algo::routes::{self, delivery::AppState};
use entrega_algo::services::{build_geocode_resolver, CacheManager, CachedResolver, MerchantConfigStore, PostgresClient};
use std::sync::Arc;
use tracing::{info, warn, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors (e.g. a merchant id that is not a UUID)
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings);

    info!("Starting Entrega Algo delivery service...");

    // Provider chain: ViaCEP (+ BrasilAPI) -> Nominatim
    let geocoder = build_geocode_resolver(&settings.geocoding).map_err(|e| {
        error!("Failed to build geocoding client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    info!(
        "Geocode chain: {:?} (timeout {:?})",
        geocoder.provider_names(),
        settings.geocoding.timeout()
    );

    // Cache is optional - the engine behaves the same without it
    let resolver: Arc<dyn CoordinateResolver> = if settings.cache.enabled {
        let cache = match CacheManager::new(
            settings.cache.redis_url.as_deref(),
            settings.cache.l1_cache_size,
            settings.cache.ttl_secs,
        )
        .await
        {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::in_memory(settings.cache.l1_cache_size, settings.cache.ttl_secs)
            }
        };

        info!(
            "Geocode cache enabled (L1: {} entries, TTL: {}s, Redis: {})",
            settings.cache.l1_cache_size,
            settings.cache.ttl_secs,
            cache.has_redis()
        );
        Arc::new(CachedResolver::new(geocoder, Arc::new(cache)))
    } else {
        info!("Geocode cache disabled");
        Arc::new(geocoder)
    };

    let store: Arc<dyn MerchantConfigStore> = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?,
    );

    info!("PostgreSQL merchant store initialized");

    let app_state = AppState {
        service: DeliveryEligibilityService::new(resolver),
        store,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
