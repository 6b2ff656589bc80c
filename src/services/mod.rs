// Service exports
pub mod brasilapi;
pub mod cache;
pub mod http;
pub mod nominatim;
pub mod postgres;
pub mod viacep;

pub use brasilapi::BrasilApiClient;
pub use cache::{CacheManager, CacheKey, CacheError, CachedResolver};
pub use http::{build_client, build_geocode_resolver};
pub use nominatim::NominatimClient;
pub use postgres::{MerchantConfigStore, PostgresClient, StoreError};
pub use viacep::ViaCepClient;
