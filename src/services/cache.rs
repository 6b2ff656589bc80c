use crate::core::geocode::{normalize_postal_code, CoordinateResolver, GeocodeFailure};
use crate::models::{Coordinate, CustomerAddress};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache. L2 is an optional Redis shared across
/// instances; without it the manager runs L1-only.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager, connecting to Redis when a URL is given
    pub async fn new(redis_url: Option<&str>, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let redis = match redis_url {
            Some(url) => {
                let client = redis::Client::open(url)?;
                let manager = ConnectionManager::new(client).await?;
                Some(Arc::new(tokio::sync::Mutex::new(manager)))
            }
            None => None,
        };

        Ok(Self {
            redis,
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// L1-only cache manager
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);

                // Populate L1 cache
                self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }
}

fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
    moka::future::CacheBuilder::new(l1_size)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a geocoded postal code
    pub fn postal_code(postal_code: &str) -> String {
        format!("geo:cep:{}", normalize_postal_code(postal_code))
    }

    /// Build a cache key for geocoded free text
    pub fn free_text(text: &str) -> String {
        format!("geo:q:{}", normalize_text(text))
    }

    /// Key for everything the resolver looks at, or `None` when the
    /// address carries its own coordinates.
    ///
    /// A postal code with free text is keyed on both, since the text is
    /// used when the postal lookup fails.
    pub fn address(address: &CustomerAddress) -> Option<String> {
        if address.coordinates.is_some() {
            return None;
        }

        match (address.postal_code(), address.free_text()) {
            (Some(code), None) => Some(Self::postal_code(code)),
            (Some(code), Some(text)) => Some(format!("{}:q:{}", Self::postal_code(code), normalize_text(text))),
            (None, Some(text)) => Some(Self::free_text(text)),
            (None, None) => None,
        }
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Transparent caching wrapper around a [`CoordinateResolver`]
///
/// Only successful resolutions are stored. Cache failures are logged and
/// treated as misses, so results are identical with or without the cache.
pub struct CachedResolver<R> {
    inner: R,
    cache: Arc<CacheManager>,
}

impl<R> CachedResolver<R> {
    pub fn new(inner: R, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<R> CoordinateResolver for CachedResolver<R>
where
    R: CoordinateResolver,
{
    async fn resolve(&self, address: &CustomerAddress) -> Result<Coordinate, GeocodeFailure> {
        let Some(key) = CacheKey::address(address) else {
            return self.inner.resolve(address).await;
        };

        match self.cache.get::<Coordinate>(&key).await {
            Ok(coordinate) => {
                tracing::debug!("Geocode cache hit: {}", key);
                return Ok(coordinate);
            }
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Geocode cache read failed for {}: {}", key, e),
        }

        let coordinate = self.inner.resolve(address).await?;

        if let Err(e) = self.cache.set(&key, &coordinate).await {
            tracing::warn!("Geocode cache write failed for {}: {}", key, e);
        }

        Ok(coordinate)
    }
}
