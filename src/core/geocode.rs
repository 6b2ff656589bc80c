use crate::models::{Coordinate, CustomerAddress, PostalAddress};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Brazilian CEPs have exactly eight digits once punctuation is removed
const POSTAL_CODE_DIGITS: usize = 8;

/// Errors that can occur while turning an address into coordinates
///
/// None of these are fatal: the eligibility service turns every one of
/// them into a fail-open result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeFailure {
    #[error("Invalid postal code: {0}")]
    InvalidPostalCode(String),

    #[error("Address not found: {0}")]
    NotFound(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider timed out: {0}")]
    Timeout(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Address has no postal code, free text or coordinates")]
    MissingAddress,
}

impl From<reqwest::Error> for GeocodeFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeocodeFailure::Timeout(err.to_string())
        } else if err.is_decode() {
            GeocodeFailure::MalformedResponse(err.to_string())
        } else {
            GeocodeFailure::Unavailable(err.to_string())
        }
    }
}

/// Maps a normalized postal code to a structured street address
#[async_trait]
pub trait PostalLookup: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Look up an eight-digit postal code
    async fn lookup(&self, postal_code: &str) -> Result<PostalAddress, GeocodeFailure>;
}

/// Maps a free-text address to coordinates
#[async_trait]
pub trait ForwardGeocoder: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Geocode a free-text address, using only the best candidate
    async fn geocode(&self, query: &str) -> Result<Coordinate, GeocodeFailure>;
}

/// Anything that can place a customer address on the map
///
/// Implemented by [`GeocodeResolver`] and by caching wrappers around it.
#[async_trait]
pub trait CoordinateResolver: Send + Sync {
    async fn resolve(&self, address: &CustomerAddress) -> Result<Coordinate, GeocodeFailure>;
}

#[async_trait]
impl<R> CoordinateResolver for Arc<R>
where
    R: CoordinateResolver + ?Sized,
{
    async fn resolve(&self, address: &CustomerAddress) -> Result<Coordinate, GeocodeFailure> {
        (**self).resolve(address).await
    }
}

/// Strip everything but digits from a postal code ("50050-000" -> "50050000")
pub fn normalize_postal_code(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Resolves customer addresses through ordered provider chains
///
/// Resolution order:
/// 1. Client-supplied coordinates are trusted as-is
/// 2. A postal code is normalized and looked up, producing a street address
/// 3. The street address (or the customer's free text) is forward-geocoded
///
/// Free text is the fallback at both steps: it is geocoded when the postal
/// lookup fails, and again when the street address built from the postal
/// code cannot be geocoded. The last failure is returned when nothing works.
///
/// Each chain is tried in order and the first success wins. No retries and
/// no caching happen here; wrap the resolver to add caching.
#[derive(Clone, Default)]
pub struct GeocodeResolver {
    postal_lookups: Vec<Arc<dyn PostalLookup>>,
    geocoders: Vec<Arc<dyn ForwardGeocoder>>,
}

impl GeocodeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a postal-lookup provider to the end of the chain
    pub fn with_postal_lookup(mut self, provider: Arc<dyn PostalLookup>) -> Self {
        self.postal_lookups.push(provider);
        self
    }

    /// Append a forward geocoder to the end of the chain
    pub fn with_geocoder(mut self, provider: Arc<dyn ForwardGeocoder>) -> Self {
        self.geocoders.push(provider);
        self
    }

    /// Names of the configured providers, in chain order
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.postal_lookups
            .iter()
            .map(|p| p.name())
            .chain(self.geocoders.iter().map(|g| g.name()))
            .collect()
    }

    /// Turn a raw postal code into a geocoder query
    async fn query_for_postal_code(&self, raw: &str) -> Result<String, GeocodeFailure> {
        let postal_code = normalize_postal_code(raw);
        if postal_code.len() != POSTAL_CODE_DIGITS {
            return Err(GeocodeFailure::InvalidPostalCode(raw.to_string()));
        }

        let mut last_failure =
            GeocodeFailure::Unavailable("no postal lookup provider configured".to_string());

        for provider in &self.postal_lookups {
            match provider.lookup(&postal_code).await {
                Ok(address) if !address.is_empty() => {
                    tracing::debug!("{} resolved postal code {}", provider.name(), postal_code);
                    return Ok(address.to_query());
                }
                Ok(_) => {
                    tracing::debug!("{} returned an empty address for {}", provider.name(), postal_code);
                    last_failure = GeocodeFailure::InvalidPostalCode(postal_code.clone());
                }
                Err(failure) => {
                    tracing::debug!("{} failed for postal code {}: {}", provider.name(), postal_code, failure);
                    last_failure = failure;
                }
            }
        }

        Err(last_failure)
    }

    async fn geocode_query(&self, query: &str) -> Result<Coordinate, GeocodeFailure> {
        let mut last_failure =
            GeocodeFailure::Unavailable("no forward geocoder configured".to_string());

        for provider in &self.geocoders {
            match provider.geocode(query).await {
                Ok(coordinate) => {
                    tracing::debug!("{} geocoded '{}'", provider.name(), query);
                    return Ok(coordinate);
                }
                Err(failure) => {
                    tracing::debug!("{} failed to geocode '{}': {}", provider.name(), query, failure);
                    last_failure = failure;
                }
            }
        }

        Err(last_failure)
    }
}

#[async_trait]
impl CoordinateResolver for GeocodeResolver {
    async fn resolve(&self, address: &CustomerAddress) -> Result<Coordinate, GeocodeFailure> {
        if let Some(coordinates) = address.coordinates {
            return Ok(coordinates);
        }

        let free_text = address.free_text();

        let Some(postal_code) = address.postal_code() else {
            return match free_text {
                Some(text) => self.geocode_query(text).await,
                None => Err(GeocodeFailure::MissingAddress),
            };
        };

        let failure = match self.query_for_postal_code(postal_code).await {
            Ok(query) => match self.geocode_query(&query).await {
                Ok(coordinate) => return Ok(coordinate),
                Err(failure) => failure,
            },
            Err(failure) => failure,
        };

        match free_text {
            Some(text) => {
                tracing::debug!("Postal code {} did not resolve ({}), trying free text", postal_code, failure);
                self.geocode_query(text).await
            }
            None => Err(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedPostal {
        result: Result<PostalAddress, GeocodeFailure>,
        calls: AtomicUsize,
    }

    impl FixedPostal {
        fn new(result: Result<PostalAddress, GeocodeFailure>) -> Arc<Self> {
            Arc::new(Self { result, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl PostalLookup for FixedPostal {
        fn name(&self) -> &'static str {
            "fixed-postal"
        }

        async fn lookup(&self, _postal_code: &str) -> Result<PostalAddress, GeocodeFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    /// Records every query and answers with a fixed result
    struct RecordingGeocoder {
        result: Result<Coordinate, GeocodeFailure>,
        queries: Mutex<Vec<String>>,
    }

    impl RecordingGeocoder {
        fn new(result: Result<Coordinate, GeocodeFailure>) -> Arc<Self> {
            Arc::new(Self { result, queries: Mutex::new(Vec::new()) })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ForwardGeocoder for RecordingGeocoder {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn geocode(&self, query: &str) -> Result<Coordinate, GeocodeFailure> {
            self.queries.lock().unwrap().push(query.to_string());
            self.result.clone()
        }
    }

    /// Finds only queries mentioning a given place
    struct PlaceGeocoder {
        place: &'static str,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ForwardGeocoder for PlaceGeocoder {
        fn name(&self) -> &'static str {
            "place"
        }

        async fn geocode(&self, query: &str) -> Result<Coordinate, GeocodeFailure> {
            self.queries.lock().unwrap().push(query.to_string());
            if query.contains(self.place) {
                Ok(recife())
            } else {
                Err(GeocodeFailure::NotFound(query.to_string()))
            }
        }
    }

    fn boa_vista() -> PostalAddress {
        PostalAddress {
            street: "Rua da Aurora".to_string(),
            neighborhood: "Boa Vista".to_string(),
            city: "Recife".to_string(),
            state: "PE".to_string(),
        }
    }

    fn recife() -> Coordinate {
        Coordinate { latitude: -8.0589, longitude: -34.8813 }
    }

    #[test]
    fn test_normalize_postal_code() {
        assert_eq!(normalize_postal_code("50050-000"), "50050000");
        assert_eq!(normalize_postal_code(" 50.050 000 "), "50050000");
        assert_eq!(normalize_postal_code("abc"), "");
    }

    #[tokio::test]
    async fn test_client_coordinates_skip_providers() {
        let postal = FixedPostal::new(Ok(boa_vista()));
        let geocoder = RecordingGeocoder::new(Ok(recife()));
        let resolver = GeocodeResolver::new()
            .with_postal_lookup(postal.clone())
            .with_geocoder(geocoder.clone());

        let supplied = Coordinate { latitude: -8.01, longitude: -34.87 };
        let address = CustomerAddress {
            postal_code: Some("50050-000".to_string()),
            coordinates: Some(supplied),
            ..Default::default()
        };

        assert_eq!(resolver.resolve(&address).await, Ok(supplied));
        assert_eq!(postal.calls.load(Ordering::SeqCst), 0);
        assert!(geocoder.queries().is_empty());
    }

    #[tokio::test]
    async fn test_postal_code_composes_geocoder_query() {
        let geocoder = RecordingGeocoder::new(Ok(recife()));
        let resolver = GeocodeResolver::new()
            .with_postal_lookup(FixedPostal::new(Ok(boa_vista())))
            .with_geocoder(geocoder.clone());

        let coordinate = resolver
            .resolve(&CustomerAddress::from_postal_code("50050-000"))
            .await
            .unwrap();

        assert_eq!(coordinate, recife());
        assert_eq!(geocoder.queries(), vec!["Rua da Aurora, Boa Vista, Recife - PE, Brasil"]);
    }

    #[tokio::test]
    async fn test_malformed_postal_code_never_hits_network() {
        let postal = FixedPostal::new(Ok(boa_vista()));
        let resolver = GeocodeResolver::new()
            .with_postal_lookup(postal.clone())
            .with_geocoder(RecordingGeocoder::new(Ok(recife())));

        let result = resolver.resolve(&CustomerAddress::from_postal_code("5005")).await;

        assert_eq!(result, Err(GeocodeFailure::InvalidPostalCode("5005".to_string())));
        assert_eq!(postal.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_postal_code_falls_back_to_free_text() {
        let geocoder = RecordingGeocoder::new(Ok(recife()));
        let resolver = GeocodeResolver::new()
            .with_postal_lookup(FixedPostal::new(Err(GeocodeFailure::InvalidPostalCode("99999999".into()))))
            .with_geocoder(geocoder.clone());

        let address = CustomerAddress {
            postal_code: Some("99999-999".to_string()),
            free_text: Some("  Rua do Bom Jesus, Recife  ".to_string()),
            coordinates: None,
        };

        assert_eq!(resolver.resolve(&address).await, Ok(recife()));
        assert_eq!(geocoder.queries(), vec!["Rua do Bom Jesus, Recife"]);
    }

    #[tokio::test]
    async fn test_unknown_postal_code_without_free_text_fails() {
        let resolver = GeocodeResolver::new()
            .with_postal_lookup(FixedPostal::new(Err(GeocodeFailure::InvalidPostalCode("99999999".into()))))
            .with_geocoder(RecordingGeocoder::new(Ok(recife())));

        let result = resolver.resolve(&CustomerAddress::from_postal_code("99999-999")).await;
        assert!(matches!(result, Err(GeocodeFailure::InvalidPostalCode(_))));
    }

    #[tokio::test]
    async fn test_postal_chain_tries_next_provider() {
        let first = FixedPostal::new(Err(GeocodeFailure::Timeout("viacep".into())));
        let second = FixedPostal::new(Ok(boa_vista()));
        let geocoder = RecordingGeocoder::new(Ok(recife()));
        let resolver = GeocodeResolver::new()
            .with_postal_lookup(first.clone())
            .with_postal_lookup(second.clone())
            .with_geocoder(geocoder.clone());

        assert!(resolver.resolve(&CustomerAddress::from_postal_code("50050000")).await.is_ok());
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_geocoder_chain_returns_last_failure() {
        let resolver = GeocodeResolver::new()
            .with_geocoder(RecordingGeocoder::new(Err(GeocodeFailure::Timeout("first".into()))))
            .with_geocoder(RecordingGeocoder::new(Err(GeocodeFailure::NotFound("second".into()))));

        let result = resolver.resolve(&CustomerAddress::from_free_text("Nowhere")).await;
        assert_eq!(result, Err(GeocodeFailure::NotFound("second".to_string())));
    }

    #[tokio::test]
    async fn test_empty_address_is_rejected() {
        let resolver = GeocodeResolver::new().with_geocoder(RecordingGeocoder::new(Ok(recife())));

        let blank = CustomerAddress {
            free_text: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(resolver.resolve(&blank).await, Err(GeocodeFailure::MissingAddress));
    }

    #[test]
    fn test_provider_names_follow_chain_order() {
        let resolver = GeocodeResolver::new()
            .with_geocoder(RecordingGeocoder::new(Ok(recife())))
            .with_postal_lookup(FixedPostal::new(Ok(boa_vista())));

        assert_eq!(resolver.provider_names(), vec!["fixed-postal", "recording"]);
    }

    #[tokio::test]
    async fn test_free_text_tried_when_street_address_not_found() {
        let postal = FixedPostal::new(Ok(boa_vista()));
        let geocoder = Arc::new(PlaceGeocoder {
            place: "Praia de Boa Viagem",
            queries: Mutex::new(Vec::new()),
        });
        let resolver = GeocodeResolver::new()
            .with_postal_lookup(postal)
            .with_geocoder(geocoder.clone());

        let address = CustomerAddress {
            postal_code: Some("50050-000".to_string()),
            free_text: Some("Av. Boa Viagem, Praia de Boa Viagem".to_string()),
            coordinates: None,
        };

        assert_eq!(resolver.resolve(&address).await, Ok(recife()));
        assert_eq!(
            geocoder.queries.lock().unwrap().clone(),
            vec![
                "Rua da Aurora, Boa Vista, Recife - PE, Brasil".to_string(),
                "Av. Boa Viagem, Praia de Boa Viagem".to_string(),
            ]
        );

        // Without free text the street-address failure comes back
        let result = resolver.resolve(&CustomerAddress::from_postal_code("50050-000")).await;
        assert!(matches!(result, Err(GeocodeFailure::NotFound(_))));
    }
}
