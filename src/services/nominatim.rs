use crate::core::geocode::{ForwardGeocoder, GeocodeFailure};
use crate::models::Coordinate;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// One Nominatim search candidate; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

/// OpenStreetMap Nominatim forward geocoder
///
/// Only the best candidate is requested (`limit=1`). The identifying
/// `User-Agent` comes from the shared HTTP client.
pub struct NominatimClient {
    base_url: String,
    country_codes: Option<String>,
    client: Client,
}

impl NominatimClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            country_codes: None,
            client,
        }
    }

    /// Restrict results to ISO country codes, e.g. "br"
    pub fn with_country_codes(mut self, country_codes: impl Into<String>) -> Self {
        let codes = country_codes.into();
        self.country_codes = (!codes.trim().is_empty()).then_some(codes);
        self
    }
}

fn parse_coordinate(result: &SearchResult) -> Result<Coordinate, GeocodeFailure> {
    let latitude: f64 = result.lat.trim().parse().map_err(|_| {
        GeocodeFailure::MalformedResponse(format!("unparseable latitude '{}'", result.lat))
    })?;
    let longitude: f64 = result.lon.trim().parse().map_err(|_| {
        GeocodeFailure::MalformedResponse(format!("unparseable longitude '{}'", result.lon))
    })?;

    Coordinate::new(latitude, longitude).ok_or_else(|| {
        GeocodeFailure::MalformedResponse(format!("coordinate out of range: {}, {}", latitude, longitude))
    })
}

#[async_trait]
impl ForwardGeocoder for NominatimClient {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn geocode(&self, query: &str) -> Result<Coordinate, GeocodeFailure> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let mut params = vec![("q", query), ("format", "json"), ("limit", "1")];
        if let Some(codes) = &self.country_codes {
            params.push(("countrycodes", codes.as_str()));
        }

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(GeocodeFailure::Unavailable(format!(
                "nominatim returned {}",
                response.status()
            )));
        }

        let results: Vec<SearchResult> = response.json().await?;

        let first = results
            .first()
            .ok_or_else(|| GeocodeFailure::NotFound(query.to_string()))?;

        parse_coordinate(first)
    }
}
