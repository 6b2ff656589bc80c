use crate::config::GeocodingSettings;
use crate::core::GeocodeResolver;
use crate::services::{BrasilApiClient, NominatimClient, ViaCepClient};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Build the HTTP client shared by every geocoding provider
///
/// Every request carries the identifying `User-Agent` (Nominatim rejects
/// anonymous clients) and is bounded by the configured timeout. There is no
/// retry layer: a slow provider surfaces as a timeout and the order fails open.
pub fn build_client(settings: &GeocodingSettings) -> Result<Client, reqwest::Error> {
    let timeout = settings.timeout();

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(2)))
        .user_agent(settings.user_agent.as_str())
        .build()
}

/// Assemble the provider chains from settings
///
/// Postal lookups: ViaCEP, then BrasilAPI when configured.
/// Forward geocoding: Nominatim.
pub fn build_geocode_resolver(settings: &GeocodingSettings) -> Result<GeocodeResolver, reqwest::Error> {
    let client = build_client(settings)?;

    let mut resolver = GeocodeResolver::new()
        .with_postal_lookup(Arc::new(ViaCepClient::new(&settings.viacep_url, client.clone())));

    if let Some(url) = &settings.brasilapi_url {
        resolver = resolver.with_postal_lookup(Arc::new(BrasilApiClient::new(url, client.clone())));
    }

    let nominatim = NominatimClient::new(&settings.nominatim_url, client)
        .with_country_codes(&settings.country_codes);

    Ok(resolver.with_geocoder(Arc::new(nominatim)))
}
