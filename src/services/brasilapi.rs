use crate::core::geocode::{GeocodeFailure, PostalLookup};
use crate::models::PostalAddress;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// BrasilAPI CEP v1 response; any field may be null for rural codes
#[derive(Debug, Deserialize)]
struct CepResponse {
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    neighborhood: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// BrasilAPI postal-code lookup, used as a second strategy after ViaCEP
pub struct BrasilApiClient {
    base_url: String,
    client: Client,
}

impl BrasilApiClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl PostalLookup for BrasilApiClient {
    fn name(&self) -> &'static str {
        "brasilapi"
    }

    async fn lookup(&self, postal_code: &str) -> Result<PostalAddress, GeocodeFailure> {
        let url = format!(
            "{}/api/cep/v1/{}",
            self.base_url.trim_end_matches('/'),
            postal_code
        );

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                Err(GeocodeFailure::InvalidPostalCode(postal_code.to_string()))
            }
            status if !status.is_success() => Err(GeocodeFailure::Unavailable(format!(
                "brasilapi returned {}",
                status
            ))),
            _ => {
                let body: CepResponse = response.json().await?;
                Ok(PostalAddress {
                    street: body.street.unwrap_or_default(),
                    neighborhood: body.neighborhood.unwrap_or_default(),
                    city: body.city.unwrap_or_default(),
                    state: body.state.unwrap_or_default(),
                })
            }
        }
    }
}
