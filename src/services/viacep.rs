use crate::core::geocode::{GeocodeFailure, PostalLookup};
use crate::models::PostalAddress;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// ViaCEP postal-code lookup
///
/// `GET {base}/ws/{cep}/json/` answers with `logradouro`, `bairro`,
/// `localidade` and `uf`, or with `{"erro": true}` for unknown codes.
pub struct ViaCepClient {
    base_url: String,
    client: Client,
}

impl ViaCepClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl PostalLookup for ViaCepClient {
    fn name(&self) -> &'static str {
        "viacep"
    }

    async fn lookup(&self, postal_code: &str) -> Result<PostalAddress, GeocodeFailure> {
        let url = format!(
            "{}/ws/{}/json/",
            self.base_url.trim_end_matches('/'),
            postal_code
        );

        tracing::debug!("Looking up postal code at: {}", url);

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::BAD_REQUEST => {
                return Err(GeocodeFailure::InvalidPostalCode(postal_code.to_string()));
            }
            status if !status.is_success() => {
                return Err(GeocodeFailure::Unavailable(format!("viacep returned {}", status)));
            }
            _ => {}
        }

        let json: Value = response.json().await?;

        // Older deployments send `true`, newer ones the string "true"
        let unknown = match json.get("erro") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag == "true",
            _ => false,
        };
        if unknown {
            return Err(GeocodeFailure::InvalidPostalCode(postal_code.to_string()));
        }

        if json.get("localidade").is_none() {
            return Err(GeocodeFailure::MalformedResponse(
                "viacep response has no localidade".to_string(),
            ));
        }

        let field = |name: &str| {
            json.get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        Ok(PostalAddress {
            street: field("logradouro"),
            neighborhood: field("bairro"),
            city: field("localidade"),
            state: field("uf"),
        })
    }
}
