/// Stacks node API client
use super::{AnchorTransaction, NameInfo, RegistryClient, RegistryResult, TokenEnvelope};
use crate::config::{HttpClientConfig, NetworkConfig};
use crate::error::RegistryError;
use crate::fqn::Fqn;
use crate::identifier::strip_hex_prefix;
use crate::metrics;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// HTTP registry client backed by a Stacks node API
#[derive(Clone)]
pub struct StacksApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ZonefileResponse {
    zonefile: String,
}

#[derive(Deserialize)]
struct OwnedNamesResponse {
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Deserialize)]
struct NodeInfoResponse {
    stacks_tip_height: u64,
}

impl StacksApiClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: impl Into<String>, config: &HttpClientConfig) -> RegistryResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .map_err(|e| RegistryError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client for the configured network
    pub fn from_config(network: &NetworkConfig, http: &HttpClientConfig) -> RegistryResult<Self> {
        Self::new(network.api_url.clone(), http)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and decode its JSON body
    ///
    /// 404 and `{"error": ...}` bodies are reported as `NotFound`.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, url: &str) -> RegistryResult<T> {
        tracing::debug!(endpoint, url, "registry request");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            metrics::record_registry_request(endpoint, "transport_error");
            RegistryError::Transport(format!("{}: {}", url, e))
        })?;

        let status = response.status();
        metrics::record_registry_request(endpoint, status.as_str());

        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(RegistryError::Transport(format!(
                "{} returned {}",
                url, status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(format!("{}: {}", url, e)))?;

        if let Some(error) = body.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(RegistryError::NotFound(format!("{}: {}", url, message)));
        }

        serde_json::from_value(body)
            .map_err(|e| RegistryError::InvalidResponse(format!("{}: {}", url, e)))
    }

    fn names_url(&self, fqn: &Fqn) -> String {
        format!(
            "{}/v1/names/{}",
            self.base_url,
            urlencoding::encode(&fqn.name_with_namespace())
        )
    }
}

#[async_trait]
impl RegistryClient for StacksApiClient {
    async fn fetch_transaction(&self, tx_id: &str) -> RegistryResult<AnchorTransaction> {
        let url = format!(
            "{}/extended/v1/tx/0x{}",
            self.base_url,
            urlencoding::encode(strip_hex_prefix(tx_id))
        );
        self.get_json("transaction", &url).await
    }

    async fn fetch_zonefile(&self, fqn: &Fqn, zonefile_hash: Option<&str>) -> RegistryResult<String> {
        let url = match zonefile_hash {
            Some(hash) => format!(
                "{}/zonefile/{}",
                self.names_url(fqn),
                urlencoding::encode(strip_hex_prefix(hash))
            ),
            None => format!("{}/zonefile", self.names_url(fqn)),
        };
        let response: ZonefileResponse = self.get_json("zonefile", &url).await?;
        Ok(response.zonefile)
    }

    async fn fetch_names_owned_by(&self, address: &str) -> RegistryResult<Vec<String>> {
        let url = format!(
            "{}/v1/addresses/stacks/{}",
            self.base_url,
            urlencoding::encode(address)
        );
        let response: OwnedNamesResponse = self.get_json("names_owned", &url).await?;
        Ok(response.names)
    }

    async fn fetch_name_info(&self, fqn: &Fqn) -> RegistryResult<NameInfo> {
        let url = self.names_url(fqn);
        self.get_json("name_info", &url).await
    }

    async fn fetch_current_block_height(&self) -> RegistryResult<u64> {
        let url = format!("{}/v2/info", self.base_url);
        let info: NodeInfoResponse = self.get_json("node_info", &url).await?;
        Ok(info.stacks_tip_height)
    }

    async fn fetch_signed_claim(&self, url: &str) -> RegistryResult<TokenEnvelope> {
        let body: Value = self.get_json("signed_claim", url).await?;

        // Profiles are published as an array of token records; older ones as a bare record
        let record = match body {
            Value::Array(mut records) if !records.is_empty() => records.swap_remove(0),
            Value::Array(_) => {
                return Err(RegistryError::InvalidResponse(format!(
                    "{}: empty token array",
                    url
                )))
            }
            other => other,
        };

        serde_json::from_value(record)
            .map_err(|e| RegistryError::InvalidResponse(format!("{}: {}", url, e)))
    }
}
