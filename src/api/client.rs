use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::BridgeApi;
use crate::core::config::ApiConfig;
use crate::core::domain::{
    deserialize_decimal, ActionRequest, ActionResponse, Asset, CodeResponse, ExchangeRate, Pair, RegisteredUser,
};
use crate::core::errors::{BridgeError, Result};
use crate::tools::async_support::AsyncExecutor;

const READ_ATTEMPTS: usize = 2;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    description: String,
}

/// `{ "data": ... }` on success, `{ "error": { code, description } }` otherwise.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct PairsData {
    pairs: Vec<Pair>,
}

#[derive(Debug, Deserialize)]
struct FeeData {
    #[serde(deserialize_with = "deserialize_decimal")]
    amount: Decimal,
}

/// `reqwest` implementation of [`BridgeApi`].
pub struct HttpBridgeApi {
    client: Client,
    base_url: String,
    swap_base_url: String,
}

impl HttpBridgeApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| BridgeError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            swap_base_url: config.swap_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn authorized(request: RequestBuilder, user: &RegisteredUser) -> Result<RequestBuilder> {
        let token = user.access_token.as_deref().ok_or_else(|| {
            BridgeError::Validation(format!("User {} has no access token", user.user_id))
        })?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(endpoint = what, %status, "API response");

        // Error envelopes may arrive with any status.
        let envelope: Option<Envelope<T>> = serde_json::from_str(&body).ok();
        if let Some(Envelope { error: Some(err), .. }) = &envelope {
            return Err(BridgeError::Api { code: err.code, description: err.description.clone() });
        }
        if !status.is_success() {
            warn!(endpoint = what, %status, "API request failed");
            return Err(BridgeError::Api {
                code: i64::from(status.as_u16()),
                description: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }
        match envelope {
            Some(Envelope { data: Some(data), .. }) => Ok(data),
            _ => Err(BridgeError::Serialization(format!("Unexpected {} response: {}", what, body))),
        }
    }

    /// GET with one retry on transport failures. Query values are encoded
    /// by `reqwest`.
    async fn get<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
        user: Option<&RegisteredUser>,
        what: &str,
    ) -> Result<T> {
        let url = url.as_str();
        let client = &self.client;
        AsyncExecutor::retry(
            move || async move {
                let mut request = client.get(url);
                if !query.is_empty() {
                    request = request.query(query);
                }
                if let Some(user) = user {
                    request = Self::authorized(request, user)?;
                }
                Self::send(request, what).await
            },
            READ_ATTEMPTS,
            Duration::from_millis(200),
        )
        .await
    }
}

#[async_trait]
impl BridgeApi for HttpBridgeApi {
    async fn fetch_assets(&self, user: &RegisteredUser) -> Result<Vec<Asset>> {
        self.get(format!("{}/assets", self.base_url), &[], Some(user), "assets").await
    }

    async fn fetch_pairs(&self) -> Result<Vec<Pair>> {
        let data: PairsData = self.get(format!("{}/api/pairs", self.swap_base_url), &[], None, "pairs").await?;
        Ok(data.pairs)
    }

    async fn fetch_exchange_rates(&self) -> Result<Vec<ExchangeRate>> {
        self.get(format!("{}/external/fiats", self.base_url), &[], None, "fiats").await
    }

    async fn fetch_withdrawal_fee(&self, asset_id: &str, destination: &str) -> Result<Decimal> {
        let url = format!("{}/network/assets/{}/fee", self.base_url, asset_id);
        let data: FeeData =
            self.get(url, &[("destination", destination)], None, "withdrawal fee").await?;
        Ok(data.amount)
    }

    async fn fetch_fee_on_asset(&self, asset_id: &str, chain_id: &str, fee: Decimal) -> Result<Decimal> {
        let url = format!("{}/api/fee", self.swap_base_url);
        let amount = fee.to_string();
        let query = [("asset_id", asset_id), ("chain_id", chain_id), ("amount", amount.as_str())];
        let data: FeeData = self.get(url, &query, None, "fee on asset").await?;
        Ok(data.amount)
    }

    async fn create_action(&self, request: &ActionRequest, user: &RegisteredUser) -> Result<ActionResponse> {
        let http = Self::authorized(self.client.post(format!("{}/api/actions", self.swap_base_url)), user)?;
        Self::send(http.json(request), "actions").await
    }

    async fn fetch_code(&self, code: &str) -> Result<CodeResponse> {
        self.get(format!("{}/codes/{}", self.base_url, code), &[], None, "codes").await
    }
}
