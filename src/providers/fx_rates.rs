use crate::core::config::GatewayConfig;
use crate::core::currency::CurrencyCode;
use crate::core::quote::{Quote, QuoteError, QuoteGateway};
use crate::providers::util::with_retry;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Quote gateway backed by the `/api/fx-rates` HTTP endpoint.
pub struct FxRatesGateway {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl FxRatesGateway {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("xfx/1.0")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FxRatesGateway {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            retries: config.retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    async fn fetch_quote(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        amount: f64,
    ) -> Result<Quote, QuoteError> {
        let amount_param = amount.to_string();
        let url = Url::parse_with_params(
            &format!("{}/api/fx-rates", self.base_url),
            &[
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("amount", amount_param.as_str()),
            ],
        )
        .map_err(|e| QuoteError::Generic(format!("Invalid gateway URL: {e}")))?;
        debug!("Requesting quote from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(QuoteError::ServerValidationRejected {
                status: status.as_u16(),
            });
        }
        if status.is_server_error() {
            return Err(QuoteError::ServerFault {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(QuoteError::Generic(format!(
                "HTTP error: {status} for {from}->{to}"
            )));
        }

        let text = response.text().await.map_err(|e| {
            QuoteError::Generic(format!("Failed to read response for {from}->{to}: {e}"))
        })?;
        let data: FxRateResponse = serde_json::from_str(&text).map_err(|e| {
            QuoteError::Generic(format!(
                "Failed to parse JSON response for {from}->{to}: {e}"
            ))
        })?;
        debug!(response = ?data, "Received fx-rates response");

        Quote::from_rate(from, to, amount, data.rate, data.from_amount, data.to_amount)
    }
}

fn transport_error(e: reqwest::Error) -> QuoteError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        QuoteError::NetworkUnreachable(e.to_string())
    } else {
        QuoteError::Generic(format!("Request error: {e}"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FxRateResponse {
    rate: f64,
    from_amount: Option<f64>,
    to_amount: Option<f64>,
}

#[async_trait]
impl QuoteGateway for FxRatesGateway {
    #[instrument(
        name = "FxRatesQuote",
        skip_all,
        fields(from = %from, to = %to, amount = amount)
    )]
    async fn get_quote(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        amount: f64,
    ) -> Result<Quote, QuoteError> {
        with_retry(
            || self.fetch_quote(from, to, amount),
            self.retries,
            self.retry_delay_ms,
        )
        .await
    }
}
