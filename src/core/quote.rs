//! Exchange quote abstractions

use crate::core::currency::CurrencyCode;
use async_trait::async_trait;
use thiserror::Error;

/// A fully populated exchange computation for one pair and amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    pub amount_from: f64,
    pub amount_to: f64,
    /// Units of `to_currency` per one unit of `from_currency`, always positive.
    pub rate: f64,
}

impl Quote {
    /// Builds a quote from a raw rate response, filling in missing amounts.
    ///
    /// A missing source amount falls back to the requested amount and a
    /// missing target amount to `requested * rate`. This is the only place
    /// the fallback is applied. Non-positive rates and negative or non-finite
    /// amounts are rejected as malformed.
    pub fn from_rate(
        from: CurrencyCode,
        to: CurrencyCode,
        requested: f64,
        rate: f64,
        amount_from: Option<f64>,
        amount_to: Option<f64>,
    ) -> Result<Self, QuoteError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(QuoteError::Generic(format!(
                "Invalid rate {rate} for {from}->{to}"
            )));
        }
        let amount_from = amount_from.unwrap_or(requested);
        let amount_to = amount_to.unwrap_or(requested * rate);
        for amount in [amount_from, amount_to] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(QuoteError::Generic(format!(
                    "Invalid amount {amount} for {from}->{to}"
                )));
            }
        }
        Ok(Quote {
            from_currency: from,
            to_currency: to,
            amount_from,
            amount_to,
            rate,
        })
    }
}

/// Failures a quote lookup can end with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// DNS, connect or other transport level failure.
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The server declined this amount or currency pair.
    #[error("Quote rejected by server: HTTP {status}")]
    ServerValidationRejected { status: u16 },

    #[error("Server error: HTTP {status}")]
    ServerFault { status: u16 },

    /// Anything else, including malformed responses.
    #[error("Quote request failed: {0}")]
    Generic(String),
}

impl QuoteError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QuoteError::NetworkUnreachable(_) | QuoteError::ServerFault { .. }
        )
    }
}

#[async_trait]
pub trait QuoteGateway: Send + Sync {
    /// Fetches a quote for sending `amount` of `from` into `to`.
    async fn get_quote(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        amount: f64,
    ) -> Result<Quote, QuoteError>;
}
