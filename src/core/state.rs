//! Snapshot of everything a converter screen shows

use crate::core::currency::CurrencyCode;

/// One consistent view of the converter.
///
/// Snapshots are never edited in place; the engine publishes a new one for
/// every change.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionState {
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    pub amount_from: String,
    pub amount_to: String,
    pub rate_text: String,
    pub loading: bool,
    /// Inline message shown under the amount fields.
    pub error: Option<String>,
    pub network_available: bool,
    pub show_no_network_banner: bool,
}

impl ConversionState {
    pub fn new(from: CurrencyCode, to: CurrencyCode, amount_from: String) -> Self {
        ConversionState {
            from_currency: from,
            to_currency: to,
            amount_from,
            amount_to: "0.00".to_string(),
            rate_text: String::new(),
            loading: false,
            error: None,
            network_available: true,
            show_no_network_banner: false,
        }
    }

    /// Same snapshot with both currencies and both amounts exchanged.
    pub fn reversed(&self) -> Self {
        ConversionState {
            from_currency: self.to_currency,
            to_currency: self.from_currency,
            amount_from: self.amount_to.clone(),
            amount_to: self.amount_from.clone(),
            ..self.clone()
        }
    }
}

pub fn rate_text(from: CurrencyCode, to: CurrencyCode, rate: f64) -> String {
    format!("1 {from} = {rate} {to}")
}
