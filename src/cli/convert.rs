use super::ui;
use crate::core::amount::{parse_amount, sanitize_amount};
use crate::core::{
    ConnectivityMonitor, ConversionEngine, ConversionState, CurrencyCode, EngineOptions,
    QuoteGateway,
};
use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::debug;

/// A single conversion requested from the command line.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub amount: String,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// `amount` is what the receiver should get rather than what is sent.
    pub receive: bool,
}

/// Runs one conversion to completion and returns the final snapshot.
pub async fn convert(
    gateway: Arc<dyn QuoteGateway>,
    monitor: &dyn ConnectivityMonitor,
    request: &ConvertRequest,
) -> Result<ConversionState> {
    let amount = sanitize_amount(&request.amount);
    if parse_amount(&amount).is_none() {
        bail!("Invalid amount: {}", request.amount);
    }

    let options = EngineOptions {
        from: request.from,
        to: request.to,
        amount_from: if request.receive {
            String::new()
        } else {
            amount.clone()
        },
        debounce: None,
    };
    let engine = ConversionEngine::spawn(gateway, monitor, options);
    if request.receive {
        engine.set_amount_to(&amount);
        engine.convert_reverse();
    }

    let state = engine.settled().await;
    engine.shutdown();
    debug!(?state, "Conversion finished");
    Ok(state)
}

pub async fn run(
    gateway: Arc<dyn QuoteGateway>,
    monitor: &dyn ConnectivityMonitor,
    request: ConvertRequest,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching {} → {} rate", request.from, request.to));
    let result = convert(gateway, monitor, &request).await;
    pb.finish_and_clear();
    let state = result?;

    println!("{}", ui::render_state(&state));
    if let Some(error) = state.error {
        bail!(error);
    }
    // A quote that made it through still counts; the banner stays a warning.
    if state.show_no_network_banner && state.rate_text.is_empty() {
        bail!("No internet connection");
    }
    Ok(())
}
