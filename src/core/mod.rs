//! Conversion logic and the abstractions it depends on

pub mod amount;
pub mod config;
pub mod connectivity;
pub mod currency;
pub mod engine;
pub mod log;
pub mod quote;
pub mod state;

// Re-export main types for cleaner imports
pub use connectivity::{ConnectivityMonitor, NetworkStatus};
pub use currency::{CurrencyCode, CurrencyRegistry};
pub use engine::{ConversionEngine, EngineHandle, EngineOptions};
pub use quote::{Quote, QuoteError, QuoteGateway};
pub use state::ConversionState;
