pub mod fx_rates;
pub mod probe;
pub mod util;

pub use fx_rates::FxRatesGateway;
pub use probe::ProbeConnectivityMonitor;
