pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionEngine, QuoteGateway};
use crate::providers::{FxRatesGateway, ProbeConnectivityMonitor};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert(cli::convert::ConvertRequest),
    Interactive,
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    match command {
        AppCommand::Currencies => {
            cli::currencies::run();
            Ok(())
        }
        AppCommand::Convert(request) => {
            let (_, gateway, monitor) = build_services(config_path)?;
            cli::convert::run(gateway, &monitor, request).await
        }
        AppCommand::Interactive => {
            let (config, gateway, monitor) = build_services(config_path)?;
            let options = config.engine.to_options()?;
            let convert_on_edit = options.debounce.is_none();
            let engine = ConversionEngine::spawn(gateway, &monitor, options);
            cli::interactive::run(engine, convert_on_edit).await
        }
    }
}

fn build_services(
    config_path: Option<&str>,
) -> Result<(AppConfig, Arc<dyn QuoteGateway>, ProbeConnectivityMonitor)> {
    info!("xfx starting...");
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let gateway: Arc<dyn QuoteGateway> = Arc::new(FxRatesGateway::new(&config.gateway)?);
    let monitor =
        ProbeConnectivityMonitor::for_base_url(&config.gateway.base_url, &config.connectivity)?;
    Ok((config, gateway, monitor))
}
