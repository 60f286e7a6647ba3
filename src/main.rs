use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xfx::cli::convert::ConvertRequest;
use xfx::core::currency::{CurrencyCode, RegistryError};
use xfx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for xfx::AppCommand {
    fn from(cmd: Commands) -> xfx::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                from,
                to,
                receive,
            } => xfx::AppCommand::Convert(ConvertRequest {
                amount,
                from,
                to,
                receive,
            }),
            Commands::Interactive => xfx::AppCommand::Interactive,
            Commands::Currencies => xfx::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn parse_currency(code: &str) -> Result<CurrencyCode, RegistryError> {
    code.to_uppercase().parse()
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert a single amount and print the quote
    Convert {
        /// Amount to send, or to receive with --receive
        amount: String,
        /// Currency you send
        #[arg(long, default_value = "PLN", value_parser = parse_currency)]
        from: CurrencyCode,
        /// Currency the receiver gets
        #[arg(long, default_value = "UAH", value_parser = parse_currency)]
        to: CurrencyCode,
        /// Treat the amount as what the receiver gets
        #[arg(short, long)]
        receive: bool,
    },
    /// Edit amounts and currencies and watch the quote update
    Interactive,
    /// List supported currencies and their sending limits
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xfx::cli::setup::setup(),
        Some(cmd) => xfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
