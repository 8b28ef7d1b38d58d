use clap::{Parser, Subcommand};
use rst_common::with_logging::log::error;
use rst_common::with_tokio::tokio;
use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

use prople_courier_cli::commands::keygen::{keygen_handler, KeygenArgs};
use prople_courier_cli::commands::send::{send_handler, SendArgs};
use prople_courier_cli::commands::show::{show_handler, ShowArgs};
use prople_courier_cli::types::CliError;

#[derive(Parser)]
#[command(name = "prople-courier-cli")]
#[command(version = "0.1.0")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "keygen")]
    #[command(about = "Create a connection record for a partner DID Doc")]
    Keygen(KeygenArgs),

    #[command(name = "show")]
    #[command(about = "Show the service and protocol of a stored connection")]
    Show(ShowArgs),

    #[command(name = "send")]
    #[command(about = "Send a message over a stored connection")]
    Send(SendArgs),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,prople_courier_core=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Keygen(args) => keygen_handler(args).await,
        Commands::Show(args) => show_handler(args).await,
        Commands::Send(args) => send_handler(args).await,
    };

    if let Err(err) = &result {
        error!("{}", err);
    }

    result
}
