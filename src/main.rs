use std::process::ExitCode;

use storefront_client::{cli, config::ClientConfig, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from .env and CLI arguments
    let config = ClientConfig::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = telemetry::init_subscriber(&config.logging) {
        eprintln!("Failed to initialise logging: {error}");
        return ExitCode::FAILURE;
    }

    cli::run(config).await
}
