// Entrypoint for the CLI application.
// - Keeps `main` small: read config, set up logging, build the client and
//   hand it to the UI loop.

use std::sync::Arc;

use passport_extract_cli::{api::ExtractionClient, config::Config, ui::main_menu};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Logs go to stderr; the view and its progress bar are drawn on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with_writer(std::io::stderr)
        .init();

    let client = ExtractionClient::new(&config)?;
    info!(url = client.url(), "extraction service configured");

    main_menu(Arc::new(client))?;
    Ok(())
}
