use clap::Parser;
use curator::cli::Cli;
use curator::commands;
use curator::config::Settings;
use tracing::{debug, error};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::new_with_cli(&cli)?;

    // Logs go to stderr so command output can be piped
    tracing_subscriber::fmt()
        .with_max_level(settings.log_level())
        .with_writer(std::io::stderr)
        .init();

    debug!(config = %cli.config.display(), "configuration loaded");

    if let Err(e) = commands::run(&cli.command, &settings) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
