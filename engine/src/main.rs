// open-coder
// Main entry point for the open-coder binary

use clap::Parser;
use open_coder_engine::cli::Cli;
use open_coder_engine::config::Config;
use open_coder_engine::handlers::handle_session;
use open_coder_engine::telemetry::init_telemetry_with_level;
use sdk::errors::{EngineError, ErrorExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Logging is configured from this file, so failures go straight to stderr
    let config = match Config::load_from_path(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}\n{}", e, e.user_hint());
            std::process::exit(1);
        }
    };

    // --log overrides the config level; RUST_LOG overrides both
    let log_level = cli.log.as_deref().unwrap_or(&config.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!("open-coder v{}", env!("CARGO_PKG_VERSION"));
    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    // The session only returns errors whose policy is Terminate
    if let Err(e) = handle_session(&cli, &config).await {
        match e.downcast_ref::<EngineError>() {
            Some(err) => {
                tracing::error!(policy = ?err.policy(), "Session failed: {}", err);
                eprintln!("Error: {}\n{}", err, err.user_hint());
            }
            None => {
                tracing::error!("Session failed: {:#}", e);
                eprintln!("Error: {:#}", e);
            }
        }
        std::process::exit(1);
    }
}
