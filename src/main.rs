use review_insights::{Config, app};

/// Main entry point for the web application
///
/// Reads configuration from the environment (and an optional `.env` file),
/// then serves until the process is stopped. Log verbosity follows
/// `RUST_LOG`, defaulting to `info`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!(
        "Starting review-insights on {} (uploads in {})",
        config.server_address(),
        config.upload_dir.display()
    );

    app::run(config).await
}
