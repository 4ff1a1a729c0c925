//! CKN admin command-line tool

use anyhow::Result;
use ckn_admin::cli::{self, Cli};
use ckn_admin::config::{self, AppConfig};
use ckn_admin::state::AppState;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The .env files may set RUST_ENV and RUST_LOG, so they load first
    let env_files = config::load_dotenv_files();
    init_tracing(cli.verbose);
    for path in &env_files {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let config = AppConfig::load()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if AppConfig::is_production() { "production" } else { "development" },
        "Starting ckn-admin"
    );

    let state = AppState::new(config)?;
    if let Err(e) = cli::run(cli.command, &state).await {
        error!(error = %e, "Command failed");
        return Err(e.into());
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "ckn_admin=debug".into()
        } else {
            "ckn_admin=info".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
