//! forwarded-normalizer
//!
//! Hosts a diagnostic application behind the forwarded header normalizer.
//!
//! ```text
//!     Client ──▶ Load balancer ──────────────▶ forwarded-normalizer
//!                (appends X-Forwarded-For,     │
//!                 sets X-Forwarded-Proto)      ├─ TransportVariablesLayer (bag, read-only)
//!                                              ├─ ForwardedHeadersLayer   (if enabled)
//!                                              └─ /_details, /_details.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use forwarded_normalizer::config::load_config;
use forwarded_normalizer::http::server::shutdown_signal;
use forwarded_normalizer::http::HttpServer;
use forwarded_normalizer::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "forwarded-normalizer")]
#[command(about = "Hide a load-balancer hop from the application", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "FORWARDED_NORMALIZER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long, env = "FORWARDED_NORMALIZER_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);

    tracing::info!("forwarded-normalizer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        forwarded_headers = config.forwarded_headers.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    server.run(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
