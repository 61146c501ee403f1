pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use services::TenderFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => run_server(config, port).await,

        Commands::Fetch {
            search,
            status,
            json,
        } => {
            config.validate()?;
            let filter = TenderFilter::new(search, status);
            cli::cmd_fetch(config, &filter, json).await
        }

        Commands::Keywords => {
            cli::cmd_keywords(&config);
            Ok(())
        }

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("Created config.toml with default settings.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    info!("Cyber50 v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let ttl_seconds = config.cache.ttl_seconds;
    let upstream = config.upstream.base_url.clone();

    let state = api::create_app_state_from_config(config, prometheus_handle)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🚀 Proxy server running at http://{}", addr);
    info!("📊 Cache duration: {} seconds, upstream: {}", ttl_seconds, upstream);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
