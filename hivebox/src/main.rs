use clap::{Parser, Subcommand};
use hivebox::{router, AppState, SenseBoxClient, ServiceConfig, TemperatureAggregator};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hivebox", version, about = "Average outdoor temperature from senseBox sensors")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Listen address (overrides HIVEBOX_BIND_ADDR)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { bind }) => serve(bind).await,
        // Bare invocation is a silent no-op
        None => Ok(()),
    }
}

async fn serve(bind: Option<SocketAddr>) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hivebox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServiceConfig::from_env()?;
    if let Some(addr) = bind {
        config.bind_addr = addr;
    }

    let client = SenseBoxClient::new(config.upstream_url.clone(), config.request_timeout)?;
    let app = router(AppState::new(TemperatureAggregator::new(client)));

    tracing::info!("Upstream: {}", config.upstream_url);
    tracing::info!("HiveBox listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
