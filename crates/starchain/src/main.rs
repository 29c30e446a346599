use std::sync::Arc;

use clap::Parser;
use starchain::config::Config;
use starchain::http::StarApi;
use starchain::{Blockchain, SystemClock};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    let chain = Arc::new(Blockchain::new(Arc::new(SystemClock)));
    tracing::info!("chain initialized with genesis block");

    let listener = TcpListener::bind(config.listen).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    StarApi::new(chain).run(listener).await?;
    Ok(())
}
