use std::net::SocketAddr;

use clap::Parser;

/// Runtime configuration, read from the command line with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "starchain", about = "In-memory star ownership registry")]
pub struct Config {
    /// Address the HTTP API listens on
    #[arg(short, long, env = "STARCHAIN_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,
}
