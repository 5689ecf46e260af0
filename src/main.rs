//! Main entry point for the Gigahard MCP server
//!
//! Sets up logging, reads configuration from flags or the environment, and
//! starts the MCP server on stdin/stdout. Exits non-zero when configuration
//! is missing, and zero on interrupt or when stdin closes.

use clap::Parser;
use tracing::{error, info};

use gigahard_mcp::{ApiKeyPolicy, Config, ConfigInput, GigahardServer};

/// Command line arguments for the Gigahard MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the Gigahard backend (e.g. https://gigahard.org)
    #[arg(long, env = "GIGAHARD_BACKEND_URL")]
    backend_url: Option<String>,

    /// API key sent to the backend in X-MCP-API-Key
    #[arg(long, env = "GIGAHARD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Which backend tool configuration to address
    #[arg(long, env = "GIGAHARD_MCP_ID")]
    mcp_id: Option<String>,

    /// Refuse to start without an API key
    #[arg(long, env = "GIGAHARD_REQUIRE_API_KEY")]
    require_api_key: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("gigahard_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout carries protocol traffic
        .init();

    let config = Config::new(ConfigInput {
        backend_url: args.backend_url,
        api_key: args.api_key,
        mcp_id: args.mcp_id,
        api_key_policy: if args.require_api_key {
            ApiKeyPolicy::Required
        } else {
            ApiKeyPolicy::Optional
        },
    })
    .inspect_err(|e| error!("Refusing to start: {}", e))?;

    let server = GigahardServer::new(config)?;

    info!("Starting Gigahard MCP server");

    tokio::select! {
        result = server.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Interrupt received, shutting down");
            // A pending blocking stdin read would keep the runtime from shutting down
            std::process::exit(0);
        }
    }

    info!("Gigahard MCP server shutdown complete");
    Ok(())
}
