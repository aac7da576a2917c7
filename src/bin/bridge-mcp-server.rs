// ABOUTME: Server binary for the MCP bridge
// ABOUTME: Reads environment configuration, loads the optional seed file and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Bridge MCP Server
//!
//! ```bash
//! BRIDGE_ENCRYPTION_SECRET=... cargo run --bin bridge-mcp-server -- --port 8081
//!
//! # Load bridges from a JSON seed file
//! cargo run --bin bridge-mcp-server -- --bridges-file bridges.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bridge_mcp_server::config::environment::ServerConfig;
use bridge_mcp_server::database::seed::load_seed_file;
use bridge_mcp_server::logging::init_logging;
use bridge_mcp_server::mcp::resources::ServerResources;
use bridge_mcp_server::mcp::server::BridgeMcpServer;

#[derive(Parser)]
#[command(
    name = "bridge-mcp-server",
    version,
    about = "MCP bridge server",
    long_about = "Expose declaratively configured REST APIs as MCP tools over JSON-RPC"
)]
struct Args {
    /// Bind address override (BRIDGE_HOST)
    #[arg(long)]
    host: Option<String>,

    /// HTTP port override (BRIDGE_HTTP_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// JSON seed file with bridge definitions (BRIDGE_BRIDGES_FILE)
    #[arg(long)]
    bridges_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env().context("Invalid server configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if args.bridges_file.is_some() {
        config.bridges_file = args.bridges_file;
    }

    init_logging(&config.logging).context("Cannot initialize logging")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.http_port,
        session_auth = config.session_auth_enabled(),
        "Starting bridge MCP server"
    );

    let port = config.http_port;
    let bridges_file = config.bridges_file.clone();
    let resources = Arc::new(ServerResources::new(config).context("Cannot build server resources")?);

    if let Some(path) = bridges_file {
        let loaded = load_seed_file(&path, resources.bridges.as_ref(), &resources.encryption)
            .await
            .with_context(|| format!("Cannot load bridges from {}", path.display()))?;
        info!(loaded, path = %path.display(), "Bridges loaded from seed file");
    }

    BridgeMcpServer::new(resources).run(port).await?;
    Ok(())
}
