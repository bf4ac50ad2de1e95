// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! `keel-mcp` is a stdio MCP server with one tool, `get_env_var`, which
//! returns a variable from the server's own environment.
//!
//! Registered as a server in the keel config it shows, from the client
//! side, what a launched server actually received after runtime patches:
//!
//! ```toml
//! [mcp.servers.env_get_server]
//! command = "keel"
//! args    = ["mcp", "env-server"]
//! env     = { TOKEN = "DEFAULT_TOKEN" }
//! ```
//!
//! ```text
//! MCP client
//!       │  stdin/stdout (line-delimited JSON-RPC)
//!       ▼
//! EnvGetServer (rmcp ServerHandler)
//!       │
//!       ▼
//! EnvLookup  ──►  process environment
//! ```

pub mod server;
pub mod tool;

pub use server::{EnvGetServer, EnvLookup, ProcessEnv};

use anyhow::Result;
use rmcp::ServiceExt;

/// Serve `server` on `stdin` / `stdout` until the client disconnects.
pub async fn serve_stdio(server: EnvGetServer) -> Result<()> {
    let running = server
        .serve((tokio::io::stdin(), tokio::io::stdout()))
        .await
        .map_err(|e| anyhow::anyhow!("MCP server init error: {e}"))?;
    running
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;
    Ok(())
}
