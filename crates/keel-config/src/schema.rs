// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub mcp: McpConfig,
}

fn default_log_level() -> String {
    "warn".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Default log filter used when neither `RUST_LOG` nor `-v` is given.
    /// Accepts any `tracing_subscriber::EnvFilter` directive, e.g. `"info"`
    /// or `"keel_core=debug"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    /// Named MCP servers an agent session may launch.
    ///
    /// ```toml
    /// [mcp.servers.env_get_server]
    /// command = "keel"
    /// args = ["mcp", "env-server"]
    /// env = { TOKEN = "DEFAULT_TOKEN" }
    /// ```
    #[serde(default)]
    pub servers: HashMap<String, McpServerConfig>,
}

/// How keel talks to a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Child process speaking line-delimited JSON-RPC on stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP endpoint
    Http,
    /// Legacy server-sent-events endpoint
    Sse,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Stdio => write!(f, "stdio"),
            Transport::Http => write!(f, "http"),
            Transport::Sse => write!(f, "sse"),
        }
    }
}

/// A server as declared in a config file.
///
/// Values are kept verbatim here; `${VAR}` expansion and validation happen
/// when the server registry is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Display name only.  The server is addressed by its key under
    /// `[mcp.servers]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub transport: Transport,
    /// Executable for stdio servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Extra environment variables for the server process.  Layered on top
    /// of the inherited environment at launch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    /// Working directory for stdio servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Endpoint for http / sse servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Per-request read timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_secs: Option<u64>,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
