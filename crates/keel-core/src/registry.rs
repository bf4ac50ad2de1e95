// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Resolved MCP server entries keyed by unique name.
//!
//! [`ServerRegistry::from_config`] turns the declared
//! [`keel_config::McpServerConfig`] map into validated [`ServerConfig`]
//! values: `${VAR}` references in `env` values and `args` are expanded from
//! the process environment and `~` in `cwd` is expanded to the home
//! directory.  Declared and resolved forms stay separate so that "what the
//! user wrote" and "what we launch" never get mixed up.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use keel_config::{McpConfig, McpServerConfig, Transport};

use crate::error::CoreError;

/// One resolved tool server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    /// Registry key: the server's key under `[mcp.servers]`.
    pub name: String,
    /// Human-readable name from the declared `name` field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub transport: Transport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment layered on top of the inherited one when the server is
    /// launched.  `None` and an empty map launch identically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip)]
    pub read_timeout: Option<Duration>,
}

impl ServerConfig {
    /// A stdio server launched with `command` and no arguments.
    pub fn stdio(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
            transport: Transport::Stdio,
            command: Some(command.into()),
            args: Vec::new(),
            env: None,
            cwd: None,
            url: None,
            headers: None,
            read_timeout: None,
        }
    }

    /// Resolve a declared server.  `key` is its name under `[mcp.servers]`
    /// and becomes the registry key; a declared `name` is display only.
    pub fn resolve(key: &str, declared: &McpServerConfig) -> Result<Self, CoreError> {
        let name = key.to_string();

        match declared.transport {
            Transport::Stdio if declared.command.as_deref().map_or(true, str::is_empty) => {
                return Err(CoreError::InvalidServer {
                    name,
                    reason: "stdio transport requires a command".into(),
                });
            }
            Transport::Http | Transport::Sse if declared.url.is_none() => {
                return Err(CoreError::InvalidServer {
                    name,
                    reason: format!("{} transport requires a url", declared.transport),
                });
            }
            _ => {}
        }

        let args = declared
            .args
            .iter()
            .map(|arg| expand(&name, arg, arg))
            .collect::<Result<Vec<_>, _>>()?;

        let env = match &declared.env {
            Some(map) => {
                let mut resolved = BTreeMap::new();
                for (key, value) in map {
                    resolved.insert(key.clone(), expand(&name, key, value)?);
                }
                Some(resolved)
            }
            None => None,
        };

        let cwd = declared
            .cwd
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()));

        Ok(Self {
            name,
            display_name: declared.name.clone(),
            description: declared.description.clone(),
            transport: declared.transport,
            command: declared.command.clone(),
            args,
            env,
            cwd,
            url: declared.url.clone(),
            headers: declared.headers.clone(),
            read_timeout: declared.read_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Insert or overwrite one environment variable, creating the mapping
    /// when it is absent.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.as_ref()?.get(key).map(String::as_str)
    }
}

/// Expand `$VAR` / `${VAR}` in `value`.  `key` names the field in errors.
fn expand(server: &str, key: &str, value: &str) -> Result<String, CoreError> {
    shellexpand::env(value)
        .map(|v| v.into_owned())
        .map_err(|e| CoreError::EnvExpansion {
            server: server.to_string(),
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Mapping from server name to [`ServerConfig`].  Iteration is sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerRegistry {
    servers: BTreeMap<String, ServerConfig>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and validate every declared server.
    pub fn from_config(cfg: &McpConfig) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        for (key, declared) in &cfg.servers {
            let server = ServerConfig::resolve(key, declared)?;
            debug!(server = %server.name, transport = %server.transport, "registered MCP server");
            registry.insert(server);
        }
        Ok(registry)
    }

    /// Insert a server, replacing any entry with the same name.
    pub fn insert(&mut self, server: ServerConfig) -> Option<ServerConfig> {
        self.servers.insert(server.name.clone(), server)
    }

    pub fn remove(&mut self, name: &str) -> Option<ServerConfig> {
        self.servers.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ServerConfig> {
        self.servers.get_mut(name)
    }

    /// Like [`get`](Self::get) but an absent server is an error.
    pub fn require(&self, name: &str) -> Result<&ServerConfig, CoreError> {
        self.get(name)
            .ok_or_else(|| CoreError::UnknownServer(name.to_string()))
    }

    pub fn require_mut(&mut self, name: &str) -> Result<&mut ServerConfig, CoreError> {
        self.servers
            .get_mut(name)
            .ok_or_else(|| CoreError::UnknownServer(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.servers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerConfig> {
        self.servers.values()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
