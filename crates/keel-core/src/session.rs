// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::{debug, info};

use keel_config::{Config, Transport};

use crate::context::Context;
use crate::error::CoreError;
use crate::lifecycle::{AgentDefinition, CoreState};
use crate::registry::{ServerConfig, ServerRegistry};

/// A running session.  The registry is frozen: modifiers can no longer
/// reach it.
#[derive(Debug)]
pub struct Session {
    context: Context,
    registry: ServerRegistry,
    agents: Vec<AgentDefinition>,
    started_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(
        context: Context,
        registry: ServerRegistry,
        agents: Vec<AgentDefinition>,
    ) -> Self {
        Self {
            context,
            registry,
            agents,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.context.session_id
    }

    pub fn state(&self) -> CoreState {
        CoreState::Running
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.context.config
    }

    pub fn server_registry(&self) -> &ServerRegistry {
        &self.registry
    }

    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.registry.get(name)
    }

    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    /// Launch command for a stdio server.
    ///
    /// The child inherits this process's environment with the server's `env`
    /// applied on top, so patched values win over inherited ones.  stdin and
    /// stdout are left for the caller to configure (MCP clients pipe both).
    pub fn command(&self, name: &str) -> Result<Command, CoreError> {
        let server = self.registry.require(name)?;
        if server.transport != Transport::Stdio {
            return Err(CoreError::NotStdio(name.to_string()));
        }
        let program = server.command.as_deref().ok_or_else(|| CoreError::InvalidServer {
            name: name.to_string(),
            reason: "stdio transport requires a command".into(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(&server.args);
        if let Some(env) = &server.env {
            cmd.envs(env);
        }
        if let Some(cwd) = &server.cwd {
            cmd.current_dir(cwd);
        }
        cmd.kill_on_drop(true);
        debug!(server = %name, program = %program, "prepared server command");
        Ok(cmd)
    }

    pub fn close(self) {
        info!(session_id = %self.context.session_id, "session closed");
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
