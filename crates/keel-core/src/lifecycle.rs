// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! [`Core`] drives the pre-run lifecycle of an agent session.
//!
//! ```text
//! Unconfigured ──create_context()──► ContextReady ──load_registry()──► RegistryReady
//!                                                                         │
//!                                              run_with(modifiers) ───────┘
//!                                                       │
//!                                                       ▼
//!                                               Session (Running)
//! ```
//!
//! Modifiers get `&mut Core` while the core is still owned by the caller.
//! `run_with` consumes the core, so nothing can reach the registry through a
//! modifier once the session is running.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use keel_config::Config;

use crate::context::Context;
use crate::error::CoreError;
use crate::modifier::CoreModifier;
use crate::registry::ServerRegistry;
use crate::session::Session;

/// Lifecycle state of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Unconfigured,
    ContextReady,
    RegistryReady,
    Running,
}

impl std::fmt::Display for CoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreState::Unconfigured => write!(f, "unconfigured"),
            CoreState::ContextReady => write!(f, "context-ready"),
            CoreState::RegistryReady => write!(f, "registry-ready"),
            CoreState::Running => write!(f, "running"),
        }
    }
}

/// An agent and the servers it needs once the session runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(default)]
    pub servers: Vec<String>,
}

impl AgentDefinition {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        servers: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            servers: servers.into_iter().map(Into::into).collect(),
        }
    }
}

pub struct Core {
    config: Arc<Config>,
    context: Option<Context>,
    state: CoreState,
    agents: Vec<AgentDefinition>,
}

impl Core {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            context: None,
            state: CoreState::Unconfigured,
            agents: Vec::new(),
        }
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut Context> {
        self.context.as_mut()
    }

    /// The registry, if the core has reached `RegistryReady`.
    pub fn server_registry(&self) -> Option<&ServerRegistry> {
        self.context.as_ref()?.server_registry.as_ref()
    }

    /// Declare an agent.  Its servers are checked against the registry when
    /// the session starts.
    pub fn declare_agent(&mut self, agent: AgentDefinition) {
        self.agents.push(agent);
    }

    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    /// `Unconfigured` → `ContextReady`.
    pub fn create_context(&mut self) -> Result<(), CoreError> {
        self.expect_state(CoreState::Unconfigured, CoreState::ContextReady)?;
        let ctx = Context::new(self.config.clone());
        debug!(session_id = %ctx.session_id, "context created");
        self.context = Some(ctx);
        self.state = CoreState::ContextReady;
        Ok(())
    }

    /// `ContextReady` → `RegistryReady`.  Builds a fresh registry from the
    /// config.
    pub fn load_registry(&mut self) -> Result<(), CoreError> {
        self.expect_state(CoreState::ContextReady, CoreState::RegistryReady)?;
        let registry = ServerRegistry::from_config(&self.config.mcp)?;
        let ctx = self.context.as_mut().ok_or(CoreError::UninitializedContext)?;
        debug!(session_id = %ctx.session_id, servers = registry.len(), "server registry loaded");
        ctx.server_registry = Some(registry);
        self.state = CoreState::RegistryReady;
        Ok(())
    }

    /// Advance to `RegistryReady` from wherever the core currently is.
    pub fn initialize(&mut self) -> Result<(), CoreError> {
        if self.state == CoreState::Unconfigured {
            self.create_context()?;
        }
        if self.state == CoreState::ContextReady {
            self.load_registry()?;
        }
        Ok(())
    }

    /// Apply one modifier to this core as it is right now.
    pub fn apply(&mut self, modifier: &dyn CoreModifier) -> Result<(), CoreError> {
        modifier.apply(self)
    }

    /// Start a session without modifiers.
    pub fn run(self) -> Result<Session, CoreError> {
        self.run_with(&[])
    }

    /// Initialize what is missing, apply `modifiers` in order, check agent
    /// declarations and start the session.
    ///
    /// The first failing modifier aborts startup; later modifiers are not
    /// applied.
    pub fn run_with(mut self, modifiers: &[Box<dyn CoreModifier>]) -> Result<Session, CoreError> {
        self.initialize()?;

        for modifier in modifiers {
            let label = modifier.label();
            debug!(modifier = %label, "applying core modifier");
            if let Err(e) = modifier.apply(&mut self) {
                warn!(modifier = %label, error = %e, "core modifier rejected, aborting startup");
                return Err(CoreError::Modifier {
                    label,
                    source: Box::new(e),
                });
            }
        }

        let mut ctx = self.context.take().ok_or(CoreError::UninitializedContext)?;
        let registry = ctx
            .server_registry
            .take()
            .ok_or(CoreError::UninitializedRegistry)?;

        for agent in &self.agents {
            for server in &agent.servers {
                if !registry.contains(server) {
                    warn!(agent = %agent.name, server = %server, "agent references unknown server");
                    return Err(CoreError::UnknownServer(server.clone()));
                }
            }
        }

        info!(
            session_id = %ctx.session_id,
            servers = registry.len(),
            agents = self.agents.len(),
            "session started"
        );
        Ok(Session::new(ctx, registry, self.agents))
    }

    fn expect_state(&self, expected: CoreState, to: CoreState) -> Result<(), CoreError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use keel_config::McpServerConfig;

    use super::*;

    fn config_with_server(name: &str) -> Arc<Config> {
        let mut cfg = Config::default();
        cfg.mcp.servers.insert(
            name.to_string(),
            McpServerConfig {
                command: Some("keel".into()),
                ..McpServerConfig::default()
            },
        );
        Arc::new(cfg)
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    #[test]
    fn new_core_is_unconfigured() {
        let core = Core::new(Arc::new(Config::default()));
        assert_eq!(core.state(), CoreState::Unconfigured);
        assert!(core.context().is_none());
        assert!(core.server_registry().is_none());
    }

    #[test]
    fn create_context_then_load_registry() {
        let mut core = Core::new(config_with_server("s"));
        core.create_context().unwrap();
        assert_eq!(core.state(), CoreState::ContextReady);
        assert!(core.server_registry().is_none());
        core.load_registry().unwrap();
        assert_eq!(core.state(), CoreState::RegistryReady);
        assert!(core.server_registry().unwrap().contains("s"));
    }

    #[test]
    fn load_registry_before_context_is_rejected() {
        let mut core = Core::new(config_with_server("s"));
        let err = core.load_registry().unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: CoreState::Unconfigured,
                to: CoreState::RegistryReady
            }
        ));
    }

    #[test]
    fn create_context_twice_is_rejected() {
        let mut core = Core::new(config_with_server("s"));
        core.create_context().unwrap();
        assert!(core.create_context().is_err());
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut core = Core::new(config_with_server("s"));
        core.initialize().unwrap();
        core.initialize().unwrap();
        assert_eq!(core.state(), CoreState::RegistryReady);
    }

    #[test]
    fn initialize_from_context_ready() {
        let mut core = Core::new(config_with_server("s"));
        core.create_context().unwrap();
        core.initialize().unwrap();
        assert_eq!(core.state(), CoreState::RegistryReady);
    }

    #[test]
    fn invalid_server_config_fails_load() {
        let mut cfg = Config::default();
        cfg.mcp
            .servers
            .insert("broken".into(), McpServerConfig::default());
        let mut core = Core::new(Arc::new(cfg));
        core.create_context().unwrap();
        assert!(matches!(
            core.load_registry(),
            Err(CoreError::InvalidServer { .. })
        ));
        assert_eq!(core.state(), CoreState::ContextReady);
    }

    #[test]
    fn state_display() {
        assert_eq!(CoreState::RegistryReady.to_string(), "registry-ready");
        assert_eq!(CoreState::Running.to_string(), "running");
    }

    // ── Agent declarations ───────────────────────────────────────────────────

    #[test]
    fn run_accepts_agents_with_known_servers() {
        let mut core = Core::new(config_with_server("env_get_server"));
        core.declare_agent(AgentDefinition::new("default", ["env_get_server"]));
        let session = core.run().unwrap();
        assert_eq!(session.agents().len(), 1);
    }

    #[test]
    fn run_rejects_agent_with_unknown_server() {
        let mut core = Core::new(config_with_server("env_get_server"));
        core.declare_agent(AgentDefinition::new("default", ["missing_server"]));
        let err = core.run().unwrap_err();
        assert!(matches!(err, CoreError::UnknownServer(ref s) if s == "missing_server"));
    }
}
