// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Core modifiers: mutations applied to a [`Core`] after its registry is
//! loaded and before its session starts.
//!
//! [`EnvPatch`] is the stock modifier.  It upserts one environment variable
//! of one server:
//!
//! ```rust,ignore
//! let session = Core::new(config)
//!     .run_with(&[Box::new(make_patch("env_get_server", "TOKEN", token))])?;
//! ```
//!
//! Any `Fn(&mut Core) -> Result<(), CoreError>` closure is a modifier as well.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::lifecycle::Core;
use crate::registry::ServerRegistry;

pub trait CoreModifier: Send + Sync {
    /// Name used in logs and in [`CoreError::Modifier`].
    fn label(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn apply(&self, core: &mut Core) -> Result<(), CoreError>;
}

impl<F> CoreModifier for F
where
    F: Fn(&mut Core) -> Result<(), CoreError> + Send + Sync,
{
    fn apply(&self, core: &mut Core) -> Result<(), CoreError> {
        self(core)
    }
}

/// Set `env_key` to `env_value` in the environment of `server_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvPatch {
    pub server_name: String,
    pub env_key: String,
    pub env_value: String,
}

/// Build an [`EnvPatch`].  Nothing is validated until it is applied.
pub fn make_patch(
    server_name: impl Into<String>,
    env_key: impl Into<String>,
    env_value: impl Into<String>,
) -> EnvPatch {
    EnvPatch::new(server_name, env_key, env_value)
}

impl EnvPatch {
    pub fn new(
        server_name: impl Into<String>,
        env_key: impl Into<String>,
        env_value: impl Into<String>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            env_key: env_key.into(),
            env_value: env_value.into(),
        }
    }

    /// Upsert the variable.  An unknown server leaves the registry untouched.
    pub fn apply_to(&self, registry: &mut ServerRegistry) -> Result<(), CoreError> {
        let server = registry.require_mut(&self.server_name)?;
        server.set_env(self.env_key.clone(), self.env_value.clone());
        debug!(server = %self.server_name, key = %self.env_key, "patched server env");
        Ok(())
    }
}

impl CoreModifier for EnvPatch {
    fn label(&self) -> String {
        format!("env:{}:{}", self.server_name, self.env_key)
    }

    fn apply(&self, core: &mut Core) -> Result<(), CoreError> {
        let ctx = core.context_mut().ok_or(CoreError::UninitializedContext)?;
        let registry = ctx
            .server_registry
            .as_mut()
            .ok_or(CoreError::UninitializedRegistry)?;
        self.apply_to(registry)
    }
}

/// Error parsing the `SERVER:KEY=VALUE` form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected SERVER:KEY=VALUE, got '{0}'")]
pub struct ParsePatchError(String);

impl FromStr for EnvPatch {
    type Err = ParsePatchError;

    /// `SERVER:KEY=VALUE`.  The value is everything after the first `=` and
    /// may itself contain `:` or `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePatchError(s.to_string());
        let (target, value) = s.split_once('=').ok_or_else(err)?;
        let (server, key) = target.split_once(':').ok_or_else(err)?;
        if server.is_empty() || key.is_empty() {
            return Err(err());
        }
        Ok(EnvPatch::new(server, key, value))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
