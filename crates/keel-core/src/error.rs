// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

use crate::lifecycle::CoreState;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("context is not initialized")]
    UninitializedContext,

    #[error("server registry is not initialized")]
    UninitializedRegistry,

    #[error("unknown MCP server '{0}'")]
    UnknownServer(String),

    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: CoreState, to: CoreState },

    #[error("invalid configuration for server '{name}': {reason}")]
    InvalidServer { name: String, reason: String },

    #[error("server '{server}': cannot expand '{key}': {message}")]
    EnvExpansion {
        server: String,
        key: String,
        message: String,
    },

    #[error("server '{0}' does not use the stdio transport")]
    NotStdio(String),

    #[error("core modifier '{label}' failed: {source}")]
    Modifier {
        label: String,
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    /// The innermost error, unwrapping any [`CoreError::Modifier`] layers.
    pub fn root(&self) -> &CoreError {
        match self {
            CoreError::Modifier { source, .. } => source.root(),
            other => other,
        }
    }
}
