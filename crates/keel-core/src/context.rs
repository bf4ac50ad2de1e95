// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Per-core session state.
//!
//! A [`Context`] is created when a [`Core`](crate::Core) leaves the
//! `Unconfigured` state and lives until the session it turns into is closed.
//! It shares the immutable [`Config`] but owns its server registry, so two
//! cores built from the same config never observe each other's patches.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use keel_config::Config;

use crate::registry::ServerRegistry;

#[derive(Debug, Clone)]
pub struct Context {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub config: Arc<Config>,
    /// Populated by [`Core::load_registry`](crate::Core::load_registry).
    pub server_registry: Option<ServerRegistry>,
}

impl Context {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            config,
            server_registry: None,
        }
    }
}
