// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! [`EnvGetServer`] is the rmcp [`ServerHandler`] behind `keel mcp env-server`.
//!
//! Lookups go through [`EnvLookup`] so tests can serve a fixed map instead of
//! the real process environment.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rmcp::{
    handler::server::ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    ErrorData as McpError,
};
use tracing::debug;

use crate::tool::{error_result, get_env_var_tool, text_result, GET_ENV_VAR};

/// Source of environment values.
pub trait EnvLookup: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Clone)]
pub struct EnvGetServer {
    env: Arc<dyn EnvLookup>,
}

impl EnvGetServer {
    pub fn new(env: impl EnvLookup + 'static) -> Self {
        Self { env: Arc::new(env) }
    }

    /// Server reading the real process environment.
    pub fn from_process() -> Self {
        Self::new(ProcessEnv)
    }

    /// Value of `key`, or an empty string when it is unset.
    pub fn get_env_var(&self, key: &str) -> String {
        self.env.lookup(key).unwrap_or_default()
    }
}

impl Default for EnvGetServer {
    fn default() -> Self {
        Self::from_process()
    }
}

impl ServerHandler for EnvGetServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..ServerInfo::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                tools: vec![get_env_var_tool()],
                next_cursor: None,
                meta: None,
            })
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if request.name.as_ref() != GET_ENV_VAR {
            return Ok(error_result(format!("unknown tool: {}", request.name)));
        }
        let key = request
            .arguments
            .as_ref()
            .and_then(|args| args.get("key"))
            .and_then(serde_json::Value::as_str);
        let Some(key) = key else {
            return Ok(error_result("missing required string argument 'key'"));
        };
        debug!(key = %key, "get_env_var");
        Ok(text_result(self.get_env_var(key)))
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
//
// list_tools / call_tool need a RequestContext and are covered end to end in
// tests/integration.rs.

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(pairs: &[(&str, &str)]) -> EnvGetServer {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvGetServer::new(map)
    }

    // ── get_info ──────────────────────────────────────────────────────────

    #[test]
    fn get_info_enables_only_tools() {
        let info = fixed(&[]).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
    }

    // ── get_env_var ───────────────────────────────────────────────────────

    #[test]
    fn returns_value_of_set_key() {
        let server = fixed(&[("TOKEN", "NEW_TOKEN")]);
        assert_eq!(server.get_env_var("TOKEN"), "NEW_TOKEN");
    }

    #[test]
    fn unset_key_yields_empty_string() {
        let server = fixed(&[("TOKEN", "NEW_TOKEN")]);
        assert_eq!(server.get_env_var("OTHER_TOKEN"), "");
    }

    #[test]
    fn hash_map_lookup_works_too() {
        let map: HashMap<String, String> = [("A".to_string(), "1".to_string())].into();
        assert_eq!(EnvGetServer::new(map).get_env_var("A"), "1");
    }

    #[test]
    fn process_env_reads_inherited_variables() {
        // PATH is set in every environment the tests run in.
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(EnvGetServer::from_process().get_env_var("PATH"), path);
        assert_eq!(
            ProcessEnv.lookup("KEEL_TEST_SURELY_UNSET_VARIABLE_7C3A"),
            None
        );
    }

    #[test]
    fn server_is_cloneable() {
        let server = fixed(&[("A", "1")]);
        let clone = server.clone();
        assert_eq!(clone.get_env_var("A"), "1");
    }
}
