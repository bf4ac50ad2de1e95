// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! The `get_env_var` tool descriptor and result constructors.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool as McpTool};
use serde_json::{json, Value};

pub const GET_ENV_VAR: &str = "get_env_var";

pub fn get_env_var_tool() -> McpTool {
    let schema = json!({
        "type": "object",
        "properties": {
            "key": {
                "type": "string",
                "description": "Name of the environment variable"
            }
        },
        "required": ["key"]
    });
    McpTool::new(
        Cow::Borrowed(GET_ENV_VAR),
        Cow::Borrowed("Returns ENV variable specified"),
        Arc::new(into_object(schema)),
    )
}

fn into_object(v: Value) -> JsonObject {
    match v {
        Value::Object(m) => m,
        _ => JsonObject::new(),
    }
}

pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

pub fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(message.into())],
        is_error: Some(true),
        structured_content: None,
        meta: None,
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
