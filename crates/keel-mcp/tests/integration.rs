// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! End-to-end tests for the env-get MCP server.
//!
//! Each test drives an [`EnvGetServer`] over in-memory pipes with raw
//! JSON-RPC 2.0 lines, so the assertions are on the wire format a real MCP
//! host sees.

use std::collections::BTreeMap;

use keel_mcp::EnvGetServer;
use rmcp::ServiceExt;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};

// ── In-process MCP server harness ────────────────────────────────────────────

type Reader = BufReader<ReadHalf<DuplexStream>>;
type Writer = WriteHalf<DuplexStream>;

async fn start_test_server(env: &[(&str, &str)]) -> (Writer, Reader) {
    let map: BTreeMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let (client_stream, server_stream) = tokio::io::duplex(65536);

    tokio::spawn(async move {
        let server = EnvGetServer::new(map);
        if let Ok(running) = server.serve(server_stream).await {
            let _ = running.waiting().await;
        }
    });

    let (client_read, client_write) = tokio::io::split(client_stream);
    (client_write, BufReader::new(client_read))
}

async fn send_msg(writer: &mut Writer, msg: &Value) {
    let line = serde_json::to_string(msg).expect("message must serialize");
    writer
        .write_all(line.as_bytes())
        .await
        .expect("write failed");
    writer.write_all(b"\n").await.expect("newline write failed");
    writer.flush().await.expect("flush failed");
}

/// Read one JSON-RPC line from the server.  Times out after 5 s.
async fn recv_msg(reader: &mut Reader) -> Value {
    let mut line = String::new();
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        reader.read_line(&mut line),
    )
    .await
    .expect("timed out waiting for server response")
    .expect("read error");
    serde_json::from_str(line.trim()).expect("server response must be valid JSON")
}

async fn initialize(writer: &mut Writer, reader: &mut Reader) -> Value {
    send_msg(
        writer,
        &json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "keel-test-client", "version": "0.0.0" }
            }
        }),
    )
    .await;

    let init_resp = recv_msg(reader).await;
    assert!(
        init_resp["result"].is_object(),
        "initialize must return a result object"
    );

    send_msg(
        writer,
        &json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
    )
    .await;

    init_resp["result"].clone()
}

async fn call(writer: &mut Writer, reader: &mut Reader, id: u64, name: &str, args: Value) -> Value {
    send_msg(
        writer,
        &json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": args }
        }),
    )
    .await;
    recv_msg(reader).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_declares_tools_capability() {
    let (mut writer, mut reader) = start_test_server(&[]).await;
    let result = initialize(&mut writer, &mut reader).await;
    assert!(
        result["capabilities"]["tools"].is_object(),
        "server must advertise tools capability; got: {result}"
    );
}

#[tokio::test]
async fn tools_list_returns_get_env_var() {
    let (mut writer, mut reader) = start_test_server(&[]).await;
    initialize(&mut writer, &mut reader).await;

    send_msg(
        &mut writer,
        &json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {} }),
    )
    .await;

    let resp = recv_msg(&mut reader).await;
    let tools = resp["result"]["tools"]
        .as_array()
        .expect("tools must be an array");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "get_env_var");
    assert_eq!(tools[0]["description"], "Returns ENV variable specified");
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["key"]));
}

#[tokio::test]
async fn call_returns_patched_value() {
    let (mut writer, mut reader) = start_test_server(&[("TOKEN", "NEW_TOKEN")]).await;
    initialize(&mut writer, &mut reader).await;

    let resp = call(&mut writer, &mut reader, 2, "get_env_var", json!({ "key": "TOKEN" })).await;
    assert_eq!(resp["result"]["isError"], false);
    assert_eq!(resp["result"]["content"][0]["text"], "NEW_TOKEN");
}

#[tokio::test]
async fn call_for_unset_key_returns_empty_text() {
    let (mut writer, mut reader) = start_test_server(&[("TOKEN", "DEFAULT_TOKEN")]).await;
    initialize(&mut writer, &mut reader).await;

    let resp = call(
        &mut writer,
        &mut reader,
        3,
        "get_env_var",
        json!({ "key": "OTHER_TOKEN" }),
    )
    .await;
    assert_eq!(resp["result"]["isError"], false);
    assert_eq!(resp["result"]["content"][0]["text"], "");
}

#[tokio::test]
async fn call_without_key_is_a_tool_error() {
    let (mut writer, mut reader) = start_test_server(&[]).await;
    initialize(&mut writer, &mut reader).await;

    let resp = call(&mut writer, &mut reader, 4, "get_env_var", json!({})).await;
    assert_eq!(resp["result"]["isError"], true, "got: {resp}");
    assert!(resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or("")
        .contains("'key'"));
}

#[tokio::test]
async fn call_unknown_tool_is_a_tool_error() {
    let (mut writer, mut reader) = start_test_server(&[]).await;
    initialize(&mut writer, &mut reader).await;

    let resp = call(&mut writer, &mut reader, 5, "set_env_var", json!({ "key": "A" })).await;
    assert_eq!(resp["result"]["isError"], true, "got: {resp}");
    assert!(resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or("")
        .contains("set_env_var"));
}

#[tokio::test]
async fn successive_calls_share_one_connection() {
    let (mut writer, mut reader) =
        start_test_server(&[("NEW_ENV1", "VALUE_ONE"), ("NEW_ENV2", "VALUE_TWO")]).await;
    initialize(&mut writer, &mut reader).await;

    let one = call(&mut writer, &mut reader, 6, "get_env_var", json!({ "key": "NEW_ENV1" })).await;
    let two = call(&mut writer, &mut reader, 7, "get_env_var", json!({ "key": "NEW_ENV2" })).await;
    assert_eq!(one["id"], 6);
    assert_eq!(one["result"]["content"][0]["text"], "VALUE_ONE");
    assert_eq!(two["id"], 7);
    assert_eq!(two["result"]["content"][0]["text"], "VALUE_TWO");
}
