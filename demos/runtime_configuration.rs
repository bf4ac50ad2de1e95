// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Two sessions from one config, each with its own token.
//!
//! ```text
//! cargo run --example runtime_configuration
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use keel_core::{make_patch, Core};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/keel.toml");
    let config = Arc::new(keel_config::load(Some(&path))?);

    for (user, token) in [("alice", "TOKEN_FOR_ALICE"), ("bob", "TOKEN_FOR_BOB")] {
        let session = Core::new(config.clone()).run_with(&[
            Box::new(make_patch("env_get_server", "TOKEN", token)),
            Box::new(make_patch("printer", "TOKEN", token)),
        ])?;

        let declared = session
            .server("env_get_server")
            .and_then(|s| s.env_var("TOKEN"))
            .unwrap_or_default();
        println!("{user}: env_get_server TOKEN = {declared}");

        let output = session
            .command("printer")?
            .output()
            .await
            .context("running printer")?;
        println!(
            "{user}: printer saw TOKEN = {}",
            String::from_utf8_lossy(&output.stdout).trim_end()
        );
        session.close();
    }

    let untouched = &config.mcp.servers["env_get_server"];
    println!("config still declares {:?}", untouched.env);
    Ok(())
}
