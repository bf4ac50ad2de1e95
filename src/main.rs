// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::sync::Arc;

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, McpCommands};
use keel_config::Config;
use keel_core::{Core, CoreModifier, EnvPatch, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let config = keel_config::load(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.logger.level);
    let config = Arc::new(config);

    match cli.command {
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
        Some(Commands::ShowConfig) => {
            println!("{}", serde_yaml::to_string(config.as_ref())?);
            Ok(())
        }
        Some(Commands::Servers { json }) => list_servers_cmd(config, json),
        Some(Commands::Run { patches, server }) => run_cmd(config, patches, server.as_deref()),
        Some(Commands::Mcp {
            command: McpCommands::EnvServer,
        }) => keel_mcp::serve_stdio(keel_mcp::EnvGetServer::from_process()).await,
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

fn list_servers_cmd(config: Arc<Config>, as_json: bool) -> anyhow::Result<()> {
    let mut core = Core::new(config);
    core.initialize()?;
    let registry = core
        .server_registry()
        .context("server registry missing after initialization")?;

    if as_json {
        #[derive(serde::Serialize)]
        struct ServerJson<'a> {
            name: &'a str,
            transport: String,
            command: Option<&'a str>,
            args: &'a [String],
            url: Option<&'a str>,
            env_keys: Vec<&'a str>,
        }
        let rows: Vec<ServerJson> = registry
            .iter()
            .map(|s| ServerJson {
                name: &s.name,
                transport: s.transport.to_string(),
                command: s.command.as_deref(),
                args: &s.args,
                url: s.url.as_deref(),
                env_keys: env_keys(s),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No MCP servers configured.");
        return Ok(());
    }

    println!("MCP servers ({} total)\n", registry.len());
    for s in registry.iter() {
        let target = match (&s.command, &s.url) {
            (Some(cmd), _) if s.args.is_empty() => cmd.clone(),
            (Some(cmd), _) => format!("{cmd} {}", s.args.join(" ")),
            (None, Some(url)) => url.clone(),
            (None, None) => String::new(),
        };
        println!("  {:<24} {:<6} {}", s.name, s.transport.to_string(), target);
        let keys = env_keys(s);
        if !keys.is_empty() {
            println!("    env: {}", keys.join(", "));
        }
    }
    Ok(())
}

fn env_keys(server: &ServerConfig) -> Vec<&str> {
    server
        .env
        .as_ref()
        .map(|env| env.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

fn run_cmd(config: Arc<Config>, patches: Vec<EnvPatch>, only: Option<&str>) -> anyhow::Result<()> {
    let modifiers: Vec<Box<dyn CoreModifier>> = patches
        .into_iter()
        .map(|p| Box::new(p) as Box<dyn CoreModifier>)
        .collect();
    debug!(count = modifiers.len(), "applying runtime patches");
    let session = Core::new(config)
        .run_with(&modifiers)
        .context("starting session")?;

    let servers: Vec<&ServerConfig> = match only {
        Some(name) => vec![session.server_registry().require(name)?],
        None => session.server_registry().iter().collect(),
    };
    println!("{}", serde_yaml::to_string(&servers)?);
    session.close();
    Ok(())
}

/// Install the stderr subscriber.  `RUST_LOG` wins, then `-v`, then the
/// configured `logger.level`.
fn init_logging(verbosity: u8, configured: &str) {
    let level = match verbosity {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
