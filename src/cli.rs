// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use keel_core::EnvPatch;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "keel",
    about = "Configure MCP server registries at runtime, before a session starts",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the effective configuration and exit
    ShowConfig,
    /// List the configured MCP servers after resolution.
    ///
    /// Only env keys are shown; use `keel run` to see values.
    Servers {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start a session with runtime env patches and print its servers.
    ///
    /// Patches are applied in the order given, after the config is loaded
    /// and before the session starts.
    Run {
        /// Env patch in SERVER:KEY=VALUE form.  May be repeated:
        /// --env env_get_server:TOKEN=abc --env env_get_server:MODE=ci
        #[arg(long = "env", short = 'e', value_name = "SERVER:KEY=VALUE")]
        patches: Vec<EnvPatch>,
        /// Print only this server
        #[arg(long, short = 's', value_name = "NAME")]
        server: Option<String>,
    },
    /// MCP servers shipped with keel
    Mcp {
        #[command(subcommand)]
        command: McpCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum McpCommands {
    /// Serve the `get_env_var` tool on stdio
    EnvServer,
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "keel", &mut std::io::stdout());
}
