// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Server registry and pre-run lifecycle for keel sessions.
//!
//! A [`Core`] turns a loaded [`keel_config::Config`] into a [`ServerRegistry`],
//! lets [`CoreModifier`]s adjust it, and then starts a [`Session`]:
//!
//! ```rust,ignore
//! let config = Arc::new(keel_config::load(None)?);
//! let session = Core::new(config)
//!     .run_with(&[Box::new(make_patch("env_get_server", "TOKEN", token))])?;
//! let child = session.command("env_get_server")?.spawn()?;
//! ```
//!
//! Each core builds its own registry, so several sessions created from the
//! same config can carry different patches side by side.

pub mod context;
pub mod error;
pub mod lifecycle;
pub mod modifier;
pub mod registry;
pub mod session;

pub use context::Context;
pub use error::CoreError;
pub use lifecycle::{AgentDefinition, Core, CoreState};
pub use modifier::{make_patch, CoreModifier, EnvPatch, ParsePatchError};
pub use registry::{ServerConfig, ServerRegistry};
pub use session::Session;
