// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Ordered list of config file locations searched from lowest to highest priority.
/// Later files override earlier ones.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. System-wide default
    paths.push(PathBuf::from("/etc/keel/config.toml"));

    // 2. XDG / home
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/keel/config.toml"));
    }
    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join("keel/config.toml"));
    }

    // 3. Workspace-local; the secrets layer is kept out of version control
    paths.push(PathBuf::from(".keel/config.toml"));
    paths.push(PathBuf::from("keel.toml"));
    paths.push(PathBuf::from("keel.secrets.toml"));

    paths
}

/// Load configuration by merging all discovered TOML files.
/// The `extra` argument may provide an explicit path (e.g. `--config` CLI flag);
/// it must exist and may be TOML or YAML.
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let discovered: Vec<PathBuf> = config_search_paths()
        .into_iter()
        .filter(|p| p.is_file())
        .collect();
    load_files(&discovered, extra)
}

/// Merge `layers` in order, then `extra` on top.
fn load_files(layers: &[PathBuf], extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in layers {
        debug!(path = %path.display(), "loading config layer");
        merge_toml(&mut merged, read_layer(path)?);
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        merge_toml(&mut merged, read_layer(p)?);
    }

    let config: Config = merged
        .try_into()
        .context("configuration does not match the expected schema")?;
    Ok(config)
}

/// Read one layer.  `.yaml` / `.yml` files go through serde_yaml, everything
/// else is parsed as TOML.
fn read_layer(path: &Path) -> anyhow::Result<toml::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        if text.trim().is_empty() {
            return Ok(toml::Value::Table(toml::map::Map::new()));
        }
        let mut doc: serde_yaml::Value =
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        strip_yaml_nulls(&mut doc);
        if doc.is_null() {
            return Ok(toml::Value::Table(toml::map::Map::new()));
        }
        toml::Value::try_from(doc).with_context(|| format!("converting {}", path.display()))
    } else {
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Drop null values.  TOML has no null, and an empty YAML key (`env:`) means
/// the field is unset.
fn strip_yaml_nulls(value: &mut serde_yaml::Value) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            *map = std::mem::take(map)
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .collect();
            for (_, v) in map.iter_mut() {
                strip_yaml_nulls(v);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            seq.retain(|v| !v.is_null());
            seq.iter_mut().for_each(strip_yaml_nulls);
        }
        serde_yaml::Value::Tagged(tagged) => strip_yaml_nulls(&mut tagged.value),
        _ => {}
    }
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_toml(dst: &mut toml::Value, src: toml::Value) {
    match (dst, src) {
        (toml::Value::Table(d), toml::Value::Table(s)) => {
            for (k, v) in s {
                let entry = d.entry(k).or_insert(toml::Value::Table(toml::map::Map::new()));
                merge_toml(entry, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
