// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order, later layers overriding earlier ones:
//! compiled defaults, `/etc/filewise/filewise.toml`,
//! `~/.config/filewise/filewise.toml`, `./filewise.toml`, then `FILEWISE_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FilewiseConfig;

/// Top-level sections that environment variables may address.
const SECTIONS: &[&str] = &[
    "engine", "history", "learning", "context", "models", "ranking", "search", "external",
];

/// Candidate config files in merge order (lowest precedence first).
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/filewise/filewise.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("filewise/filewise.toml"));
    }
    paths.push(PathBuf::from("filewise.toml"));
    paths
}

/// Build the full Figment before extraction.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(FilewiseConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<FilewiseConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults only.
pub fn load_config_from_str(toml_content: &str) -> Result<FilewiseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FilewiseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, still honouring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<FilewiseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FilewiseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Maps `FILEWISE_SEARCH_MAX_RESULTS` to `search.max_results`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// field names that contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("FILEWISE_").map(|key| env_key_to_path(key.as_str()).into())
}

fn env_key_to_path(key: &str) -> String {
    SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|field| format!("{section}.{field}"))
        })
        .unwrap_or_else(|| key.to_string())
}
