// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Tether.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, `TETHER_` environment
//! overrides, miette diagnostics with typo suggestions, and the channel-id
//! normalization shared by the allowlist and the mention router.
//!
//! # Usage
//!
//! ```no_run
//! use tether_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("executable: {}", config.runner.executable_path);
//! ```

pub mod channels;
pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{
    load_config, load_config_from_path, load_config_from_str, save_config_to_path,
    user_config_path,
};
pub use model::TetherConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `TetherConfig` or every diagnostic found.
pub fn load_and_validate() -> Result<TetherConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<TetherConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load an explicit config file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<TetherConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read the config files that exist, for span lookup in diagnostics.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join("tether.toml"))
        .unwrap_or_else(|_| "tether.toml".into());
    let candidates = [
        Some(local),
        loader::user_config_path(),
        Some("/etc/tether/tether.toml".into()),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
