// SPDX-FileCopyrightText: 2026 Leadline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Leadline lead scheduler.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `LEADLINE_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use leadline_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, ConfigSource, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::LeadlineConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `LeadlineConfig` or every diagnostic found.
pub fn load_and_validate() -> Result<LeadlineConfig, Vec<ConfigError>> {
    checked(loader::load_config(), standard_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<LeadlineConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        ConfigSource::read(path).into_iter().collect()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<LeadlineConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![ConfigSource::new("<inline>", toml_content)]
    })
}

/// Validate a parsed config, or translate the parse failure. Sources are
/// only read when there is an error to point into.
fn checked(
    loaded: Result<LeadlineConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<ConfigSource>,
) -> Result<LeadlineConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::from_figment(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// The standard config files that exist, for error span resolution.
fn standard_sources() -> Vec<ConfigSource> {
    let cwd = std::env::current_dir()
        .map(|d| d.join("leadline.toml"))
        .unwrap_or_else(|_| "leadline.toml".into());
    let user = dirs::config_dir().map(|d| d.join("leadline/leadline.toml"));

    [Some(cwd), user, Some("/etc/leadline/leadline.toml".into())]
        .into_iter()
        .flatten()
        .filter_map(|path: std::path::PathBuf| ConfigSource::read(&path))
        .collect()
}
