//! Installer configuration model.
//!
//! [`InstallerConfig`] is plain data. It is mutated through a
//! [`ConfigEditor`] and frozen into a [`ValidatedConfig`] before any
//! artifact is produced.

mod backend;
mod core;
mod editor;
pub mod identifier;
mod scripts;
mod validate;

pub use backend::{BackendConfig, CURRENT_USER_TOKEN};
pub use core::{BackupMode, InstallerConfig, split_list};
pub use editor::{BackendEdit, ConfigEdit, ConfigEditor};
pub use identifier::{DEFAULT_IDENTIFIER, sanitize_identifier};
pub use scripts::{ScriptFile, ScriptKind};
pub use validate::{ConfigError, ValidatedConfig, check, validate};

use std::path::Path;

/// Load a configuration file, applying defaults for absent fields.
pub async fn load(path: &Path) -> crate::Result<InstallerConfig> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(toml::from_str(&text)?)
}

/// Write a configuration file as pretty TOML.
pub async fn save(config: &InstallerConfig, path: &Path) -> crate::Result<()> {
    let text = toml::to_string_pretty(config)?;
    crate::utils::fs::write_file(path, text.as_bytes()).await?;
    Ok(())
}
