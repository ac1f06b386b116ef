//! Subcommand implementations.
//!
//! Each command returns the process exit code on success; failures bubble
//! up as [`GenieError`](crate::error::GenieError) and are mapped in `main`.

pub mod departments;
pub mod generate;
pub mod init;
pub mod run;
pub mod validate;

use super::args::ConfigArgs;
use crate::config::{self, ConfigEdit, ConfigEditor};
use crate::error::{CliError, Result};
use anyhow::Context;

/// Load the configuration file and apply `--set` overrides.
pub(crate) async fn load_editor(args: &ConfigArgs) -> Result<ConfigEditor> {
    let exists = tokio::fs::try_exists(&args.config)
        .await
        .with_context(|| format!("checking configuration file {}", args.config.display()))?;
    if !exists {
        return Err(CliError::InvalidArguments {
            reason: format!(
                "configuration file {} does not exist; run `installer_genie init` first",
                args.config.display()
            ),
        }
        .into());
    }
    let mut editor = ConfigEditor::from_config(config::load(&args.config).await?);
    for assignment in &args.set {
        editor.apply(ConfigEdit::parse_assignment(assignment)?);
    }
    Ok(editor)
}
