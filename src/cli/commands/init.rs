//! `init`: write the default configuration.

use crate::cli::{RuntimeConfig, args::InitArgs};
use crate::config::{self, InstallerConfig};
use crate::error::{CliError, Result};
use anyhow::Context;

pub async fn execute(args: &InitArgs, runtime: &RuntimeConfig) -> Result<i32> {
    let exists = tokio::fs::try_exists(&args.config)
        .await
        .with_context(|| format!("checking configuration file {}", args.config.display()))?;
    if !args.force && exists {
        return Err(CliError::InvalidArguments {
            reason: format!(
                "{} already exists; pass --force to overwrite it",
                args.config.display()
            ),
        }
        .into());
    }

    config::save(&InstallerConfig::default(), &args.config).await?;
    runtime.success(&format!(
        "Wrote default configuration to {}",
        args.config.display()
    ))?;
    Ok(0)
}
