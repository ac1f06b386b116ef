//! `validate`: list every configuration problem.

use super::load_editor;
use crate::cli::{RuntimeConfig, args::ConfigArgs};
use crate::config;
use crate::error::Result;

/// Exit code when the configuration is invalid.
pub const INVALID: i32 = 2;

pub async fn execute(args: &ConfigArgs, runtime: &RuntimeConfig) -> Result<i32> {
    let editor = load_editor(args).await?;
    let errors = config::check(editor.draft());

    if errors.is_empty() {
        runtime.success(&format!("{} is valid", args.config.display()))?;
        return Ok(0);
    }

    for error in &errors {
        runtime.output().error(&error.to_string())?;
    }
    Ok(INVALID)
}
