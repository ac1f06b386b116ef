//! Inno Setup script strategy.
//!
//! # Module Organization
//!
//! - `template` - script template constant
//! - `render` - template data and rendering
//! - `validate` - directive contract checks
//! - `compile` - optional ISCC invocation
//! - `utils` - directive value helpers

mod compile;
mod render;
mod template;
mod utils;
mod validate;

pub use compile::{locate_iscc, run_iscc};
pub use render::render_script;
pub use validate::{FORBIDDEN_DIRECTIVES, ScriptViolation, validate_script};

use super::{Artifact, ArtifactFile, ArtifactKind, ArtifactProducer, Error, Result, Strategy};
use crate::agent::ClientLayout;
use crate::config::ValidatedConfig;

/// File name of the produced script.
pub const SCRIPT_FILE_NAME: &str = "installer.iss";

/// Produces a single Inno Setup 6 script.
#[derive(Clone, Debug, Default)]
pub struct ScriptProducer {
    client: ClientLayout,
}

impl ScriptProducer {
    pub fn new(client: ClientLayout) -> Self {
        Self { client }
    }

    /// Render and check the script without wrapping it in an artifact.
    pub fn render(&self, config: &ValidatedConfig) -> Result<String> {
        let text = render_script(config, &self.client)?;
        validate_script(&text).map_err(Error::ScriptContract)?;
        Ok(text)
    }
}

impl ArtifactProducer for ScriptProducer {
    fn strategy(&self) -> Strategy {
        Strategy::Script
    }

    async fn produce(&self, config: &ValidatedConfig) -> Result<Artifact> {
        log::info!("Rendering installer script for {}", config.app_name);
        let text = self.render(config)?;
        Ok(Artifact {
            kind: ArtifactKind::Script,
            // ISCC reads UTF-8 scripts only with a byte order mark.
            files: vec![ArtifactFile::new(SCRIPT_FILE_NAME, text).with_bom()],
        })
    }
}
