//! Optional compilation of a produced script with the Inno Setup compiler.

use crate::producer::error::{Error, ErrorExt, Result};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Location of `ISCC`, resolved once per process.
static ISCC: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    ["ISCC", "iscc"].iter().find_map(|name| match which::which(name) {
        Ok(path) => {
            log::debug!("Found ISCC at: {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{name} not found in PATH: {e}");
            None
        }
    })
});

/// Path of the Inno Setup command-line compiler, if installed.
pub fn locate_iscc() -> Option<PathBuf> {
    ISCC.clone()
}

/// Run ISCC to compile `script` into `out_dir`.
///
/// # Arguments
/// - `iscc` - Compiler executable
/// - `script` - Script written by the script producer
/// - `out_dir` - Directory that receives the setup executable
pub async fn run_iscc(iscc: &Path, script: &Path, out_dir: &Path) -> Result<()> {
    log::info!("Running ISCC on {}", script.display());

    tokio::fs::create_dir_all(out_dir)
        .await
        .fs_context("creating compiler output directory", out_dir)?;

    let output = tokio::process::Command::new(iscc)
        .arg("/Q")
        .arg(format!("/O{}", out_dir.display()))
        .arg(script)
        .output()
        .await
        .map_err(|e| Error::CommandFailed {
            command: "ISCC".to_string(),
            error: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(Error::GenericError(format!(
            "ISCC compilation failed (exit code {:?}): {}",
            output.status.code(),
            if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() }
        )));
    }

    Ok(())
}
