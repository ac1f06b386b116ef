//! Artifact producers.
//!
//! A producer turns a [`ValidatedConfig`] into an [`Artifact`]: either a
//! single installer script or a multi-file application bundle. The script
//! and bundle producers are pure and deterministic; the generative producer
//! delegates to a text-generation service.

mod checksum;
pub mod bundle;
pub mod error;
pub mod escape;
pub mod generative;
pub mod script;

pub use bundle::BundleProducer;
pub use checksum::{calculate_file_sha256, sha256_hex};
pub use error::{Context, Error, ErrorExt, Result};
pub use generative::GenerativeProducer;
pub use script::ScriptProducer;

use crate::config::ValidatedConfig;
use crate::utils::fs as fsutil;
use std::{
    fmt,
    future::Future,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Which producer to use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    Script,
    Bundle,
    Generative,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Script => "script",
            Strategy::Bundle => "bundle",
            Strategy::Generative => "generative",
        })
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "script" | "inno" => Ok(Strategy::Script),
            "bundle" | "electron" => Ok(Strategy::Bundle),
            "generative" | "ai" => Ok(Strategy::Generative),
            other => Err(format!(
                "unknown strategy `{other}` (expected script, bundle or generative)"
            )),
        }
    }
}

/// Shape of an artifact.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArtifactKind {
    /// One installer script.
    Script,
    /// Several files forming an application project.
    Bundle,
}

/// One file of an artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactFile {
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub contents: String,
    /// Prefix the file with a UTF-8 byte order mark when written.
    pub bom: bool,
}

impl ArtifactFile {
    pub fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
            bom: false,
        }
    }

    pub fn with_bom(mut self) -> Self {
        self.bom = true;
        self
    }

    /// Bytes as they are written to disk.
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.contents.len() + 3);
        if self.bom {
            bytes.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
        }
        bytes.extend_from_slice(self.contents.as_bytes());
        bytes
    }
}

/// Output of a producer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub files: Vec<ArtifactFile>,
}

/// A file written to disk with its checksum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

impl Artifact {
    /// File at `path` (relative), if present.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&ArtifactFile> {
        self.files.iter().find(|f| f.path == path.as_ref())
    }

    /// Write every file below `dir`, returning paths and checksums.
    pub async fn write_to(&self, dir: &Path) -> Result<Vec<WrittenFile>> {
        fsutil::create_dir_all(dir, false)
            .await
            .fs_context("creating output directory", dir)?;

        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = dir.join(&file.path);
            let bytes = file.bytes();
            fsutil::write_file(&path, &bytes)
                .await
                .fs_context("writing artifact file", &path)?;
            let sha256 = calculate_file_sha256(&path).await?;
            log::debug!("wrote {} ({} bytes, sha256 {sha256})", path.display(), bytes.len());
            written.push(WrittenFile {
                path,
                size: bytes.len() as u64,
                sha256,
            });
        }
        Ok(written)
    }
}

/// Turns a validated configuration into an artifact.
pub trait ArtifactProducer {
    fn strategy(&self) -> Strategy;

    fn produce(&self, config: &ValidatedConfig) -> impl Future<Output = Result<Artifact>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!("Inno".parse::<Strategy>(), Ok(Strategy::Script));
        assert_eq!("bundle".parse::<Strategy>(), Ok(Strategy::Bundle));
        assert!("zip".parse::<Strategy>().is_err());
    }

    #[tokio::test]
    async fn write_to_reports_checksums_and_bom() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact {
            kind: ArtifactKind::Bundle,
            files: vec![
                ArtifactFile::new("a.txt", "abc".into()),
                ArtifactFile::new("nested/b.iss", "x".into()).with_bom(),
            ],
        };

        let written = artifact.write_to(dir.path()).await.unwrap();

        assert_eq!(written[0].sha256, sha256_hex(b"abc"));
        assert_eq!(written[1].size, 4);
        let raw = std::fs::read(dir.path().join("nested/b.iss")).unwrap();
        assert_eq!(raw, [0xEF, 0xBB, 0xBF, b'x']);
    }
}
