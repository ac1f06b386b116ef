//! Deployment agent errors.
//!
//! Only failures that abort a run are represented here. Configure and launch
//! problems are logged and the run continues.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// The end user's choices do not satisfy the plan
    #[error("invalid install request: {0}")]
    InvalidRequest(String),

    /// Download failed; the partial file has been removed
    #[error("download of {url} failed: {reason}")]
    Acquisition { url: String, reason: String },

    /// Bundled package is not where the layout says it should be
    #[error("bundled package not found at {}", path.display())]
    BundledPackageMissing { path: PathBuf },

    /// Installer could not be started
    #[error("failed to start the installer: {0}")]
    InstallSpawn(#[source] std::io::Error),

    /// Installer exited with a non-zero code
    #[error("installer exited with code {code}")]
    InstallFailed { code: i32 },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize the backend payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("deployment cancelled")]
    Cancelled,
}

impl AgentError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AgentError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn acquisition(url: impl Into<String>, reason: impl ToString) -> Self {
        AgentError::Acquisition {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the run must stop. Cancellation stops the run but is not a fault.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AgentError::Cancelled)
    }

    /// One-line message suitable for the end user.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Acquisition { reason, .. } => {
                format!("Could not download the installer package ({reason}).")
            }
            AgentError::BundledPackageMissing { .. } => {
                "The installer package is missing from this deployment bundle.".to_string()
            }
            AgentError::InstallSpawn(_) => {
                "The installer could not be started. Was the elevation prompt declined?".to_string()
            }
            AgentError::InstallFailed { code } => {
                format!("The installer reported an error (exit code {code}).")
            }
            AgentError::Cancelled => "Deployment was cancelled.".to_string(),
            other => other.to_string(),
        }
    }
}
