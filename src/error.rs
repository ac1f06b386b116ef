//! Top-level error types for configuration, generation and deployment runs.
//!
//! Layer errors (`ConfigError`, producer `Error`, `AgentError`) convert into
//! [`GenieError`] so the CLI can map every failure to an exit code and a hint.

use thiserror::Error;

/// Result type alias for InstallerGenie operations
pub type Result<T> = std::result::Result<T, GenieError>;

/// Main error type for all InstallerGenie operations
#[derive(Error, Debug)]
pub enum GenieError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Configuration rejected at the freeze boundary
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Artifact generation errors
    #[error("Generation error: {0}")]
    Producer(#[from] crate::producer::Error),

    /// Deployment agent errors
    #[error("Deployment error: {0}")]
    Agent(#[from] crate::agent::AgentError),

    /// Context-wrapped errors raised at the CLI edge
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl GenieError {
    /// Process exit code for this error.
    ///
    /// Validation failures exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenieError::Config(_) | GenieError::Toml(_) => 2,
            _ => 1,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            GenieError::Config(_) => vec![
                "Run `installer_genie validate --config <file>` to list every problem".to_string(),
                "Run `installer_genie init` to start from the default configuration".to_string(),
            ],
            GenieError::Toml(_) => {
                vec!["Check the configuration file for TOML syntax errors".to_string()]
            }
            GenieError::Producer(crate::producer::Error::Generation(failure)) => {
                vec![failure.friendly_message()]
            }
            GenieError::Agent(crate::agent::AgentError::Acquisition { .. }) => vec![
                "Check network access to the package download URL".to_string(),
                "Switch to bundled mode if the target machines are offline".to_string(),
            ],
            GenieError::Agent(crate::agent::AgentError::InstallFailed { .. }) => vec![
                "Approve the elevation prompt when the installer starts".to_string(),
                "Inspect the Windows Installer log for the failing action".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
