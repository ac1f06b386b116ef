//! InstallerGenie: installer configuration and unattended deployment.
//!
//! This library provides:
//! - an editable, validated installer configuration ([`config`])
//! - the end-user choice policies shared by every artifact ([`policy`])
//! - three artifact producers: Inno Setup script, desktop application
//!   bundle and delegated generation ([`producer`])
//! - the deployment agent that acquires, installs, configures and launches
//!   the sync client ([`agent`])
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod policy;
pub mod producer;
pub mod utils;

// Re-export commonly used types
pub use error::{CliError, GenieError, Result};
