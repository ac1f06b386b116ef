//! Command line argument parsing.
//!
//! Every subcommand reads one TOML configuration file; `--set field=value`
//! edits are applied on top of it before the configuration is frozen.

use crate::policy::BackupRoot;
use crate::producer::Strategy;
use crate::producer::generative::DEFAULT_ENDPOINT;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "installer_genie.toml";

/// Installer configurator and deployment agent for a file-sync client
#[derive(Parser, Debug)]
#[command(
    name = "installer_genie",
    version,
    about = "Installer configurator and deployment agent for a file-sync client",
    long_about = "Configures and emits unattended deployment agents for the Synology Drive client.

Usage:
  installer_genie init
  installer_genie validate --config installer_genie.toml
  installer_genie generate --strategy script --output dist --set app_name=Drive
  installer_genie generate --strategy bundle --output dist/bundle
  installer_genie run --project 卖场 --department 卖场服务部 --backup D:

Exit code 0 = success, 2 = invalid configuration."
)]
pub struct Args {
    /// Print detailed progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the default configuration file
    Init(InitArgs),
    /// Check a configuration and list every problem
    Validate(ConfigArgs),
    /// Show the departments offered for each project
    Departments(DepartmentsArgs),
    /// Produce an installer artifact
    Generate(GenerateArgs),
    /// Run the deployment agent on this machine
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Configuration file to create
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Override a field, e.g. `--set app_name=Drive` or `--set backend.enabled=false`
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub set: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct DepartmentsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Only list the departments of this project
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Artifact strategy: script, bundle or generative
    #[arg(short, long, default_value = "script")]
    pub strategy: Strategy,

    /// Directory that receives the artifact files
    #[arg(short, long, value_name = "DIR", default_value = "dist")]
    pub output: PathBuf,

    /// Compile the script with ISCC after writing it
    #[arg(long)]
    pub compile: bool,

    /// API key for the generative strategy
    #[arg(long, env = "INSTALLER_GENIE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the text-generation service
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Project of this machine
    #[arg(long)]
    pub project: Option<String>,

    /// Department of this machine
    #[arg(long)]
    pub department: Option<String>,

    /// Backup roots to protect (Desktop, C:, D:, E:, F:, G:)
    #[arg(long, value_delimiter = ',')]
    pub backup: Vec<BackupRoot>,

    /// Fail instead of prompting for missing choices
    #[arg(long)]
    pub no_input: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn generate_accepts_aliases_and_repeated_sets() {
        let args = Args::try_parse_from([
            "installer_genie",
            "generate",
            "--strategy",
            "electron",
            "--set",
            "app_name=Drive",
            "--set",
            "backend.enabled=false",
        ])
        .unwrap();
        let Command::Generate(generate) = args.command else {
            panic!("expected generate");
        };
        assert_eq!(generate.strategy, Strategy::Bundle);
        assert_eq!(generate.config.set.len(), 2);
        assert_eq!(generate.output, PathBuf::from("dist"));
    }

    #[test]
    fn run_splits_backup_roots() {
        let args =
            Args::try_parse_from(["installer_genie", "run", "--backup", "d:,Desktop", "--no-input"]).unwrap();
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.backup, [BackupRoot::D, BackupRoot::Desktop]);
        assert!(run.no_input);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["installer_genie", "-v", "-q", "validate"]).is_err());
    }
}
