//! InstallerGenie - installer configurator and deployment agent.
//!
//! Produces installer artifacts from a TOML configuration and runs the
//! deployment agent, mapping failures to exit codes with recovery hints.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match installer_genie::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {suggestion}");
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
