//! Install phase: optional clean slate, then the elevated package installer.

use super::{
    AgentError, DeploymentPlan,
    host::Host,
    options::AgentOptions,
    state::Reporter,
};
use crate::utils::fs as fsutil;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Windows Installer executable.
pub const MSIEXEC: &str = "msiexec.exe";

/// Program and arguments for one installer invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallerInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Build the installer command line.
///
/// `CONFIGPATH` is only passed when a backend payload was written.
pub fn installer_invocation(
    package: &Path,
    silent: bool,
    config_path: Option<&Path>,
) -> InstallerInvocation {
    let mut args = vec!["/i".to_string(), package.display().to_string()];
    if silent {
        args.push("/qn".to_string());
    }
    args.push("/norestart".to_string());
    if let Some(path) = config_path {
        args.push(format!("CONFIGPATH={}", path.display()));
    }
    InstallerInvocation {
        program: PathBuf::from(MSIEXEC),
        args,
    }
}

/// Remove a previous installation and its per-user state. Never fails the run.
pub async fn force_clean<H: Host>(host: &H, options: &AgentOptions, reporter: &mut Reporter) {
    reporter.log("Removing previous installation");

    match host.find_product_code(&options.client.display_name).await {
        Ok(Some(code)) => {
            reporter.log(format!("Uninstalling existing product {code}"));
            let args = vec![
                "/x".to_string(),
                code,
                "/qn".to_string(),
                "/norestart".to_string(),
            ];
            match host.run_elevated(Path::new(MSIEXEC), &args).await {
                Ok(0) => reporter.log("Previous installation removed"),
                Ok(status) => reporter.log(format!("Uninstall exited with code {status}, continuing")),
                Err(e) => reporter.log(format!("Uninstall could not run ({e}), continuing")),
            }
        }
        Ok(None) => reporter.log("No previous installation found"),
        Err(e) => reporter.log(format!("Uninstall lookup failed ({e}), continuing")),
    }

    if let Some(state_dir) = &options.user_state_dir {
        match fsutil::remove_dir_all(state_dir).await {
            Ok(()) => reporter.log(format!("Cleared {}", state_dir.display())),
            Err(e) => reporter.log(format!(
                "Could not clear {} ({e}), continuing",
                state_dir.display()
            )),
        }
    }
}

/// Run the installer and wait for it. A non-zero exit code is fatal.
///
/// Cancellation drops the child future, which kills the installer process.
pub async fn run_installer<H: Host>(
    host: &H,
    plan: &DeploymentPlan,
    invocation: &InstallerInvocation,
    reporter: &mut Reporter,
    cancel: &CancellationToken,
) -> Result<(), AgentError> {
    reporter.log(if plan.run_as_admin {
        "Starting installer (administrator approval required)"
    } else {
        "Starting installer"
    });
    log::debug!("installer arguments: {:?}", invocation.args);

    let run = async {
        if plan.run_as_admin {
            host.run_elevated(&invocation.program, &invocation.args).await
        } else {
            host.run_as_user(&invocation.program, &invocation.args).await
        }
    };

    let code = tokio::select! {
        _ = cancel.cancelled() => return Err(AgentError::Cancelled),
        result = run => result.map_err(AgentError::InstallSpawn)?,
    };

    if code != 0 {
        return Err(AgentError::InstallFailed { code });
    }
    reporter.log("Installer finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_invocation_with_payload() {
        let inv = installer_invocation(
            Path::new("/tmp/app-1.msi"),
            true,
            Some(Path::new("/tmp/app-1-config.json")),
        );
        assert_eq!(inv.program, PathBuf::from("msiexec.exe"));
        assert_eq!(
            inv.args,
            [
                "/i",
                "/tmp/app-1.msi",
                "/qn",
                "/norestart",
                "CONFIGPATH=/tmp/app-1-config.json"
            ]
        );
    }

    #[test]
    fn interactive_invocation_without_payload() {
        let inv = installer_invocation(Path::new("a.msi"), false, None);
        assert_eq!(inv.args, ["/i", "a.msi", "/norestart"]);
    }
}
