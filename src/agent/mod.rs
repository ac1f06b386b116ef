//! Deployment agent.
//!
//! Runs one deployment as a strictly sequential state machine:
//! Acquire, Install, Configure, Launch, then Done. Any fatal error moves the
//! run to Failed. Progress and log lines are published over the channels of
//! the [`Reporter`] handed to [`DeploymentAgent::start_install`].

mod acquire;
mod cleanup;
mod configure;
mod error;
pub mod host;
mod install;
mod launch;
mod options;
pub mod payload;
mod plan;
pub mod poll;
mod state;

pub use acquire::{Downloader, MAX_REDIRECTS, resolve_bundled};
pub use cleanup::CleanupHandle;
pub use error::AgentError;
pub use host::{Host, SystemHost};
pub use install::{InstallerInvocation, installer_invocation};
pub use options::{AgentOptions, ClientLayout, ResourceLayout};
pub use payload::{BackendPayload, BackendPlan, device_identifier};
pub use plan::{DeploymentPlan, InstallRequest, PackageSource};
pub use poll::PollPolicy;
pub use state::{Phase, Progress, Reporter, RunEvents, RunState};

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Progress reached at the end of each phase.
const ACQUIRED: u8 = 40;
const INSTALLED: u8 = 70;
const CONFIGURED: u8 = 90;

/// Final result of a run.
#[derive(Debug)]
pub struct RunOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub state: RunState,
    /// Pending deletion of the run's temp files.
    pub cleanup: CleanupHandle,
}

/// Executes a [`DeploymentPlan`] against a [`Host`].
pub struct DeploymentAgent<H: Host> {
    plan: DeploymentPlan,
    host: H,
    options: AgentOptions,
    cancel: CancellationToken,
}

impl<H: Host> DeploymentAgent<H> {
    pub fn new(plan: DeploymentPlan, host: H, options: AgentOptions) -> Self {
        Self {
            plan,
            host,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn plan(&self) -> &DeploymentPlan {
        &self.plan
    }

    /// Token that aborts the run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the whole deployment for one end-user request.
    pub async fn start_install(&self, request: InstallRequest, mut reporter: Reporter) -> RunOutcome {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut temp_files = Vec::new();

        let result = self
            .execute(&request, &token, &mut reporter, &mut temp_files)
            .await;
        let cleanup = cleanup::schedule(temp_files, self.options.cleanup_grace);

        let (success, error) = match result {
            Ok(()) => {
                reporter.phase(Phase::Done);
                reporter.progress(Progress::Percent(100));
                reporter.log("Deployment complete");
                (true, None)
            }
            Err(e) => {
                reporter.phase(Phase::Failed);
                reporter.log(format!("Deployment failed: {e}"));
                if e.is_fatal() {
                    log::error!("deployment failed: {e}");
                }
                (false, Some(e.user_message()))
            }
        };

        RunOutcome {
            success,
            error,
            state: reporter.into_state(),
            cleanup,
        }
    }

    async fn execute(
        &self,
        request: &InstallRequest,
        token: &str,
        reporter: &mut Reporter,
        temp_files: &mut Vec<PathBuf>,
    ) -> Result<(), AgentError> {
        self.plan.check_request(request)?;

        self.checkpoint()?;
        reporter.phase(Phase::Acquiring);
        reporter.progress(Progress::Percent(0));
        let package = self.acquire(token, reporter, temp_files).await?;
        reporter.progress(Progress::Percent(ACQUIRED));

        self.checkpoint()?;
        reporter.phase(Phase::Installing);
        let config_path = match &self.plan.backend {
            Some(backend) => {
                if self.plan.force_clean_install {
                    install::force_clean(&self.host, &self.options, reporter).await;
                }
                let payload = BackendPayload::assemble(
                    backend,
                    &request.project,
                    &request.department,
                    &request.backup_roots,
                    &self.host.hostname(),
                );
                if let Some(name) = &payload.connections[0].computer_name {
                    reporter.log(format!("Device name: {name}"));
                }
                let path = self
                    .options
                    .temp_dir
                    .join(format!("{}-{token}-config.json", self.plan.identifier));
                temp_files.push(path.clone());
                configure::write_payload(&path, &payload).await?;
                Some(path)
            }
            None => None,
        };
        reporter.progress(Progress::Indeterminate);
        let invocation =
            install::installer_invocation(&package, self.plan.silent_install, config_path.as_deref());
        install::run_installer(&self.host, &self.plan, &invocation, reporter, &self.cancel).await?;
        reporter.progress(Progress::Percent(INSTALLED));

        self.checkpoint()?;
        reporter.phase(Phase::Configuring);
        if let Some(path) = &config_path {
            configure::inject(&self.host, &self.options, path, reporter, &self.cancel).await?;
        }
        let scripts = configure::run_scripts(
            &self.host,
            &self.plan.scripts,
            &self.options.temp_dir,
            token,
            reporter,
            &self.cancel,
        )
        .await?;
        temp_files.extend(scripts);
        reporter.progress(Progress::Percent(CONFIGURED));

        self.checkpoint()?;
        reporter.phase(Phase::Launching);
        launch::launch(&self.host, &self.options, reporter, &self.cancel).await?;

        Ok(())
    }

    async fn acquire(
        &self,
        token: &str,
        reporter: &mut Reporter,
        temp_files: &mut Vec<PathBuf>,
    ) -> Result<PathBuf, AgentError> {
        match &self.plan.package {
            PackageSource::Download { url } => {
                let dest = self
                    .options
                    .temp_dir
                    .join(format!("{}-{token}.msi", self.plan.identifier));
                temp_files.push(dest.clone());
                let downloader = Downloader::new(&self.options)?;
                downloader
                    .fetch(url, &dest, reporter, &self.cancel, |reporter, percent| {
                        reporter.progress(match percent {
                            Some(p) => Progress::Percent(scale(p, ACQUIRED)),
                            None => Progress::Indeterminate,
                        });
                    })
                    .await?;
                Ok(dest)
            }
            PackageSource::Bundled { file_name } => {
                let path = resolve_bundled(&self.options, file_name).await?;
                reporter.log(format!("Using bundled package {}", path.display()));
                Ok(path)
            }
        }
    }

    fn checkpoint(&self) -> Result<(), AgentError> {
        if self.cancel.is_cancelled() {
            Err(AgentError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Map a 0-100 percentage onto 0..=`ceiling`.
fn scale(percent: u8, ceiling: u8) -> u8 {
    (u16::from(percent.min(100)) * u16::from(ceiling) / 100) as u8
}
