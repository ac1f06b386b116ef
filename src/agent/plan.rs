//! Deployment plan: the part of a configuration the agent acts on.
//!
//! The plan is computed once from a [`ValidatedConfig`] and is also
//! embedded, as JSON, into the bundle artifact's automation runtime.

use super::{
    AgentError,
    payload::{BackendPlan, BackupSchedule, Connection},
};
use crate::config::{BackupMode, ScriptFile, ValidatedConfig};
use crate::policy::{self, BackupSelection, DepartmentResolver};
use serde::{Deserialize, Serialize};

/// Where the installer package comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PackageSource {
    Download { url: String },
    Bundled { file_name: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub identifier: String,
    pub app_name: String,
    pub package: PackageSource,
    pub run_as_admin: bool,
    pub silent_install: bool,
    pub force_clean_install: bool,
    pub collect_user_info: bool,
    pub projects: Vec<String>,
    pub departments: DepartmentResolver,
    pub backup_selection: bool,
    /// Absent when the remote backend is disabled.
    pub backend: Option<BackendPlan>,
    pub scripts: Vec<ScriptFile>,
}

/// The end user's choices for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub project: String,
    pub department: String,
    pub backup_roots: BackupSelection,
}

impl DeploymentPlan {
    pub fn from_config(config: &ValidatedConfig) -> Self {
        let package = if config.use_online_installer {
            PackageSource::Download {
                url: config.download_url.trim().to_string(),
            }
        } else {
            PackageSource::Bundled {
                file_name: config.msi_file_name.trim().to_string(),
            }
        };

        let backend = config.backend.enabled.then(|| BackendPlan {
            connection: Connection::from_backend(&config.backend),
            device_naming: config.device_naming_active(),
            backup: config.backup_selection_active().then(|| BackupSchedule {
                mode: config.backup_mode,
                start_time: (config.backup_mode == BackupMode::Scheduled)
                    .then(|| config.backup_start_time.trim().to_string()),
            }),
            smart_filters: config.enable_smart_filters,
        });

        Self {
            identifier: config.identifier(),
            app_name: config.app_name.clone(),
            package,
            run_as_admin: config.run_as_admin,
            silent_install: config.silent_install,
            force_clean_install: config.force_clean_install,
            collect_user_info: config.collect_user_info,
            projects: config.projects(),
            departments: DepartmentResolver::from_config(config),
            backup_selection: config.backup_selection_active(),
            backend,
            scripts: config.automation_scripts.clone(),
        }
    }

    /// Departments offered for `project`.
    pub fn departments_for(&self, project: &str) -> Vec<String> {
        self.departments.resolve(project)
    }

    /// Reject requests the interactive shell would not let through.
    pub fn check_request(&self, request: &InstallRequest) -> Result<(), AgentError> {
        if self.collect_user_info {
            if !self.projects.iter().any(|p| *p == request.project) {
                return Err(AgentError::InvalidRequest(format!(
                    "unknown project `{}`",
                    request.project
                )));
            }
            if !self
                .departments_for(&request.project)
                .iter()
                .any(|d| *d == request.department)
            {
                return Err(AgentError::InvalidRequest(format!(
                    "department `{}` is not offered for project `{}`",
                    request.department, request.project
                )));
            }
        }
        if !policy::is_valid(&request.backup_roots, self.backup_selection) {
            return Err(AgentError::InvalidRequest(
                "select at least one backup location".to_string(),
            ));
        }
        Ok(())
    }
}
