//! The root configuration entity.

use super::{BackendConfig, ScriptFile, identifier::sanitize_identifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// When the backup task runs once configured.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupMode {
    #[default]
    Continuous,
    Scheduled,
}

impl BackupMode {
    /// Numeric mode understood by the sync client.
    pub fn code(self) -> u8 {
        match self {
            BackupMode::Continuous => 0,
            BackupMode::Scheduled => 2,
        }
    }
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackupMode::Continuous => "continuous",
            BackupMode::Scheduled => "scheduled",
        })
    }
}

impl std::str::FromStr for BackupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(BackupMode::Continuous),
            "scheduled" => Ok(BackupMode::Scheduled),
            other => Err(format!("unknown backup mode `{other}`")),
        }
    }
}

/// Everything a deployment artifact is generated from.
///
/// Missing fields in a TOML file fall back to [`InstallerConfig::default`],
/// which mirrors the production deployment of the sync client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub app_name: String,
    pub app_version: String,
    pub publisher: String,
    pub msi_file_name: String,
    pub download_url: String,
    /// Download mode when set, bundled mode otherwise.
    pub use_online_installer: bool,

    pub welcome_message: String,
    pub warning_title: String,
    pub warning_message: String,
    pub license_text: String,

    pub run_as_admin: bool,
    pub silent_install: bool,
    pub force_clean_install: bool,

    pub collect_user_info: bool,
    /// Comma separated.
    pub project_list: String,
    /// Comma separated.
    pub department_list: String,
    pub use_info_for_device_name: bool,

    pub enable_backup_selection: bool,
    pub backup_mode: BackupMode,
    /// `HH:MM`, only meaningful for [`BackupMode::Scheduled`].
    pub backup_start_time: String,
    pub enable_smart_filters: bool,

    pub automation_scripts: Vec<ScriptFile>,
    pub backend: BackendConfig,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            app_name: "Synology Drive 助手".to_string(),
            app_version: "3.5.1".to_string(),
            publisher: "制作人关新宇".to_string(),
            msi_file_name: "SynologyDrive.msi".to_string(),
            download_url: "https://archive.synology.cn/download/Utility/SynologyDriveClient/3.5.1-12888/Windows/Installer/Synology%20Drive%20Client-3.5.1-12888.msi".to_string(),
            use_online_installer: true,
            welcome_message: "本向导将自动下载并安装最新的 Synology Drive Client。".to_string(),
            warning_title: "安装前须知".to_string(),
            warning_message: "安装过程中将连接服务器配置环境，请确保网络畅通。".to_string(),
            license_text: String::new(),
            run_as_admin: true,
            silent_install: true,
            force_clean_install: true,
            collect_user_info: true,
            project_list: "总经办,职能部门,卖场,万晟汇,峰景,峰阁,华府,丽府,雲府,观岭雲庭,江山墅,清溪樾,科创园,翰林苑,书香门第A区,天府智慧城（北）,天府智慧城（南）".to_string(),
            department_list: "项目综合部,客户服务部,工程维护部,秩序维护部,环境维护部".to_string(),
            use_info_for_device_name: true,
            enable_backup_selection: true,
            backup_mode: BackupMode::Continuous,
            backup_start_time: "22:00".to_string(),
            enable_smart_filters: true,
            automation_scripts: Vec::new(),
            backend: BackendConfig::default(),
        }
    }
}

impl InstallerConfig {
    /// Machine-safe identifier derived from `app_name`.
    pub fn identifier(&self) -> String {
        sanitize_identifier(&self.app_name)
    }

    /// Configured projects, split and trimmed.
    pub fn projects(&self) -> Vec<String> {
        split_list(&self.project_list)
    }

    /// Configured fallback departments, split and trimmed.
    pub fn departments(&self) -> Vec<String> {
        split_list(&self.department_list)
    }

    /// Whether the backup root selection is presented to the end user.
    ///
    /// Backup selection lives on the user-info page, so it requires that
    /// page to be shown.
    pub fn backup_selection_active(&self) -> bool {
        self.collect_user_info && self.enable_backup_selection
    }

    /// Whether device names are derived from project and department.
    pub fn device_naming_active(&self) -> bool {
        self.collect_user_info && self.use_info_for_device_name
    }
}

/// Split a comma separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
