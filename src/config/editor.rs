//! Single owner of the mutable configuration.
//!
//! Every mutation is a [`ConfigEdit`] command applied by [`ConfigEditor`];
//! [`ConfigEditor::freeze`] hands out an immutable [`ValidatedConfig`].

use super::{
    BackupMode, ConfigError, InstallerConfig, ScriptFile, ValidatedConfig,
};

/// A single field-level change to the configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigEdit {
    AppName(String),
    AppVersion(String),
    Publisher(String),
    MsiFileName(String),
    DownloadUrl(String),
    UseOnlineInstaller(bool),
    WelcomeMessage(String),
    WarningTitle(String),
    WarningMessage(String),
    LicenseText(String),
    RunAsAdmin(bool),
    SilentInstall(bool),
    ForceCleanInstall(bool),
    CollectUserInfo(bool),
    ProjectList(String),
    DepartmentList(String),
    UseInfoForDeviceName(bool),
    EnableBackupSelection(bool),
    BackupMode(BackupMode),
    BackupStartTime(String),
    EnableSmartFilters(bool),
    /// Appends a script, replacing one with the same name.
    AddScript(ScriptFile),
    RemoveScript(String),
    Backend(BackendEdit),
}

/// A change to the remote backend settings.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendEdit {
    Enabled(bool),
    ServerAddress(String),
    Username(String),
    Password(String),
    EnableSsl(bool),
    AllowUntrustedCertificate(bool),
    AsUser(String),
    ShareFolder(String),
    RemotePath(String),
    LocalPath(String),
}

impl ConfigEdit {
    /// Parse a `field=value` assignment as given on the command line.
    pub fn parse_assignment(assignment: &str) -> Result<Self, ConfigError> {
        let (field, value) =
            assignment
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: assignment.to_string(),
                    value: String::new(),
                    reason: "expected `field=value`".to_string(),
                })?;
        Self::parse(field.trim(), value)
    }

    /// Build an edit from a field name and its textual value.
    pub fn parse(field: &str, value: &str) -> Result<Self, ConfigError> {
        let text = || value.to_string();
        let flag = || parse_bool(field, value);

        let edit = match field {
            "app_name" => ConfigEdit::AppName(text()),
            "app_version" => ConfigEdit::AppVersion(text()),
            "publisher" => ConfigEdit::Publisher(text()),
            "msi_file_name" => ConfigEdit::MsiFileName(text()),
            "download_url" => ConfigEdit::DownloadUrl(text()),
            "use_online_installer" => ConfigEdit::UseOnlineInstaller(flag()?),
            "welcome_message" => ConfigEdit::WelcomeMessage(text()),
            "warning_title" => ConfigEdit::WarningTitle(text()),
            "warning_message" => ConfigEdit::WarningMessage(text()),
            "license_text" => ConfigEdit::LicenseText(text()),
            "run_as_admin" => ConfigEdit::RunAsAdmin(flag()?),
            "silent_install" => ConfigEdit::SilentInstall(flag()?),
            "force_clean_install" => ConfigEdit::ForceCleanInstall(flag()?),
            "collect_user_info" => ConfigEdit::CollectUserInfo(flag()?),
            "project_list" => ConfigEdit::ProjectList(text()),
            "department_list" => ConfigEdit::DepartmentList(text()),
            "use_info_for_device_name" => ConfigEdit::UseInfoForDeviceName(flag()?),
            "enable_backup_selection" => ConfigEdit::EnableBackupSelection(flag()?),
            "backup_mode" => ConfigEdit::BackupMode(value.parse().map_err(|reason| {
                ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: text(),
                    reason,
                }
            })?),
            "backup_start_time" => ConfigEdit::BackupStartTime(text()),
            "enable_smart_filters" => ConfigEdit::EnableSmartFilters(flag()?),
            "backend.enabled" => ConfigEdit::Backend(BackendEdit::Enabled(flag()?)),
            "backend.server_address" => ConfigEdit::Backend(BackendEdit::ServerAddress(text())),
            "backend.username" => ConfigEdit::Backend(BackendEdit::Username(text())),
            "backend.password" => ConfigEdit::Backend(BackendEdit::Password(text())),
            "backend.enable_ssl" => ConfigEdit::Backend(BackendEdit::EnableSsl(flag()?)),
            "backend.allow_untrusted_certificate" => {
                ConfigEdit::Backend(BackendEdit::AllowUntrustedCertificate(flag()?))
            }
            "backend.as_user" => ConfigEdit::Backend(BackendEdit::AsUser(text())),
            "backend.share_folder" => ConfigEdit::Backend(BackendEdit::ShareFolder(text())),
            "backend.remote_path" => ConfigEdit::Backend(BackendEdit::RemotePath(text())),
            "backend.local_path" => ConfigEdit::Backend(BackendEdit::LocalPath(text())),
            other => {
                return Err(ConfigError::UnknownField {
                    field: other.to_string(),
                });
            }
        };
        Ok(edit)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "expected a boolean (true/false, yes/no)".to_string(),
        }),
    }
}

/// Owns the draft configuration and applies edits to it.
#[derive(Debug, Default)]
pub struct ConfigEditor {
    draft: InstallerConfig,
}

impl ConfigEditor {
    /// Starts from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one loaded from disk.
    pub fn from_config(config: InstallerConfig) -> Self {
        Self { draft: config }
    }

    /// Current draft, possibly invalid.
    pub fn draft(&self) -> &InstallerConfig {
        &self.draft
    }

    /// Apply one edit.
    pub fn apply(&mut self, edit: ConfigEdit) -> &mut Self {
        let c = &mut self.draft;
        match edit {
            ConfigEdit::AppName(v) => c.app_name = v,
            ConfigEdit::AppVersion(v) => c.app_version = v,
            ConfigEdit::Publisher(v) => c.publisher = v,
            ConfigEdit::MsiFileName(v) => c.msi_file_name = v,
            ConfigEdit::DownloadUrl(v) => c.download_url = v,
            ConfigEdit::UseOnlineInstaller(v) => c.use_online_installer = v,
            ConfigEdit::WelcomeMessage(v) => c.welcome_message = v,
            ConfigEdit::WarningTitle(v) => c.warning_title = v,
            ConfigEdit::WarningMessage(v) => c.warning_message = v,
            ConfigEdit::LicenseText(v) => c.license_text = v,
            ConfigEdit::RunAsAdmin(v) => c.run_as_admin = v,
            ConfigEdit::SilentInstall(v) => c.silent_install = v,
            ConfigEdit::ForceCleanInstall(v) => c.force_clean_install = v,
            ConfigEdit::CollectUserInfo(v) => c.collect_user_info = v,
            ConfigEdit::ProjectList(v) => c.project_list = v,
            ConfigEdit::DepartmentList(v) => c.department_list = v,
            ConfigEdit::UseInfoForDeviceName(v) => c.use_info_for_device_name = v,
            ConfigEdit::EnableBackupSelection(v) => c.enable_backup_selection = v,
            ConfigEdit::BackupMode(v) => c.backup_mode = v,
            ConfigEdit::BackupStartTime(v) => c.backup_start_time = v,
            ConfigEdit::EnableSmartFilters(v) => c.enable_smart_filters = v,
            ConfigEdit::AddScript(script) => {
                match c.automation_scripts.iter_mut().find(|s| s.name == script.name) {
                    Some(existing) => *existing = script,
                    None => c.automation_scripts.push(script),
                }
            }
            ConfigEdit::RemoveScript(name) => c.automation_scripts.retain(|s| s.name != name),
            ConfigEdit::Backend(edit) => {
                let b = &mut c.backend;
                match edit {
                    BackendEdit::Enabled(v) => b.enabled = v,
                    BackendEdit::ServerAddress(v) => b.server_address = v,
                    BackendEdit::Username(v) => b.username = v,
                    BackendEdit::Password(v) => b.password = v,
                    BackendEdit::EnableSsl(v) => b.enable_ssl = v,
                    BackendEdit::AllowUntrustedCertificate(v) => b.allow_untrusted_certificate = v,
                    BackendEdit::AsUser(v) => b.as_user = v,
                    BackendEdit::ShareFolder(v) => b.share_folder = v,
                    BackendEdit::RemotePath(v) => b.remote_path = v,
                    BackendEdit::LocalPath(v) => b.local_path = v,
                }
            }
        }
        self
    }

    /// Apply edits in order.
    pub fn apply_all(&mut self, edits: impl IntoIterator<Item = ConfigEdit>) -> &mut Self {
        for edit in edits {
            self.apply(edit);
        }
        self
    }

    /// Validate a copy of the draft without giving up ownership.
    pub fn snapshot(&self) -> Result<ValidatedConfig, ConfigError> {
        ValidatedConfig::new(self.draft.clone())
    }

    /// Validate and freeze the draft.
    pub fn freeze(self) -> Result<ValidatedConfig, ConfigError> {
        ValidatedConfig::new(self.draft)
    }
}
