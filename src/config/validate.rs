//! Freeze-boundary validation.
//!
//! A [`ValidatedConfig`] can only be built from a configuration that passes
//! [`check`], so producers and the agent never see an invalid snapshot.

use super::InstallerConfig;
use super::core::BackupMode;
use chrono::NaiveTime;
use std::{collections::HashSet, ops::Deref, sync::Arc};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field required by the selected mode is empty
    #[error("missing required field `{field}` ({mode})")]
    MissingField {
        field: &'static str,
        mode: &'static str,
    },

    /// Download URL is not an absolute http(s) URL
    #[error("invalid download URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A comma separated list has no entries
    #[error("`{field}` must list at least one entry")]
    EmptyList { field: &'static str },

    /// Scheduled backup start time is not `HH:MM`
    #[error("invalid backup start time `{value}` (expected HH:MM)")]
    InvalidStartTime { value: String },

    /// Automation script cannot be materialized
    #[error("invalid automation script `{name}`: {reason}")]
    InvalidScript { name: String, reason: String },

    /// `--set` named a field that does not exist
    #[error("unknown configuration field `{field}`")]
    UnknownField { field: String },

    /// `--set` value could not be parsed for its field
    #[error("invalid value `{value}` for `{field}`: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Immutable, validated configuration snapshot.
///
/// Cheap to clone; producers receive one snapshot per generation request.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedConfig(Arc<InstallerConfig>);

impl ValidatedConfig {
    /// Validate and freeze `config`.
    pub fn new(config: InstallerConfig) -> Result<Self, ConfigError> {
        validate(&config)?;
        Ok(Self(Arc::new(config)))
    }

    /// The frozen configuration.
    pub fn config(&self) -> &InstallerConfig {
        &self.0
    }
}

impl Deref for ValidatedConfig {
    type Target = InstallerConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Return the first validation error, if any.
pub fn validate(config: &InstallerConfig) -> Result<(), ConfigError> {
    match check(config).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Collect every validation error in field order.
pub fn check(config: &InstallerConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.app_name.trim().is_empty() {
        errors.push(ConfigError::MissingField {
            field: "app_name",
            mode: "always required",
        });
    }

    if config.use_online_installer {
        check_download_url(&config.download_url, &mut errors);
    } else if config.msi_file_name.trim().is_empty() {
        errors.push(ConfigError::MissingField {
            field: "msi_file_name",
            mode: "bundled mode",
        });
    } else if config.msi_file_name.contains(['/', '\\']) || config.msi_file_name.contains("..") {
        errors.push(ConfigError::InvalidValue {
            field: "msi_file_name".into(),
            value: config.msi_file_name.clone(),
            reason: "must be a bare file name inside the resources directory".into(),
        });
    }

    if config.collect_user_info {
        if config.projects().is_empty() {
            errors.push(ConfigError::EmptyList {
                field: "project_list",
            });
        }
        if config.departments().is_empty() {
            errors.push(ConfigError::EmptyList {
                field: "department_list",
            });
        }
    }

    if config.backup_selection_active()
        && config.backup_mode == BackupMode::Scheduled
        && NaiveTime::parse_from_str(config.backup_start_time.trim(), "%H:%M").is_err()
    {
        errors.push(ConfigError::InvalidStartTime {
            value: config.backup_start_time.clone(),
        });
    }

    if config.backend.enabled {
        let backend = &config.backend;
        for (field, value) in [
            ("backend.server_address", &backend.server_address),
            ("backend.username", &backend.username),
            ("backend.as_user", &backend.as_user),
            ("backend.share_folder", &backend.share_folder),
            ("backend.local_path", &backend.local_path),
        ] {
            if value.trim().is_empty() {
                errors.push(ConfigError::MissingField {
                    field,
                    mode: "remote backend enabled",
                });
            }
        }
    }

    let mut seen = HashSet::new();
    for script in &config.automation_scripts {
        let reason = if script.name.trim().is_empty() {
            Some("name is empty")
        } else if script.name.contains(['/', '\\', ':', '"', '\'']) {
            Some("name must not contain path separators or quotes")
        } else if !seen.insert(script.file_name().to_ascii_lowercase()) {
            Some("duplicate script name")
        } else {
            None
        };
        if let Some(reason) = reason {
            errors.push(ConfigError::InvalidScript {
                name: script.name.clone(),
                reason: reason.to_string(),
            });
        }
    }

    errors
}

fn check_download_url(raw: &str, errors: &mut Vec<ConfigError>) {
    if raw.trim().is_empty() {
        errors.push(ConfigError::MissingField {
            field: "download_url",
            mode: "download mode",
        });
        return;
    }

    match url::Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
        Ok(url) => errors.push(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{}`", url.scheme()),
        }),
        Err(e) => errors.push(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScriptFile, ScriptKind};

    #[test]
    fn default_config_is_valid() {
        assert!(ValidatedConfig::new(InstallerConfig::default()).is_ok());
    }

    #[test]
    fn download_mode_requires_absolute_http_url() {
        let mut config = InstallerConfig::default();
        config.download_url = "  ".into();
        assert_eq!(
            validate(&config),
            Err(ConfigError::MissingField {
                field: "download_url",
                mode: "download mode"
            })
        );

        config.download_url = "ftp://example.com/a.msi".into();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl { .. })));

        config.download_url = "relative/path.msi".into();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn bundled_mode_ignores_url_but_needs_file_name() {
        let mut config = InstallerConfig::default();
        config.use_online_installer = false;
        config.download_url.clear();
        assert!(validate(&config).is_ok());

        config.msi_file_name.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingField {
                field: "msi_file_name",
                ..
            })
        ));

        config.msi_file_name = "..\\evil.msi".into();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn user_info_requires_non_empty_lists() {
        let mut config = InstallerConfig::default();
        config.project_list = " , ".into();
        assert_eq!(
            validate(&config),
            Err(ConfigError::EmptyList {
                field: "project_list"
            })
        );

        config.collect_user_info = false;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn scheduled_mode_checks_start_time() {
        let mut config = InstallerConfig::default();
        config.backup_mode = BackupMode::Scheduled;
        config.backup_start_time = "25:61".into();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidStartTime { .. })
        ));

        config.backup_start_time = "07:30".into();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn check_collects_every_problem() {
        let mut config = InstallerConfig::default();
        config.app_name.clear();
        config.backend.server_address.clear();
        config.automation_scripts = vec![
            ScriptFile::new("a", ScriptKind::Batch),
            ScriptFile::new("A.bat", ScriptKind::Batch),
        ];

        let errors = check(&config);
        assert_eq!(errors.len(), 3, "{errors:?}");
    }
}
