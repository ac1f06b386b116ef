//! Backend configuration payload read by the sync client's installer.

use crate::config::{BackendConfig, BackupMode};
use crate::policy::{BackupSelection, BlackList, MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};

/// Sync direction of the single session every deployment creates.
pub const SYNC_DIRECTION: &str = "BIDIRECTION";

/// Top-level payload document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendPayload {
    pub connections: Vec<Connection>,
    #[serde(flatten)]
    pub backup: BackupFields,
}

/// One server connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub server_address: String,
    pub username: String,
    pub password: String,
    pub as_user: String,
    pub enable_ssl: bool,
    pub allow_untrusted_certificate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computer_name: Option<String>,
    pub sync_sessions: Vec<SyncSession>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSession {
    pub sharefolder: String,
    pub remote_path: String,
    pub local_path: String,
    pub sync_direction: String,
}

/// Optional backup task settings, flattened into the top level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_mode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_list: Option<BlackList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
}

impl Connection {
    /// Connection without a device name, from the backend settings.
    pub fn from_backend(backend: &BackendConfig) -> Self {
        Self {
            server_address: backend.server_address.clone(),
            username: backend.username.clone(),
            password: backend.password.clone(),
            as_user: backend.as_user.clone(),
            enable_ssl: backend.enable_ssl,
            allow_untrusted_certificate: backend.allow_untrusted_certificate,
            computer_name: None,
            sync_sessions: vec![SyncSession {
                sharefolder: backend.share_folder.clone(),
                remote_path: backend.remote_path.clone(),
                local_path: backend.local_path.clone(),
                sync_direction: SYNC_DIRECTION.to_string(),
            }],
        }
    }
}

/// Backup schedule fixed at plan time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSchedule {
    pub mode: BackupMode,
    /// `HH:MM`, only for scheduled mode.
    pub start_time: Option<String>,
}

/// Everything about the payload that is known before the end user's choices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPlan {
    pub connection: Connection,
    pub device_naming: bool,
    /// Present when backup selection is offered.
    pub backup: Option<BackupSchedule>,
    pub smart_filters: bool,
}

impl BackendPlan {
    /// Backup fields that do not depend on the selected roots.
    pub fn static_backup_fields(&self) -> BackupFields {
        BackupFields {
            backup_path: None,
            backup_mode: self.backup.as_ref().map(|b| b.mode.code()),
            backup_start_time: self.backup.as_ref().and_then(|b| b.start_time.clone()),
            black_list: self.smart_filters.then(BlackList::default),
            max_file_size: self.smart_filters.then_some(MAX_FILE_SIZE),
        }
    }
}

/// Device identifier in `project-department-hostname` form.
pub fn device_identifier(project: &str, department: &str, hostname: &str) -> String {
    format!("{project}-{department}-{hostname}")
}

impl BackendPayload {
    /// Combine the plan with the end user's choices and the host name.
    pub fn assemble(
        plan: &BackendPlan,
        project: &str,
        department: &str,
        roots: &BackupSelection,
        hostname: &str,
    ) -> Self {
        let mut connection = plan.connection.clone();
        if plan.device_naming {
            connection.computer_name = Some(device_identifier(project, department, hostname));
        }

        let mut backup = plan.static_backup_fields();
        if plan.backup.is_some() {
            backup.backup_path = Some(roots.iter().map(|r| r.backup_path().to_string()).collect());
        }

        Self {
            connections: vec![connection],
            backup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::BackupRoot;

    fn plan(device_naming: bool, backup: Option<BackupSchedule>, smart_filters: bool) -> BackendPlan {
        BackendPlan {
            connection: Connection::from_backend(&BackendConfig::default()),
            device_naming,
            backup,
            smart_filters,
        }
    }

    #[test]
    fn device_identifier_has_no_brackets() {
        assert_eq!(device_identifier("峰景", "客户服务部", "PC01"), "峰景-客户服务部-PC01");
    }

    #[test]
    fn minimal_payload_omits_optional_fields() {
        let payload = BackendPayload::assemble(
            &plan(false, None, false),
            "",
            "",
            &BackupSelection::new(),
            "PC01",
        );
        let json = serde_json::to_value(&payload).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), ["connections"]);
        assert!(json["connections"][0].get("computer_name").is_none());
        assert_eq!(json["connections"][0]["sync_sessions"][0]["sync_direction"], "BIDIRECTION");
    }

    #[test]
    fn scheduled_backup_carries_start_time() {
        let schedule = BackupSchedule {
            mode: BackupMode::Scheduled,
            start_time: Some("22:00".into()),
        };
        let roots = BackupSelection::from_toggles([BackupRoot::Desktop, BackupRoot::E]);
        let payload = BackendPayload::assemble(&plan(true, Some(schedule), false), "p", "d", &roots, "h");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["backup_mode"], 2);
        assert_eq!(json["backup_start_time"], "22:00");
        assert_eq!(json["backup_path"], serde_json::json!(["C:\\Users\\$\\Desktop", "E:\\"]));
        assert_eq!(json["connections"][0]["computer_name"], "p-d-h");
        assert!(json.get("black_list").is_none());
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = BackendPayload::assemble(
            &plan(true, None, true),
            "a",
            "b",
            &BackupSelection::new(),
            "c",
        );
        let text = serde_json::to_string(&payload).unwrap();
        assert_eq!(serde_json::from_str::<BackendPayload>(&text).unwrap(), payload);
    }
}
