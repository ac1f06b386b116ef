//! Remote sync backend settings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder the sync client replaces with the interactive user's name.
pub const CURRENT_USER_TOKEN: &str = "$";

/// Connection settings injected into the sync client after installation.
///
/// Credentials are carried as plain strings into generated artifacts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub enabled: bool,
    pub server_address: String,
    pub username: String,
    pub password: String,
    pub enable_ssl: bool,
    pub allow_untrusted_certificate: bool,
    /// Account the sync session runs as, `$` or `DOMAIN\$` for the current user.
    pub as_user: String,
    pub share_folder: String,
    pub remote_path: String,
    pub local_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            server_address: "192.168.1.100".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            enable_ssl: true,
            allow_untrusted_certificate: true,
            as_user: CURRENT_USER_TOKEN.to_string(),
            share_folder: "home".to_string(),
            remote_path: "/".to_string(),
            local_path: "C:\\Users\\$\\SynologyDrive".to_string(),
        }
    }
}

impl BackendConfig {
    /// Whether `as_user` names a domain account (`DOMAIN\user`).
    pub fn is_domain_qualified(&self) -> bool {
        self.as_user.contains('\\')
    }

    /// Whether the session binds to whoever is logged on at injection time.
    pub fn uses_current_user(&self) -> bool {
        self.as_user.rsplit('\\').next() == Some(CURRENT_USER_TOKEN)
    }

    /// Local sync folder with the placeholder replaced by `user`.
    pub fn local_path_for(&self, user: &str) -> String {
        self.local_path.replace(CURRENT_USER_TOKEN, user)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("enabled", &self.enabled)
            .field("server_address", &self.server_address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("enable_ssl", &self.enable_ssl)
            .field("allow_untrusted_certificate", &self.allow_untrusted_certificate)
            .field("as_user", &self.as_user)
            .field("share_folder", &self.share_folder)
            .field("remote_path", &self.remote_path)
            .field("local_path", &self.local_path)
            .finish()
    }
}
