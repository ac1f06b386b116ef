//! Smart backup filters.
//!
//! Backups include everything except what this blacklist names.

use serde::{Deserialize, Serialize};

/// Largest file the backup task uploads, in bytes (2 GiB).
pub const MAX_FILE_SIZE: u64 = 2048 * 1024 * 1024;

/// Extensions of temporary, system and executable files.
pub const JUNK_EXTENSIONS: &[&str] = &[
    "tmp", "log", "bak", "lnk", "url", "sys", "dll", "exe", "msi", "bat", "cmd", "com", "iso",
    "gho", "db", "db-shm", "db-wal", "dat",
];

/// Exact file names, plus the Office lock-file pattern.
pub const JUNK_FILE_NAMES: &[&str] = &["desktop.ini", "Thumbs.db", "~$*"];

/// Chat client cache folders. The `WeChat Files` root itself stays included.
pub const CHAT_CACHE_SUB_PATHS: &[&str] = &[
    "WeChat Files\\*\\Video",
    "WeChat Files\\*\\Msg",
    "FileStorage\\Video",
    "FileStorage\\Msg",
];

/// System directories never worth backing up.
pub const SYSTEM_DIRECTORIES: &[&str] = &[
    "C:\\Windows",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
    "C:\\ProgramData",
    "C:\\$Recycle.Bin",
];

/// Blacklist in the shape the sync client reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackList {
    pub file_extensions: Vec<String>,
    pub file_names: Vec<String>,
    pub sub_paths: Vec<String>,
    pub absolute_paths: Vec<String>,
}

impl Default for BlackList {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            file_extensions: owned(JUNK_EXTENSIONS),
            file_names: owned(JUNK_FILE_NAMES),
            sub_paths: owned(CHAT_CACHE_SUB_PATHS),
            absolute_paths: owned(SYSTEM_DIRECTORIES),
        }
    }
}

impl BlackList {
    /// Whether a file at `path` with `size` bytes is excluded from backup.
    ///
    /// Matching is case-insensitive and accepts either path separator.
    pub fn matches(&self, path: &str, size: u64) -> bool {
        if size > MAX_FILE_SIZE {
            return true;
        }

        let normalized = path.replace('/', "\\").to_lowercase();
        let segments: Vec<&str> = normalized.split('\\').filter(|s| !s.is_empty()).collect();
        let Some((file_name, dirs)) = segments.split_last() else {
            return false;
        };

        self.excludes_absolute(&normalized)
            || self.excludes_sub_path(dirs)
            || self.excludes_name(file_name)
            || self.excludes_extension(file_name)
    }

    fn excludes_absolute(&self, path: &str) -> bool {
        self.absolute_paths.iter().any(|dir| {
            let dir = dir.to_lowercase();
            path == dir || path.starts_with(&format!("{dir}\\"))
        })
    }

    fn excludes_sub_path(&self, dirs: &[&str]) -> bool {
        self.sub_paths.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            let parts: Vec<&str> = pattern.split('\\').collect();
            dirs.windows(parts.len()).any(|window| {
                window
                    .iter()
                    .zip(&parts)
                    .all(|(segment, part)| *part == "*" || segment == part)
            })
        })
    }

    fn excludes_name(&self, file_name: &str) -> bool {
        self.file_names.iter().any(|name| {
            let name = name.to_lowercase();
            match name.strip_suffix('*') {
                Some(prefix) => file_name.starts_with(prefix),
                None => file_name == name,
            }
        })
    }

    fn excludes_extension(&self, file_name: &str) -> bool {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.file_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}
