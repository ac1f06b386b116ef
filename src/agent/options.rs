//! Agent runtime options.

use super::poll::PollPolicy;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

/// Where the sync client puts its files once installed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientLayout {
    /// Prefix of the `DisplayName` in the uninstall registry.
    pub display_name: String,
    /// Per-user state directory name under the local app data directory.
    pub state_dir_name: String,
    /// Configuration tool relative to a program-files root.
    pub connect_tool: PathBuf,
    /// Launcher relative to a program-files root.
    pub launcher: PathBuf,
    /// Argument preceding the payload path when invoking the connect tool.
    pub config_flag: String,
}

impl Default for ClientLayout {
    fn default() -> Self {
        let bin = Path::new("Synology").join("SynologyDrive").join("bin");
        Self {
            display_name: "Synology Drive Client".to_string(),
            state_dir_name: "SynologyDrive".to_string(),
            connect_tool: bin.join("cloud-drive-connect.exe"),
            launcher: bin.join("launcher.exe"),
            config_flag: "--config".to_string(),
        }
    }
}

/// How the bundled package is located.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceLayout {
    /// `resources/` next to the working directory.
    Development(PathBuf),
    /// `resources/` next to the running executable.
    Packaged(PathBuf),
}

impl ResourceLayout {
    /// Development layout for debug builds, packaged layout otherwise.
    pub fn detect() -> Self {
        if cfg!(debug_assertions) {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            ResourceLayout::Development(cwd)
        } else {
            let exe_dir = env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."));
            ResourceLayout::Packaged(exe_dir)
        }
    }

    pub fn base(&self) -> &Path {
        match self {
            ResourceLayout::Development(p) | ResourceLayout::Packaged(p) => p,
        }
    }

    /// Full path of a bundled resource file.
    pub fn resource(&self, file_name: &str) -> PathBuf {
        self.base().join("resources").join(file_name)
    }
}

/// Timeouts, poll ceilings and locations used by a run.
#[derive(Clone, Debug)]
pub struct AgentOptions {
    pub temp_dir: PathBuf,
    pub resources: ResourceLayout,
    /// Program-files roots searched for the client's executables.
    pub install_roots: Vec<PathBuf>,
    /// Per-user state directory wiped by a forced clean install.
    pub user_state_dir: Option<PathBuf>,
    pub client: ClientLayout,
    pub readiness: PollPolicy,
    pub launcher: PollPolicy,
    pub connect_timeout: Duration,
    /// Wait for response headers.
    pub response_timeout: Duration,
    /// Wait between body chunks.
    pub chunk_timeout: Duration,
    /// Delay before temp files are deleted.
    pub cleanup_grace: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        let client = ClientLayout::default();
        let user_state_dir = dirs::data_local_dir().map(|d| d.join(&client.state_dir_name));
        Self {
            temp_dir: env::temp_dir(),
            resources: ResourceLayout::detect(),
            install_roots: program_files_roots(),
            user_state_dir,
            client,
            readiness: PollPolicy::READINESS,
            launcher: PollPolicy::LAUNCHER,
            connect_timeout: Duration::from_secs(15),
            response_timeout: Duration::from_secs(30),
            chunk_timeout: Duration::from_secs(60),
            cleanup_grace: Duration::from_secs(5),
        }
    }
}

impl AgentOptions {
    /// Candidate locations of the configuration tool.
    pub fn connect_tool_candidates(&self) -> Vec<PathBuf> {
        self.candidates(&self.client.connect_tool)
    }

    /// Candidate locations of the launcher.
    pub fn launcher_candidates(&self) -> Vec<PathBuf> {
        self.candidates(&self.client.launcher)
    }

    fn candidates(&self, relative: &Path) -> Vec<PathBuf> {
        self.install_roots.iter().map(|root| root.join(relative)).collect()
    }
}

/// Both program-files roots, from the environment when available.
fn program_files_roots() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for (var, fallback) in [
        ("ProgramFiles", "C:\\Program Files"),
        ("ProgramFiles(x86)", "C:\\Program Files (x86)"),
    ] {
        let root = env::var_os(var)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(fallback));
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}
