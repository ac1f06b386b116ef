//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use installer_genie::agent::{AgentOptions, Host, PollPolicy, ResourceLayout};
use installer_genie::config::{ConfigEdit, ConfigEditor, ValidatedConfig};
use std::{
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

/// A process run recorded by [`FakeHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub elevated: bool,
}

/// Host that records calls instead of running anything.
#[derive(Clone, Default)]
pub struct FakeHost {
    pub installer_exit: i32,
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub spawned: Arc<Mutex<Vec<PathBuf>>>,
    /// Payload file contents seen when the installer ran.
    pub payload: Arc<Mutex<Option<String>>>,
}

impl FakeHost {
    pub fn failing_installer(code: i32) -> Self {
        Self {
            installer_exit: code,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, program: &Path, args: &[String], elevated: bool) -> i32 {
        self.calls.lock().unwrap().push(Call {
            program: program.to_path_buf(),
            args: args.to_vec(),
            elevated,
        });
        if program == Path::new("msiexec.exe") && args.first().map(String::as_str) == Some("/i") {
            if let Some(path) = args.iter().find_map(|a| a.strip_prefix("CONFIGPATH=")) {
                *self.payload.lock().unwrap() = std::fs::read_to_string(path).ok();
            }
            return self.installer_exit;
        }
        0
    }
}

impl Host for FakeHost {
    fn hostname(&self) -> String {
        "PC01".to_string()
    }

    async fn run_elevated(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        Ok(self.record(program, args, true))
    }

    async fn run_as_user(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        Ok(self.record(program, args, false))
    }

    fn spawn_detached(&self, program: &Path) -> io::Result<()> {
        self.spawned.lock().unwrap().push(program.to_path_buf());
        Ok(())
    }

    async fn find_product_code(&self, _display_name: &str) -> io::Result<Option<String>> {
        Ok(None)
    }
}

pub const FAST_POLL: PollPolicy = PollPolicy {
    interval: Duration::from_millis(5),
    max_attempts: 3,
    heartbeat_every: 0,
};

/// Options rooted in `dir`: temp files in `dir/tmp`, resources in
/// `dir/resources`, program files in `dir/pf`.
pub fn options(dir: &Path) -> AgentOptions {
    std::fs::create_dir_all(dir.join("tmp")).unwrap();
    std::fs::create_dir_all(dir.join("resources")).unwrap();
    AgentOptions {
        temp_dir: dir.join("tmp"),
        resources: ResourceLayout::Development(dir.to_path_buf()),
        install_roots: vec![dir.join("pf")],
        user_state_dir: None,
        readiness: FAST_POLL,
        launcher: FAST_POLL,
        response_timeout: Duration::from_secs(5),
        chunk_timeout: Duration::from_secs(5),
        cleanup_grace: Duration::from_millis(10),
        ..AgentOptions::default()
    }
}

/// Place an empty file at `root/relative`, creating parents.
pub fn touch(root: &Path, relative: &Path) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"").unwrap();
    path
}

/// Default configuration switched to bundled mode, plus `edits`.
pub fn bundled_config(edits: Vec<ConfigEdit>) -> ValidatedConfig {
    let mut editor = ConfigEditor::new();
    editor.apply(ConfigEdit::UseOnlineInstaller(false));
    editor.apply(ConfigEdit::MsiFileName("pkg.msi".into()));
    editor.apply_all(edits);
    editor.freeze().unwrap()
}
