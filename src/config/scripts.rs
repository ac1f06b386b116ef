//! Post-install automation scripts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interpreter family of an automation script.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    #[default]
    Powershell,
    Batch,
    Vbs,
}

impl ScriptKind {
    /// File extension expected by the interpreter.
    pub fn extension(self) -> &'static str {
        match self {
            ScriptKind::Powershell => "ps1",
            ScriptKind::Batch => "bat",
            ScriptKind::Vbs => "vbs",
        }
    }

    /// Interpreter executable for this kind.
    pub fn interpreter(self) -> &'static str {
        match self {
            ScriptKind::Powershell => "powershell.exe",
            ScriptKind::Batch => "cmd.exe",
            ScriptKind::Vbs => "cscript.exe",
        }
    }

    /// Interpreter arguments that execute the script at `path`.
    pub fn interpreter_args(self, path: &str) -> Vec<String> {
        match self {
            ScriptKind::Powershell => vec![
                "-NoProfile".into(),
                "-ExecutionPolicy".into(),
                "Bypass".into(),
                "-File".into(),
                path.into(),
            ],
            ScriptKind::Batch => vec!["/C".into(), path.into()],
            ScriptKind::Vbs => vec!["//nologo".into(), path.into()],
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScriptKind::Powershell => "powershell",
            ScriptKind::Batch => "batch",
            ScriptKind::Vbs => "vbs",
        })
    }
}

impl std::str::FromStr for ScriptKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "powershell" | "ps1" => Ok(ScriptKind::Powershell),
            "batch" | "bat" | "cmd" => Ok(ScriptKind::Batch),
            "vbs" | "vbscript" => Ok(ScriptKind::Vbs),
            other => Err(format!("unknown script kind `{other}`")),
        }
    }
}

/// A named post-install script carried verbatim into artifacts.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScriptFile {
    pub name: String,
    #[serde(default)]
    pub kind: ScriptKind,
    #[serde(default)]
    pub content: String,
}

impl ScriptFile {
    /// Creates a script with empty content.
    pub fn new(name: impl Into<String>, kind: ScriptKind) -> Self {
        Self {
            name: name.into(),
            kind,
            content: String::new(),
        }
    }

    /// Sets the script body.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// File name used when the script is materialized on the target machine.
    ///
    /// The kind's extension is appended unless the name already carries it.
    pub fn file_name(&self) -> String {
        let ext = self.kind.extension();
        let lower = self.name.to_ascii_lowercase();
        if lower.ends_with(&format!(".{ext}")) {
            self.name.clone()
        } else {
            format!("{}.{ext}", self.name)
        }
    }
}
