//! Operating system seam used by the agent.
//!
//! [`SystemHost`] talks to the real machine. Elevation goes through
//! PowerShell `Start-Process -Verb RunAs`, which triggers the consent
//! prompt and waits for the child's exit code.

use std::{
    future::Future,
    io,
    path::Path,
    process::Stdio,
};
use tokio::process::Command;

/// Process and machine operations the agent needs.
pub trait Host: Send + Sync {
    /// Machine host name, used in device identifiers.
    fn hostname(&self) -> String;

    /// Run `program` with administrator rights and wait for its exit code.
    fn run_elevated(
        &self,
        program: &Path,
        args: &[String],
    ) -> impl Future<Output = io::Result<i32>> + Send;

    /// Run `program` as the interactive user and wait for its exit code.
    fn run_as_user(
        &self,
        program: &Path,
        args: &[String],
    ) -> impl Future<Output = io::Result<i32>> + Send;

    /// Start `program` without waiting for it.
    fn spawn_detached(&self, program: &Path) -> io::Result<()>;

    /// Product code of the installed package whose display name starts with `display_name`.
    fn find_product_code(
        &self,
        display_name: &str,
    ) -> impl Future<Output = io::Result<Option<String>>> + Send;
}

/// The real machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn hostname(&self) -> String {
        sysinfo::System::host_name()
            .or_else(|| std::env::var("COMPUTERNAME").ok())
            .unwrap_or_else(|| "UNKNOWN-HOST".to_string())
    }

    async fn run_elevated(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        if cfg!(windows) {
            run_powershell(&start_process_script(program, args, true)).await
        } else {
            run(program, args).await
        }
    }

    async fn run_as_user(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        run(program, args).await
    }

    fn spawn_detached(&self, program: &Path) -> io::Result<()> {
        let mut command = std::process::Command::new(program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            command.creation_flags(DETACHED_PROCESS);
        }
        command.spawn().map(|_| ())
    }

    async fn find_product_code(&self, display_name: &str) -> io::Result<Option<String>> {
        if !cfg!(windows) {
            return Ok(None);
        }
        let output = Command::new("powershell.exe")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(uninstall_query_script(display_name))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_product_code(&String::from_utf8_lossy(&output.stdout)))
    }
}

async fn run(program: &Path, args: &[String]) -> io::Result<i32> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await?;
    Ok(status.code().unwrap_or(-1))
}

async fn run_powershell(script: &str) -> io::Result<i32> {
    let status = Command::new("powershell.exe")
        .args([
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            script,
        ])
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await?;
    Ok(status.code().unwrap_or(-1))
}

/// Quote `value` as a PowerShell single-quoted string literal.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote one command-line argument for a Windows Installer style command line.
///
/// `NAME=value` properties keep the name bare and quote the value.
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }
    if !arg.contains(char::is_whitespace) || arg.starts_with('"') {
        return arg.to_string();
    }
    match arg.split_once('=') {
        Some((name, value))
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            format!("{name}=\"{value}\"")
        }
        _ => format!("\"{arg}\""),
    }
}

/// PowerShell that starts `program`, waits, and exits with its exit code.
pub fn start_process_script(program: &Path, args: &[String], elevated: bool) -> String {
    let mut script = format!(
        "$p = Start-Process -FilePath {}",
        ps_quote(&program.display().to_string())
    );
    if !args.is_empty() {
        let list: Vec<String> = args.iter().map(|a| ps_quote(&quote_arg(a))).collect();
        script.push_str(&format!(" -ArgumentList @({})", list.join(",")));
    }
    if elevated {
        script.push_str(" -Verb RunAs");
    }
    script.push_str(" -Wait -PassThru; exit $p.ExitCode");
    script
}

fn uninstall_query_script(display_name: &str) -> String {
    format!(
        "Get-ItemProperty 'HKLM:\\Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\*',\
         'HKLM:\\Software\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\*' \
         -ErrorAction SilentlyContinue | Where-Object {{ $_.DisplayName -like {} }} | \
         Select-Object -First 1 -ExpandProperty PSChildName",
        ps_quote(&format!("{display_name}*"))
    )
}

fn parse_product_code(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('{') && line.ends_with('}'))
        .map(String::from)
}
