//! Configure phase: payload file, configuration injection, automation scripts.

use super::{
    AgentError,
    host::Host,
    options::AgentOptions,
    payload::BackendPayload,
    poll::{self, PollOutcome},
    state::Reporter,
};
use crate::config::ScriptFile;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Write the payload as pretty JSON.
pub async fn write_payload(path: &Path, payload: &BackendPayload) -> Result<(), AgentError> {
    let json = serde_json::to_vec_pretty(payload)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| AgentError::io(format!("writing {}", path.display()), e))
}

/// Wait for the client's configuration tool and hand it the payload.
///
/// Only cancellation is returned as an error; everything else is logged.
pub async fn inject<H: Host>(
    host: &H,
    options: &AgentOptions,
    config_path: &Path,
    reporter: &mut Reporter,
    cancel: &CancellationToken,
) -> Result<(), AgentError> {
    reporter.log("Waiting for the sync client to become ready");
    let candidates = options.connect_tool_candidates();
    let max = options.readiness.max_attempts;

    let outcome = poll::poll_until(
        options.readiness,
        cancel,
        || poll::first_existing(&candidates),
        |attempt| reporter.log(format!("Still waiting for the sync client ({attempt}/{max})")),
    )
    .await;

    let tool = match outcome {
        PollOutcome::Ready(tool) => tool,
        PollOutcome::Exhausted => {
            reporter.log(format!(
                "Sync client not found after {max} attempts, skipping configuration"
            ));
            return Ok(());
        }
        PollOutcome::Cancelled => return Err(AgentError::Cancelled),
    };

    reporter.log("Applying server configuration");
    let args = vec![
        options.client.config_flag.clone(),
        config_path.display().to_string(),
    ];
    let run = host.run_as_user(&tool, &args);
    let result = tokio::select! {
        _ = cancel.cancelled() => return Err(AgentError::Cancelled),
        r = run => r,
    };
    match result {
        Ok(0) => reporter.log("Server configuration applied"),
        Ok(code) => reporter.log(format!("Configuration tool exited with code {code}, continuing")),
        Err(e) => reporter.log(format!("Configuration tool could not run ({e}), continuing")),
    }
    Ok(())
}

/// Write each non-empty script to the temp directory and run it.
///
/// Returns the written files so they can be cleaned up. Script failures
/// are logged and never fail the run.
pub async fn run_scripts<H: Host>(
    host: &H,
    scripts: &[ScriptFile],
    temp_dir: &Path,
    token: &str,
    reporter: &mut Reporter,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>, AgentError> {
    let mut written = Vec::new();

    for script in scripts {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        if script.content.trim().is_empty() {
            reporter.log(format!("Script {} is empty, skipped", script.name));
            continue;
        }

        let path = temp_dir.join(format!("{token}-{}", script.file_name()));
        if let Err(e) = tokio::fs::write(&path, &script.content).await {
            reporter.log(format!("Could not write script {} ({e}), skipped", script.name));
            continue;
        }
        written.push(path.clone());

        reporter.log(format!("Running {} script {}", script.kind, script.name));
        let program = PathBuf::from(script.kind.interpreter());
        let args = script.kind.interpreter_args(&path.display().to_string());
        let run = host.run_as_user(&program, &args);
        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            r = run => r,
        };
        match result {
            Ok(0) => reporter.log(format!("Script {} finished", script.name)),
            Ok(code) => reporter.log(format!("Script {} exited with code {code}", script.name)),
            Err(e) => reporter.log(format!("Script {} could not run ({e})", script.name)),
        }
    }

    Ok(written)
}
