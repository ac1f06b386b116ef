//! Launch phase.

use super::{
    AgentError,
    host::Host,
    options::AgentOptions,
    poll::{self, PollOutcome},
    state::Reporter,
};
use tokio_util::sync::CancellationToken;

/// Start the client's launcher once it exists. Only cancellation is an error.
pub async fn launch<H: Host>(
    host: &H,
    options: &AgentOptions,
    reporter: &mut Reporter,
    cancel: &CancellationToken,
) -> Result<(), AgentError> {
    let candidates = options.launcher_candidates();
    let max = options.launcher.max_attempts;
    let outcome = poll::poll_until(
        options.launcher,
        cancel,
        || poll::first_existing(&candidates),
        |attempt| reporter.log(format!("Still waiting for the launcher ({attempt}/{max})")),
    )
    .await;

    match outcome {
        PollOutcome::Ready(launcher) => match host.spawn_detached(&launcher) {
            Ok(()) => reporter.log("Sync client started"),
            Err(e) => reporter.log(format!("Could not start the sync client ({e})")),
        },
        PollOutcome::Exhausted => {
            reporter.log("Launcher not found, start the sync client manually")
        }
        PollOutcome::Cancelled => return Err(AgentError::Cancelled),
    }
    Ok(())
}
