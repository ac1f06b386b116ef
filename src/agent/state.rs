//! Run state and the two notification channels.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Deployment phase.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Acquiring,
    Installing,
    Configuring,
    Launching,
    Done,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Acquiring => "acquiring",
            Phase::Installing => "installing",
            Phase::Configuring => "configuring",
            Phase::Launching => "launching",
            Phase::Done => "done",
            Phase::Failed => "failed",
        })
    }
}

/// Overall progress of a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Progress {
    Percent(u8),
    Indeterminate,
}

/// Snapshot of a run, owned by its [`Reporter`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub phase: Phase,
    pub progress: Option<Progress>,
    pub log: Vec<String>,
}

/// Receiving ends handed to the presentation layer.
#[derive(Debug)]
pub struct RunEvents {
    pub log_lines: mpsc::UnboundedReceiver<String>,
    pub progress: mpsc::UnboundedReceiver<Progress>,
}

/// Records run state and forwards it to the presentation layer.
///
/// Sends never block; a dropped receiver only stops forwarding.
#[derive(Debug)]
pub struct Reporter {
    state: RunState,
    log_tx: mpsc::UnboundedSender<String>,
    progress_tx: mpsc::UnboundedSender<Progress>,
}

impl Reporter {
    /// A reporter together with the receiving ends of its channels.
    pub fn channel() -> (Reporter, RunEvents) {
        let (log_tx, log_lines) = mpsc::unbounded_channel();
        let (progress_tx, progress) = mpsc::unbounded_channel();
        (
            Reporter {
                state: RunState::default(),
                log_tx,
                progress_tx,
            },
            RunEvents {
                log_lines,
                progress,
            },
        )
    }

    /// A reporter nobody listens to.
    pub fn detached() -> Reporter {
        Self::channel().0
    }

    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{line}");
        self.state.log.push(line.clone());
        let _ = self.log_tx.send(line);
    }

    pub fn progress(&mut self, progress: Progress) {
        if self.state.progress == Some(progress) {
            return;
        }
        self.state.progress = Some(progress);
        let _ = self.progress_tx.send(progress);
    }

    pub fn phase(&mut self, phase: Phase) {
        log::debug!("phase -> {phase}");
        self.state.phase = phase;
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn into_state(self) -> RunState {
        self.state
    }
}
