//! Cancellable timed retry used by the readiness and launcher polls.

use std::{future::Future, path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;

/// How often and how long to poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Invoke the heartbeat every this many failed attempts (0 disables it).
    pub heartbeat_every: u32,
}

impl PollPolicy {
    /// Waiting for the client's configuration tool after installation.
    pub const READINESS: PollPolicy = PollPolicy {
        interval: Duration::from_secs(1),
        max_attempts: 30,
        heartbeat_every: 5,
    };

    /// Waiting for the client's launcher.
    pub const LAUNCHER: PollPolicy = PollPolicy {
        interval: Duration::from_secs(1),
        max_attempts: 10,
        heartbeat_every: 5,
    };
}

/// Result of a polling loop.
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    Exhausted,
    Cancelled,
}

/// Run `probe` until it yields a value, the attempts run out or `cancel` fires.
///
/// `heartbeat` receives the attempt number after every `heartbeat_every`
/// failed attempts.
pub async fn poll_until<T, F, Fut>(
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut probe: F,
    mut heartbeat: impl FnMut(u32),
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        if let Some(value) = probe().await {
            return PollOutcome::Ready(value);
        }
        if policy.heartbeat_every > 0 && attempt % policy.heartbeat_every == 0 {
            heartbeat(attempt);
        }
        if attempt == policy.max_attempts {
            break;
        }
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
    PollOutcome::Exhausted
}

/// First candidate path that exists on disk.
pub async fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    for candidate in candidates {
        if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
            return Some(candidate.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const FAST: PollPolicy = PollPolicy {
        interval: Duration::from_secs(1),
        max_attempts: 30,
        heartbeat_every: 5,
    };

    #[tokio::test(start_paused = true)]
    async fn exhaustion_after_max_attempts_with_heartbeats() {
        let attempts = Cell::new(0);
        let mut beats = Vec::new();
        let started = tokio::time::Instant::now();

        let outcome: PollOutcome<()> = poll_until(
            FAST,
            &CancellationToken::new(),
            || {
                attempts.set(attempts.get() + 1);
                async { None }
            },
            |n| beats.push(n),
        )
        .await;

        assert_eq!(outcome, PollOutcome::Exhausted);
        assert_eq!(attempts.get(), 30);
        assert_eq!(beats, [5, 10, 15, 20, 25, 30]);
        assert_eq!(started.elapsed(), Duration::from_secs(29));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_value_stops_polling() {
        let attempts = Cell::new(0);
        let outcome = poll_until(
            FAST,
            &CancellationToken::new(),
            || {
                attempts.set(attempts.get() + 1);
                let n = attempts.get();
                async move { (n == 3).then_some(n) }
            },
            |_| {},
        )
        .await;
        assert_eq!(outcome, PollOutcome::Ready(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let outcome: PollOutcome<()> = poll_until(FAST, &cancel, || async { None }, |_| {}).await;
        assert_eq!(outcome, PollOutcome::Cancelled);
    }

    #[tokio::test]
    async fn first_existing_picks_earliest_present_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.exe");
        let b = dir.path().join("b.exe");
        std::fs::write(&b, b"").unwrap();
        assert_eq!(first_existing(&[a.clone(), b.clone()]).await, Some(b));
        assert_eq!(first_existing(&[a]).await, None);
    }
}
