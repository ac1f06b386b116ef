//! Retry with capped exponential backoff across fallback tiers.

use super::error::{GenerationError, GenerationFailure};
use std::{future::Future, time::Duration};

/// One model to try, with its own retry budget.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationTier {
    pub model: String,
    /// Retries after the first attempt.
    pub retries: u32,
    pub initial_delay: Duration,
}

impl GenerationTier {
    pub fn new(model: impl Into<String>, retries: u32, initial_delay: Duration) -> Self {
        Self {
            model: model.into(),
            retries,
            initial_delay,
        }
    }
}

/// Tiers in fallback order plus the shared backoff shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub tiers: Vec<GenerationTier>,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                GenerationTier::new("gemini-3-pro-preview", 1, Duration::from_millis(1500)),
                GenerationTier::new("gemini-2.5-flash", 1, Duration::from_millis(1000)),
                GenerationTier::new("gemini-flash-lite-latest", 2, Duration::from_millis(1000)),
            ],
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (1-based) of `tier`.
    pub fn backoff_delay(&self, tier: &GenerationTier, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let cap = self.max_delay.as_millis() as f64;
        let millis = (tier.initial_delay.as_millis() as f64 * factor).min(cap);
        if millis.is_finite() {
            Duration::from_millis(millis.round() as u64)
        } else {
            self.max_delay
        }
    }
}

/// Run `operation` against each tier in order until one succeeds.
///
/// Within a tier, failures are retried after [`RetryConfig::backoff_delay`];
/// a tier that runs out of retries hands over to the next one immediately.
/// Errors for which [`GenerationError::aborts_all_tiers`] holds stop at once.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, GenerationFailure>
where
    F: FnMut(&GenerationTier) -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let mut attempts = 0;
    let mut last = GenerationError::NoTiers;

    for tier in &config.tiers {
        log::info!("Attempting generation with {}", tier.model);
        for retry in 0..=tier.retries {
            if retry > 0 {
                let delay = config.backoff_delay(tier, retry);
                log::warn!(
                    "Retrying {} in {}ms (retry {retry}/{})",
                    tier.model,
                    delay.as_millis(),
                    tier.retries
                );
                tokio::time::sleep(delay).await;
            }
            attempts += 1;
            match operation(tier).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    log::warn!("{} attempt failed: {e}", tier.model);
                    let abort = e.aborts_all_tiers();
                    last = e;
                    if abort {
                        return Err(GenerationFailure { attempts, last });
                    }
                }
            }
        }
        log::warn!("{} exhausted, falling back", tier.model);
    }

    Err(GenerationFailure { attempts, last })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn fast(tiers: &[(&str, u32)]) -> RetryConfig {
        RetryConfig {
            tiers: tiers
                .iter()
                .map(|(m, r)| GenerationTier::new(*m, *r, Duration::from_millis(100)))
                .collect(),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(250),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = fast(&[("a", 5)]);
        let tier = &config.tiers[0];
        assert_eq!(config.backoff_delay(tier, 1), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(tier, 2), Duration::from_millis(200));
        assert_eq!(config.backoff_delay(tier, 3), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_through_tiers_in_order() {
        let config = fast(&[("pro", 1), ("flash", 1), ("lite", 2)]);
        let calls = Mutex::new(Vec::new());

        let result = retry_with_backoff(&config, |tier| {
            calls.lock().unwrap().push(tier.model.clone());
            let model = tier.model.clone();
            async move {
                if model == "lite" {
                    Ok(model)
                } else {
                    Err(GenerationError::Empty)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "lite");
        assert_eq!(*calls.lock().unwrap(), ["pro", "pro", "flash", "flash", "lite"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_counts_every_attempt() {
        let config = fast(&[("pro", 1), ("lite", 2)]);
        let failure = retry_with_backoff(&config, |_| async { Err::<(), _>(GenerationError::Empty) })
            .await
            .unwrap_err();
        assert_eq!(failure.attempts, 5);
        assert!(matches!(failure.last, GenerationError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_key_stops_immediately() {
        let config = fast(&[("pro", 3), ("lite", 3)]);
        let failure = retry_with_backoff(&config, |_| async {
            Err::<(), _>(GenerationError::MissingApiKey)
        })
        .await
        .unwrap_err();
        assert_eq!(failure.attempts, 1);
    }

    #[tokio::test]
    async fn no_tiers_is_a_failure() {
        let config = fast(&[]);
        let failure = retry_with_backoff(&config, |_| async { Ok::<_, GenerationError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(failure.last, GenerationError::NoTiers));
    }
}
