//! Delegated script generation.
//!
//! Asks a text-generation service for an Inno Setup script, falling back
//! through [`RetryConfig::tiers`]. Output that breaks the directive contract
//! counts as a failed attempt.

mod client;
mod error;
mod prompt;
mod retry;

pub use client::{DEFAULT_ENDPOINT, TextGenerationClient, TextGenerator};
pub use error::{GenerationError, GenerationFailure};
pub use prompt::{system_instruction, user_prompt};
pub use retry::{GenerationTier, RetryConfig, retry_with_backoff};

use super::{
    Artifact, ArtifactFile, ArtifactKind, ArtifactProducer, Result, Strategy,
    script::{SCRIPT_FILE_NAME, validate_script},
};
use crate::agent::ClientLayout;
use crate::config::ValidatedConfig;

/// Produces a script through a [`TextGenerator`].
#[derive(Debug, Clone)]
pub struct GenerativeProducer<G = TextGenerationClient> {
    generator: G,
    retry: RetryConfig,
    client: ClientLayout,
}

impl<G: TextGenerator> GenerativeProducer<G> {
    pub fn new(generator: G, retry: RetryConfig) -> Self {
        Self {
            generator,
            retry,
            client: ClientLayout::default(),
        }
    }

    /// Generate and check a script, retrying across tiers.
    pub async fn generate(&self, config: &ValidatedConfig) -> std::result::Result<String, GenerationFailure> {
        let system = system_instruction();
        let prompt = user_prompt(config, &self.client);
        let generator = &self.generator;
        let (system, prompt) = (system.as_str(), prompt.as_str());

        retry_with_backoff(&self.retry, |tier| {
            let model = tier.model.clone();
            async move {
                let raw = generator.generate(&model, system, prompt).await?;
                let script = strip_code_fences(&raw);
                if script.trim().is_empty() {
                    return Err(GenerationError::Empty);
                }
                validate_script(&script).map_err(GenerationError::InvalidOutput)?;
                log::info!("{model} produced a conforming script");
                Ok(script)
            }
        })
        .await
    }
}

impl<G: TextGenerator> ArtifactProducer for GenerativeProducer<G> {
    fn strategy(&self) -> Strategy {
        Strategy::Generative
    }

    async fn produce(&self, config: &ValidatedConfig) -> Result<Artifact> {
        let script = self.generate(config).await?;
        Ok(Artifact {
            kind: ArtifactKind::Script,
            files: vec![ArtifactFile::new(SCRIPT_FILE_NAME, script).with_bom()],
        })
    }
}

/// Remove a surrounding Markdown code fence, if the service added one.
///
/// Non-empty output always ends with exactly one newline.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let body = match trimmed.strip_prefix("```") {
        Some(rest) => {
            // Drop the info string (`iss`, `pascal`, ...) on the opening line.
            let body = rest.split_once('\n').map_or("", |(_, body)| body).trim_end();
            body.strip_suffix("```").unwrap_or(body).trim_end()
        }
        None => trimmed,
    };
    if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigEditor;
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    const GOOD: &str = "[Setup]\nAppName=Demo\nWizardStyle=modern\nOutputBaseFilename=demo\n";

    /// Answers from a fixed queue and records the models asked.
    #[derive(Clone, Default)]
    struct Scripted {
        answers: Arc<Mutex<Vec<std::result::Result<String, u16>>>>,
        models: Arc<Mutex<Vec<String>>>,
    }

    impl TextGenerator for Scripted {
        async fn generate(
            &self,
            model: &str,
            _system: &str,
            _prompt: &str,
        ) -> std::result::Result<String, GenerationError> {
            self.models.lock().unwrap().push(model.to_string());
            match self.answers.lock().unwrap().remove(0) {
                Ok(text) => Ok(text),
                Err(status) => Err(GenerationError::Status {
                    status,
                    message: "boom".into(),
                }),
            }
        }
    }

    fn retry() -> RetryConfig {
        RetryConfig {
            tiers: vec![
                GenerationTier::new("pro", 1, Duration::from_millis(10)),
                GenerationTier::new("flash", 0, Duration::from_millis(10)),
            ],
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(50),
        }
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```iss\n[Setup]\nA=b\n```\n"), "[Setup]\nA=b\n");
        assert_eq!(strip_code_fences("  [Setup]\n"), "[Setup]\n");
        assert_eq!(strip_code_fences("```\n```"), "");
    }

    #[test]
    fn fenced_and_bare_output_give_the_same_bytes() {
        let bare = strip_code_fences("[Setup]\nA=b");
        assert_eq!(bare, strip_code_fences("```iss\n[Setup]\nA=b\n```"));
        assert_eq!(bare, strip_code_fences("\n[Setup]\nA=b\n\n\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_output_falls_back_to_next_tier() {
        let generator = Scripted::default();
        *generator.answers.lock().unwrap() = vec![
            Err(503),
            Ok("[Setup]\nUseAbsolutePaths=no\nWizardStyle=modern\n".into()),
            Ok(format!("```\n{GOOD}```")),
        ];
        let producer = GenerativeProducer::new(generator.clone(), retry());
        let config = ConfigEditor::new().freeze().unwrap();

        let artifact = producer.produce(&config).await.unwrap();

        assert_eq!(artifact.files[0].contents, GOOD);
        assert!(artifact.files[0].bom);
        assert_eq!(*generator.models.lock().unwrap(), ["pro", "pro", "flash"]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_tiers_surface_one_failure() {
        let generator = Scripted::default();
        *generator.answers.lock().unwrap() = vec![Err(429), Err(429), Err(429)];
        let producer = GenerativeProducer::new(generator, retry());
        let config = ConfigEditor::new().freeze().unwrap();

        let failure = producer.generate(&config).await.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert!(failure.friendly_message().contains("Rate Limit"));
    }
}
