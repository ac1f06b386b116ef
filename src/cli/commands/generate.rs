//! `generate`: produce an installer artifact and write it to disk.

use super::load_editor;
use crate::cli::{RuntimeConfig, args::GenerateArgs};
use crate::config::ValidatedConfig;
use crate::error::{CliError, Result};
use crate::producer::{
    Artifact, ArtifactProducer, BundleProducer, GenerativeProducer, ScriptProducer, Strategy,
    generative::{RetryConfig, TextGenerationClient},
    script::{SCRIPT_FILE_NAME, locate_iscc, run_iscc},
};

pub async fn execute(args: &GenerateArgs, runtime: &RuntimeConfig) -> Result<i32> {
    if args.compile && args.strategy == Strategy::Bundle {
        return Err(CliError::InvalidArguments {
            reason: "--compile only applies to script artifacts".to_string(),
        }
        .into());
    }

    let config = load_editor(&args.config).await?.freeze()?;
    runtime.progress(&format!(
        "Generating {} artifact for {} {}",
        args.strategy, config.app_name, config.app_version
    ))?;

    let artifact = produce(args, &config).await?;
    let written = artifact.write_to(&args.output).await?;

    runtime.section("Artifact files")?;
    for file in &written {
        runtime.indent(&format!(
            "{}  {} bytes  sha256:{}",
            file.path.display(),
            file.size,
            file.sha256
        ))?;
    }

    if args.compile {
        let iscc = locate_iscc().ok_or_else(|| CliError::ExecutionFailed {
            command: "ISCC".to_string(),
            reason: "Inno Setup compiler not found on PATH; install Inno Setup 6 or omit --compile"
                .to_string(),
        })?;
        runtime.verbose_println(&format!("Using {}", iscc.display()))?;
        runtime.progress("Compiling installer script")?;
        run_iscc(&iscc, &args.output.join(SCRIPT_FILE_NAME), &args.output).await?;
        runtime.success(&format!("Compiled setup into {}", args.output.display()))?;
    }

    runtime.success(&format!(
        "Wrote {} file(s) to {}",
        written.len(),
        args.output.display()
    ))?;
    Ok(0)
}

async fn produce(args: &GenerateArgs, config: &ValidatedConfig) -> Result<Artifact> {
    let artifact = match args.strategy {
        Strategy::Script => ScriptProducer::default().produce(config).await?,
        Strategy::Bundle => BundleProducer::default().produce(config).await?,
        Strategy::Generative => {
            let client = TextGenerationClient::new(&args.endpoint, args.api_key.clone()).map_err(
                |e| CliError::ExecutionFailed {
                    command: "generate".to_string(),
                    reason: e.to_string(),
                },
            )?;
            GenerativeProducer::new(client, RetryConfig::default())
                .produce(config)
                .await?
        }
    };
    Ok(artifact)
}
