//! `run`: execute the deployment agent on this machine.
//!
//! Choices missing from the command line are collected interactively.
//! Ctrl-C cancels the run through the agent's cancellation token.

use super::load_editor;
use crate::agent::{
    AgentOptions, DeploymentAgent, DeploymentPlan, InstallRequest, Progress, Reporter, RunEvents,
    SystemHost,
};
use crate::cli::{OutputManager, RuntimeConfig, args::RunArgs};
use crate::error::{CliError, Result};
use crate::policy::{BackupRoot, BackupSelection};

pub async fn execute(args: &RunArgs, runtime: &RuntimeConfig) -> Result<i32> {
    let config = load_editor(&args.config).await?.freeze()?;
    let plan = DeploymentPlan::from_config(&config);
    let request = collect_request(&plan, args, runtime)?;

    runtime.section(&format!("Deploying {}", plan.app_name))?;
    let agent = DeploymentAgent::new(plan, SystemHost, AgentOptions::default());

    let cancel = agent.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, cancelling deployment");
            cancel.cancel();
        }
    });

    let (reporter, events) = Reporter::channel();
    let printers = forward_events(events, *runtime.output());

    let outcome = agent.start_install(request, reporter).await;
    ctrl_c.abort();
    for printer in printers {
        let _ = printer.await;
    }

    runtime.verbose_println("Removing temporary files")?;
    outcome.cleanup.wait().await;

    if outcome.success {
        runtime.success("Deployment complete")?;
        Ok(0)
    } else {
        let message = outcome.error.unwrap_or_else(|| "deployment failed".to_string());
        runtime.output().error(&message)?;
        Ok(1)
    }
}

/// Print agent log lines and, in verbose mode, progress updates.
fn forward_events(events: RunEvents, output: OutputManager) -> [tokio::task::JoinHandle<()>; 2] {
    let RunEvents {
        mut log_lines,
        mut progress,
    } = events;

    let lines = tokio::spawn(async move {
        while let Some(line) = log_lines.recv().await {
            let _ = output.progress(&line);
        }
    });
    let percent = tokio::spawn(async move {
        while let Some(update) = progress.recv().await {
            let text = match update {
                Progress::Percent(p) => format!("{p}%"),
                Progress::Indeterminate => "working...".to_string(),
            };
            let _ = output.verbose(&text);
        }
    });
    [lines, percent]
}

/// Build the end-user request from flags, prompting for what is missing.
fn collect_request(
    plan: &DeploymentPlan,
    args: &RunArgs,
    runtime: &RuntimeConfig,
) -> Result<InstallRequest> {
    let mut request = InstallRequest::default();

    if plan.collect_user_info {
        request.project = match &args.project {
            Some(project) => project.trim().to_string(),
            None => select("项目 (Project)", &plan.projects, args.no_input, "--project")?,
        };
        request.department = match &args.department {
            Some(department) => department.trim().to_string(),
            None => select(
                "部门 (Department)",
                &plan.departments_for(&request.project),
                args.no_input,
                "--department",
            )?,
        };
    }

    if plan.backup_selection {
        request.backup_roots = if args.backup.is_empty() {
            select_backup_roots(args.no_input)?
        } else {
            if args.backup.contains(&BackupRoot::C) && args.backup.contains(&BackupRoot::Desktop) {
                runtime.warn("C: and Desktop overlap; only the last one given is kept")?;
            }
            BackupSelection::from_selected(args.backup.iter().copied())
        };
    }

    Ok(request)
}

fn select(prompt: &str, items: &[String], no_input: bool, flag: &str) -> Result<String> {
    if no_input {
        return Err(CliError::MissingArgument {
            argument: flag.to_string(),
        }
        .into());
    }
    if items.is_empty() {
        return Err(CliError::InvalidArguments {
            reason: format!("nothing to choose for {flag}"),
        }
        .into());
    }

    let index = dialoguer::Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .map_err(|e| prompt_failed(flag, e))?;
    Ok(items[index].clone())
}

fn select_backup_roots(no_input: bool) -> Result<BackupSelection> {
    if no_input {
        return Err(CliError::MissingArgument {
            argument: "--backup".to_string(),
        }
        .into());
    }

    let labels: Vec<String> = BackupRoot::ALL
        .iter()
        .map(|root| format!("{} ({})", root.label(), root.id()))
        .collect();
    let chosen = dialoguer::MultiSelect::new()
        .with_prompt("备份位置 (Backup locations)")
        .items(&labels)
        .interact()
        .map_err(|e| prompt_failed("--backup", e))?;

    Ok(BackupSelection::from_selected(
        chosen.into_iter().map(|i| BackupRoot::ALL[i]),
    ))
}

fn prompt_failed(flag: &str, error: dialoguer::Error) -> crate::error::GenieError {
    CliError::ExecutionFailed {
        command: "prompt".to_string(),
        reason: format!("{error}; pass {flag} instead"),
    }
    .into()
}
