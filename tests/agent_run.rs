mod common;

use common::{FakeHost, bundled_config, options, touch};
use installer_genie::agent::{
    AgentError, DeploymentAgent, DeploymentPlan, InstallRequest, Phase, PollPolicy, Progress,
    Reporter,
};
use installer_genie::config::{BackendEdit, ConfigEdit, ConfigEditor, ScriptFile, ScriptKind};
use installer_genie::policy::{BackupRoot, BackupSelection};
use serde_json::Value;
use httpmock::prelude::*;
use std::time::Duration;

fn request(roots: &[BackupRoot]) -> InstallRequest {
    InstallRequest {
        project: "峰景".into(),
        department: "客户服务部".into(),
        backup_roots: BackupSelection::from_toggles(roots.iter().copied()),
    }
}

#[tokio::test]
async fn readiness_exhaustion_still_completes_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    touch(dir.path(), std::path::Path::new("resources/pkg.msi"));
    let host = FakeHost::default();

    let plan = DeploymentPlan::from_config(&bundled_config(vec![]));
    let agent = DeploymentAgent::new(plan, host.clone(), options);
    let (reporter, mut events) = Reporter::channel();

    let outcome = agent.start_install(request(&[BackupRoot::D]), reporter).await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.state.phase, Phase::Done);
    assert!(
        outcome
            .state
            .log
            .iter()
            .any(|l| l.contains("Sync client not found after 3 attempts"))
    );
    assert!(outcome.state.log.iter().any(|l| l.contains("Launcher not found")));

    let mut last = 0;
    while let Ok(progress) = events.progress.try_recv() {
        if let Progress::Percent(p) = progress {
            assert!(p >= last, "progress went back from {last} to {p}");
            last = p;
        }
    }
    assert_eq!(last, 100);
    assert_eq!(events.log_lines.try_recv().unwrap(), outcome.state.log[0]);
    outcome.cleanup.wait().await;
}

#[tokio::test]
async fn waiting_heartbeats_reach_the_log_channel() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = options(dir.path());
    options.readiness = PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts: 10,
        heartbeat_every: 5,
    };
    options.launcher = PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts: 5,
        heartbeat_every: 5,
    };
    touch(dir.path(), std::path::Path::new("resources/pkg.msi"));

    let plan = DeploymentPlan::from_config(&bundled_config(vec![]));
    let agent = DeploymentAgent::new(plan, FakeHost::default(), options);
    let (reporter, mut events) = Reporter::channel();

    let outcome = agent.start_install(request(&[BackupRoot::D]), reporter).await;
    assert!(outcome.success, "{:?}", outcome.error);

    let mut lines = Vec::new();
    while let Ok(line) = events.log_lines.try_recv() {
        lines.push(line);
    }
    let waiting: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|l| l.starts_with("Still waiting"))
        .collect();
    assert_eq!(
        waiting,
        [
            "Still waiting for the sync client (5/10)",
            "Still waiting for the sync client (10/10)",
            "Still waiting for the launcher (5/5)",
        ]
    );
    outcome.cleanup.wait().await;
}

#[tokio::test]
async fn submitted_overlapping_roots_never_reach_the_payload_together() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    touch(dir.path(), std::path::Path::new("resources/pkg.msi"));
    let host = FakeHost::default();

    let plan = DeploymentPlan::from_config(&bundled_config(vec![]));
    let agent = DeploymentAgent::new(plan, host.clone(), options);
    let request: InstallRequest = serde_json::from_str(
        r#"{"project":"峰景","department":"客户服务部","backup_roots":["C:","Desktop"]}"#,
    )
    .unwrap();

    let outcome = agent.start_install(request, Reporter::detached()).await;
    assert!(outcome.success, "{:?}", outcome.error);

    let payload: Value =
        serde_json::from_str(host.payload.lock().unwrap().as_deref().unwrap()).unwrap();
    assert_eq!(payload["backup_path"], serde_json::json!(["C:\\Users\\$\\Desktop"]));
    outcome.cleanup.wait().await;
}

#[tokio::test]
async fn non_zero_installer_exit_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    touch(dir.path(), std::path::Path::new("resources/pkg.msi"));
    let host = FakeHost::failing_installer(1603);

    let plan = DeploymentPlan::from_config(&bundled_config(vec![]));
    let agent = DeploymentAgent::new(plan, host.clone(), options);

    let outcome = agent
        .start_install(request(&[BackupRoot::E]), Reporter::detached())
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.state.phase, Phase::Failed);
    assert!(outcome.error.unwrap().contains("1603"));
    assert!(host.spawned.lock().unwrap().is_empty());
    outcome.cleanup.wait().await;
}

#[tokio::test]
async fn payload_reaches_the_installer_and_the_connect_tool() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    touch(dir.path(), std::path::Path::new("resources/pkg.msi"));
    let tool = touch(&dir.path().join("pf"), &options.client.connect_tool);
    let launcher = touch(&dir.path().join("pf"), &options.client.launcher);
    let host = FakeHost::default();

    let plan = DeploymentPlan::from_config(&bundled_config(vec![]));
    let agent = DeploymentAgent::new(plan, host.clone(), options);

    // Desktop is evicted by C:, so only the drive roots remain.
    let outcome = agent
        .start_install(
            request(&[BackupRoot::Desktop, BackupRoot::C, BackupRoot::D]),
            Reporter::detached(),
        )
        .await;
    assert!(outcome.success, "{:?}", outcome.error);

    let payload: Value =
        serde_json::from_str(host.payload.lock().unwrap().as_deref().unwrap()).unwrap();
    assert_eq!(payload["backup_path"], serde_json::json!(["C:\\", "D:\\"]));
    assert!(
        !payload["backup_path"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p.as_str().unwrap().contains("Desktop"))
    );
    assert_eq!(payload["max_file_size"], 2_147_483_648u64);
    assert!(!payload["black_list"]["file_extensions"].as_array().unwrap().is_empty());
    assert_eq!(payload["backup_mode"], 0);
    assert_eq!(payload["connections"][0]["computer_name"], "峰景-客户服务部-PC01");

    let calls = host.calls();
    let install = calls.iter().find(|c| c.args.first().map(String::as_str) == Some("/i")).unwrap();
    assert!(install.elevated);
    assert!(install.args.contains(&"/qn".to_string()));

    let inject = calls.iter().find(|c| c.program == tool).unwrap();
    assert!(!inject.elevated);
    assert_eq!(inject.args[0], "--config");
    assert!(inject.args[1].ends_with("-config.json"));

    assert_eq!(*host.spawned.lock().unwrap(), [launcher]);

    // The payload file is removed after the grace delay.
    let config_path = std::path::PathBuf::from(&inject.args[1]);
    outcome.cleanup.wait().await;
    assert!(!config_path.exists());
}

#[tokio::test]
async fn disabled_backend_skips_payload_and_injection() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    touch(dir.path(), std::path::Path::new("resources/pkg.msi"));
    let tool = touch(&dir.path().join("pf"), &options.client.connect_tool);
    let host = FakeHost::default();

    let plan = DeploymentPlan::from_config(&bundled_config(vec![ConfigEdit::Backend(
        BackendEdit::Enabled(false),
    )]));
    let agent = DeploymentAgent::new(plan, host.clone(), options);
    let outcome = agent
        .start_install(request(&[BackupRoot::D]), Reporter::detached())
        .await;

    assert!(outcome.success);
    assert!(host.payload.lock().unwrap().is_none());
    let calls = host.calls();
    assert!(calls.iter().all(|c| c.program != tool));
    assert!(calls.iter().all(|c| !c.args.iter().any(|a| a.starts_with("CONFIGPATH="))));
    outcome.cleanup.wait().await;
}

#[tokio::test]
async fn scripts_run_with_their_interpreter_after_install() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    touch(dir.path(), std::path::Path::new("resources/pkg.msi"));
    let host = FakeHost::default();

    let plan = DeploymentPlan::from_config(&bundled_config(vec![
        ConfigEdit::AddScript(ScriptFile::new("setup", ScriptKind::Powershell).with_content("Write-Host hi")),
        ConfigEdit::AddScript(ScriptFile::new("empty", ScriptKind::Batch)),
    ]));
    let agent = DeploymentAgent::new(plan, host.clone(), options);
    let outcome = agent
        .start_install(request(&[BackupRoot::D]), Reporter::detached())
        .await;
    assert!(outcome.success);

    let calls = host.calls();
    let script = calls.last().unwrap();
    assert_eq!(script.program, std::path::PathBuf::from("powershell.exe"));
    assert!(script.args.iter().any(|a| a.ends_with("setup.ps1")));
    assert!(outcome.state.log.iter().any(|l| l.contains("Script empty is empty")));
    outcome.cleanup.wait().await;
}

#[tokio::test]
async fn invalid_request_is_rejected_before_acquisition() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let plan = DeploymentPlan::from_config(&bundled_config(vec![]));
    let agent = DeploymentAgent::new(plan, host.clone(), options(dir.path()));

    let outcome = agent.start_install(request(&[]), Reporter::detached()).await;

    assert!(!outcome.success);
    assert!(host.calls().is_empty());
    assert!(outcome.error.unwrap().contains("backup location"));
}

#[tokio::test]
async fn missing_bundled_package_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let plan = DeploymentPlan::from_config(&bundled_config(vec![]));
    let agent = DeploymentAgent::new(plan, FakeHost::default(), options(dir.path()));

    let outcome = agent
        .start_install(request(&[BackupRoot::D]), Reporter::detached())
        .await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.error.unwrap(),
        AgentError::BundledPackageMissing {
            path: std::path::PathBuf::new()
        }
        .user_message()
    );
}

#[tokio::test]
async fn cancelled_token_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), std::path::Path::new("resources/pkg.msi"));
    let host = FakeHost::default();
    let plan = DeploymentPlan::from_config(&bundled_config(vec![]));
    let agent = DeploymentAgent::new(plan, host.clone(), options(dir.path()));
    agent.cancellation_token().cancel();

    let outcome = agent
        .start_install(request(&[BackupRoot::D]), Reporter::detached())
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Deployment was cancelled."));
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn download_mode_with_force_clean_builds_the_full_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pkg.msi");
            then.status(200).body(vec![1u8; 4096]);
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut options = options(dir.path());
    let state_dir = dir.path().join("state");
    touch(&state_dir, std::path::Path::new("session.db"));
    options.user_state_dir = Some(state_dir.clone());
    let host = FakeHost::default();

    let mut editor = ConfigEditor::new();
    editor.apply_all([
        ConfigEdit::UseOnlineInstaller(true),
        ConfigEdit::DownloadUrl(server.url("/pkg.msi")),
        ConfigEdit::ForceCleanInstall(true),
        ConfigEdit::EnableSmartFilters(true),
    ]);
    let plan = DeploymentPlan::from_config(&editor.freeze().unwrap());
    let agent = DeploymentAgent::new(plan, host.clone(), options);

    let outcome = agent
        .start_install(request(&[BackupRoot::C]), Reporter::detached())
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert!(!state_dir.exists());

    let payload: Value =
        serde_json::from_str(host.payload.lock().unwrap().as_deref().unwrap()).unwrap();
    assert_eq!(payload["backup_path"], serde_json::json!(["C:\\"]));
    assert_eq!(payload["max_file_size"], 2_147_483_648u64);
    assert!(!payload["black_list"]["sub_paths"].as_array().unwrap().is_empty());

    let install = host
        .calls()
        .into_iter()
        .find(|c| c.args.first().map(String::as_str) == Some("/i"))
        .unwrap();
    let package = std::path::PathBuf::from(&install.args[1]);
    assert!(package.starts_with(dir.path().join("tmp")));
    outcome.cleanup.wait().await;
    assert!(!package.exists());
}
