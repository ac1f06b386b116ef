//! Desktop application bundle strategy.
//!
//! Assembles an Electron project of five files: the manifest, the privileged
//! automation runtime, the preload bridge, the presentation shell and an npm
//! registry mirror. The runtime carries the [`DeploymentPlan`] as an embedded
//! JSON literal and performs the same phases as [`crate::agent`].

mod manifest;
mod template;

pub use manifest::{npm_version, package_manifest};

use super::{
    Artifact, ArtifactFile, ArtifactKind, ArtifactProducer, Error, Result, Strategy,
    escape::{html_text, json_literal},
};
use crate::agent::{AgentOptions, ClientLayout, DeploymentPlan, MAX_REDIRECTS, PollPolicy};
use crate::config::{ScriptKind, ValidatedConfig};
use crate::policy::BackupRoot;
use handlebars::Handlebars;
use serde_json::{Map, Value, json};
use std::{collections::BTreeMap, path::Path, time::Duration};
use template::{INDEX_HTML, MAIN_JS, NPMRC, PRELOAD_JS};

pub const MANIFEST_FILE: &str = "package.json";
pub const MAIN_FILE: &str = "main.js";
pub const PRELOAD_FILE: &str = "preload.js";
pub const INDEX_FILE: &str = "index.html";
pub const NPMRC_FILE: &str = ".npmrc";

/// Stands in for the script path in interpreter argument lists.
const SCRIPT_PATH_TOKEN: &str = "%SCRIPT%";

/// Produces the five-file application bundle.
#[derive(Clone, Debug)]
pub struct BundleProducer {
    client: ClientLayout,
    readiness: PollPolicy,
    launcher: PollPolicy,
    response_timeout: Duration,
    chunk_timeout: Duration,
    cleanup_grace: Duration,
}

impl Default for BundleProducer {
    fn default() -> Self {
        Self::from_options(&AgentOptions::default())
    }
}

impl BundleProducer {
    /// Bundle whose runtime uses the same layout, polling and timeouts as the agent.
    pub fn from_options(options: &AgentOptions) -> Self {
        Self {
            client: options.client.clone(),
            readiness: options.readiness,
            launcher: options.launcher,
            response_timeout: options.response_timeout,
            chunk_timeout: options.chunk_timeout,
            cleanup_grace: options.cleanup_grace,
        }
    }

    /// Render every file of the bundle.
    pub fn render(&self, config: &ValidatedConfig) -> Result<Vec<ArtifactFile>> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        for (name, source) in [(MAIN_FILE, MAIN_JS), (INDEX_FILE, INDEX_HTML)] {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| Error::Template(format!("failed to register {name}: {e}")))?;
        }

        let plan = DeploymentPlan::from_config(config);
        let render = |name: &str, data: &Value| {
            handlebars
                .render(name, data)
                .map_err(|e| Error::Template(format!("failed to render {name}: {e}")))
        };

        let manifest = serde_json::to_string_pretty(&package_manifest(config))? + "\n";
        let main_js = render(MAIN_FILE, &self.runtime_data(&plan)?)?;
        let index_html = render(INDEX_FILE, &shell_data(config, &plan)?)?;

        Ok(vec![
            ArtifactFile::new(MANIFEST_FILE, manifest),
            ArtifactFile::new(MAIN_FILE, main_js),
            ArtifactFile::new(PRELOAD_FILE, PRELOAD_JS.to_string()),
            ArtifactFile::new(INDEX_FILE, index_html),
            ArtifactFile::new(NPMRC_FILE, NPMRC.to_string()),
        ])
    }

    fn runtime_data(&self, plan: &DeploymentPlan) -> Result<Value> {
        let backup_roots: Vec<Value> = BackupRoot::ALL
            .iter()
            .map(|root| {
                json!({
                    "id": root.id(),
                    "path": root.backup_path(),
                    "conflictsWith": root.conflicts_with().map(BackupRoot::id),
                })
            })
            .collect();

        let script_runners: Map<String, Value> =
            [ScriptKind::Powershell, ScriptKind::Batch, ScriptKind::Vbs]
                .into_iter()
                .map(|kind| {
                    let runner = json!({
                        "interpreter": kind.interpreter(),
                        "extension": kind.extension(),
                        "args": kind.interpreter_args(SCRIPT_PATH_TOKEN),
                    });
                    (kind.to_string(), runner)
                })
                .collect();

        let client = json!({
            "displayName": self.client.display_name,
            "stateDirName": self.client.state_dir_name,
            "connectTool": windows_path(&self.client.connect_tool),
            "launcher": windows_path(&self.client.launcher),
            "configFlag": self.client.config_flag,
        });

        let static_backup = match &plan.backend {
            Some(backend) => json_literal(&backend.static_backup_fields())?,
            None => "null".to_string(),
        };

        Ok(json!({
            "plan_json": json_literal(plan)?,
            "departments_json": json_literal(&department_table(plan))?,
            "backup_roots_json": json_literal(&backup_roots)?,
            "script_runners_json": json_literal(&script_runners)?,
            "script_path_token_json": json_literal(SCRIPT_PATH_TOKEN)?,
            "client_json": json_literal(&client)?,
            "max_redirects": MAX_REDIRECTS,
            "response_timeout_ms": millis(self.response_timeout),
            "chunk_timeout_ms": millis(self.chunk_timeout),
            "readiness_json": json_literal(&poll_json(self.readiness))?,
            "launcher_json": json_literal(&poll_json(self.launcher))?,
            "cleanup_grace_ms": millis(self.cleanup_grace),
            "backend_enabled": plan.backend.is_some(),
            "static_backup_json": static_backup,
        }))
    }
}

impl ArtifactProducer for BundleProducer {
    fn strategy(&self) -> Strategy {
        Strategy::Bundle
    }

    async fn produce(&self, config: &ValidatedConfig) -> Result<Artifact> {
        log::info!("Assembling application bundle for {}", config.app_name);
        Ok(Artifact {
            kind: ArtifactKind::Bundle,
            files: self.render(config)?,
        })
    }
}

fn shell_data(config: &ValidatedConfig, plan: &DeploymentPlan) -> Result<Value> {
    let roots: Vec<Value> = BackupRoot::ALL
        .iter()
        .map(|root| json!({ "id": root.id(), "label": root.label() }))
        .collect();
    let conflicts: BTreeMap<&str, &str> = BackupRoot::ALL
        .iter()
        .filter_map(|root| root.conflicts_with().map(|other| (root.id(), other.id())))
        .collect();

    let ui = json!({
        "appName": config.app_name,
        "welcome": config.welcome_message,
        "warningTitle": config.warning_title,
        "warningMessage": config.warning_message.trim(),
        "license": config.license_text.trim(),
        "collectUserInfo": plan.collect_user_info,
        "backupSelection": plan.backup_selection,
        "projects": plan.projects,
        "departments": department_table(plan),
        "backupRoots": roots,
        "conflicts": conflicts,
    });

    Ok(json!({
        "title": html_text(&config.app_name),
        "ui_json": json_literal(&ui)?,
    }))
}

fn department_table(plan: &DeploymentPlan) -> BTreeMap<String, Vec<String>> {
    plan.departments.table(&plan.projects).into_iter().collect()
}

fn poll_json(policy: PollPolicy) -> Value {
    json!({
        "intervalMs": millis(policy.interval),
        "maxAttempts": policy.max_attempts,
        "heartbeatEvery": policy.heartbeat_every,
    })
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Relative path with Windows separators, independent of the build host.
fn windows_path(path: &Path) -> String {
    path.to_string_lossy().replace('/', "\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendEdit, ConfigEdit, ConfigEditor};

    fn config(edits: Vec<ConfigEdit>) -> ValidatedConfig {
        let mut editor = ConfigEditor::new();
        editor.apply_all(edits);
        editor.freeze().unwrap()
    }

    fn file<'a>(files: &'a [ArtifactFile], name: &str) -> &'a str {
        &files
            .iter()
            .find(|f| f.path == Path::new(name))
            .unwrap()
            .contents
    }

    #[test]
    fn bundle_has_five_files() {
        let files = BundleProducer::default().render(&config(vec![])).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.path.to_str().unwrap()).collect();
        assert_eq!(names, [MANIFEST_FILE, MAIN_FILE, PRELOAD_FILE, INDEX_FILE, NPMRC_FILE]);
        assert!(files.iter().all(|f| !f.bom));
    }

    #[test]
    fn runtime_embeds_plan_and_ipc_channels() {
        let files = BundleProducer::default().render(&config(vec![])).unwrap();
        let main = file(&files, MAIN_FILE);
        assert!(main.contains("const PLAN = {\"identifier\":"));
        assert!(main.contains("ipcMain.handle('start-install'"));
        assert!(main.contains("send('log-line', line)"));
        assert!(main.contains("function buildPayload"));
        assert!(main.contains("\"max_file_size\":2147483648"));
        assert!(main.contains("const MAX_REDIRECTS = 10;"));
        assert!(main.contains(r#""conflictsWith":"Desktop""#));
        assert!(main.contains(r#""conflictsWith":null"#));
        assert!(main.contains("backupRoots: selectRoots(backupRoots || [])"));
    }

    #[test]
    fn disabled_backend_omits_payload_fragment() {
        let files = BundleProducer::default()
            .render(&config(vec![ConfigEdit::Backend(BackendEdit::Enabled(false))]))
            .unwrap();
        let main = file(&files, MAIN_FILE);
        assert!(!main.contains("buildPayload"));
        assert!(!main.contains("STATIC_BACKUP"));
        assert!(!main.contains("forceClean"));
    }

    #[test]
    fn hostile_names_cannot_break_out_of_literals() {
        let hostile = "</script><script>alert('x')</script>";
        let files = BundleProducer::default()
            .render(&config(vec![ConfigEdit::AppName(hostile.into())]))
            .unwrap();
        let html = file(&files, INDEX_FILE);
        assert_eq!(html.matches("</script>").count(), 1);
        assert!(html.contains("<title>&lt;/script&gt;"));
        let main = file(&files, MAIN_FILE);
        assert!(!main.contains("</script>"));
    }

    #[test]
    fn shell_lists_projects_and_conflicts() {
        let files = BundleProducer::default().render(&config(vec![])).unwrap();
        let html = file(&files, INDEX_FILE);
        assert!(html.contains("\"职能部门\":[\"人力行政部\",\"财务管理部\",\"运营管理部\"]"));
        assert!(html.contains("\"conflicts\":{\"C:\":\"Desktop\",\"Desktop\":\"C:\"}"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let producer = BundleProducer::default();
        let a = producer.render(&config(vec![])).unwrap();
        let b = producer.render(&config(vec![])).unwrap();
        assert_eq!(a, b);
    }
}
