//! Inno Setup script rendering.
//!
//! Builds the template data from a validated configuration and renders
//! [`ISS_TEMPLATE`] with Handlebars. Values are escaped here for the exact
//! syntax they land in: `[Setup]` directives, entry-section parameters or
//! Pascal Script string expressions.

use super::{template::ISS_TEMPLATE, utils};
use crate::agent::{ClientLayout, DeploymentPlan};
use crate::config::ValidatedConfig;
use crate::policy::{BackupRoot, DepartmentResolver};
use crate::producer::{
    error::{Error, Result},
    escape::{directive_value, entry_string, pascal_string},
};
use handlebars::Handlebars;
use serde_json::{Value, json};

/// Render the complete installer script for `config`.
///
/// # Arguments
/// - `config` - Validated configuration
/// - `client` - Install layout of the sync client being deployed
///
/// # Returns
/// The script text, without byte order mark.
pub fn render_script(config: &ValidatedConfig, client: &ClientLayout) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string("installer.iss", ISS_TEMPLATE)
        .map_err(|e| Error::Template(format!("failed to register script template: {e}")))?;

    let data = template_data(config, client)?;
    handlebars
        .render("installer.iss", &data)
        .map_err(|e| Error::Template(format!("failed to render script template: {e}")))
}

fn template_data(config: &ValidatedConfig, client: &ClientLayout) -> Result<Value> {
    let plan = DeploymentPlan::from_config(config);
    let backend = plan.backend.as_ref();
    let backup_enabled = plan.backup_selection;

    // Pascal builds the connection object up to its closing brace so the
    // device name can be appended at run time.
    let connection_prefix = match backend {
        Some(b) => {
            let json = serde_json::to_string(&b.connection)?;
            let open = json.strip_suffix('}').unwrap_or(&json);
            pascal_string(open)
        }
        None => "''".to_string(),
    };

    let policy_tail = match backend {
        Some(b) => {
            let json = serde_json::to_string(&b.static_backup_fields())?;
            let body = json.trim_start_matches('{').trim_end_matches('}');
            if body.is_empty() {
                "''".to_string()
            } else {
                pascal_string(&format!(",{body}"))
            }
        }
        None => "''".to_string(),
    };

    let backup_roots = BackupRoot::ALL
        .iter()
        .map(|root| -> Result<Value> {
            Ok(json!({
                "label": pascal_string(root.label()),
                "path_json": pascal_string(&serde_json::to_string(root.backup_path())?),
            }))
        })
        .collect::<Result<Vec<_>>>()?;
    let index_of = |wanted: BackupRoot| {
        BackupRoot::ALL
            .iter()
            .position(|r| *r == wanted)
            .unwrap_or_default()
    };

    let department_overrides: Vec<Value> = DepartmentResolver::overrides()
        .into_iter()
        .map(|(project, departments)| {
            json!({
                "project": pascal_string(&project),
                "departments": departments.iter().map(|d| pascal_string(d)).collect::<Vec<_>>(),
            })
        })
        .collect();

    let scripts: Vec<Value> = plan
        .scripts
        .iter()
        .filter(|s| !s.content.trim().is_empty())
        .map(|script| {
            let file_name = script.file_name();
            let path = format!("\"{{tmp}}\\{}\"", file_name.replace('{', "{{"));
            let parameters = script.kind.interpreter_args(&path).join(" ");
            json!({
                "interpreter": script.kind.interpreter(),
                "parameters": parameters.replace('"', "\"\""),
                "status": entry_string(&format!("正在执行 {}", script.name)),
                "file_name": pascal_string(&file_name),
                "content": pascal_string(&script.content),
            })
        })
        .collect();

    let incomplete = if backup_enabled {
        "请选择项目和部门，并至少选择一个备份位置。"
    } else {
        "请选择项目和部门。"
    };

    Ok(json!({
        "app_name": directive_value(&config.app_name),
        "app_version": directive_value(&config.app_version),
        "identifier": plan.identifier,
        "publisher": directive_value(&config.publisher),
        "version_info": utils::format_version_info(&config.app_version),
        "privileges": utils::privileges(config.run_as_admin),
        "disable_welcome_page": utils::yes_no(config.welcome_message.trim().is_empty()),
        "output_base": format!("{}-setup", plan.identifier),
        "online": config.use_online_installer,
        "package_source": entry_string(config.msi_file_name.trim()),
        "download_url": pascal_string(config.download_url.trim()),
        "msi_quiet": if config.silent_install { "' /qn'" } else { "''" },
        "scripts": scripts,
        "client_display_name": pascal_string(&client.display_name),
        "client_state_dir": pascal_string(&client.state_dir_name),
        "welcome": pascal_string(&config.welcome_message),
        "has_warning": !config.warning_message.trim().is_empty(),
        "warning_title": pascal_string(&config.warning_title),
        "warning_message": pascal_string(&config.warning_message),
        "has_license": !config.license_text.trim().is_empty(),
        "license": pascal_string(&config.license_text),
        "collect_user_info": plan.collect_user_info,
        "projects": plan.projects.iter().map(|p| pascal_string(p)).collect::<Vec<_>>(),
        "department_overrides": department_overrides,
        "fallback_departments": plan.departments.fallback().iter().map(|d| pascal_string(d)).collect::<Vec<_>>(),
        "incomplete_message": pascal_string(incomplete),
        "backup_enabled": backup_enabled,
        "backup_roots": backup_roots,
        "c_index": index_of(BackupRoot::C),
        "desktop_index": index_of(BackupRoot::Desktop),
        "backend_enabled": backend.is_some(),
        "connection_prefix": connection_prefix,
        "device_naming": backend.is_some_and(|b| b.device_naming),
        "policy_tail": policy_tail,
        "server_address": pascal_string(&config.backend.server_address),
        "force_clean": plan.force_clean_install && backend.is_some(),
        "memo_title": pascal_string(&format!("即将安装 {}", config.app_name)),
    }))
}
