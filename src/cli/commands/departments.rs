//! `departments`: show the project to department table.

use super::load_editor;
use crate::cli::{RuntimeConfig, args::DepartmentsArgs};
use crate::error::Result;
use crate::policy::DepartmentResolver;

pub async fn execute(args: &DepartmentsArgs, runtime: &RuntimeConfig) -> Result<i32> {
    let editor = load_editor(&args.config).await?;
    let config = editor.draft();
    let resolver = DepartmentResolver::from_config(config);
    let output = runtime.output();

    if let Some(project) = &args.project {
        for department in resolver.resolve(project.trim()) {
            output.plain(&department)?;
        }
        return Ok(0);
    }

    for (project, departments) in resolver.table(&config.projects()) {
        let marker = if DepartmentResolver::override_for(&project).is_some() {
            " (fixed)"
        } else {
            ""
        };
        output.plain(&format!("{project}{marker}: {}", departments.join(", ")))?;
    }
    Ok(0)
}
