//! Instruction and prompt sent to the generation service.

use crate::agent::ClientLayout;
use crate::config::{BackupMode, ValidatedConfig};
use crate::policy::{BackupRoot, BlackList, DEPARTMENT_OVERRIDES, MAX_FILE_SIZE};
use crate::producer::script::FORBIDDEN_DIRECTIVES;
use std::fmt::Write;

/// Fixed instruction: output format and the directive contract.
pub fn system_instruction() -> String {
    let forbidden = FORBIDDEN_DIRECTIVES.join(", ");
    format!(
        "You are a Windows application packaging engineer writing Inno Setup 6 scripts.\n\
         Produce one complete, compilable .iss script for the request.\n\
         \n\
         Compiler rules:\n\
         1. Never write these directives: {forbidden}.\n\
         2. Directive names never contain spaces (CloseApplications, not Close Applications).\n\
         3. Boolean directive values are yes or no, never true or false.\n\
         4. Always set WizardStyle=modern.\n\
         5. OutputBaseFilename contains no spaces.\n\
         \n\
         Behaviour:\n\
         - The wizard is in Simplified Chinese.\n\
         - Online mode downloads the MSI to {{tmp}}\\Setup.msi with a download page before installing.\n\
         - The MSI runs from CurStepChanged(ssInstall) through msiexec.exe.\n\
         - The backend JSON is built in Pascal Script at install time, written to {{tmp}}\\config.json \
           and passed as CONFIGPATH.\n\
         - Override UpdateReadyMemo to summarise the user's choices.\n\
         \n\
         Return only the script text, without Markdown fences or commentary."
    )
}

/// Request describing one configuration.
pub fn user_prompt(config: &ValidatedConfig, client: &ClientLayout) -> String {
    let mut p = String::new();
    let yes = |b: bool| if b { "YES" } else { "NO" };

    let _ = writeln!(p, "[Metadata]");
    let _ = writeln!(p, "App Name: {}", config.app_name);
    let _ = writeln!(p, "Version: {}", config.app_version);
    let _ = writeln!(p, "Publisher: {}", config.publisher);
    let _ = writeln!(p, "Identifier: {}", config.identifier());

    let _ = writeln!(p, "\n[Install Mode]");
    let _ = writeln!(p, "Online Installer: {}", yes(config.use_online_installer));
    if config.use_online_installer {
        let _ = writeln!(p, "Download URL: \"{}\"", config.download_url.trim());
    } else {
        let _ = writeln!(p, "Local MSI: \"{}\"", config.msi_file_name.trim());
    }
    let _ = writeln!(p, "Run as Admin: {}", yes(config.run_as_admin));
    let _ = writeln!(p, "Silent MSI (/qn): {}", yes(config.silent_install));

    let _ = writeln!(p, "\n[Wizard Text]");
    let _ = writeln!(p, "Welcome: {}", config.welcome_message);
    if !config.warning_message.trim().is_empty() {
        let _ = writeln!(p, "Warning Page: {} / {}", config.warning_title, config.warning_message);
    }
    if !config.license_text.trim().is_empty() {
        let _ = writeln!(p, "License Text:\n{}", config.license_text);
    }

    let backend = &config.backend;
    let _ = writeln!(p, "\n[Clean Strategy]");
    let _ = writeln!(
        p,
        "Force Clean Install: {}",
        if config.force_clean_install && backend.enabled {
            format!(
                "YES (uninstall any '{}' found in the Uninstall registry keys with msiexec /x /qn, \
                 then DelTree {{localappdata}}\\{})",
                client.display_name, client.state_dir_name
            )
        } else {
            "NO".to_string()
        }
    );

    let _ = writeln!(p, "\n[Server Configuration]");
    if backend.enabled {
        let _ = writeln!(p, "Server: {}", backend.server_address);
        let _ = writeln!(p, "User: {}", backend.username);
        let _ = writeln!(p, "Password: {}", backend.password);
        let _ = writeln!(p, "SSL: {}", yes(backend.enable_ssl));
        let _ = writeln!(p, "Allow Untrusted Certificate: {}", yes(backend.allow_untrusted_certificate));
        let _ = writeln!(p, "Run As: {}", backend.as_user);
        let _ = writeln!(
            p,
            "Sync Session: share '{}', remote '{}', local '{}', direction BIDIRECTION",
            backend.share_folder, backend.remote_path, backend.local_path
        );
        let _ = writeln!(
            p,
            "JSON shape: {{\"connections\":[{{server_address, username, password, as_user, enable_ssl, \
             allow_untrusted_certificate, computer_name?, sync_sessions:[{{sharefolder, remote_path, \
             local_path, sync_direction}}]}}], backup_path?, backup_mode?, backup_start_time?, \
             black_list?, max_file_size?}}"
        );
    } else {
        let _ = writeln!(p, "Disabled: no JSON and no CONFIGPATH.");
    }

    let _ = writeln!(p, "\n[User Info Page]");
    if config.collect_user_info {
        let _ = writeln!(p, "Project dropdown: {}", config.projects().join(", "));
        let _ = writeln!(p, "Department dropdown depends on the project:");
        for (project, departments) in DEPARTMENT_OVERRIDES {
            let _ = writeln!(p, "- {project}: {}", departments.join(", "));
        }
        let _ = writeln!(p, "- any other project: {}", config.departments().join(", "));
        let _ = writeln!(
            p,
            "Device Name: {}",
            if config.device_naming_active() {
                "YES, computer_name = Project-Department-GetComputerNameString (no brackets)"
            } else {
                "NO"
            }
        );
        if config.backup_selection_active() {
            let roots: Vec<String> = BackupRoot::ALL
                .iter()
                .map(|r| format!("{} ({})", r.label(), r.backup_path()))
                .collect();
            let _ = writeln!(p, "Backup checklist: {}", roots.join(", "));
            let _ = writeln!(
                p,
                "Checking C: unchecks Desktop and checking Desktop unchecks C:. \
                 Next stays disabled until project, department and one backup root are chosen."
            );
            let _ = writeln!(p, "Checked roots fill backup_path.");
            match config.backup_mode {
                BackupMode::Continuous => {
                    let _ = writeln!(p, "backup_mode: 0 (continuous)");
                }
                BackupMode::Scheduled => {
                    let _ = writeln!(
                        p,
                        "backup_mode: 2 (scheduled), backup_start_time: {}",
                        config.backup_start_time.trim()
                    );
                }
            }
        }
    } else {
        let _ = writeln!(p, "No custom page.");
    }

    if backend.enabled && config.enable_smart_filters {
        let list = BlackList::default();
        let _ = writeln!(p, "\n[Smart Filters]");
        let _ = writeln!(p, "Back up everything except the black_list below.");
        let _ = writeln!(p, "max_file_size: {MAX_FILE_SIZE}");
        let _ = writeln!(p, "file_extensions: {}", list.file_extensions.join(", "));
        let _ = writeln!(p, "file_names: {}", list.file_names.join(", "));
        let _ = writeln!(p, "sub_paths: {}", list.sub_paths.join(", "));
        let _ = writeln!(p, "absolute_paths: {}", list.absolute_paths.join(", "));
    }

    let scripts: Vec<_> = config
        .automation_scripts
        .iter()
        .filter(|s| !s.content.trim().is_empty())
        .collect();
    if !scripts.is_empty() {
        let _ = writeln!(p, "\n[Post-install Scripts]");
        for script in scripts {
            let _ = writeln!(
                p,
                "--- {} ({}, run with {}) ---\n{}",
                script.file_name(),
                script.kind,
                script.kind.interpreter(),
                script.content
            );
        }
    }

    p
}
