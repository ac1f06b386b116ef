//! Directive contract every produced installer script must satisfy.
//!
//! Checked on rendered scripts and on generative output alike. Only the
//! `[Setup]` section is inspected; `[Code]` is opaque.

use regex::Regex;
use std::sync::LazyLock;

/// Directives that break portable builds or reference external images.
pub const FORBIDDEN_DIRECTIVES: &[&str] =
    &["UseAbsolutePaths", "WizardImageFile", "WizardSmallImageFile"];

/// `[Setup]` directives whose value is a plain yes/no flag.
const BOOLEAN_DIRECTIVES: &[&str] = &[
    "AllowCancelDuringInstall",
    "AllowNoIcons",
    "AlwaysRestart",
    "AppendDefaultDirName",
    "CreateAppDir",
    "DisableDirPage",
    "DisableFinishedPage",
    "DisableProgramGroupPage",
    "DisableReadyMemo",
    "DisableReadyPage",
    "DisableStartupPrompt",
    "DisableWelcomePage",
    "RestartIfNeededByRun",
    "SetupLogging",
    "SolidCompression",
    "Uninstallable",
    "UsePreviousAppDir",
];

static SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[([A-Za-z]+)\]\s*$").expect("valid section regex"));
static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^=;]+?)\s*=\s*(.*?)\s*$").expect("valid directive regex"));

/// One broken rule, with its 1-based line number where it applies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptViolation {
    #[error("script has no [Setup] section")]
    MissingSetupSection,

    #[error("line {line}: `{name}` must not be used")]
    ForbiddenDirective { line: usize, name: String },

    #[error("line {line}: directive name `{name}` contains spaces")]
    SpacedDirective { line: usize, name: String },

    #[error("line {line}: `{name}={value}` must be yes or no")]
    NonLiteralBoolean {
        line: usize,
        name: String,
        value: String,
    },

    #[error("WizardStyle must be modern")]
    WizardStyleNotModern,

    #[error("line {line}: OutputBaseFilename `{value}` contains spaces")]
    OutputNameHasSpaces { line: usize, value: String },
}

/// Check `text` against the directive contract, returning every violation.
pub fn validate_script(text: &str) -> Result<(), Vec<ScriptViolation>> {
    let mut violations = Vec::new();
    let mut saw_setup = false;
    let mut in_setup = false;
    let mut wizard_modern = false;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let raw = raw.trim_start_matches('\u{feff}');
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with("//") {
            continue;
        }

        if let Some(section) = SECTION.captures(raw) {
            in_setup = section[1].eq_ignore_ascii_case("Setup");
            saw_setup |= in_setup;
            continue;
        }
        if !in_setup {
            continue;
        }
        let Some(directive) = DIRECTIVE.captures(raw) else {
            continue;
        };
        let name = directive[1].to_string();
        let value = directive[2].to_string();

        if name.chars().any(char::is_whitespace) {
            violations.push(ScriptViolation::SpacedDirective { line, name });
            continue;
        }
        if FORBIDDEN_DIRECTIVES
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&name))
        {
            violations.push(ScriptViolation::ForbiddenDirective { line, name });
            continue;
        }
        if BOOLEAN_DIRECTIVES
            .iter()
            .any(|b| b.eq_ignore_ascii_case(&name))
            && !matches!(value.to_ascii_lowercase().as_str(), "yes" | "no")
        {
            violations.push(ScriptViolation::NonLiteralBoolean { line, name, value });
            continue;
        }
        if name.eq_ignore_ascii_case("WizardStyle") {
            wizard_modern = value.eq_ignore_ascii_case("modern");
        } else if name.eq_ignore_ascii_case("OutputBaseFilename")
            && value.chars().any(char::is_whitespace)
        {
            violations.push(ScriptViolation::OutputNameHasSpaces { line, value });
        }
    }

    if !saw_setup {
        violations.insert(0, ScriptViolation::MissingSetupSection);
    } else if !wizard_modern {
        violations.push(ScriptViolation::WizardStyleNotModern);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "[Setup]\nAppName=Demo\nWizardStyle=modern\nOutputBaseFilename=demo-setup\nSolidCompression=yes\n\n[Code]\nvar X: Boolean;\n";

    #[test]
    fn conforming_script_passes() {
        assert_eq!(validate_script(GOOD), Ok(()));
    }

    #[test]
    fn missing_setup_section_is_reported() {
        let errors = validate_script("[Code]\nbegin end.\n").unwrap_err();
        assert_eq!(errors, vec![ScriptViolation::MissingSetupSection]);
    }

    #[test]
    fn forbidden_directives_are_reported_with_lines() {
        let text = "[Setup]\nWizardStyle=modern\nwizardimagefile=a.bmp\nUseAbsolutePaths=no\n";
        let errors = validate_script(text).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ScriptViolation::ForbiddenDirective {
                    line: 3,
                    name: "wizardimagefile".into()
                },
                ScriptViolation::ForbiddenDirective {
                    line: 4,
                    name: "UseAbsolutePaths".into()
                },
            ]
        );
    }

    #[test]
    fn booleans_must_be_yes_or_no() {
        let text = "[Setup]\nWizardStyle=modern\nSolidCompression=true\nUninstallable=No\n";
        let errors = validate_script(text).unwrap_err();
        assert_eq!(
            errors,
            vec![ScriptViolation::NonLiteralBoolean {
                line: 3,
                name: "SolidCompression".into(),
                value: "true".into()
            }]
        );
    }

    #[test]
    fn wizard_style_and_output_name_are_checked() {
        let text = "[Setup]\nWizardStyle=classic\nOutputBaseFilename=My Setup\nApp Name=x\n";
        let errors = validate_script(text).unwrap_err();
        assert!(errors.contains(&ScriptViolation::WizardStyleNotModern));
        assert!(errors.contains(&ScriptViolation::OutputNameHasSpaces {
            line: 3,
            value: "My Setup".into()
        }));
        assert!(errors.contains(&ScriptViolation::SpacedDirective {
            line: 4,
            name: "App Name".into()
        }));
    }

    #[test]
    fn code_section_is_not_inspected() {
        let text = format!("{GOOD}UseAbsolutePaths=yes\n");
        assert_eq!(validate_script(&text), Ok(()));
    }
}
