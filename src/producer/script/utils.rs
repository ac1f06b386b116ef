//! Inno Setup utility functions.

/// Inno Setup boolean literal.
pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// `PrivilegesRequired` value for the installer.
pub fn privileges(run_as_admin: bool) -> &'static str {
    if run_as_admin { "admin" } else { "lowest" }
}

/// Format version string for `VersionInfoVersion`.
///
/// Inno Setup requires up to four numeric parts; this always emits four:
/// - "3" -> "3.0.0.0"
/// - "3.5.1" -> "3.5.1.0"
/// - "3.5.1-12888" -> "3.5.1.0"
/// - "1.2.3.4.5" -> "1.2.3.4"
///
/// Each part keeps its leading digits only; parts without digits become 0.
pub fn format_version_info(version: &str) -> String {
    let mut parts: Vec<String> = version
        .trim()
        .split('.')
        .take(4)
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            let number = digits.parse::<u64>().unwrap_or(0).min(u64::from(u16::MAX));
            number.to_string()
        })
        .collect();
    parts.resize(4, "0".to_string());
    parts.join(".")
}
