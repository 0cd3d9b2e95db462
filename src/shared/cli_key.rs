//! Usage: Shared CLI key constants and validation (single source of truth).

pub(crate) const SUPPORTED_CLI_KEYS: [&str; 3] = ["claude", "codex", "gemini"];

pub(crate) fn is_supported_cli_key(cli_key: &str) -> bool {
    SUPPORTED_CLI_KEYS.contains(&cli_key)
}

pub(crate) fn validate_cli_key(cli_key: &str) -> Result<(), String> {
    if is_supported_cli_key(cli_key) {
        Ok(())
    } else {
        Err(format!("SEC_INVALID_INPUT: unknown cli_key={cli_key}"))
    }
}

/// Normalizes an optional per-CLI filter: trims, maps empty to "all CLIs",
/// rejects unknown keys.
pub(crate) fn normalize_cli_filter(cli_key: Option<&str>) -> Result<Option<String>, String> {
    match cli_key.map(str::trim) {
        None | Some("") => Ok(None),
        Some(key) => {
            validate_cli_key(key)?;
            Ok(Some(key.to_string()))
        }
    }
}
