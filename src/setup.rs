//! First-run setup.
//!
//! Writes the default configuration template when no config file exists yet.

use std::path::Path;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../environments/notescribe.toml");

/// Creates the config file from the template if it is missing.
///
/// Returns `true` when a new file was written.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn ensure_config(config_path: &Path) -> anyhow::Result<bool> {
    if config_path.exists() {
        tracing::debug!("Config file present: {}", config_path.display());
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, DEFAULT_CONFIG)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(config_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("Created default configuration at {}", config_path.display());
    Ok(true)
}
