//! Configuration file management for notescribe.
//!
//! Settings live in `~/.config/notescribe/notescribe.toml`. Environment variables take
//! precedence over the file so keys can be injected without writing them to disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::host::kernel::DEFAULT_KERNEL_URL;
use crate::host::KernelClient;
use crate::transcription::api::DEFAULT_MODEL;
use crate::transcription::TranscriptionOptions;

/// Environment variables that override file settings.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_KERNEL_URL: &str = "SIYUAN_URL";
pub const ENV_KERNEL_TOKEN: &str = "SIYUAN_TOKEN";

/// Transcription API settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// Bearer key for the transcription API
    #[serde(default)]
    pub api_key: String,
    /// API root, e.g. "https://api.openai.com/v1" or a self-hosted server. Empty uses OpenAI.
    #[serde(default)]
    pub base_url: String,
    /// Transcription model name
    #[serde(default = "default_model")]
    pub model: String,
    /// ISO-639-1 language hint. Empty lets the API detect the language.
    #[serde(default)]
    pub language: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_kernel_url() -> String {
    DEFAULT_KERNEL_URL.to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            model: default_model(),
            language: String::new(),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("language", &self.language)
            .finish()
    }
}

/// SiYuan kernel connection settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiyuanConfig {
    /// Kernel address
    #[serde(default = "default_kernel_url")]
    pub url: String,
    /// API token from Settings > About. Empty when the kernel has no access code.
    #[serde(default)]
    pub token: String,
}

impl Default for SiyuanConfig {
    fn default() -> Self {
        Self {
            url: default_kernel_url(),
            token: String::new(),
        }
    }
}

impl fmt::Debug for SiyuanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiyuanConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotescribeConfig {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub siyuan: SiyuanConfig,
}

impl NotescribeConfig {
    /// Loads configuration from the user's config directory and applies environment
    /// overrides.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Reads a config file without applying environment overrides.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {}: {e}", path.display())
        })?;
        let config: NotescribeConfig = toml::from_str(&config_content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Writes the config with owner-only permissions, since it holds credentials.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let config_content = toml::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        #[cfg(unix)]
        restrict_permissions(path)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overrides file values with non-empty environment values.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut String); 4] = [
            (ENV_API_KEY, &mut self.openai.api_key),
            (ENV_BASE_URL, &mut self.openai.base_url),
            (ENV_KERNEL_URL, &mut self.siyuan.url),
            (ENV_KERNEL_TOKEN, &mut self.siyuan.token),
        ];
        for (name, target) in targets {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                tracing::debug!("Using {} from environment", name);
                *target = value;
            }
        }
    }

    /// Per-call options for the transcription client. Empty strings become `None`.
    pub fn transcription_options(&self) -> TranscriptionOptions {
        let non_empty = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        TranscriptionOptions {
            api_key: self.openai.api_key.trim().to_string(),
            language: non_empty(&self.openai.language),
            base_url: non_empty(&self.openai.base_url),
            model: non_empty(&self.openai.model),
        }
    }

    pub fn kernel_client(&self) -> KernelClient {
        let token = Some(self.siyuan.token.clone()).filter(|t| !t.trim().is_empty());
        KernelClient::new(&self.siyuan.url, token)
    }
}

/// Path to the config file, creating its directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
        .join(".config")
        .join("notescribe");
    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create config directory: {e}"))?;
    Ok(config_dir.join("notescribe.toml"))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}
