//! Interactive credential and endpoint setup.
//!
//! Prompts for the transcription API key and endpoint settings plus the SiYuan kernel
//! connection, then writes them to the config file. Pressing Enter keeps the current
//! value of any field.

use cliclack::{input, intro, note, outro, password};
use console::style;

use crate::config::{get_config_path, NotescribeConfig};
use crate::setup;
use crate::transcription::api::{transcription_endpoint, DEFAULT_MODEL};

/// Prompts for a secret, keeping `current` when the input is left empty.
fn prompt_secret(label: &str, current: &str, required: bool) -> anyhow::Result<String> {
    let has_current = !current.is_empty();
    let prompt = if has_current {
        format!("{label} (press Enter to keep current):")
    } else {
        format!("{label}:")
    };

    let mut secret = password(&prompt);
    if has_current || !required {
        secret = secret.allow_empty();
    }
    let value: String = secret
        .interact()
        .map_err(|e| anyhow::anyhow!("Input cancelled: {e}"))?;

    Ok(if value.trim().is_empty() {
        current.to_string()
    } else {
        value.trim().to_string()
    })
}

/// Prompts for a plain optional value, pre-filled with `current`.
fn prompt_value(label: &str, current: &str, placeholder: &str) -> anyhow::Result<String> {
    let mut prompt = input(label).placeholder(placeholder).required(false);
    if !current.is_empty() {
        prompt = prompt.default_input(current);
    }
    let value: String = prompt
        .interact()
        .map_err(|e| anyhow::anyhow!("Input cancelled: {e}"))?;
    Ok(value.trim().to_string())
}

/// Handles `notescribe auth`.
pub async fn handle_auth() -> anyhow::Result<()> {
    tracing::info!("=== notescribe Authentication ===");

    let config_path = get_config_path()?;
    setup::ensure_config(&config_path)?;
    // Environment overrides are deliberately not applied so they never end up on disk.
    let mut config = NotescribeConfig::load_from(&config_path).unwrap_or_else(|e| {
        tracing::warn!("Starting from defaults, existing config unreadable: {e}");
        NotescribeConfig::default()
    });

    intro(style(" notescribe auth ").on_white().black())?;

    config.openai.api_key = prompt_secret("Transcription API key", &config.openai.api_key, true)?;
    if config.openai.api_key.is_empty() {
        return Err(anyhow::anyhow!("API key cannot be empty"));
    }

    config.openai.base_url = prompt_value(
        "API base URL (empty for OpenAI)",
        &config.openai.base_url,
        "https://api.openai.com/v1",
    )?;
    config.openai.model = prompt_value("Model", &config.openai.model, DEFAULT_MODEL)?;
    config.openai.language = prompt_value(
        "Language hint (ISO-639-1, empty for auto-detect)",
        &config.openai.language,
        "en",
    )?;

    config.siyuan.url = prompt_value("SiYuan kernel URL", &config.siyuan.url, "http://127.0.0.1:6806")?;
    config.siyuan.token = prompt_secret("SiYuan API token", &config.siyuan.token, false)?;

    config.save_to(&config_path)?;

    note(
        "Transcription endpoint",
        transcription_endpoint(Some(&config.openai.base_url)),
    )?;
    outro("Configuration saved.")?;

    tracing::info!(
        "Authentication completed: base_url={:?} model={}",
        config.openai.base_url,
        config.openai.model
    );
    Ok(())
}
