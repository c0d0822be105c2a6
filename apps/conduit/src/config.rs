use std::{fs, path::Path};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "conduit.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub page_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "https://api.realworld.io/api".into(),
            token: None,
            page_limit: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    token: Option<String>,
    page_limit: Option<u32>,
}

/// Defaults, then `conduit.toml` in the working directory, then env vars.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => {
            if let Some(v) = file_cfg.api_url {
                settings.api_url = v;
            }
            if let Some(v) = file_cfg.token {
                settings.token = Some(v);
            }
            if let Some(v) = file_cfg.page_limit {
                settings.page_limit = v;
            }
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "config: ignoring unreadable settings file");
        }
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CONDUIT_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = var("CONDUIT_TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = var("APP__TOKEN") {
        settings.token = Some(v);
    }

    if let Some(v) = var("APP__PAGE_LIMIT") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.page_limit = parsed;
        }
    }
}

pub fn parse_api_url(raw_api_url: &str) -> anyhow::Result<Url> {
    let trimmed = raw_api_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("api url must not be empty");
    }
    let url = Url::parse(trimmed).with_context(|| format!("invalid api url '{trimmed}'"))?;
    if url.cannot_be_a_base() {
        bail!("api url '{trimmed}' cannot carry a path");
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
