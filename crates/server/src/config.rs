use std::{collections::HashMap, fs};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub summary_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "0.0.0.0:5000".into(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.into(),
            summary_model: DEFAULT_SUMMARY_MODEL.into(),
        }
    }
}

/// `server.toml` in the working directory, then the process environment.
pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub(crate) fn settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("openai_api_key") {
                settings.openai_api_key = non_blank(v.clone());
            }
            if let Some(v) = file_cfg.get("openai_base_url") {
                settings.openai_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("summary_model") {
                settings.summary_model = v.clone();
            }
        }
    }

    if let Some(port) = env("PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
        settings.server_bind = format!("0.0.0.0:{port}");
    }
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("OPENAI_API_KEY") {
        settings.openai_api_key = non_blank(v);
    }
    if let Some(v) = env("OPENAI_BASE_URL") {
        settings.openai_base_url = v;
    }
    if let Some(v) = env("SUMMARY_MODEL") {
        settings.summary_model = v;
    }

    settings.openai_base_url = settings.openai_base_url.trim_end_matches('/').to_string();
    settings
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
