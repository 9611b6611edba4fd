use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub csrf_cookie_name: String,
    /// Raw `Cookie` header copied from an authenticated browser session.
    pub session_cookie: Option<String>,
    pub campaign_poll_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000/".into(),
            csrf_cookie_name: client_core::csrf::DEFAULT_CSRF_COOKIE.into(),
            session_cookie: None,
            campaign_poll_seconds: 30,
            request_timeout_seconds: 15,
        }
    }
}

impl ClientSettings {
    pub fn campaign_poll_period(&self) -> Duration {
        Duration::from_secs(self.campaign_poll_seconds.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    csrf_cookie_name: Option<String>,
    session_cookie: Option<String>,
    campaign_poll_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
}

/// Defaults, then the config file when present, then `APP__*` variables.
pub fn load_settings(path: &Path) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.csrf_cookie_name {
        settings.csrf_cookie_name = v;
    }
    if let Some(v) = file_cfg.session_cookie {
        settings.session_cookie = Some(v);
    }
    if let Some(v) = file_cfg.campaign_poll_seconds {
        settings.campaign_poll_seconds = v;
    }
    if let Some(v) = file_cfg.request_timeout_seconds {
        settings.request_timeout_seconds = v;
    }
    Ok(())
}

fn apply_env<F>(settings: &mut ClientSettings, var: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__CSRF_COOKIE_NAME") {
        settings.csrf_cookie_name = v;
    }
    if let Some(v) = var("APP__SESSION_COOKIE") {
        settings.session_cookie = Some(v);
    }
    if let Some(v) = var("APP__CAMPAIGN_POLL_SECONDS") {
        settings.campaign_poll_seconds = v
            .parse()
            .with_context(|| format!("APP__CAMPAIGN_POLL_SECONDS is not a number: {v}"))?;
    }
    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECONDS") {
        settings.request_timeout_seconds = v
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_SECONDS is not a number: {v}"))?;
    }
    Ok(())
}
