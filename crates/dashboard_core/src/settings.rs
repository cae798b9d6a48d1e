use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub api_base_url: String,
    pub page_size: u32,
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000/".into(),
            page_size: 10,
            search_debounce_ms: 500,
            request_timeout_secs: 30,
        }
    }
}

impl DashboardSettings {
    /// Base URL with a trailing slash so collection paths join under it.
    pub fn api_base(&self) -> anyhow::Result<Url> {
        let raw = self.api_base_url.trim();
        if raw.is_empty() {
            bail!("api base url is empty");
        }
        let mut url = Url::parse(raw).with_context(|| format!("invalid api base url '{raw}'"))?;
        if url.cannot_be_a_base() {
            bail!("api base url '{raw}' cannot carry collection paths");
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    page_size: Option<u32>,
    search_debounce_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
}

/// Reads `path` (or `dashboard.toml` in the working directory) and then the
/// process environment. A missing file is not an error; a malformed one is.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<DashboardSettings> {
    let mut settings = DashboardSettings::default();

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());

    if settings.page_size == 0 {
        bail!("page_size must be greater than zero");
    }
    settings.api_base()?;
    Ok(settings)
}

fn apply_file(settings: &mut DashboardSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    Ok(())
}

fn apply_env(settings: &mut DashboardSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__PAGE_SIZE").and_then(|v| v.parse().ok()) {
        settings.page_size = v;
    }
    if let Some(v) = lookup("APP__SEARCH_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = v;
    }
}
