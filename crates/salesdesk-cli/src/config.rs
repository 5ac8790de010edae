// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use salesdesk_app::{DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES, ViewConfig};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_SEARCH_DEBOUNCE: &str = "500ms";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            view: View::default(),
            storage: Storage::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct View {
    pub page_size: Option<usize>,
    pub search_debounce: Option<String>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
            search_debounce: Some(DEFAULT_SEARCH_DEBOUNCE.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("SALESDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set SALESDESK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(salesdesk_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and put values under [api], [view], [storage], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.base_url().trim().is_empty() {
            bail!(
                "api.base_url in {} must not be empty, e.g. {DEFAULT_BASE_URL}",
                path.display()
            );
        }

        if let Some(timeout) = &self.api.timeout
            && parse_duration(timeout)? <= Duration::ZERO
        {
            bail!(
                "api.timeout in {} must be positive, got {}",
                path.display(),
                timeout
            );
        }

        if let Some(page_size) = self.view.page_size
            && !PAGE_SIZE_CHOICES.contains(&page_size)
        {
            bail!(
                "view.page_size in {} must be one of {:?}, got {}",
                path.display(),
                PAGE_SIZE_CHOICES,
                page_size
            );
        }

        if let Some(debounce) = &self.view.search_debounce
            && parse_duration(debounce)? <= Duration::ZERO
        {
            bail!(
                "view.search_debounce in {} must be positive, got {}",
                path.display(),
                debounce
            );
        }

        if let Some(db_path) = &self.storage.db_path {
            salesdesk_db::validate_db_path(db_path)?;
        }

        if let Some(level) = &self.log.level
            && level.trim().is_empty()
        {
            bail!(
                "log.level in {} must not be empty; use error, warn, info, debug or trace",
                path.display()
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn view_config(&self) -> Result<ViewConfig> {
        Ok(ViewConfig {
            page_size: self.view.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            search_debounce: parse_duration(
                self.view
                    .search_debounce
                    .as_deref()
                    .unwrap_or(DEFAULT_SEARCH_DEBOUNCE),
            )?,
        })
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => salesdesk_db::default_db_path(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log.file.as_deref().map(Path::new)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# salesdesk config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{DEFAULT_BASE_URL}\"\ntimeout = \"{DEFAULT_TIMEOUT}\"\n\n[view]\n# One of 10, 25, 50, 100\npage_size = {DEFAULT_PAGE_SIZE}\nsearch_debounce = \"{DEFAULT_SEARCH_DEBOUNCE}\"\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/salesdesk/session.db)\n# db_path = \"/absolute/path/to/session.db\"\n\n[log]\n# SALESDESK_LOG overrides this when set\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# Logging is off unless a file is given; the terminal belongs to the UI\n# file = \"/tmp/salesdesk.log\"\n",
            path.display(),
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .with_context(|| format!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
