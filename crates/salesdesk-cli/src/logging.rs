// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "SALESDESK_LOG";

/// `SALESDESK_LOG` wins over the configured level.
pub fn build_filter(configured_level: &str) -> Result<EnvFilter> {
    match env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .with_context(|| format!("parse {LOG_ENV}={directives:?}")),
        _ => EnvFilter::try_new(configured_level)
            .with_context(|| format!("parse log.level {configured_level:?}")),
    }
}

/// Installs a file-backed fmt subscriber. Without a file nothing is
/// installed since the terminal UI owns stdout and stderr.
pub fn init(level: &str, file: Option<&Path>) -> Result<()> {
    let Some(path) = file else {
        return Ok(());
    };

    let filter = build_filter(level)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}; fix [log].file", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    tracing::debug!(file = %path.display(), "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{LOG_ENV, build_filter, init};
    use anyhow::Result;

    #[test]
    fn missing_log_file_installs_nothing() -> Result<()> {
        init("info", None)
    }

    #[test]
    fn configured_level_must_parse() {
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        assert!(build_filter("salesdesk_api=debug,warn").is_ok());
        assert!(build_filter("salesdesk=loud").is_err());
    }
}
