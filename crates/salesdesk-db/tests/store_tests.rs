// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use rusqlite::Connection;
use salesdesk_app::SessionContext;
use salesdesk_db::{SessionStore, default_db_path, validate_db_path};
use salesdesk_testkit::{fixture_token, temp_db_path};
use std::sync::{Mutex, OnceLock};

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:session.db").is_err());
    assert!(validate_db_path("https://example.com/session.db").is_err());
    assert!(validate_db_path("session.db?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path(":memory:").is_ok());
    assert!(validate_db_path("/tmp/salesdesk/session.db").is_ok());
}

#[test]
fn tokens_survive_reopen() -> Result<()> {
    let (_temp, path) = temp_db_path()?;
    {
        let store = SessionStore::open(&path)?;
        store.bootstrap()?;
        store.set_tokens(fixture_token(), Some("refresh"))?;
    }

    let store = SessionStore::open(&path)?;
    store.bootstrap()?;
    assert_eq!(store.access_token()?, Some(fixture_token().to_owned()));
    assert_eq!(store.refresh_token()?, Some("refresh".to_owned()));
    Ok(())
}

#[test]
fn clear_removes_both_tokens() -> Result<()> {
    let store = SessionStore::open_memory()?;
    store.bootstrap()?;
    store.set_tokens(fixture_token(), Some("refresh"))?;

    store.clear()?;
    assert_eq!(store.access_token()?, None);
    assert_eq!(store.refresh_token()?, None);

    store.clear()?;
    Ok(())
}

#[test]
fn bootstrap_is_idempotent() -> Result<()> {
    let store = SessionStore::open_memory()?;
    store.bootstrap()?;
    store.set_tokens(fixture_token(), None)?;
    store.bootstrap()?;
    assert_eq!(store.access_token()?, Some(fixture_token().to_owned()));
    Ok(())
}

#[test]
fn bootstrap_rejects_incompatible_session_table() -> Result<()> {
    let (_temp, path) = temp_db_path()?;
    Connection::open(&path)?
        .execute_batch("CREATE TABLE session (key TEXT PRIMARY KEY, value TEXT NOT NULL);")?;

    let store = SessionStore::open(&path)?;
    let error = store
        .bootstrap()
        .expect_err("missing updated_at should fail");
    assert!(error.to_string().contains("updated_at"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn session_database_is_private() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, path) = temp_db_path()?;
    let store = SessionStore::open(&path)?;
    store.bootstrap()?;
    store.set_tokens(fixture_token(), None)?;

    let mode = std::fs::metadata(&path)?.permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    Ok(())
}

#[test]
fn default_db_path_honors_env_override() -> Result<()> {
    let _guard = env_lock();
    let temp = tempfile::tempdir()?;
    let override_path = temp.path().join("custom-session.db");
    // SAFETY: test-only process-local env mutation.
    unsafe {
        std::env::set_var("SALESDESK_DB_PATH", &override_path);
    }
    let resolved = default_db_path();
    // SAFETY: test cleanup for process-local env mutation.
    unsafe {
        std::env::remove_var("SALESDESK_DB_PATH");
    }
    assert_eq!(resolved?, override_path);
    Ok(())
}
