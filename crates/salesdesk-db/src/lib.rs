// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use salesdesk_app::SessionContext;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const APP_NAME: &str = "salesdesk";

const REQUIRED_COLUMNS: [&str; 3] = ["key", "value", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
}

impl SessionKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// Durable home for the signed-in user's tokens.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open session database at {}", path.display()))?;
        configure_connection(&conn)?;
        if path.exists() {
            set_private_permissions(path)?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory session database")?;
        configure_connection(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn bootstrap(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(include_str!("sql/schema.sql"))
            .context("create session schema")?;
        validate_schema(&conn)
    }

    /// Stores a fresh login. Any previous refresh token is dropped when
    /// `refresh` is `None`.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> Result<()> {
        let access = access.trim();
        if access.is_empty() {
            bail!("access token must not be empty -- pass the token issued at sign-in");
        }

        let now = now_rfc3339()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction().context("begin session update")?;
        upsert(&tx, SessionKey::AccessToken, access, &now)?;
        match refresh.map(str::trim).filter(|token| !token.is_empty()) {
            Some(token) => upsert(&tx, SessionKey::RefreshToken, token, &now)?,
            None => {
                tx.execute(
                    "DELETE FROM session WHERE key = ?",
                    params![SessionKey::RefreshToken.as_str()],
                )
                .context("drop stale refresh token")?;
            }
        }
        tx.commit().context("commit session update")
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.get_raw(SessionKey::RefreshToken)
    }

    pub fn updated_at(&self, key: SessionKey) -> Result<Option<String>> {
        self.lock()?
            .query_row(
                "SELECT updated_at FROM session WHERE key = ?",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read {} timestamp", key.as_str()))
    }

    fn get_raw(&self, key: SessionKey) -> Result<Option<String>> {
        self.lock()?
            .query_row(
                "SELECT value FROM session WHERE key = ?",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read {}", key.as_str()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("session database lock poisoned"))
    }
}

impl SessionContext for SessionStore {
    fn access_token(&self) -> Result<Option<String>> {
        self.get_raw(SessionKey::AccessToken)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn
            .execute(
                "DELETE FROM session WHERE key IN (?, ?)",
                params![
                    SessionKey::AccessToken.as_str(),
                    SessionKey::RefreshToken.as_str()
                ],
            )
            .context("clear session tokens")?;
        tracing::debug!(removed, "session tokens cleared");
        Ok(())
    }
}

fn upsert(conn: &Connection, key: SessionKey, value: &str, now: &str) -> Result<()> {
    conn.execute(
        "
        INSERT INTO session (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
          value = excluded.value,
          updated_at = excluded.updated_at
        ",
        params![key.as_str(), value, now],
    )
    .with_context(|| format!("upsert {}", key.as_str()))?;
    Ok(())
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("SALESDESK_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set SALESDESK_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("session.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn validate_schema(conn: &Connection) -> Result<()> {
    let mut statement = conn
        .prepare("SELECT name FROM pragma_table_info('session')")
        .context("inspect session table")?;
    let columns = statement
        .query_map([], |row| row.get::<_, String>(0))
        .context("list session columns")?
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect session columns")?;

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !columns.contains(*column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "session table is missing column(s) {}; delete the session database and sign in again",
            missing.join(", ")
        );
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn set_private_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions)
            .with_context(|| format!("set permissions on {}", path.display()))?;
    }
    Ok(())
}
