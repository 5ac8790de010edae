// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::sync::Mutex;

/// Where authenticated requests get their bearer token. Written on login and
/// logout only; read by every request.
pub trait SessionContext: Send + Sync {
    fn access_token(&self) -> Result<Option<String>>;
    fn clear(&self) -> Result<()>;
}

/// In-memory session, used by tests and `--check`.
#[derive(Debug, Default)]
pub struct StaticSession {
    token: Mutex<Option<String>>,
}

impl StaticSession {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_owned)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        match self.token.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SessionContext for StaticSession {
    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.lock().clone())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}
