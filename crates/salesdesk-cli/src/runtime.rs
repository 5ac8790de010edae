// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result};
use salesdesk_api::Client;
use salesdesk_app::{
    CoordinatorEvent, ListView, SalesOrder, SessionContext, ViewConfig, sales_order_registry,
};
use salesdesk_db::SessionStore;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

pub type OrderView = (ListView<SalesOrder>, Receiver<CoordinatorEvent<SalesOrder>>);

/// Session store plus the HTTP client that reads tokens from it.
pub struct Runtime {
    session: Arc<SessionStore>,
    client: Client,
    view_config: ViewConfig,
}

impl Runtime {
    pub fn from_config(config: &Config, db_path: &Path) -> Result<Self> {
        let session = open_session(db_path)?;
        Self::new(
            session,
            config.base_url(),
            config.timeout()?,
            config.view_config()?,
        )
    }

    pub fn new(
        session: Arc<SessionStore>,
        base_url: &str,
        timeout: Duration,
        view_config: ViewConfig,
    ) -> Result<Self> {
        let client = Client::new(base_url, timeout, Arc::clone(&session) as Arc<dyn SessionContext>)
            .with_context(|| format!("invalid [api] config ({base_url}); fix base_url/timeout"))?;
        Ok(Self {
            session,
            client,
            view_config,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn store_token(&self, token: &str) -> Result<()> {
        self.session.set_tokens(token, None)?;
        tracing::debug!("access token stored");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.session.clear()
    }

    pub fn order_view(&self) -> Result<OrderView> {
        ListView::new(
            sales_order_registry()?,
            self.view_config,
            Arc::new(self.client.clone()),
        )
    }
}

pub fn open_session(db_path: &Path) -> Result<Arc<SessionStore>> {
    let store = SessionStore::open(db_path).with_context(|| {
        format!(
            "open session database {} -- if this path is wrong, set [storage].db_path or SALESDESK_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    Ok(Arc::new(store))
}
