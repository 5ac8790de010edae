// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use salesdesk_app::{FetchError, ListQuery, PageResult, PageSource, SalesOrder, SessionContext};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const ORDERS_PATH: &str = "api/sales/orders/";

/// Blocking client for the sales backend's paginated list endpoints.
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
    session: Arc<dyn SessionContext>,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<dyn SessionContext>) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("parse api.base_url {base_url:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?} -- e.g. http://localhost:8000",
                base_url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn orders_url(&self, query: &ListQuery) -> Result<Url> {
        self.list_url(ORDERS_PATH, query)
    }

    pub fn list_orders(&self, query: &ListQuery) -> Result<PageResult<SalesOrder>, FetchError> {
        self.list_page(ORDERS_PATH, query)
    }

    /// Fetches one page from any list endpoint that speaks the
    /// `{count, next, previous, results}` envelope.
    pub fn list_page<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
    ) -> Result<PageResult<R>, FetchError> {
        let url = self
            .list_url(path, query)
            .map_err(|error| FetchError::Network(format!("{error:#}")))?;

        let mut request = self.http.get(url);
        match self.session.access_token() {
            Ok(Some(token)) => request = request.bearer_auth(token),
            Ok(None) => {}
            Err(error) => tracing::warn!("read access token: {error:#}"),
        }

        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, &error))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(FetchError::Unauthorized);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                message: clean_error_message(&body),
            });
        }

        response
            .json::<PageResult<R>>()
            .map_err(|error| FetchError::Decode(error.to_string()))
    }

    /// Fetches a one-row page to confirm the endpoint is reachable and the
    /// session is accepted. Returns the server's total count.
    pub fn check(&self) -> Result<usize> {
        let query = ListQuery {
            page: 1,
            page_size: 1,
            search: String::new(),
            filters: Vec::new(),
            date_range: Default::default(),
        };
        let page = self
            .list_orders(&query)
            .map_err(|error| anyhow!("{} ({error})", error.user_message()))?;
        Ok(page.count)
    }

    fn list_url(&self, path: &str, query: &ListQuery) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .with_context(|| format!("build list URL for {path:?}"))?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());
        Ok(url)
    }

    fn expire_session(&self) {
        match self.session.clear() {
            Ok(()) => tracing::warn!("server rejected the access token; session cleared"),
            Err(error) => tracing::warn!("server rejected the access token; clear session: {error:#}"),
        }
    }
}

impl PageSource<SalesOrder> for Client {
    fn fetch_page(&self, query: &ListQuery) -> Result<PageResult<SalesOrder>, FetchError> {
        self.list_orders(query)
    }
}

fn connection_error(base_url: &Url, error: &reqwest::Error) -> FetchError {
    FetchError::Network(format!("cannot reach {base_url} ({error})"))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

/// Pulls a human-readable reason out of an error body: a JSON `detail`,
/// `error` or `message` string, else a short plain-text body, else nothing.
fn clean_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = [parsed.detail, parsed.error, parsed.message]
            .into_iter()
            .flatten()
            .find(|message| !message.trim().is_empty())
    {
        return message.trim().to_owned();
    }

    let trimmed = body.trim();
    if trimmed.len() < 100 && !trimmed.contains('{') && !trimmed.contains('<') {
        return trimmed.to_owned();
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_message};
    use anyhow::Result;
    use salesdesk_app::{DateRange, ListQuery, StaticSession};
    use std::sync::Arc;
    use std::time::Duration;

    fn client(base_url: &str) -> Result<Client> {
        Client::new(
            base_url,
            Duration::from_secs(1),
            Arc::new(StaticSession::new(None)),
        )
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(
            clean_error_message(r#"{"detail": "Invalid page."}"#),
            "Invalid page."
        );
        assert_eq!(
            clean_error_message(r#"{"message": "database unavailable"}"#),
            "database unavailable"
        );
        assert_eq!(clean_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(clean_error_message("<html><body>oops</body></html>"), "");
        assert_eq!(clean_error_message(&"x".repeat(200)), "");
    }

    #[test]
    fn orders_url_keeps_base_path_and_encodes_query() -> Result<()> {
        let client = client("http://localhost:8000/backend")?;
        let url = client.orders_url(&ListQuery {
            page: 2,
            page_size: 25,
            search: "olive oil".to_owned(),
            filters: vec![("status".to_owned(), "shipped".to_owned())],
            date_range: DateRange::default(),
        })?;
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/backend/api/sales/orders/?page=2&page_size=25&search=olive+oil&status=shipped"
        );
        Ok(())
    }

    #[test]
    fn rejects_empty_and_non_http_base_urls() {
        assert!(client("  ").is_err());
        let error = client("ftp://example.com").err().map(|error| error.to_string());
        assert!(error.is_some_and(|message| message.contains("http or https")));
    }
}
