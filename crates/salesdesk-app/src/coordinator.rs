// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::error::FetchError;
use crate::filters::{DateRange, FilterState};
use crate::model::{PageResult, iso_date};
use crate::pagination::PaginationState;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Everything one list request needs, captured at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: usize,
    pub page_size: usize,
    pub search: String,
    pub filters: Vec<(String, String)>,
    pub date_range: DateRange,
}

impl ListQuery {
    pub fn capture(pagination: &PaginationState, search: &str, filters: &FilterState) -> Self {
        Self {
            page: pagination.current_page(),
            page_size: pagination.page_size(),
            search: search.trim().to_owned(),
            filters: filters
                .active()
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
            date_range: filters.date_range(),
        }
    }

    /// Query-string pairs in wire order. Empty search and empty filter values
    /// are left out; the date range is sent only when both ends are set.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_owned(), self.page.to_string()),
            ("page_size".to_owned(), self.page_size.to_string()),
        ];
        if !self.search.is_empty() {
            pairs.push(("search".to_owned(), self.search.clone()));
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .cloned(),
        );
        if let (Some(from), Some(to)) = (self.date_range.from, self.date_range.to) {
            pairs.push(("start_date".to_owned(), iso_date::format(from)));
            pairs.push(("end_date".to_owned(), iso_date::format(to)));
        }
        pairs
    }
}

/// The backend list endpoint as the coordinator sees it.
pub trait PageSource<R>: Send + Sync {
    fn fetch_page(&self, query: &ListQuery) -> Result<PageResult<R>, FetchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent<R> {
    Resolved {
        seq: u64,
        result: Result<PageResult<R>, FetchError>,
    },
    SearchSettled {
        token: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<R> {
    Current(Result<PageResult<R>, FetchError>),
    Stale,
}

/// Issues list requests on worker threads and decides which responses count.
///
/// Every dispatch takes the next sequence number; only the response carrying
/// the most recently dispatched number is applied, whatever order responses
/// arrive in. Superseded requests are not cancelled, their results are just
/// dropped. Search input is debounced the same way: each keystroke takes a new
/// token and only the settle event for the newest token fires a fetch.
pub struct QueryCoordinator<R> {
    source: Arc<dyn PageSource<R>>,
    tx: Sender<CoordinatorEvent<R>>,
    debounce: Duration,
    next_seq: u64,
    latest_seq: Option<u64>,
    debounce_token: u64,
    loading: bool,
}

impl<R: Send + 'static> QueryCoordinator<R> {
    pub fn new(
        source: Arc<dyn PageSource<R>>,
        debounce: Duration,
    ) -> (Self, Receiver<CoordinatorEvent<R>>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                source,
                tx,
                debounce,
                next_seq: 1,
                latest_seq: None,
                debounce_token: 0,
                loading: false,
            },
            rx,
        )
    }

    pub fn fetch(&mut self, query: ListQuery) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_seq = Some(seq);
        self.loading = true;
        tracing::debug!(
            seq,
            page = query.page,
            page_size = query.page_size,
            search = %query.search,
            "dispatching list request"
        );

        let source = Arc::clone(&self.source);
        let sender = self.tx.clone();
        thread::spawn(move || {
            let result = source.fetch_page(&query);
            let _ = sender.send(CoordinatorEvent::Resolved { seq, result });
        });
        seq
    }

    /// Restarts the quiet period for search input and returns its token.
    pub fn schedule_search(&mut self) -> u64 {
        self.debounce_token += 1;
        let token = self.debounce_token;
        let delay = self.debounce;
        let sender = self.tx.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            let _ = sender.send(CoordinatorEvent::SearchSettled { token });
        });
        token
    }

    pub fn is_current_search(&self, token: u64) -> bool {
        token == self.debounce_token
    }

    /// Clears the loading flag when `seq` is the latest dispatch, on success
    /// and failure alike.
    pub fn resolve(
        &mut self,
        seq: u64,
        result: Result<PageResult<R>, FetchError>,
    ) -> Resolution<R> {
        if self.latest_seq != Some(seq) {
            tracing::debug!(seq, latest = ?self.latest_seq, "discarding stale list response");
            return Resolution::Stale;
        }
        self.loading = false;
        Resolution::Current(result)
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }
}
