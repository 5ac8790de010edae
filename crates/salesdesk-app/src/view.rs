// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;
use time::Date;

use crate::columns::ColumnRegistry;
use crate::coordinator::{
    CoordinatorEvent, DEFAULT_SEARCH_DEBOUNCE, ListQuery, PageSource, QueryCoordinator, Resolution,
};
use crate::error::FetchError;
use crate::evaluate::refine;
use crate::filters::FilterState;
use crate::model::PageResult;
use crate::pagination::{DEFAULT_PAGE_SIZE, PaginationState};
use crate::record::ViewRecord;
use crate::sort::{SortSpec, cycle_sort, sort_rows};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    pub page_size: usize,
    pub search_debounce: Duration,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Refresh,
    GoToPage(usize),
    NextPage,
    PrevPage,
    ChangePageSize(usize),
    SetSearch(String),
    SetFilter { key: String, value: String },
    ApplyFilters(Vec<(String, String)>),
    SetDateRange(Option<Date>, Option<Date>),
    ClearFilters,
    ToggleColumn(String),
    ShowAllColumns,
    HideAllColumns,
    CycleSort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    FetchDispatched { seq: u64, query: ListQuery },
    SearchScheduled { token: u64 },
    PageLoaded { seq: u64, count: usize },
    StaleDiscarded { seq: u64 },
    FetchFailed { seq: u64, message: String },
    SessionExpired,
    ColumnsChanged,
    ColumnUnknown(String),
    SortChanged(Option<SortSpec>),
    SortUnavailable(String),
    Rejected(String),
}

/// One paginated, filterable list bound to a remote page source.
///
/// Commands mutate local state and may dispatch a fetch; results come back
/// through the receiver returned by [`ListView::new`] and are fed to
/// [`ListView::handle_event`] on the owning thread.
pub struct ListView<R> {
    columns: ColumnRegistry,
    filters: FilterState,
    pagination: PaginationState,
    // Page and size of the rows on screen; `pagination` runs ahead while a
    // fetch is in flight.
    displayed: PaginationState,
    search: String,
    sort: Option<SortSpec>,
    rows: Vec<R>,
    state: LoadState,
    error: Option<String>,
    coordinator: QueryCoordinator<R>,
}

impl<R> ListView<R>
where
    R: ViewRecord + Clone + Send + 'static,
{
    pub fn new(
        columns: ColumnRegistry,
        config: ViewConfig,
        source: Arc<dyn PageSource<R>>,
    ) -> Result<(Self, Receiver<CoordinatorEvent<R>>)> {
        let pagination = PaginationState::new(config.page_size)?;
        let (coordinator, rx) = QueryCoordinator::new(source, config.search_debounce);
        Ok((
            Self {
                columns,
                filters: FilterState::new(),
                pagination,
                displayed: pagination,
                search: String::new(),
                sort: None,
                rows: Vec::new(),
                state: LoadState::Idle,
                error: None,
                coordinator,
            },
            rx,
        ))
    }

    pub fn dispatch(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        match command {
            ViewCommand::Refresh => vec![self.fetch()],
            ViewCommand::GoToPage(page) => {
                self.pagination.go_to_page(page);
                vec![self.fetch()]
            }
            ViewCommand::NextPage => self.step_page(1),
            ViewCommand::PrevPage => self.step_page(-1),
            ViewCommand::ChangePageSize(size) => match self.pagination.change_page_size(size) {
                Ok(()) => vec![self.fetch()],
                Err(error) => {
                    tracing::warn!(size, "rejected page size change: {error:#}");
                    vec![ViewEvent::Rejected(error.to_string())]
                }
            },
            ViewCommand::SetSearch(text) => {
                self.search = text;
                let token = self.coordinator.schedule_search();
                vec![ViewEvent::SearchScheduled { token }]
            }
            ViewCommand::SetFilter { key, value } => {
                self.filters.set_filter(&key, &value);
                self.refetch_from_start()
            }
            ViewCommand::ApplyFilters(filters) => {
                self.filters.apply(filters);
                self.refetch_from_start()
            }
            ViewCommand::SetDateRange(from, to) => {
                self.filters.set_date_range(from, to);
                self.refetch_from_start()
            }
            ViewCommand::ClearFilters => {
                self.filters.clear();
                self.refetch_from_start()
            }
            ViewCommand::ToggleColumn(id) => {
                if self.columns.toggle_visibility(&id) {
                    vec![ViewEvent::ColumnsChanged]
                } else {
                    vec![ViewEvent::ColumnUnknown(id)]
                }
            }
            ViewCommand::ShowAllColumns => {
                self.columns.show_all();
                vec![ViewEvent::ColumnsChanged]
            }
            ViewCommand::HideAllColumns => {
                self.columns.hide_all();
                vec![ViewEvent::ColumnsChanged]
            }
            ViewCommand::CycleSort(id) => match self.columns.get(&id) {
                Some(column) if column.sortable => {
                    self.sort = cycle_sort(self.sort, column.id);
                    vec![ViewEvent::SortChanged(self.sort)]
                }
                _ => vec![ViewEvent::SortUnavailable(id)],
            },
        }
    }

    pub fn handle_event(&mut self, event: CoordinatorEvent<R>) -> Vec<ViewEvent> {
        match event {
            CoordinatorEvent::SearchSettled { token } => {
                if !self.coordinator.is_current_search(token) {
                    return Vec::new();
                }
                self.refetch_from_start()
            }
            CoordinatorEvent::Resolved { seq, result } => {
                match self.coordinator.resolve(seq, result) {
                    Resolution::Stale => vec![ViewEvent::StaleDiscarded { seq }],
                    Resolution::Current(Ok(page)) => vec![self.apply_page(seq, page)],
                    Resolution::Current(Err(error)) => self.apply_failure(seq, &error),
                }
            }
        }
    }

    /// Rows of the current page that pass the local filters, in display order.
    pub fn visible_rows(&self) -> Cow<'_, [R]> {
        let refined = refine(&self.rows, &self.filters);
        match self.sort {
            None => refined,
            Some(spec) => {
                let mut rows = refined.into_owned();
                sort_rows(&mut rows, spec);
                Cow::Owned(rows)
            }
        }
    }

    /// Running row number for the index column, counting across pages.
    pub const fn ordinal(&self, position: usize) -> usize {
        self.pagination.first_ordinal() + position
    }

    pub const fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub const fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub const fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// The last page the server returned, before local filtering.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub const fn state(&self) -> LoadState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub const fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    fn step_page(&mut self, delta: isize) -> Vec<ViewEvent> {
        let current = self.pagination.current_page();
        let target = current.saturating_add_signed(delta);
        if self.pagination.go_to_page(target) == current {
            return Vec::new();
        }
        vec![self.fetch()]
    }

    fn refetch_from_start(&mut self) -> Vec<ViewEvent> {
        self.pagination.reset_to_first();
        vec![self.fetch()]
    }

    fn fetch(&mut self) -> ViewEvent {
        let query = ListQuery::capture(&self.pagination, &self.search, &self.filters);
        let seq = self.coordinator.fetch(query.clone());
        self.state = LoadState::Loading;
        ViewEvent::FetchDispatched { seq, query }
    }

    fn apply_page(&mut self, seq: u64, page: PageResult<R>) -> ViewEvent {
        let count = page.count;
        let mut rows = page.results;
        let limit = self.pagination.page_size();
        if rows.len() > limit {
            tracing::warn!(
                received = rows.len(),
                page_size = limit,
                "server returned more rows than requested; truncating"
            );
            rows.truncate(limit);
        }

        self.pagination.set_total_count(count);
        self.displayed = self.pagination;
        self.rows = rows;
        self.state = LoadState::Loaded;
        self.error = None;
        ViewEvent::PageLoaded { seq, count }
    }

    fn apply_failure(&mut self, seq: u64, error: &FetchError) -> Vec<ViewEvent> {
        tracing::warn!(seq, "list fetch failed: {error}");
        let message = error.user_message();
        self.pagination = self.displayed;
        self.state = LoadState::Errored;
        self.error = Some(message.clone());

        let mut events = vec![ViewEvent::FetchFailed { seq, message }];
        if error.is_session_fatal() {
            events.push(ViewEvent::SessionExpired);
        }
        events
    }
}
