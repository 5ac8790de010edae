// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use salesdesk_app::{
    ColumnDescriptor, CoordinatorEvent, ListView, SortDirection, SortSpec, ViewCommand, ViewEvent,
    ViewRecord, iso_date,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::Date;

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const DATE_RANGE_SEPARATOR: &str = "..";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Nav,
    Search,
    Filter,
    DateRange,
}

impl InputMode {
    const fn label(self) -> &'static str {
        match self {
            Self::Nav => "NAV",
            Self::Search => "SEARCH",
            Self::Filter => "FILTER",
            Self::DateRange => "DATES",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct UiState {
    mode: InputMode,
    input: String,
    selected_row: usize,
    selected_col: usize,
    status: Option<String>,
    status_token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavCommand {
    MoveRow(isize),
    MoveColumn(isize),
    NextPage,
    PrevPage,
    CyclePageSize(isize),
    EditSearch,
    EditFilter,
    EditDateRange,
    ClearFilters,
    ToggleCurrentColumn,
    ShowAllColumns,
    HideAllColumns,
    SortCurrentColumn,
    Refresh,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InternalEvent {
    ClearStatus { token: u64 },
}

/// Runs the list view full-screen until the user quits. `events` is the
/// receiver paired with `view`.
pub fn run_app<R>(view: &mut ListView<R>, events: &Receiver<CoordinatorEvent<R>>) -> Result<()>
where
    R: ViewRecord + Clone + Send + 'static,
{
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let result = Terminal::new(backend)
        .context("create terminal")
        .and_then(|mut terminal| event_loop(&mut terminal, view, events));

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<R>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view: &mut ListView<R>,
    events: &Receiver<CoordinatorEvent<R>>,
) -> Result<()>
where
    R: ViewRecord + Clone + Send + 'static,
{
    let mut ui = UiState::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    let initial = view.dispatch(ViewCommand::Refresh);
    report(view, &mut ui, &internal_tx, &initial);

    loop {
        process_view_events(view, &mut ui, &internal_tx, events);
        process_internal_events(&mut ui, &internal_rx);

        terminal
            .draw(|frame| render(frame, view, &ui))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        if let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(view, &mut ui, &internal_tx, key)
        {
            return Ok(());
        }
    }
}

fn process_view_events<R>(
    view: &mut ListView<R>,
    ui: &mut UiState,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<CoordinatorEvent<R>>,
) where
    R: ViewRecord + Clone + Send + 'static,
{
    while let Ok(event) = rx.try_recv() {
        let events = view.handle_event(event);
        report(view, ui, tx, &events);
    }
}

fn process_internal_events(ui: &mut UiState, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == ui.status_token => {
                ui.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(ui: &mut UiState, internal_tx: &Sender<InternalEvent>, message: impl Into<String>) {
    ui.status = Some(message.into());
    ui.status_token = ui.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, ui.status_token);
}

fn report<R>(
    view: &ListView<R>,
    ui: &mut UiState,
    internal_tx: &Sender<InternalEvent>,
    events: &[ViewEvent],
) where
    R: ViewRecord + Clone + Send + 'static,
{
    for event in events {
        if let Some(message) = status_message(view, event) {
            emit_status(ui, internal_tx, message);
        }
    }
    clamp_cursor(view, ui);
}

fn status_message<R>(view: &ListView<R>, event: &ViewEvent) -> Option<String>
where
    R: ViewRecord + Clone + Send + 'static,
{
    match event {
        ViewEvent::FetchFailed { message, .. } => Some(message.clone()),
        ViewEvent::SessionExpired => {
            Some("signed out: run `salesdesk --set-token <token>` and restart".to_owned())
        }
        ViewEvent::ColumnUnknown(id) => Some(format!("unknown column: {id}")),
        ViewEvent::SortChanged(Some(spec)) => {
            let label = view
                .columns()
                .get(spec.column)
                .map_or(spec.column, |column| column.label);
            Some(format!("sort {label} {}", direction_label(spec.direction)))
        }
        ViewEvent::SortChanged(None) => Some("sort cleared".to_owned()),
        ViewEvent::SortUnavailable(_) => Some("sort unavailable".to_owned()),
        ViewEvent::Rejected(message) => Some(message.clone()),
        ViewEvent::FetchDispatched { .. }
        | ViewEvent::SearchScheduled { .. }
        | ViewEvent::PageLoaded { .. }
        | ViewEvent::StaleDiscarded { .. }
        | ViewEvent::ColumnsChanged => None,
    }
}

/// Returns true when the app should quit.
fn handle_key_event<R>(
    view: &mut ListView<R>,
    ui: &mut UiState,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool
where
    R: ViewRecord + Clone + Send + 'static,
{
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }
    if ui.mode != InputMode::Nav {
        handle_input_key(view, ui, internal_tx, key);
        return false;
    }

    let Some(command) = nav_command_for_key(key) else {
        return false;
    };
    if command == NavCommand::Quit {
        return true;
    }
    let events = apply_nav_command(view, ui, internal_tx, command);
    report(view, ui, internal_tx, &events);
    false
}

fn nav_command_for_key(key: KeyEvent) -> Option<NavCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(NavCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(NavCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(NavCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(NavCommand::MoveColumn(1)),
        (KeyCode::Char(']'), _) | (KeyCode::PageDown, _) => Some(NavCommand::NextPage),
        (KeyCode::Char('['), _) | (KeyCode::PageUp, _) => Some(NavCommand::PrevPage),
        (KeyCode::Char('+'), _) => Some(NavCommand::CyclePageSize(1)),
        (KeyCode::Char('-'), _) => Some(NavCommand::CyclePageSize(-1)),
        (KeyCode::Char('/'), _) => Some(NavCommand::EditSearch),
        (KeyCode::Char('f'), KeyModifiers::NONE) => Some(NavCommand::EditFilter),
        (KeyCode::Char('d'), KeyModifiers::NONE) => Some(NavCommand::EditDateRange),
        (KeyCode::Char('x'), KeyModifiers::NONE) => Some(NavCommand::ClearFilters),
        (KeyCode::Char('c'), KeyModifiers::NONE) => Some(NavCommand::ToggleCurrentColumn),
        (KeyCode::Char('C'), _) => Some(NavCommand::ShowAllColumns),
        (KeyCode::Char('H'), _) => Some(NavCommand::HideAllColumns),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(NavCommand::SortCurrentColumn),
        (KeyCode::Char('r'), KeyModifiers::NONE) => Some(NavCommand::Refresh),
        (KeyCode::Char('q'), _) => Some(NavCommand::Quit),
        _ => None,
    }
}

fn apply_nav_command<R>(
    view: &mut ListView<R>,
    ui: &mut UiState,
    internal_tx: &Sender<InternalEvent>,
    command: NavCommand,
) -> Vec<ViewEvent>
where
    R: ViewRecord + Clone + Send + 'static,
{
    match command {
        NavCommand::MoveRow(delta) => {
            let rows = view.visible_rows().len();
            ui.selected_row = step(ui.selected_row, delta, rows);
            Vec::new()
        }
        NavCommand::MoveColumn(delta) => {
            let columns = view.columns().visible_count();
            ui.selected_col = step(ui.selected_col, delta, columns);
            Vec::new()
        }
        NavCommand::NextPage => view.dispatch(ViewCommand::NextPage),
        NavCommand::PrevPage => view.dispatch(ViewCommand::PrevPage),
        NavCommand::CyclePageSize(delta) => {
            let size = view.pagination().next_size_choice(delta);
            emit_status(ui, internal_tx, format!("page size {size}"));
            view.dispatch(ViewCommand::ChangePageSize(size))
        }
        NavCommand::EditSearch => {
            ui.mode = InputMode::Search;
            ui.input = view.search().to_owned();
            Vec::new()
        }
        NavCommand::EditFilter => {
            ui.mode = InputMode::Filter;
            ui.input.clear();
            Vec::new()
        }
        NavCommand::EditDateRange => {
            ui.mode = InputMode::DateRange;
            let range = view.filters().date_range();
            ui.input = match (range.from, range.to) {
                (Some(from), Some(to)) => format_date_range(from, to),
                _ => String::new(),
            };
            Vec::new()
        }
        NavCommand::ClearFilters => {
            emit_status(ui, internal_tx, "filters cleared");
            view.dispatch(ViewCommand::ClearFilters)
        }
        NavCommand::ToggleCurrentColumn => match current_column(view, ui) {
            Some(column) if column.id == view.columns().sentinel() => {
                emit_status(ui, internal_tx, "the index column stays visible");
                Vec::new()
            }
            Some(column) => {
                let label = column.label;
                let events = view.dispatch(ViewCommand::ToggleColumn(column.id.to_owned()));
                emit_status(ui, internal_tx, format!("column hidden: {label}"));
                events
            }
            None => Vec::new(),
        },
        NavCommand::ShowAllColumns => {
            emit_status(ui, internal_tx, "all columns shown");
            view.dispatch(ViewCommand::ShowAllColumns)
        }
        NavCommand::HideAllColumns => {
            emit_status(ui, internal_tx, "columns hidden");
            ui.selected_col = 0;
            view.dispatch(ViewCommand::HideAllColumns)
        }
        NavCommand::SortCurrentColumn => match current_column(view, ui) {
            Some(column) => {
                let id = column.id.to_owned();
                view.dispatch(ViewCommand::CycleSort(id))
            }
            None => Vec::new(),
        },
        NavCommand::Refresh => view.dispatch(ViewCommand::Refresh),
        NavCommand::Quit => Vec::new(),
    }
}

fn handle_input_key<R>(
    view: &mut ListView<R>,
    ui: &mut UiState,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) where
    R: ViewRecord + Clone + Send + 'static,
{
    let mode = ui.mode;
    let events = match key.code {
        KeyCode::Esc => {
            ui.mode = InputMode::Nav;
            ui.input.clear();
            Vec::new()
        }
        KeyCode::Enter => {
            ui.mode = InputMode::Nav;
            let input = std::mem::take(&mut ui.input);
            commit_input(view, ui, internal_tx, mode, &input)
        }
        KeyCode::Backspace => {
            ui.input.pop();
            live_search(view, mode, &ui.input)
        }
        KeyCode::Char(ch) => {
            ui.input.push(ch);
            live_search(view, mode, &ui.input)
        }
        _ => Vec::new(),
    };
    report(view, ui, internal_tx, &events);
}

// Search text is pushed on every edit; the view debounces it.
fn live_search<R>(view: &mut ListView<R>, mode: InputMode, input: &str) -> Vec<ViewEvent>
where
    R: ViewRecord + Clone + Send + 'static,
{
    if mode != InputMode::Search {
        return Vec::new();
    }
    view.dispatch(ViewCommand::SetSearch(input.to_owned()))
}

fn commit_input<R>(
    view: &mut ListView<R>,
    ui: &mut UiState,
    internal_tx: &Sender<InternalEvent>,
    mode: InputMode,
    input: &str,
) -> Vec<ViewEvent>
where
    R: ViewRecord + Clone + Send + 'static,
{
    match mode {
        InputMode::Nav | InputMode::Search => Vec::new(),
        InputMode::Filter => match parse_filter_input(input) {
            Ok((key, value)) => {
                let message = if value.is_empty() {
                    format!("filter {key} removed")
                } else {
                    format!("filter {key}={value}")
                };
                emit_status(ui, internal_tx, message);
                view.dispatch(ViewCommand::SetFilter { key, value })
            }
            Err(error) => {
                emit_status(ui, internal_tx, format!("{error:#}"));
                Vec::new()
            }
        },
        InputMode::DateRange => match parse_date_range_input(input) {
            Ok((from, to)) => view.dispatch(ViewCommand::SetDateRange(from, to)),
            Err(error) => {
                emit_status(ui, internal_tx, format!("{error:#}"));
                Vec::new()
            }
        },
    }
}

/// Parses `key=value`. An empty value removes that filter.
fn parse_filter_input(input: &str) -> Result<(String, String)> {
    let Some((key, value)) = input.split_once('=') else {
        bail!("filter must look like key=value, e.g. status=shipped");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("filter key is empty; use key=value, e.g. status=shipped");
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

/// Parses `YYYY-MM-DD..YYYY-MM-DD`. Blank input clears the range.
fn parse_date_range_input(input: &str) -> Result<(Option<Date>, Option<Date>)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok((None, None));
    }
    let Some((from, to)) = trimmed.split_once(DATE_RANGE_SEPARATOR) else {
        bail!("date range must look like 2024-03-01..2024-03-31");
    };
    let parse = |raw: &str| -> Result<Date> {
        let raw = raw.trim();
        if raw.len() != 10 {
            bail!("invalid date {raw:?}; use YYYY-MM-DD");
        }
        iso_date::parse(raw).with_context(|| format!("invalid date {raw:?}; use YYYY-MM-DD"))
    };
    Ok((Some(parse(from)?), Some(parse(to)?)))
}

fn format_date_range(from: Date, to: Date) -> String {
    format!(
        "{}{DATE_RANGE_SEPARATOR}{}",
        iso_date::format(from),
        iso_date::format(to)
    )
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn clamp_cursor<R>(view: &ListView<R>, ui: &mut UiState)
where
    R: ViewRecord + Clone + Send + 'static,
{
    let rows = view.visible_rows().len();
    ui.selected_row = ui.selected_row.min(rows.saturating_sub(1));
    let columns = view.columns().visible_count();
    ui.selected_col = ui.selected_col.min(columns.saturating_sub(1));
}

fn current_column<'a, R>(view: &'a ListView<R>, ui: &UiState) -> Option<&'a ColumnDescriptor>
where
    R: ViewRecord + Clone + Send + 'static,
{
    view.columns().visible().nth(ui.selected_col)
}

const fn direction_label(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "asc",
        SortDirection::Desc => "desc",
    }
}

fn header_label(column: &ColumnDescriptor, sort: Option<SortSpec>) -> String {
    match sort {
        Some(spec) if spec.column == column.id => {
            let arrow = match spec.direction {
                SortDirection::Asc => "↑",
                SortDirection::Desc => "↓",
            };
            format!("{} {arrow}", column.label)
        }
        _ => column.label.to_owned(),
    }
}

fn table_title<R>(view: &ListView<R>) -> String
where
    R: ViewRecord + Clone + Send + 'static,
{
    let pagination = view.pagination();
    let columns = view.columns();
    let mut parts = vec![format!(
        "orders p:{}/{} n:{} c:{}/{}",
        pagination.current_page(),
        pagination.total_pages(),
        pagination.total_count(),
        columns.visible_count(),
        columns.columns().len(),
    )];

    if let Some(spec) = view.sort() {
        parts.push(format!(
            "sort {}:{}",
            spec.column,
            direction_label(spec.direction)
        ));
    }
    if !view.search().trim().is_empty() {
        parts.push(format!("search {:?}", view.search().trim()));
    }
    let active = view.filters().active_count();
    if active > 0 {
        parts.push(format!("filters {active}"));
    }
    if view.is_loading() {
        parts.push("loading".to_owned());
    }

    parts.join(" | ")
}

fn status_text<R>(view: &ListView<R>, ui: &UiState) -> String
where
    R: ViewRecord + Clone + Send + 'static,
{
    let mode = ui.mode.label();
    match ui.mode {
        InputMode::Search => return format!("{mode} | /{} | enter done | esc", ui.input),
        InputMode::Filter => return format!("{mode} | {} | key=value, enter apply | esc", ui.input),
        InputMode::DateRange => {
            return format!("{mode} | {} | from..to, blank clears | esc", ui.input);
        }
        InputMode::Nav => {}
    }

    let hints = "j/k h/l | [ ] page | +/- size | / search f filter d dates x clear | c/C/H cols | s sort | r retry | q";
    let message = ui.status.as_deref().or(view.error());
    match message {
        Some(message) => format!("{mode} | {message} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn cell_text<R>(view: &ListView<R>, row: &R, position: usize, column: &ColumnDescriptor) -> String
where
    R: ViewRecord + Clone + Send + 'static,
{
    if column.id == view.columns().sentinel() {
        return view.ordinal(position).to_string();
    }
    row.cell(column.id).display()
}

fn render<R>(frame: &mut ratatui::Frame<'_>, view: &ListView<R>, ui: &UiState)
where
    R: ViewRecord + Clone + Send + 'static,
{
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(frame.area());

    render_table(frame, layout[0], view, ui);

    let status_style = if ui.status.is_none() && view.error().is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let status = Paragraph::new(status_text(view, ui))
        .style(status_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[1]);
}

fn render_table<R>(frame: &mut ratatui::Frame<'_>, area: Rect, view: &ListView<R>, ui: &UiState)
where
    R: ViewRecord + Clone + Send + 'static,
{
    let columns: Vec<&ColumnDescriptor> = view.columns().visible().collect();
    let widths = columns
        .iter()
        .map(|column| Constraint::Length(column.width))
        .collect::<Vec<_>>();

    let header = Row::new(columns.iter().map(|column| {
        Cell::from(header_label(column, view.sort())).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let visible_rows = view.visible_rows();
    let rows = visible_rows.iter().enumerate().map(|(row_index, row)| {
        let selected_row = row_index == ui.selected_row;
        let cells = columns
            .iter()
            .enumerate()
            .map(|(column_index, column)| {
                let mut style = Style::default();
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && column_index == ui.selected_col {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(cell_text(view, row, row_index, column)).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(view))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::{
        InputMode, InternalEvent, NavCommand, UiState, handle_key_event, header_label,
        nav_command_for_key, parse_date_range_input, parse_filter_input, process_internal_events,
        render, status_text, table_title,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use salesdesk_app::{
        CoordinatorEvent, FetchError, ListQuery, ListView, PageResult, PageSource, SalesOrder,
        SortDirection, SortSpec, ViewCommand, ViewConfig, sales_order_registry,
    };
    use salesdesk_testkit::{OrderFaker, page_of};
    use std::sync::Arc;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::time::Duration;
    use time::{Date, Month};

    struct FakerSource {
        orders: Vec<SalesOrder>,
    }

    impl PageSource<SalesOrder> for FakerSource {
        fn fetch_page(&self, query: &ListQuery) -> Result<PageResult<SalesOrder>, FetchError> {
            Ok(page_of(&self.orders, query.page, query.page_size))
        }
    }

    type Harness = (
        ListView<SalesOrder>,
        Receiver<CoordinatorEvent<SalesOrder>>,
        UiState,
        Sender<InternalEvent>,
    );

    fn loaded_view(count: usize) -> Harness {
        let source = Arc::new(FakerSource {
            orders: OrderFaker::new(9).sales_orders(count),
        });
        let (mut view, rx) = ListView::new(
            sales_order_registry().expect("registry"),
            ViewConfig {
                page_size: 10,
                search_debounce: Duration::from_millis(1),
            },
            source,
        )
        .expect("view");
        view.dispatch(ViewCommand::Refresh);
        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("page should load");
        view.handle_event(event);
        let (tx, _internal_rx) = mpsc::channel();
        (view, rx, UiState::default(), tx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(
        view: &mut ListView<SalesOrder>,
        ui: &mut UiState,
        tx: &Sender<InternalEvent>,
        code: KeyCode,
    ) -> bool {
        handle_key_event(view, ui, tx, key(code))
    }

    fn settle(view: &mut ListView<SalesOrder>, rx: &Receiver<CoordinatorEvent<SalesOrder>>) {
        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("coordinator event");
        view.handle_event(event);
    }

    #[test]
    fn key_bindings_map_to_commands() {
        assert_eq!(
            nav_command_for_key(key(KeyCode::Char(']'))),
            Some(NavCommand::NextPage)
        );
        assert_eq!(
            nav_command_for_key(key(KeyCode::Char('['))),
            Some(NavCommand::PrevPage)
        );
        assert_eq!(
            nav_command_for_key(key(KeyCode::Char('+'))),
            Some(NavCommand::CyclePageSize(1))
        );
        assert_eq!(
            nav_command_for_key(KeyEvent::new(KeyCode::Char('H'), KeyModifiers::SHIFT)),
            Some(NavCommand::HideAllColumns)
        );
        assert_eq!(
            nav_command_for_key(key(KeyCode::Char('q'))),
            Some(NavCommand::Quit)
        );
        assert_eq!(nav_command_for_key(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let (mut view, _rx, mut ui, tx) = loaded_view(5);
        assert!(press(&mut view, &mut ui, &tx, KeyCode::Char('q')));
        assert!(handle_key_event(
            &mut view,
            &mut ui,
            &tx,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
        ));
    }

    #[test]
    fn row_cursor_stays_on_page() {
        let (mut view, _rx, mut ui, tx) = loaded_view(3);
        for _ in 0..5 {
            press(&mut view, &mut ui, &tx, KeyCode::Char('j'));
        }
        assert_eq!(ui.selected_row, 2);
        press(&mut view, &mut ui, &tx, KeyCode::Char('k'));
        assert_eq!(ui.selected_row, 1);
    }

    #[test]
    fn page_keys_move_between_pages() {
        let (mut view, rx, mut ui, tx) = loaded_view(25);
        press(&mut view, &mut ui, &tx, KeyCode::Char(']'));
        settle(&mut view, &rx);
        assert_eq!(view.pagination().current_page(), 2);
        assert!(table_title(&view).starts_with("orders p:2/3 n:25"));

        press(&mut view, &mut ui, &tx, KeyCode::Char('['));
        settle(&mut view, &rx);
        assert_eq!(view.pagination().current_page(), 1);
    }

    #[test]
    fn page_size_key_cycles_and_resets_page() {
        let (mut view, rx, mut ui, tx) = loaded_view(60);
        press(&mut view, &mut ui, &tx, KeyCode::Char(']'));
        settle(&mut view, &rx);
        press(&mut view, &mut ui, &tx, KeyCode::Char('+'));
        settle(&mut view, &rx);
        assert_eq!(view.pagination().page_size(), 25);
        assert_eq!(view.pagination().current_page(), 1);
        assert_eq!(ui.status.as_deref(), Some("page size 25"));
    }

    #[test]
    fn search_mode_types_and_commits() {
        let (mut view, _rx, mut ui, tx) = loaded_view(5);
        press(&mut view, &mut ui, &tx, KeyCode::Char('/'));
        assert_eq!(ui.mode, InputMode::Search);
        for ch in "oil".chars() {
            press(&mut view, &mut ui, &tx, KeyCode::Char(ch));
        }
        press(&mut view, &mut ui, &tx, KeyCode::Backspace);
        assert_eq!(view.search(), "oi");
        assert!(status_text(&view, &ui).starts_with("SEARCH | /oi"));

        press(&mut view, &mut ui, &tx, KeyCode::Enter);
        assert_eq!(ui.mode, InputMode::Nav);
        assert_eq!(view.search(), "oi");
    }

    #[test]
    fn filter_mode_applies_key_value() {
        let (mut view, _rx, mut ui, tx) = loaded_view(5);
        press(&mut view, &mut ui, &tx, KeyCode::Char('f'));
        for ch in "status=shipped".chars() {
            press(&mut view, &mut ui, &tx, KeyCode::Char(ch));
        }
        press(&mut view, &mut ui, &tx, KeyCode::Enter);
        assert_eq!(view.filters().get("status"), Some("shipped"));
        assert_eq!(ui.status.as_deref(), Some("filter status=shipped"));

        press(&mut view, &mut ui, &tx, KeyCode::Char('x'));
        assert!(view.filters().is_empty());
    }

    #[test]
    fn bad_filter_input_reports_without_changing_filters() {
        let (mut view, _rx, mut ui, tx) = loaded_view(5);
        press(&mut view, &mut ui, &tx, KeyCode::Char('f'));
        press(&mut view, &mut ui, &tx, KeyCode::Char('z'));
        press(&mut view, &mut ui, &tx, KeyCode::Enter);
        assert!(view.filters().is_empty());
        assert!(
            ui.status
                .as_deref()
                .is_some_and(|status| status.contains("key=value"))
        );
    }

    #[test]
    fn column_keys_protect_index_column() {
        let (mut view, _rx, mut ui, tx) = loaded_view(5);
        press(&mut view, &mut ui, &tx, KeyCode::Char('c'));
        assert_eq!(ui.status.as_deref(), Some("the index column stays visible"));

        press(&mut view, &mut ui, &tx, KeyCode::Char('l'));
        let before = view.columns().visible_count();
        press(&mut view, &mut ui, &tx, KeyCode::Char('c'));
        assert_eq!(view.columns().visible_count(), before - 1);

        handle_key_event(
            &mut view,
            &mut ui,
            &tx,
            KeyEvent::new(KeyCode::Char('H'), KeyModifiers::SHIFT),
        );
        assert_eq!(view.columns().visible_count(), 1);
        handle_key_event(
            &mut view,
            &mut ui,
            &tx,
            KeyEvent::new(KeyCode::Char('C'), KeyModifiers::SHIFT),
        );
        assert_eq!(
            view.columns().visible_count(),
            view.columns().columns().len()
        );
    }

    #[test]
    fn sort_key_cycles_current_column() {
        let (mut view, _rx, mut ui, tx) = loaded_view(5);
        press(&mut view, &mut ui, &tx, KeyCode::Char('l'));
        press(&mut view, &mut ui, &tx, KeyCode::Char('s'));
        assert_eq!(
            view.sort(),
            Some(SortSpec {
                column: "order_number",
                direction: SortDirection::Asc,
            })
        );
        assert_eq!(ui.status.as_deref(), Some("sort order asc"));
        press(&mut view, &mut ui, &tx, KeyCode::Char('s'));
        press(&mut view, &mut ui, &tx, KeyCode::Char('s'));
        assert_eq!(view.sort(), None);
        assert_eq!(ui.status.as_deref(), Some("sort cleared"));
    }

    #[test]
    fn stale_status_clear_is_ignored() {
        let mut ui = UiState {
            status: Some("sort cleared".to_owned()),
            status_token: 2,
            ..UiState::default()
        };
        let (tx, rx) = mpsc::channel();
        tx.send(InternalEvent::ClearStatus { token: 1 })
            .expect("send stale clear");
        process_internal_events(&mut ui, &rx);
        assert!(ui.status.is_some());

        tx.send(InternalEvent::ClearStatus { token: 2 })
            .expect("send current clear");
        process_internal_events(&mut ui, &rx);
        assert!(ui.status.is_none());
    }

    #[test]
    fn parse_filter_input_trims_and_allows_removal() {
        assert_eq!(
            parse_filter_input(" location = Pune ").expect("valid filter"),
            ("location".to_owned(), "Pune".to_owned())
        );
        assert_eq!(
            parse_filter_input("status=").expect("removal"),
            ("status".to_owned(), String::new())
        );
        assert!(parse_filter_input("=x").is_err());
        assert!(parse_filter_input("status").is_err());
    }

    #[test]
    fn parse_date_range_input_accepts_iso_pairs() {
        let march = |day| Date::from_calendar_date(2024, Month::March, day).expect("valid date");
        assert_eq!(
            parse_date_range_input("2024-03-01..2024-03-31").expect("valid range"),
            (Some(march(1)), Some(march(31)))
        );
        assert_eq!(parse_date_range_input("  ").expect("blank"), (None, None));
        assert!(parse_date_range_input("2024-03-01").is_err());
        assert!(parse_date_range_input("2024-03-01..soon").is_err());
        assert!(parse_date_range_input("2024-03-01T10:00..2024-03-02").is_err());
    }

    #[test]
    fn header_label_marks_sorted_column() -> anyhow::Result<()> {
        let registry = sales_order_registry()?;
        let total = registry.get("total_amount").expect("total column");
        let spec = SortSpec {
            column: "total_amount",
            direction: SortDirection::Desc,
        };
        assert_eq!(header_label(total, Some(spec)), "total ↓");
        assert_eq!(header_label(total, None), "total");
        Ok(())
    }

    #[test]
    fn render_draws_without_panicking() -> anyhow::Result<()> {
        let (view, _rx, ui, _tx) = loaded_view(12);
        let mut terminal = Terminal::new(TestBackend::new(120, 20))?;
        terminal.draw(|frame| render(frame, &view, &ui))?;
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("orders p:1/2 n:12"));
        Ok(())
    }
}
