// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Terminal front-end for the card screens. The controllers own all
//! domain state; this crate translates key presses into commands, ships
//! requests to a runtime, and feeds completions back as replies. Region
//! snapshots for the detail screen are rebuilt only when the controller
//! publishes that region, so what is on screen is exactly what was last
//! published.

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tablero_app::detail::{CardDetailScreen, DetailCommand, DetailEffect, Route};
use tablero_app::list::{CardListScreen, ListCommand, ListEffect};
use tablero_app::ids::{DatabaseId, TableId};
use tablero_app::model::{
    Card, Database, DatasetQuery, DisplayType, Organization, PublicPerms, QueryMode,
    Table as DbTable,
};
use tablero_app::remote::{DetailReply, DetailRequest, ListReply, ListRequest};
use tablero_app::viewmodel::{EditorModel, HeaderModel, RenderRegion, VisualizationModel};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const RESULT_PREVIEW_ROWS: usize = 20;

/// Executes remote requests for the screens. The synchronous hooks do the
/// work; the spawn hooks decide threading, and default to inline execution
/// so tests and the demo runtime stay single-threaded.
pub trait ApiRuntime {
    fn fetch_organization(&mut self) -> Result<Organization>;
    fn execute_list(&mut self, request: ListRequest) -> ListReply;
    fn execute_detail(&mut self, request: DetailRequest) -> DetailReply;

    fn spawn_organization(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self
            .fetch_organization()
            .map_err(|error| error.to_string());
        tx.send(InternalEvent::OrganizationLoaded(outcome))
            .map_err(|_| anyhow!("event channel closed"))?;
        Ok(())
    }

    fn spawn_list(&mut self, request: ListRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let reply = self.execute_list(request);
        tx.send(InternalEvent::List(reply))
            .map_err(|_| anyhow!("event channel closed"))?;
        Ok(())
    }

    fn spawn_detail(&mut self, request: DetailRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let reply = self.execute_detail(request);
        tx.send(InternalEvent::Detail(reply))
            .map_err(|_| anyhow!("event channel closed"))?;
        Ok(())
    }
}

/// Completions delivered to the event loop between key presses.
#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    OrganizationLoaded(std::result::Result<Organization, String>),
    List(ListReply),
    Detail(DetailReply),
    ClearStatus { token: u64 },
}

/// Where the list screen wants to go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Quit,
    Open(Route),
}

#[derive(Debug, Default)]
struct ListView {
    cursor: usize,
    status: String,
    status_token: u64,
    search_input: Option<String>,
    rename_input: Option<String>,
}

#[derive(Debug, Default)]
struct DetailView {
    header: Option<HeaderModel>,
    editor: Option<EditorModel>,
    visualization: Option<VisualizationModel>,
    status: String,
    status_token: u64,
    name_input: Option<String>,
    query_input: Option<String>,
}

pub fn run_list<R: ApiRuntime>(
    screen: &mut CardListScreen,
    runtime: &mut R,
) -> Result<ListOutcome> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view = ListView::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = runtime.spawn_organization(internal_tx.clone()) {
        emit_list_status(&mut view, &internal_tx, format!("startup failed: {error}"));
    }

    let mut outcome = ListOutcome::Quit;
    let mut result = Ok(());
    loop {
        process_list_events(screen, runtime, &mut view, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render_list(frame, screen, &view)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(POLL_INTERVAL).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if let Some(done) =
                        handle_list_key(screen, runtime, &mut view, &internal_tx, key)
                    {
                        outcome = done;
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result.map(|()| outcome)
}

fn process_list_events<R: ApiRuntime>(
    screen: &mut CardListScreen,
    runtime: &mut R,
    view: &mut ListView,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view.status_token => {
                view.status.clear();
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::OrganizationLoaded(Ok(org)) => {
                let effects = screen.dispatch(ListCommand::OrganizationChanged(Some(org)));
                apply_list_effects(screen, runtime, view, tx, effects);
            }
            InternalEvent::OrganizationLoaded(Err(error)) => {
                emit_list_status(view, tx, format!("organization lookup failed: {error}"));
            }
            InternalEvent::List(reply) => {
                let effects = screen.handle_reply(reply);
                apply_list_effects(screen, runtime, view, tx, effects);
            }
            InternalEvent::Detail(_) => {}
        }
    }
}

fn apply_list_effects<R: ApiRuntime>(
    screen: &mut CardListScreen,
    runtime: &mut R,
    view: &mut ListView,
    tx: &Sender<InternalEvent>,
    effects: Vec<ListEffect>,
) {
    for effect in effects {
        match effect {
            ListEffect::Request(request) => {
                if let Err(error) = runtime.spawn_list(request, tx.clone()) {
                    emit_list_status(view, tx, format!("request failed: {error}"));
                }
            }
            ListEffect::Refresh => {
                clamp_cursor(view, screen.visible_cards().len());
            }
            ListEffect::SaveRejected(message) => {
                emit_list_status(view, tx, format!("save failed: {message}"));
            }
        }
    }
    clamp_cursor(view, screen.visible_cards().len());
}

fn handle_list_key<R: ApiRuntime>(
    screen: &mut CardListScreen,
    runtime: &mut R,
    view: &mut ListView,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> Option<ListOutcome> {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(ListOutcome::Quit);
    }

    if let Some(input) = view.search_input.as_mut() {
        match key.code {
            KeyCode::Esc => {
                view.search_input = None;
                let effects = screen.dispatch(ListCommand::SetSearch(None));
                apply_list_effects(screen, runtime, view, tx, effects);
            }
            KeyCode::Enter => {
                let entered = view.search_input.take().unwrap_or_default();
                let filter = (!entered.is_empty()).then_some(entered);
                let effects = screen.dispatch(ListCommand::SetSearch(filter));
                apply_list_effects(screen, runtime, view, tx, effects);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => input.push(ch),
            _ => {}
        }
        return None;
    }

    if let Some(input) = view.rename_input.as_mut() {
        match key.code {
            KeyCode::Esc => view.rename_input = None,
            KeyCode::Enter => {
                let name = view.rename_input.take().unwrap_or_default();
                if let Some((index, card)) = selected_card(screen, view) {
                    let mut card = card.clone();
                    card.name = Some(name);
                    let effects =
                        screen.dispatch(ListCommand::InlineSave(Box::new(card), index));
                    apply_list_effects(screen, runtime, view, tx, effects);
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => input.push(ch),
            _ => {}
        }
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ListOutcome::Quit),
        KeyCode::Char('j') | KeyCode::Down => {
            move_cursor(view, screen.visible_cards().len(), 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            move_cursor(view, screen.visible_cards().len(), -1);
        }
        KeyCode::Char('f') => {
            let effects = screen.dispatch(ListCommand::Filter(screen.filter_mode().toggled()));
            apply_list_effects(screen, runtime, view, tx, effects);
        }
        KeyCode::Char('/') => view.search_input = Some(String::new()),
        KeyCode::Char('r') => {
            if let Some((_, card)) = selected_card(screen, view) {
                view.rename_input = Some(card.name.clone().unwrap_or_default());
            }
        }
        KeyCode::Char('d') => {
            if let Some((_, card)) = selected_card(screen, view)
                && let Some(id) = card.id
            {
                let effects = screen.dispatch(ListCommand::Delete(id));
                apply_list_effects(screen, runtime, view, tx, effects);
            }
        }
        KeyCode::Char('u') => {
            if let Some((index, _)) = selected_card(screen, view) {
                let effects = screen.dispatch(ListCommand::Unfavorite(index));
                apply_list_effects(screen, runtime, view, tx, effects);
            }
        }
        KeyCode::Enter => {
            if let Some((_, card)) = selected_card(screen, view)
                && let Some(id) = card.id
            {
                return Some(ListOutcome::Open(Route::Edit(id)));
            }
        }
        KeyCode::Char('c') => {
            if let Some((_, card)) = selected_card(screen, view)
                && let Some(id) = card.id
            {
                return Some(ListOutcome::Open(Route::Clone(id)));
            }
        }
        KeyCode::Char('n') => return Some(ListOutcome::Open(Route::Blank)),
        _ => {}
    }
    None
}

fn selected_card<'a>(screen: &'a CardListScreen, view: &ListView) -> Option<(usize, &'a Card)> {
    screen
        .visible_cards()
        .get(view.cursor)
        .map(|card| (view.cursor, *card))
}

fn move_cursor(view: &mut ListView, len: usize, delta: isize) {
    if len == 0 {
        view.cursor = 0;
        return;
    }
    let current = view.cursor as isize;
    view.cursor = (current + delta).clamp(0, len as isize - 1) as usize;
}

fn clamp_cursor(view: &mut ListView, len: usize) {
    if len == 0 {
        view.cursor = 0;
    } else if view.cursor >= len {
        view.cursor = len - 1;
    }
}

fn render_list(frame: &mut ratatui::Frame<'_>, screen: &CardListScreen, view: &ListView) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let title = Paragraph::new(render_list_title_text(screen, view))
        .block(Block::default().title("tablero").borders(Borders::ALL));
    frame.render_widget(title, layout[0]);

    let cards = screen.visible_cards();
    let rows: Vec<Row> = cards
        .iter()
        .enumerate()
        .map(|(index, card)| {
            let row = Row::new(vec![
                Cell::from(card.id.map(|id| id.get().to_string()).unwrap_or_default()),
                Cell::from(card.name.clone().unwrap_or_default()),
                Cell::from(card.display.as_str()),
                Cell::from(card.public_perms.label()),
            ]);
            if index == view.cursor {
                row.style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Min(20),
            Constraint::Length(8),
            Constraint::Length(18),
        ],
    )
    .header(Row::new(vec!["id", "name", "display", "visibility"]))
    .block(Block::default().borders(Borders::ALL).title("cards"));
    frame.render_widget(table, layout[1]);

    let status = Paragraph::new(render_list_status_text(view))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);
}

fn render_list_title_text(screen: &CardListScreen, view: &ListView) -> String {
    let mut parts = vec![format!("filter: {}", screen.filter_mode().as_str())];
    if let Some(input) = &view.search_input {
        parts.push(format!("search: {input}_"));
    } else if let Some(search) = screen.search_filter() {
        parts.push(format!("search: {search}"));
    }
    parts.push(format!("{} cards", screen.visible_cards().len()));
    parts.join(" | ")
}

fn render_list_status_text(view: &ListView) -> String {
    if let Some(input) = &view.rename_input {
        return format!("rename: {input}_");
    }
    if view.status.is_empty() {
        "enter open | n new | c clone | d delete | u unfavorite | f filter | / search | r rename | q quit"
            .to_owned()
    } else {
        view.status.clone()
    }
}

fn emit_list_status(view: &mut ListView, tx: &Sender<InternalEvent>, message: impl Into<String>) {
    view.status = message.into();
    view.status_token = view.status_token.saturating_add(1);
    schedule_status_clear(tx, view.status_token);
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

pub fn run_detail<R: ApiRuntime>(
    screen: &mut CardDetailScreen,
    runtime: &mut R,
) -> Result<Option<String>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view = DetailView::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = runtime.spawn_organization(internal_tx.clone()) {
        emit_detail_status(&mut view, &internal_tx, format!("startup failed: {error}"));
    }

    let mut destination = None;
    let mut result = Ok(());
    loop {
        let navigated = process_detail_events(screen, runtime, &mut view, &internal_tx, &internal_rx);
        if let Some(path) = navigated {
            destination = Some(path);
            break;
        }

        if let Err(error) = terminal.draw(|frame| render_detail(frame, screen, &view)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(POLL_INTERVAL).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_detail_key(screen, runtime, &mut view, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result.map(|()| destination)
}

fn process_detail_events<R: ApiRuntime>(
    screen: &mut CardDetailScreen,
    runtime: &mut R,
    view: &mut DetailView,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) -> Option<String> {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view.status_token => {
                view.status.clear();
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::OrganizationLoaded(Ok(org)) => {
                let effects = screen.dispatch(DetailCommand::OrganizationChanged(Some(org)));
                if let Some(path) = apply_detail_effects(screen, runtime, view, tx, effects) {
                    return Some(path);
                }
            }
            InternalEvent::OrganizationLoaded(Err(error)) => {
                emit_detail_status(view, tx, format!("organization lookup failed: {error}"));
            }
            InternalEvent::Detail(reply) => {
                let effects = screen.handle_reply(reply);
                if let Some(path) = apply_detail_effects(screen, runtime, view, tx, effects) {
                    return Some(path);
                }
            }
            InternalEvent::List(_) => {}
        }
    }
    None
}

/// Applies controller effects; returns a navigation target when the
/// controller asked to leave the screen.
fn apply_detail_effects<R: ApiRuntime>(
    screen: &mut CardDetailScreen,
    runtime: &mut R,
    view: &mut DetailView,
    tx: &Sender<InternalEvent>,
    effects: Vec<DetailEffect>,
) -> Option<String> {
    for effect in effects {
        match effect {
            DetailEffect::Request(request) => {
                if let Err(error) = runtime.spawn_detail(request, tx.clone()) {
                    emit_detail_status(view, tx, format!("request failed: {error}"));
                }
            }
            DetailEffect::Render(RenderRegion::Header) => {
                view.header = Some(screen.header_model());
            }
            DetailEffect::Render(RenderRegion::Editor) => {
                view.editor = Some(screen.editor_model());
            }
            DetailEffect::Render(RenderRegion::Visualization) => {
                view.visualization = Some(screen.visualization_model());
            }
            DetailEffect::Navigate(path) => return Some(path),
        }
    }
    None
}

fn handle_detail_key<R: ApiRuntime>(
    screen: &mut CardDetailScreen,
    runtime: &mut R,
    view: &mut DetailView,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if let Some(input) = view.name_input.as_mut() {
        match key.code {
            KeyCode::Esc => view.name_input = None,
            KeyCode::Enter => {
                let name = view.name_input.take().unwrap_or_default();
                let description = screen.card().description.clone();
                let effects = screen.dispatch(DetailCommand::SaveHeader { name, description });
                apply_detail_effects(screen, runtime, view, tx, effects);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => input.push(ch),
            _ => {}
        }
        return false;
    }

    if let Some(input) = view.query_input.as_mut() {
        match key.code {
            KeyCode::Esc => view.query_input = None,
            KeyCode::Enter => {
                let text = view.query_input.take().unwrap_or_default();
                screen.dispatch(DetailCommand::SetNativeQuery(text));
                let effects = screen.dispatch(DetailCommand::RunQuery);
                apply_detail_effects(screen, runtime, view, tx, effects);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => input.push(ch),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('e') => {
            view.name_input = Some(screen.card().name.clone().unwrap_or_default());
        }
        KeyCode::Char('s') => {
            let name = screen.card().name.clone().unwrap_or_default();
            let description = screen.card().description.clone();
            let effects = screen.dispatch(DetailCommand::SaveHeader { name, description });
            apply_detail_effects(screen, runtime, view, tx, effects);
        }
        KeyCode::Char('m') => {
            let next = match screen.editor_model().mode {
                Some(QueryMode::Native) => QueryMode::Structured,
                _ => QueryMode::Native,
            };
            screen.dispatch(DetailCommand::SetQueryMode(next.as_str().to_owned()));
            // Mode switches do not publish; refresh the editor snapshot so
            // the operator sees the new template.
            view.editor = Some(screen.editor_model());
        }
        KeyCode::Char('i') => {
            if screen.editor_model().mode == Some(QueryMode::Native) {
                view.query_input = Some(String::new());
            } else {
                emit_detail_status(view, tx, "query entry requires native mode (press m)");
            }
        }
        KeyCode::Char('r') => {
            let effects = screen.dispatch(DetailCommand::RunQuery);
            apply_detail_effects(screen, runtime, view, tx, effects);
        }
        KeyCode::Char('d') => {
            let Some(databases) = screen.editor_model().databases else {
                emit_detail_status(view, tx, "no databases available yet");
                return false;
            };
            let current = screen
                .card()
                .dataset_query
                .as_ref()
                .and_then(DatasetQuery::database);
            let Some(next) = next_database(&databases, current) else {
                return false;
            };
            let effects = screen.dispatch(DetailCommand::SetDatabase(next));
            if effects.is_empty() {
                emit_detail_status(view, tx, "pick a query mode first (press m)");
                return false;
            }
            apply_detail_effects(screen, runtime, view, tx, effects);
            let effects = screen.dispatch(DetailCommand::LoadTables(next));
            apply_detail_effects(screen, runtime, view, tx, effects);
        }
        KeyCode::Char('t') => {
            let editor = screen.editor_model();
            let Some(tables) = editor.tables else {
                emit_detail_status(view, tx, "no tables loaded (press d)");
                return false;
            };
            let current = editor
                .table_metadata
                .as_ref()
                .map(|metadata| metadata.table.id);
            if let Some(next) = next_table(&tables, current) {
                let effects = screen.dispatch(DetailCommand::LoadTableMetadata(next));
                apply_detail_effects(screen, runtime, view, tx, effects);
            }
        }
        KeyCode::Char('p') => {
            let next = cycle_perms(screen.header_model().public_perms);
            let effects = screen.dispatch(DetailCommand::SetPermissions(next));
            apply_detail_effects(screen, runtime, view, tx, effects);
        }
        KeyCode::Char('v') => {
            let next = cycle_display(screen.visualization_model().display);
            let effects = screen.dispatch(DetailCommand::SetDisplay(next));
            apply_detail_effects(screen, runtime, view, tx, effects);
        }
        _ => {}
    }
    false
}

/// Next database in presentation order, starting from the first when none
/// is selected yet.
fn next_database(databases: &[Database], current: Option<DatabaseId>) -> Option<DatabaseId> {
    if databases.is_empty() {
        return None;
    }
    let index = current
        .and_then(|id| databases.iter().position(|database| database.id == id))
        .map_or(0, |position| (position + 1) % databases.len());
    Some(databases[index].id)
}

fn next_table(tables: &[DbTable], current: Option<TableId>) -> Option<TableId> {
    if tables.is_empty() {
        return None;
    }
    let index = current
        .and_then(|id| tables.iter().position(|table| table.id == id))
        .map_or(0, |position| (position + 1) % tables.len());
    Some(tables[index].id)
}

fn cycle_perms(current: PublicPerms) -> PublicPerms {
    let index = PublicPerms::ALL
        .iter()
        .position(|perms| *perms == current)
        .unwrap_or(0);
    PublicPerms::ALL[(index + 1) % PublicPerms::ALL.len()]
}

fn cycle_display(current: DisplayType) -> DisplayType {
    let index = DisplayType::ALL
        .iter()
        .position(|display| *display == current)
        .unwrap_or(0);
    DisplayType::ALL[(index + 1) % DisplayType::ALL.len()]
}

fn render_detail(frame: &mut ratatui::Frame<'_>, screen: &CardDetailScreen, view: &DetailView) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(render_header_text(view.header.as_ref()))
        .block(Block::default().title("card").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let editor = Paragraph::new(render_editor_text(view.editor.as_ref()))
        .block(Block::default().title("query").borders(Borders::ALL));
    frame.render_widget(editor, layout[1]);

    let viz = Paragraph::new(render_visualization_text(view.visualization.as_ref()))
        .block(Block::default().title("result").borders(Borders::ALL));
    frame.render_widget(viz, layout[2]);

    let status = Paragraph::new(render_detail_status_text(screen, view))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);
}

fn render_header_text(header: Option<&HeaderModel>) -> String {
    let Some(header) = header else {
        return "loading...".to_owned();
    };
    let mut lines = vec![format!(
        "{} [{}]",
        header.name.as_deref().unwrap_or("(unnamed)"),
        header.public_perms.label()
    )];
    if let Some(description) = &header.description {
        lines.push(description.clone());
    }
    let mut flags = Vec::new();
    if header.is_saved {
        flags.push("saved".to_owned());
    }
    if header.save_ready {
        flags.push("ready to save".to_owned());
    }
    if let Some(link) = &header.download_link {
        flags.push(format!("csv: {link}"));
    }
    if !flags.is_empty() {
        lines.push(flags.join(" | "));
    }
    lines.join("\n")
}

fn render_editor_text(editor: Option<&EditorModel>) -> String {
    let Some(editor) = editor else {
        return "waiting for databases...".to_owned();
    };
    let mut lines = Vec::new();
    match &editor.databases {
        Some(databases) => {
            let names: Vec<&str> = databases
                .iter()
                .map(|database| database.name.as_str())
                .collect();
            lines.push(format!("databases: {}", names.join(", ")));
        }
        None => lines.push("databases: (none available)".to_owned()),
    }
    match editor.mode {
        Some(mode) => lines.push(format!("mode: {}", mode.as_str())),
        None => lines.push("mode: (not selected)".to_owned()),
    }
    if let Some(tables) = &editor.tables {
        let names: Vec<&str> = tables.iter().map(|table| table.name.as_str()).collect();
        lines.push(format!("tables: {}", names.join(", ")));
    }
    if let Some(metadata) = &editor.table_metadata {
        lines.push(format!(
            "{}: {} fields, {} aggregations",
            metadata.table.name,
            metadata.fields.len(),
            metadata.aggregations.len()
        ));
    }
    lines.join("\n")
}

fn render_visualization_text(viz: Option<&VisualizationModel>) -> String {
    let Some(viz) = viz else {
        return String::new();
    };
    let Some(result) = &viz.result else {
        return format!("display: {} (no result yet -- press r)", viz.display.as_str());
    };

    let mut lines = vec![format!(
        "display: {} | {} rows",
        viz.display.as_str(),
        result.rows.len()
    )];
    lines.push(result.columns.join(" | "));
    for row in result.rows.iter().take(RESULT_PREVIEW_ROWS) {
        let cells: Vec<String> = row.iter().map(format_cell).collect();
        lines.push(cells.join(" | "));
    }
    if result.rows.len() > RESULT_PREVIEW_ROWS {
        lines.push(format!(
            "... {} more rows",
            result.rows.len() - RESULT_PREVIEW_ROWS
        ));
    }
    lines.join("\n")
}

fn format_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn render_detail_status_text(screen: &CardDetailScreen, view: &DetailView) -> String {
    if let Some(input) = &view.name_input {
        return format!("name: {input}_");
    }
    if let Some(input) = &view.query_input {
        return format!("sql: {input}_");
    }
    if !view.status.is_empty() {
        return view.status.clone();
    }
    if !screen.initialized() {
        "connecting...".to_owned()
    } else {
        "r run | m mode | i sql | d db | t table | e name | s save | p perms | v display | q back"
            .to_owned()
    }
}

fn emit_detail_status(
    view: &mut DetailView,
    tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view.status = message.into();
    view.status_token = view.status_token.saturating_add(1);
    schedule_status_clear(tx, view.status_token);
}
