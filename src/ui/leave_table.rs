use crate::calc::date_range::{month_abbrev, month_name};
use crate::calc::{DayMark, LeaveBlock, OpenPicker, Selection};
use crate::data::{CellKey, Toast, ToastKind, ToastQueue};
use crate::session::Session;
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyModifiers};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::collections::BTreeMap;
use std::io::Stdout;
use std::time::{Duration as StdDuration, Instant};

// Leave bar colors
const BAR_COLOR: Color = Color::Indexed(70); // green
const BAR_ACTIVE_COLOR: Color = Color::Indexed(114);

// Picker range colors
const EDGE_COLOR: Color = Color::LightBlue;
const RANGE_COLOR: Color = Color::Blue;

const NAME_WIDTH: u16 = 18;
const PICKER_WIDTH: u16 = 36;
const PICKER_HEIGHT: u16 = 15;

#[derive(PartialEq, Debug)]
enum Mode {
    Normal,
    Edit,
    Search,
    Picker,
}

pub struct App {
    session: Session,
    /// Shared with the session's notifier; drained into `toast`.
    toasts: ToastQueue,
    /// The toast on screen and when it appeared.
    toast: Option<(Toast, Instant)>,
    mode: Mode,
    input_buffer: String,
    search_query: String,
    today: NaiveDate,
    /// First visible row of the grid.
    row_offset: usize,
}

impl App {
    pub fn new(mut session: Session, toasts: ToastQueue, today: NaiveDate) -> Self {
        let month = if today.year() == session.year() {
            today.month()
        } else {
            1
        };
        if let Some(first) = session.employees().first() {
            let first = CellKey::new(first, month);
            session.set_active(Some(first));
        }
        App {
            session,
            toasts,
            toast: None,
            mode: Mode::Normal,
            input_buffer: String::new(),
            search_query: String::new(),
            today,
            row_offset: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Rows shown in the grid: every employee, or the search hits in roster
    /// order while a query is set.
    fn visible_rows(&self) -> Vec<String> {
        if self.search_query.trim().is_empty() {
            return self.session.employees().to_vec();
        }
        let hits = self.session.search(&self.search_query);
        self.session
            .employees()
            .iter()
            .filter(|e| hits.rows.contains(*e))
            .cloned()
            .collect()
    }

    fn move_active(&mut self, rows: i32, months: i32) {
        let visible = self.visible_rows();
        self.session.move_active(&visible, rows, months);
    }

    /// Expires the visible toast and shows the next queued one.
    pub fn poll_toast(&mut self, now: Instant) {
        if let Some((toast, shown)) = &self.toast {
            if now.duration_since(*shown) < toast.duration {
                return;
            }
            self.toast = None;
        }
        if let Some(next) = self.toasts.pop() {
            self.toast = Some((next, now));
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.mode {
            Mode::Edit => {
                self.handle_edit_key(code);
                false
            }
            Mode::Search => {
                self.handle_search_key(code);
                false
            }
            Mode::Picker => {
                self.handle_picker_key(code, modifiers);
                false
            }
            Mode::Normal => self.handle_normal_key(code, modifiers),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('z') if ctrl => {
                self.session.undo();
            }
            KeyCode::Char('u') => {
                self.session.undo();
            }
            KeyCode::Left => self.move_active(0, -1),
            KeyCode::Right => self.move_active(0, 1),
            KeyCode::Up => self.move_active(-1, 0),
            KeyCode::Down => self.move_active(1, 0),
            KeyCode::Enter => {
                if let Some(key) = self.session.active_cell() {
                    self.input_buffer = self.session.cell_text(key);
                    self.mode = Mode::Edit;
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.session.active_cell().is_some() {
                    self.input_buffer = c.to_string();
                    self.mode = Mode::Edit;
                }
            }
            KeyCode::Delete | KeyCode::Backspace => {
                if let Some(key) = self.session.active_cell().cloned() {
                    self.session.clear_cell(&key);
                }
            }
            KeyCode::Char('c') => {
                if let Some(key) = self.session.active_cell().cloned() {
                    self.session.open_picker(key);
                    self.mode = Mode::Picker;
                }
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
            }
            KeyCode::Esc => {
                self.search_query.clear();
            }
            _ => {}
        }
        false
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                if let Some(key) = self.session.active_cell().cloned() {
                    // A rejected edit has already been reported through a toast.
                    let _ = self.session.edit_cell_text(&key, &self.input_buffer);
                }
                self.input_buffer.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => {
                self.search_query.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.search_query.pop();
            }
            KeyCode::Char(c) => {
                self.search_query.push(c);
            }
            _ => {}
        }
        self.row_offset = 0;
    }

    fn handle_picker_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Enter => {
                self.session.confirm_picker();
                self.mode = Mode::Normal;
                return;
            }
            KeyCode::Esc => {
                self.session.cancel_picker();
                self.mode = Mode::Normal;
                return;
            }
            _ => {}
        }
        let today = self.today;
        let Some(open) = self.session.picker_mut().as_open_mut() else {
            self.mode = Mode::Normal;
            return;
        };
        match code {
            KeyCode::Left => open.move_cursor(-1),
            KeyCode::Right => open.move_cursor(1),
            KeyCode::Up => open.move_cursor(-7),
            KeyCode::Down => open.move_cursor(7),
            KeyCode::PageUp | KeyCode::Char('<') => open.prev_month(),
            KeyCode::PageDown | KeyCode::Char('>') => open.next_month(),
            KeyCode::Char('t') => open.today(today),
            KeyCode::Char(' ') => open.click(modifiers.contains(KeyModifiers::SHIFT)),
            KeyCode::Char('x') => open.click(true),
            _ => {}
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // title + undo indicator
                Constraint::Min(4),    // grid
                Constraint::Length(1), // active cell details / input
                Constraint::Length(1), // toast
                Constraint::Length(1), // key help
            ])
            .split(f.area());

        self.render_title(f, chunks[0]);
        self.render_grid(f, chunks[1]);
        self.render_details(f, chunks[2]);
        self.render_toast(f, chunks[3]);
        self.render_help(f, chunks[4]);
        if self.session.picker().is_open() {
            self.render_picker(f, chunks[1]);
        }
    }

    fn render_title(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            format!("Leave calendar {}", self.session.year()),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if self.session.roster().fallback {
            spans.push(Span::styled(
                "  (placeholder roster)",
                Style::default().fg(Color::Yellow),
            ));
        }
        if !self.search_query.is_empty() {
            spans.push(Span::styled(
                format!("  filter: {}", self.search_query),
                Style::default().fg(Color::Cyan),
            ));
        }
        let undo_style = if self.session.can_undo() {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::raw("  "));
        let steps = self.session.history_len().saturating_sub(1);
        spans.push(Span::styled(format!("[u] Undo ({steps})"), undo_style));
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_grid(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let cell_width = cell_width(inner.width);
        let rows = self.visible_rows();
        let active = self.session.active_cell().cloned();
        let body_height = inner.height.saturating_sub(1) as usize;
        if let Some(idx) = active
            .as_ref()
            .and_then(|a| rows.iter().position(|r| *r == a.employee))
        {
            self.row_offset = scroll_to(self.row_offset, idx, body_height);
        }

        let blocks = self.session.blocks();
        let hits = self.session.search(&self.search_query);
        let mut lines = vec![header_line(cell_width)];
        for employee in rows.iter().skip(self.row_offset).take(body_height) {
            let mut spans = vec![Span::styled(
                fit(employee, NAME_WIDTH as usize),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            for month in 1..=12 {
                let key = CellKey::new(employee, month);
                let is_active = active.as_ref() == Some(&key);
                let is_hit = hits.cells.contains(&key);
                spans.push(Span::styled("│", Style::default().add_modifier(Modifier::DIM)));
                spans.extend(cell_spans(
                    cell_blocks(&blocks, &key),
                    cell_width,
                    is_active,
                    is_hit,
                ));
            }
            lines.push(Line::from(spans));
        }
        f.render_widget(Paragraph::new(lines), inner);
    }

    fn render_details(&self, f: &mut Frame, area: Rect) {
        let Some(key) = self.session.active_cell() else {
            return;
        };
        let prefix = format!("{} · {}: ", key.employee, month_name(key.month));
        let line = match self.mode {
            Mode::Edit => Line::from(vec![
                Span::raw(prefix),
                Span::styled(
                    format!("{}_", self.input_buffer),
                    Style::default().fg(Color::Yellow),
                ),
            ]),
            Mode::Search => Line::from(format!("Search: {}_", self.search_query)),
            Mode::Normal | Mode::Picker => {
                let labels: Vec<String> = self
                    .session
                    .blocks()
                    .get(key)
                    .map(|b| b.iter().map(|b| b.label.clone()).collect())
                    .unwrap_or_default();
                let text = self.session.cell_text(key);
                let mut spans = vec![Span::raw(prefix), Span::raw(text)];
                if !labels.is_empty() {
                    spans.push(Span::styled(
                        format!("  ({})", labels.join(", ")),
                        Style::default().add_modifier(Modifier::DIM),
                    ));
                }
                Line::from(spans)
            }
        };
        f.render_widget(Paragraph::new(line), area);
    }

    fn render_toast(&self, f: &mut Frame, area: Rect) {
        let Some((toast, _)) = &self.toast else {
            return;
        };
        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Failure => Color::Red,
        };
        let line = Line::from(Span::styled(
            toast.message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        f.render_widget(Paragraph::new(line), area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help = match self.mode {
            Mode::Normal => {
                "←↑↓→ move  Enter/0-9 edit  Del clear  c calendar  / search  u undo  q quit"
            }
            Mode::Edit => "Enter save  Esc cancel  e.g. 3, 5-7, 10",
            Mode::Search => "Enter keep filter  Esc clear",
            Mode::Picker => {
                "Space pick  Shift+Space/x extend  PgUp/PgDn month  t today  Enter ok  Esc cancel"
            }
        };
        let line = Line::from(Span::styled(help, Style::default().add_modifier(Modifier::DIM)));
        f.render_widget(Paragraph::new(line), area);
    }

    fn render_picker(&self, f: &mut Frame, area: Rect) {
        let Some(open) = self.session.picker().as_open() else {
            return;
        };
        let rect = centered(area, PICKER_WIDTH, PICKER_HEIGHT);
        f.render_widget(Clear, rect);
        let title = format!(" {} · {} ", open.cell.employee, month_name(open.cell.month));
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(rect);
        f.render_widget(block, rect);

        let heading = format!("{} {}", month_name(open.view.month()), open.view.year());
        let mut lines = vec![
            Line::from(Span::styled(
                format!("{heading:^27}"),
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )),
            Line::from("Mo Tu We Th Fr Sa Su"),
        ];
        for week in open.weeks() {
            lines.push(picker_week_line(open, &week, self.today));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(selection_summary(&open.selection)));
        f.render_widget(Paragraph::new(lines), inner);
    }
}

// ── Grid helpers ──────────────────────────────────────────────────────────────

/// Width of one month cell, leaving room for the name column and the
/// twelve separators.
fn cell_width(total: u16) -> u16 {
    (total.saturating_sub(NAME_WIDTH + 12) / 12).max(1)
}

/// Keeps `idx` inside a window of `height` rows starting at `offset`.
fn scroll_to(offset: usize, idx: usize, height: usize) -> usize {
    if height == 0 || idx < offset {
        idx
    } else if idx >= offset + height {
        idx + 1 - height
    } else {
        offset
    }
}

/// Pads or truncates `s` to exactly `width` characters.
fn fit(s: &str, width: usize) -> String {
    let truncated: String = s.chars().take(width).collect();
    format!("{truncated:<width$}")
}

fn header_line(cell_width: u16) -> Line<'static> {
    let w = cell_width as usize;
    let mut spans = vec![Span::raw(fit("Employee", NAME_WIDTH as usize))];
    for month in 1..=12 {
        let abbrev: String = month_abbrev(month).chars().take(w).collect();
        spans.push(Span::raw("│"));
        spans.push(Span::styled(
            format!("{abbrev:^w$}"),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

fn cell_blocks<'a>(blocks: &'a BTreeMap<CellKey, Vec<LeaveBlock>>, key: &CellKey) -> &'a [LeaveBlock] {
    blocks.get(key).map(Vec::as_slice).unwrap_or(&[])
}

/// Draws one month cell: runs of blank columns and leave bars. A bar shows
/// its period label when the label fits.
pub(crate) fn cell_spans(
    blocks: &[LeaveBlock],
    width: u16,
    is_active: bool,
    is_hit: bool,
) -> Vec<Span<'static>> {
    let w = width as usize;
    let mut owner: Vec<Option<usize>> = vec![None; w];
    for (i, block) in blocks.iter().enumerate() {
        let (start, len) = block.columns(width);
        let end = (start as usize + len as usize).min(w);
        for slot in owner.iter_mut().take(end).skip(start as usize) {
            *slot = Some(i);
        }
    }

    let mut base = Style::default();
    if is_hit {
        base = base.fg(Color::Yellow);
    }
    if is_active {
        base = base.add_modifier(Modifier::REVERSED);
    }
    let bar = Style::default()
        .fg(Color::Black)
        .bg(if is_active { BAR_ACTIVE_COLOR } else { BAR_COLOR });

    let mut spans = Vec::new();
    let mut col = 0;
    while col < w {
        let run_owner = owner[col];
        let run_end = (col..w).find(|&c| owner[c] != run_owner).unwrap_or(w);
        let len = run_end - col;
        let span = match run_owner {
            Some(i) => {
                let label = &blocks[i].label;
                let text = if label.chars().count() <= len {
                    format!("{label:^len$}")
                } else {
                    " ".repeat(len)
                };
                Span::styled(text, bar)
            }
            None => Span::styled(" ".repeat(len), base),
        };
        spans.push(span);
        col = run_end;
    }
    spans
}

// ── Picker helpers ────────────────────────────────────────────────────────────

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn picker_week_line(open: &OpenPicker, week: &[Option<NaiveDate>; 7], today: NaiveDate) -> Line<'static> {
    let mut spans = Vec::new();
    for (col, slot) in week.iter().enumerate() {
        let Some(date) = slot else {
            spans.push(Span::raw("   "));
            continue;
        };
        let mark = open.selection.day_mark(*date);
        let style = picker_day_style(mark, *date == open.cursor, *date == today);
        spans.push(Span::styled(format!("{:2}", date.day()), style));
        // Fill the gap between two selected neighbours in the same week.
        let joined = col < 6 && mark.is_some_and(|m| !m.is_end());
        let gap = if joined {
            Style::default().bg(RANGE_COLOR)
        } else {
            Style::default()
        };
        spans.push(Span::styled(" ", gap));
    }
    Line::from(spans)
}

/// Style of one picker day: range edges and inner days are colored apart,
/// the keyboard cursor is reversed.
pub(crate) fn picker_day_style(mark: Option<DayMark>, is_cursor: bool, is_today: bool) -> Style {
    let mut s = match mark {
        Some(m) if m.is_start() || m.is_end() => Style::default()
            .fg(Color::Black)
            .bg(EDGE_COLOR)
            .add_modifier(Modifier::BOLD),
        Some(_) => Style::default().fg(Color::White).bg(RANGE_COLOR),
        None if is_today => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        None => Style::default(),
    };
    if is_cursor {
        s = s.add_modifier(Modifier::REVERSED);
    }
    s
}

fn short_date(d: NaiveDate) -> String {
    format!("{}.{}.{}", d.day(), d.month(), d.year())
}

fn selection_summary(selection: &Selection) -> String {
    match selection {
        Selection::Pair { start: None, .. } => "Pick the first day".to_string(),
        Selection::Pair { start: Some(s), end: None } => {
            format!("From {}, pick the last day", short_date(*s))
        }
        Selection::Pair { start: Some(s), end: Some(e) } => {
            format!("{} - {}", short_date(*s), short_date(*e))
        }
        Selection::Toggle { dates, .. } => format!("{} day(s) selected", dates.len()),
    }
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_toast(Instant::now());
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(16))? {
            if let CEvent::Key(key) = event::read()? {
                if app.handle_key(key.code, key.modifiers) {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::PickStrategy;
    use crate::data::store::MemoryStore;
    use crate::data::{AppSettings, LeavePeriod, LeavesDocument};
    use crate::session::tests::session_with;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::rc::Rc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn make_test_app(settings: AppSettings) -> (App, Rc<MemoryStore>) {
        let store = MemoryStore::with_roster(&["Anna", "Bob"]);
        let doc: LeavesDocument = serde_json::from_str(
            r#"{"leavesData":{"Anna":[{"startDate":"2025-03-05","endDate":"2025-03-07"}]}}"#,
        )
        .unwrap();
        *store.leaves.borrow_mut() = Some(doc);
        let (session, store, toasts) = session_with(store, settings);
        (App::new(session, toasts, d(2025, 3, 10)), store)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code, KeyModifiers::empty())
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn active(app: &App) -> CellKey {
        app.session().active_cell().cloned().unwrap()
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    #[test]
    fn test_starts_on_todays_month() {
        let (app, _) = make_test_app(AppSettings::default());
        assert_eq!(active(&app), CellKey::new("Anna", 3));
    }

    #[test]
    fn test_arrow_keys_move_active_cell() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Right);
        assert_eq!(active(&app), CellKey::new("Anna", 4));
        press(&mut app, KeyCode::Down);
        assert_eq!(active(&app), CellKey::new("Bob", 4));
        press(&mut app, KeyCode::Down);
        assert_eq!(active(&app), CellKey::new("Bob", 4));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Up);
        assert_eq!(active(&app), CellKey::new("Anna", 3));
    }

    #[test]
    fn test_q_returns_true() {
        let (mut app, _) = make_test_app(AppSettings::default());
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_ctrl_c_returns_true_in_any_mode() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Enter);
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    // ── Text edit ─────────────────────────────────────────────────────────────

    #[test]
    fn test_enter_prefills_and_saves_edit() {
        let (mut app, store) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Edit);
        assert_eq!(app.input_buffer, "5-7");
        type_text(&mut app, ", 20");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "5-7, 20");
        assert_eq!(store.saves.get(), 1);
    }

    #[test]
    fn test_digit_starts_fresh_edit() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.input_buffer, "12");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "12");
    }

    #[test]
    fn test_edit_esc_discards() {
        let (mut app, store) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('9'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.input_buffer.is_empty());
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "5-7");
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn test_reversed_range_shows_failure_toast() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('9'));
        type_text(&mut app, "-2");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "5-7");
        app.poll_toast(Instant::now());
        let (toast, _) = app.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Failure);
    }

    // ── Clear and undo ────────────────────────────────────────────────────────

    #[test]
    fn test_delete_clears_and_u_undoes() {
        let (mut app, store) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "");
        assert!(app.session().can_undo());
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "5-7");
        assert!(!app.session().can_undo());
        assert_eq!(store.saves.get(), 2);
    }

    #[test]
    fn test_ctrl_z_undoes() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Backspace);
        app.handle_key(KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "5-7");
    }

    #[test]
    fn test_undo_with_no_history_is_noop() {
        let (mut app, store) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(store.saves.get(), 0);
    }

    // ── Picker ────────────────────────────────────────────────────────────────

    #[test]
    fn test_picker_pair_selection_appends_period() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, Mode::Picker);
        press(&mut app, KeyCode::Char('t')); // March 10
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Down); // March 17
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(
            app.session().data().periods("Anna")[1],
            LeavePeriod::new(d(2025, 3, 10), d(2025, 3, 17))
        );
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "5-7, 10-17");
    }

    #[test]
    fn test_picker_month_navigation_keeps_selection() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char(' ')); // March 1
        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::Char(' ')); // April 1
        press(&mut app, KeyCode::PageUp);
        let open = app.session().picker().as_open().unwrap();
        assert!(open.selection.contains(d(2025, 3, 31)));
        assert_eq!(open.view, d(2025, 3, 1));
    }

    #[test]
    fn test_picker_esc_cancels() {
        let (mut app, store) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.session().picker().is_open());
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn test_picker_toggle_shift_space_extends() {
        let settings = AppSettings {
            pick_strategy: PickStrategy::Toggle,
            ..AppSettings::default()
        };
        let (mut app, _) = make_test_app(settings);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('t')); // March 10
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        app.handle_key(KeyCode::Char(' '), KeyModifiers::SHIFT);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session().cell_text(&CellKey::new("Anna", 3)), "5-7, 10-12");
    }

    // ── Search ────────────────────────────────────────────────────────────────

    #[test]
    fn test_search_filters_rows() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "bo");
        assert_eq!(app.visible_rows(), vec!["Bob".to_string()]);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.search_query, "bo");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.visible_rows().len(), 2);
    }

    #[test]
    fn test_arrow_keys_skip_rows_hidden_by_search() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "bo");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Down);
        assert_eq!(active(&app), CellKey::new("Bob", 3));
        press(&mut app, KeyCode::Up);
        assert_eq!(active(&app), CellKey::new("Bob", 3));
    }

    // ── Toasts ────────────────────────────────────────────────────────────────

    #[test]
    fn test_toast_expires_after_duration() {
        let (mut app, _) = make_test_app(AppSettings::default());
        press(&mut app, KeyCode::Delete);
        let start = Instant::now();
        app.poll_toast(start);
        let (toast, _) = app.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        app.poll_toast(start + StdDuration::from_millis(1999));
        assert!(app.toast.is_some());
        app.poll_toast(start + StdDuration::from_millis(2000));
        assert!(app.toast.is_none());
    }

    // ── Drawing helpers ───────────────────────────────────────────────────────

    #[test]
    fn test_cell_spans_cover_width() {
        let block = LeaveBlock {
            year: 2025,
            month: 3,
            day_start: 5,
            day_end: 7,
            left_pct: 4.0 / 31.0 * 100.0,
            width_pct: 3.0 / 31.0 * 100.0,
            label: "5.3 - 7.3".to_string(),
        };
        let spans = cell_spans(&[block], 10, false, false);
        let total: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        assert_eq!(total, 10);
        assert!(spans.iter().any(|s| s.style.bg == Some(BAR_COLOR)));
    }

    #[test]
    fn test_empty_cell_is_one_blank_run() {
        let spans = cell_spans(&[], 8, false, false);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "        ");
    }

    #[test]
    fn test_picker_day_style_edges_and_middle() {
        let edge = picker_day_style(Some(DayMark::Start), false, false);
        assert_eq!(edge.bg, Some(EDGE_COLOR));
        let middle = picker_day_style(Some(DayMark::Middle), false, false);
        assert_eq!(middle.bg, Some(RANGE_COLOR));
        let cursor = picker_day_style(None, true, false);
        assert!(cursor.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_scroll_to_keeps_row_visible() {
        assert_eq!(scroll_to(0, 3, 5), 0);
        assert_eq!(scroll_to(0, 7, 5), 3);
        assert_eq!(scroll_to(4, 2, 5), 2);
    }

    #[test]
    fn test_render_smoke() {
        let (mut app, _) = make_test_app(AppSettings::default());
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        press(&mut app, KeyCode::Char('c'));
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
