//! Interactive audit screen: two roster paths, an Audit button, an output
//! pane and a status line.
//!
//! All screen state lives in `AppState`. Audits run on an `AuditWorker`; the
//! worker posts `UiEvent`s back over a channel which the draw loop drains
//! between frames.

use std::io::stdout;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use rosteraudit_cli::audit::{run_audit, AuditReport, AuditRequest, Stage};
use rosteraudit_cli::render;
use rosteraudit_cli::worker::{AuditWorker, JobOutcome};

use crate::util;

pub const MISSING_PATHS: &str = "Please select both files before auditing.";

/// Rows taken by everything except the output pane's contents.
const CHROME_ROWS: u16 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Local,
    National,
    Audit,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Local => Self::National,
            Self::National => Self::Audit,
            Self::Audit => Self::Local,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Local => Self::Audit,
            Self::National => Self::Local,
            Self::Audit => Self::National,
        }
    }
}

/// Posted by the audit worker to the UI loop.
enum UiEvent {
    Progress(Stage),
    Finished(JobOutcome<Result<AuditReport, String>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    StartAudit,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Popup {
    title: &'static str,
    message: String,
    color: Color,
}

impl Popup {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            title: " Warning ",
            message: message.into(),
            color: Color::Yellow,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            title: " Error ",
            message: message.into(),
            color: Color::Red,
        }
    }
}

pub struct AppState {
    local: String,
    national: String,
    focus: Focus,
    /// False while an audit is in flight.
    audit_enabled: bool,
    output: Vec<String>,
    scroll: usize,
    /// Keep the output pane pinned to its last line.
    follow: bool,
    viewport: usize,
    status: String,
    popup: Option<Popup>,
    should_quit: bool,
}

impl AppState {
    fn new(local: Option<PathBuf>, national: Option<PathBuf>) -> Self {
        let path_text = |p: Option<PathBuf>| p.map(|p| p.display().to_string()).unwrap_or_default();
        Self {
            local: path_text(local),
            national: path_text(national),
            focus: Focus::Local,
            audit_enabled: true,
            output: Vec::new(),
            scroll: 0,
            follow: true,
            viewport: 1,
            status: "Enter roster paths, then run the audit".to_string(),
            popup: None,
            should_quit: false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        if self.popup.is_some() {
            // Enter or Esc dismisses; everything else is swallowed
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.popup = None;
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r') if ctrl => return self.audit_action(),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Enter => {
                if self.focus == Focus::Audit {
                    return self.audit_action();
                }
                self.focus = self.focus.next();
            }
            KeyCode::PageUp => self.scroll_by(-(self.viewport as isize)),
            KeyCode::PageDown => self.scroll_by(self.viewport as isize),
            KeyCode::Up if self.focus == Focus::Audit => self.scroll_by(-1),
            KeyCode::Down if self.focus == Focus::Audit => self.scroll_by(1),
            KeyCode::Backspace => {
                if let Some(field) = self.focused_path_mut() {
                    field.pop();
                }
            }
            KeyCode::Char(c) if !ctrl => {
                if let Some(field) = self.focused_path_mut() {
                    field.push(c);
                }
            }
            _ => {}
        }
        Action::None
    }

    fn audit_action(&self) -> Action {
        if self.audit_enabled {
            Action::StartAudit
        } else {
            Action::None
        }
    }

    fn focused_path_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Local => Some(&mut self.local),
            Focus::National => Some(&mut self.national),
            Focus::Audit => None,
        }
    }

    /// Validate the paths and switch into the running state. Returns the
    /// request to submit, or `None` when nothing should run.
    fn begin_audit(&mut self) -> Option<AuditRequest> {
        if !self.audit_enabled {
            return None;
        }
        let local = self.local.trim();
        let national = self.national.trim();
        if local.is_empty() || national.is_empty() {
            self.popup = Some(Popup::warning(MISSING_PATHS));
            return None;
        }

        let request = AuditRequest::new(local, national);
        self.output.clear();
        self.scroll = 0;
        self.follow = true;
        self.audit_enabled = false;
        self.status = "Audit running...".to_string();
        Some(request)
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Progress(stage) => {
                self.output.push(stage.message().to_string());
                self.status = stage.message().to_string();
            }
            UiEvent::Finished(outcome) => {
                self.audit_enabled = true;
                match outcome {
                    JobOutcome::Finished(Ok(report)) => {
                        self.output.extend(render::transcript_lines(&report.findings));
                        self.output.push(String::new());
                        self.output.push(render::COMPLETED.to_string());
                        self.status = render::summary_line(&report.summary);
                    }
                    JobOutcome::Finished(Err(message)) | JobOutcome::Panicked(message) => {
                        self.popup = Some(Popup::error(format!("An error occurred: {message}")));
                        self.status = "Audit failed".to_string();
                    }
                }
            }
        }
        if self.follow {
            self.scroll = self.max_scroll();
        }
    }

    fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        if self.follow {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    fn max_scroll(&self) -> usize {
        self.output.len().saturating_sub(self.viewport)
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
        self.follow = self.scroll == max;
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_path_field(frame, chunks[1], " Local member list ", &self.local, Focus::Local);
        self.draw_path_field(frame, chunks[2], " National member list ", &self.national, Focus::National);
        self.draw_button(frame, chunks[3]);
        self.draw_output(frame, chunks[4]);
        self.draw_status(frame, chunks[5]);

        if let Some(popup) = &self.popup {
            draw_popup(frame, area, popup);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(vec![Span::styled(
            " Roster audit: local vs national ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )]));
        frame.render_widget(title, area);
    }

    fn draw_path_field(&self, frame: &mut Frame, area: Rect, title: &str, value: &str, field: Focus) {
        let focused = self.focus == field && self.popup.is_none();
        let border = if focused { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title.to_string());

        let inner_width = area.width.saturating_sub(2) as usize;
        let (text, style) = if value.is_empty() && !focused {
            ("No file selected".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (
                util::truncate_path(value, inner_width.saturating_sub(1)),
                Style::default().fg(Color::White),
            )
        };

        if focused {
            let x = area.x + 1 + util::display_width(&text) as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
        }

        frame.render_widget(Paragraph::new(Span::styled(text, style)).block(block), area);
    }

    fn draw_button(&self, frame: &mut Frame, area: Rect) {
        let (label, style) = if !self.audit_enabled {
            ("Auditing...", Style::default().fg(Color::DarkGray))
        } else if self.focus == Focus::Audit {
            (
                "Audit",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("Audit", Style::default().fg(Color::White))
        };

        let border = if self.focus == Focus::Audit { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        let para = Paragraph::new(Span::styled(format!(" {label} "), style))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(para, area);
    }

    fn draw_output(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .output
            .iter()
            .skip(self.scroll)
            .take(area.height.saturating_sub(2) as usize)
            .map(|s| Line::from(s.as_str()))
            .collect();

        let title = if self.output.is_empty() {
            " Output ".to_string()
        } else {
            format!(" Output ({} lines) ", self.output.len())
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let right = "Tab: next  Ctrl+R: audit  PgUp/PgDn: scroll  Esc: quit ";
        let width = area.width as usize;
        let left_width = width.saturating_sub(util::display_width(right));
        let left = util::truncate_path(&format!(" {}", self.status), left_width);
        let status = format!("{}{}", util::pad_right(&left, left_width), right);

        let para = Paragraph::new(Line::from(vec![Span::styled(
            status,
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        )]))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }
}

fn draw_popup(frame: &mut Frame, area: Rect, popup: &Popup) {
    let width: u16 = 60.min(area.width);
    let text_width = width.saturating_sub(4).max(1) as usize;
    let body_rows = util::display_width(&popup.message).div_ceil(text_width).max(1) as u16;
    let height = (body_rows + 4).min(area.height);

    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    let rect = Rect::new(area.x + x, area.y + y, width, height);

    let lines = vec![
        Line::from(Span::styled(popup.message.as_str(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled("Enter: dismiss", Style::default().fg(Color::DarkGray))),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(popup.color))
        .title(popup.title)
        .title_style(Style::default().fg(popup.color).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black));

    frame.render_widget(Clear, rect);
    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(para, rect);
}

/// Submit the current paths to the worker. The completion callback always
/// posts `Finished`, which is what re-enables the Audit button.
fn start_audit(app: &mut AppState, worker: &AuditWorker, events: &Sender<UiEvent>) {
    let Some(request) = app.begin_audit() else {
        return;
    };
    log::info!(
        "audit started: local={} national={}",
        request.local.display(),
        request.national.display()
    );

    let progress_tx = events.clone();
    let done_tx = events.clone();
    let submitted = worker.submit(
        move || {
            run_audit(&request, |stage| {
                let _ = progress_tx.send(UiEvent::Progress(stage));
            })
            .map_err(|e| e.to_string())
        },
        move |outcome| {
            let _ = done_tx.send(UiEvent::Finished(outcome));
        },
    );

    if let Err(e) = submitted {
        app.apply(UiEvent::Finished(JobOutcome::Finished(Err(e.to_string()))));
    }
}

/// Run the interactive audit screen until the user quits.
pub fn run(local: Option<PathBuf>, national: Option<PathBuf>) -> Result<(), String> {
    let mut app = AppState::new(local, national);
    let worker =
        AuditWorker::spawn().map_err(|e| format!("failed to start audit worker: {}", e))?;
    let (events_tx, events_rx) = mpsc::channel::<UiEvent>();

    terminal::enable_raw_mode()
        .map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        while let Ok(event) = events_rx.try_recv() {
            app.apply(event);
        }

        let height = terminal.size().map(|s| s.height).unwrap_or_default();
        app.set_viewport(height.saturating_sub(CHROME_ROWS) as usize);

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if event::poll(Duration::from_millis(100))
            .map_err(|e| format!("event poll error: {}", e))?
        {
            if let Event::Key(key) =
                event::read().map_err(|e| format!("event read error: {}", e))?
            {
                if key.kind == KeyEventKind::Press {
                    match app.handle_key(key) {
                        Action::StartAudit => start_audit(&mut app, &worker, &events_tx),
                        Action::Quit => app.should_quit = true,
                        Action::None => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosteraudit_cli::audit::AuditMeta;
    use rosteraudit_recon::{AuditSummary, Discrepancy, Finding};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app_with_paths() -> AppState {
        AppState::new(Some("local.xlsx".into()), Some("national.csv".into()))
    }

    fn report(findings: Vec<Finding>) -> AuditReport {
        AuditReport {
            meta: AuditMeta {
                engine_version: "0.0.0".into(),
                run_at: "2024-01-01T00:00:00+00:00".into(),
                local_path: "local.xlsx".into(),
                national_path: "national.csv".into(),
            },
            summary: AuditSummary::default(),
            findings,
        }
    }

    #[test]
    fn tab_cycles_focus() {
        let mut app = app_with_paths();
        assert_eq!(app.focus, Focus::Local);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::National);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Audit);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Local);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus, Focus::Audit);
    }

    #[test]
    fn typing_edits_focused_path() {
        let mut app = AppState::new(None, None);
        for c in "a.csv".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.local, "a.cs");
        assert_eq!(app.national, "");
    }

    #[test]
    fn enter_on_button_and_ctrl_r_start_audit() {
        let mut app = app_with_paths();
        assert_eq!(app.handle_key(ctrl('r')), Action::StartAudit);

        app.focus = Focus::Audit;
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::StartAudit);
    }

    #[test]
    fn esc_and_ctrl_c_quit() {
        let mut app = app_with_paths();
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(app.handle_key(ctrl('c')), Action::Quit);
    }

    #[test]
    fn missing_path_warns_and_stays_enabled() {
        let mut app = AppState::new(Some("local.xlsx".into()), None);
        assert!(app.begin_audit().is_none());
        assert!(app.audit_enabled);
        let popup = app.popup.clone().unwrap();
        assert_eq!(popup.message, MISSING_PATHS);

        // Popup swallows keys until dismissed
        assert_eq!(app.handle_key(ctrl('r')), Action::None);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.popup.is_none());
    }

    #[test]
    fn begin_audit_clears_output_and_disables_button() {
        let mut app = app_with_paths();
        app.output.push("old run".into());

        let request = app.begin_audit().unwrap();
        assert_eq!(request.local, PathBuf::from("local.xlsx"));
        assert!(app.output.is_empty());
        assert!(!app.audit_enabled);

        // No second audit while one is in flight
        assert!(app.begin_audit().is_none());
        assert_eq!(app.handle_key(ctrl('r')), Action::None);
    }

    #[test]
    fn success_reenables_and_renders_transcript() {
        let mut app = app_with_paths();
        app.begin_audit().unwrap();
        app.apply(UiEvent::Progress(Stage::Reading));
        app.apply(UiEvent::Finished(JobOutcome::Finished(Ok(report(vec![
            Finding::Mismatch(Discrepancy {
                member_id: "100".into(),
                member_name: "Doe, Jane".into(),
                field: "Service Computation Date".into(),
                national: "1/1/2020".into(),
                local: Some("1/2/2020".into()),
            }),
        ])))));

        assert!(app.audit_enabled);
        assert!(app.popup.is_none());
        assert_eq!(app.output.first().map(String::as_str), Some("Reading files..."));
        assert!(app.output.iter().any(|l| l == "Service Computation Date mismatch: 100"));
        assert_eq!(app.output.last().map(String::as_str), Some(render::COMPLETED));
    }

    #[test]
    fn failure_reenables_and_shows_error() {
        let mut app = app_with_paths();
        app.begin_audit().unwrap();
        app.apply(UiEvent::Finished(JobOutcome::Finished(Err(
            "local roster: missing column 'SCD'".into(),
        ))));

        assert!(app.audit_enabled);
        let popup = app.popup.clone().unwrap();
        assert_eq!(popup.message, "An error occurred: local roster: missing column 'SCD'");
    }

    #[test]
    fn panic_reenables_and_shows_error() {
        let mut app = app_with_paths();
        app.begin_audit().unwrap();
        app.apply(UiEvent::Finished(JobOutcome::Panicked("boom".into())));

        assert!(app.audit_enabled);
        assert!(app.popup.unwrap().message.ends_with("boom"));
    }

    #[test]
    fn output_follows_tail_until_scrolled_up() {
        let mut app = app_with_paths();
        app.set_viewport(3);
        app.focus = Focus::Audit;
        for _ in 0..10 {
            app.apply(UiEvent::Progress(Stage::Auditing));
        }
        assert_eq!(app.scroll, 7);

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.scroll, 6);
        assert!(!app.follow);
        app.apply(UiEvent::Progress(Stage::Auditing));
        assert_eq!(app.scroll, 6);

        app.handle_key(key(KeyCode::PageDown));
        assert!(app.follow);
        assert_eq!(app.scroll, 8);
    }
}
