use crate::clock::Clock;
use crate::edit::{EditMode, EditSession};
use crate::input::{self, Key, Routed};
use crate::model::{BoardModel, ColumnKind};
use crate::storage::BoardStore;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const FRAME_COLOR: Color = Color::Rgb(135, 0, 255);

pub fn run<S: BoardStore>(board: BoardModel, store: S, clock: Box<dyn Clock>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(board, store, clock);
    let result = app.event_loop(&mut terminal);
    let teardown = teardown_terminal(&mut terminal);
    shutdown(&mut app, result, teardown)
}

/// Saves the board once more, then reports the first error of the session.
fn shutdown<S: BoardStore>(
    app: &mut App<S>,
    result: Result<()>,
    teardown: Result<()>,
) -> Result<()> {
    app.persist();
    tracing::info!("quit");
    result.and(teardown)
}

struct App<S> {
    board: BoardModel,
    edit: EditSession,
    store: S,
    clock: Box<dyn Clock>,
    scroll_offsets: [usize; 4],
    last_save: Option<Instant>,
    status: String,
}

impl<S: BoardStore> App<S> {
    fn new(board: BoardModel, store: S, clock: Box<dyn Clock>) -> Self {
        let status = format!("Loaded board from {}", store.location().display());
        App {
            board,
            edit: EditSession::default(),
            store,
            clock,
            scroll_offsets: [0; 4],
            last_save: None,
            status,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(500))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true when the key asks to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let routed = input::route(
            Key::from(key),
            &mut self.board,
            &mut self.edit,
            self.clock.as_ref(),
        );
        match routed {
            Routed::Mutated => {
                self.persist();
                false
            }
            Routed::Consumed => false,
            Routed::Unhandled => is_quit(key),
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.board) {
            Ok(()) => {
                self.last_save = Some(Instant::now());
                self.status = format!("Saved to {}", self.store.location().display());
            }
            Err(err) => {
                tracing::warn!(%err, "save failed");
                self.status = format!("Save failed: {}", err);
            }
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(f.size());
        self.draw_board(f, layout[0]);
        self.draw_footer(f, layout[1]);
    }

    fn draw_board(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let outer = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .border_style(Style::default().fg(FRAME_COLOR));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(inner);

        for (idx, kind) in ColumnKind::ALL.into_iter().enumerate() {
            let rows = column_rows(&self.board, &self.edit, kind);
            let accent = color_for_kind(kind);
            let is_active = self.board.active() == kind;
            let items = rows.lines.into_iter().map(ListItem::new).collect::<Vec<_>>();

            let title = Line::from(vec![
                Span::raw("─ "),
                Span::styled(
                    kind.label(),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" ─"),
            ]);
            let block = Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if is_active {
                    accent
                } else {
                    Color::DarkGray
                }));

            let mut state = ListState::default()
                .with_offset(self.scroll_offsets[idx])
                .with_selected(rows.focus);
            let list = List::new(items).block(block);
            f.render_stateful_widget(list, chunks[idx], &mut state);
            self.scroll_offsets[idx] = state.offset();
        }
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let saved = self
            .last_save
            .map(format_elapsed)
            .unwrap_or_else(|| "not yet".to_string());
        let lines = vec![
            self.footer_help_line(),
            Line::from(vec![
                Span::raw(self.status.clone()),
                Span::raw("  •  "),
                Span::styled(
                    format!("saved {}", saved),
                    Style::default().fg(Color::Gray),
                ),
            ]),
        ];
        let footer = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(footer, area);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        if self.edit.is_active() {
            return Line::from(vec![
                key("Enter", Color::LightGreen),
                Span::raw(" save  "),
                key("Esc", Color::LightRed),
                Span::raw(" cancel"),
            ]);
        }
        if self.board.is_grabbing() {
            return Line::from(vec![
                key("←↑↓→", Color::LightCyan),
                Span::raw(" choose slot  "),
                key("Enter", Color::LightYellow),
                Span::raw(" drop  "),
                key("q", Color::LightRed),
                Span::raw(" quit"),
            ]);
        }
        Line::from(vec![
            key("←↑↓→", Color::LightCyan),
            Span::raw(" move  "),
            key("Enter", Color::LightYellow),
            Span::raw(" grab  "),
            key("a", Color::LightMagenta),
            Span::raw(" add  "),
            key("r", Color::LightYellow),
            Span::raw(" rename / set date  "),
            key("d", Color::LightRed),
            Span::raw(" delete  "),
            key("q", Color::LightRed),
            Span::raw(" quit"),
        ])
    }
}

/// Rendered lines of one column and the line the cursor is on.
struct ColumnRows {
    lines: Vec<Line<'static>>,
    focus: Option<usize>,
}

fn column_rows(board: &BoardModel, edit: &EditSession, kind: ColumnKind) -> ColumnRows {
    let items = board.column(kind);
    let is_active = board.active() == kind;
    let cursor = board.cursor(kind);
    let is_date_column = kind == ColumnKind::FinishedOn;
    let inserting = board.grabbed().filter(|_| is_active && !is_date_column);
    let editing_row = matches!(edit.mode(), EditMode::Renaming | EditMode::SettingDate);
    let dates: Vec<&str> = if is_date_column {
        board.finished_on().collect()
    } else {
        Vec::new()
    };

    let mut lines = Vec::new();
    let mut focus = None;
    for idx in 0..=items.len() {
        if let Some(grabbed) = inserting.filter(|_| idx == cursor) {
            focus = Some(lines.len());
            lines.push(Line::styled(
                format!("[ {} ]", grabbed.title),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        let Some(item) = items.get(idx) else {
            break;
        };
        let text = match dates.get(idx).copied() {
            Some(date) if date.is_empty() => "(not set)",
            Some(date) => date,
            None => item.title.as_str(),
        };

        if !(is_active && idx == cursor) {
            lines.push(Line::raw(format!("  {}", text)));
            continue;
        }
        if focus.is_none() {
            focus = Some(lines.len());
        }
        if editing_row {
            lines.push(Line::from(vec![
                Span::raw("> "),
                Span::raw(edit.mode().prompt()),
                Span::styled(
                    edit.buffer().to_string(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
        } else {
            let color = if kind == ColumnKind::Todo && idx == 0 && item.is_anchor() {
                Color::Red
            } else {
                Color::Green
            };
            lines.push(Line::styled(
                format!("> {}", text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        }
    }

    if is_active && !is_date_column && edit.mode() == EditMode::Adding {
        focus = Some(lines.len());
        lines.push(Line::from(vec![
            Span::raw(edit.mode().prompt()),
            Span::styled(
                edit.buffer().to_string(),
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    if items.is_empty() && inserting.is_none() {
        lines.push(Line::styled(
            "  (empty)",
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    ColumnRows { lines, focus }
}

fn is_quit(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') | KeyCode::Esc => true,
        _ => false,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn color_for_kind(kind: ColumnKind) -> Color {
    match kind {
        ColumnKind::Todo => Color::Rgb(135, 215, 255),
        ColumnKind::InProgress => Color::Rgb(255, 175, 0),
        ColumnKind::Done => Color::Rgb(0, 255, 175),
        ColumnKind::FinishedOn => Color::Rgb(215, 0, 215),
    }
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::{Item, ANCHOR_TITLE};
    use crate::storage::JsonStore;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn text_of(rows: &ColumnRows) -> Vec<String> {
        rows.lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn press(app: &mut App<JsonStore>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app_in(dir: &tempfile::TempDir) -> App<JsonStore> {
        let store = JsonStore::new(dir.path().join("dodone.json"));
        App::new(
            BoardModel::default(),
            store,
            Box::new(FixedClock("2024-05-01 09:30:00")),
        )
    }

    #[test]
    fn rows_mark_selection_and_anchor() {
        let board = BoardModel::from_columns([vec![Item::new("a")], Vec::new(), Vec::new()]);
        let edit = EditSession::default();
        let rows = column_rows(&board, &edit, ColumnKind::Todo);
        assert_eq!(text_of(&rows), vec![format!("> {}", ANCHOR_TITLE), "  a".into()]);
        assert_eq!(rows.focus, Some(0));
        let selected = rows.lines[0].style.patch(rows.lines[0].spans[0].style);
        assert_eq!(selected.fg, Some(Color::Red));

        let rows = column_rows(&board, &edit, ColumnKind::InProgress);
        assert_eq!(text_of(&rows), vec!["  (empty)".to_string()]);
        assert_eq!(rows.focus, None);
    }

    #[test]
    fn rows_show_grab_slot_and_dates() {
        let mut board = BoardModel::from_columns([
            vec![Item::new("move")],
            Vec::new(),
            vec![Item::new("undated")],
        ]);
        board.navigate(1);
        board.grab().unwrap();
        board.switch_column(2);
        let edit = EditSession::default();
        assert_eq!(
            text_of(&column_rows(&board, &edit, ColumnKind::Done)),
            vec!["[ move ]".to_string(), "> undated".into()]
        );
        assert_eq!(
            text_of(&column_rows(&board, &edit, ColumnKind::FinishedOn)),
            vec!["  (not set)".to_string()]
        );
    }

    #[test]
    fn rows_show_edit_prompts() {
        let mut board = BoardModel::from_columns([vec![Item::new("old")], Vec::new(), Vec::new()]);
        board.navigate(1);
        let mut edit = EditSession::default();
        edit.begin(EditMode::Renaming, "new");
        assert_eq!(
            text_of(&column_rows(&board, &edit, ColumnKind::Todo)),
            vec![format!("  {}", ANCHOR_TITLE), "> Renaming: new".into()]
        );

        let mut edit = EditSession::default();
        edit.begin(EditMode::Adding, "x");
        let rows = column_rows(&board, &edit, ColumnKind::Todo);
        assert_eq!(rows.lines.len(), 3);
        assert_eq!(text_of(&rows)[2], "+ Add: x");
        assert_eq!(rows.focus, Some(2));
    }

    #[test]
    fn mutations_are_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        assert!(!press(&mut app, KeyCode::Char('a')));
        for ch in "tea".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        assert!(!dir.path().join("dodone.json").exists());
        press(&mut app, KeyCode::Enter);
        let saved = fs::read_to_string(dir.path().join("dodone.json")).unwrap();
        assert!(saved.contains("\"tea\""));
        assert!(app.status.starts_with("Saved"));
        assert!(app.last_save.is_some());
    }

    #[test]
    fn quit_keys_only_outside_edit_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        press(&mut app, KeyCode::Char('a'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(!press(&mut app, KeyCode::Esc));
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(press(&mut app, KeyCode::Esc));
    }

    #[test]
    fn finished_on_rows_list_done_dates() {
        let board = BoardModel::from_columns([
            Vec::new(),
            Vec::new(),
            vec![
                Item {
                    title: "shipped".into(),
                    completed_at: "2024-05-01 09:30:00".into(),
                },
                Item::new("undated"),
            ],
        ]);
        let edit = EditSession::default();
        assert_eq!(
            text_of(&column_rows(&board, &edit, ColumnKind::FinishedOn)),
            vec!["  2024-05-01 09:30:00".to_string(), "  (not set)".into()]
        );
    }

    #[test]
    fn shutdown_saves_even_when_teardown_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.board.commit_add("late").unwrap();
        let outcome = shutdown(&mut app, Ok(()), Err(anyhow::anyhow!("terminal gone")));
        assert_eq!(outcome.unwrap_err().to_string(), "terminal gone");
        let saved = fs::read_to_string(dir.path().join("dodone.json")).unwrap();
        assert!(saved.contains("\"late\""));
    }

    #[test]
    fn failed_save_keeps_running() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let mut app = App::new(
            BoardModel::default(),
            JsonStore::new(blocker.join("dodone.json")),
            Box::new(FixedClock("2024-05-01 09:30:00")),
        );
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('x'));
        assert!(!press(&mut app, KeyCode::Enter));
        assert!(app.status.starts_with("Save failed"));
        assert_eq!(app.board.column(ColumnKind::Todo).len(), 2);
    }
}
