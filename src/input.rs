use crate::clock::Clock;
use crate::edit::{EditMode, EditOutcome, EditSession};
use crate::model::{BoardError, BoardModel, ColumnKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// The keys the board reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Other,
}

impl From<KeyEvent> for Key {
    fn from(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                Key::Char(c)
            }
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Enter => Key::Enter,
            KeyCode::Esc => Key::Esc,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Not claimed; left to the surrounding event loop.
    Unhandled,
    Consumed,
    /// The board changed and should be saved.
    Mutated,
}

pub fn route(
    key: Key,
    board: &mut BoardModel,
    edit: &mut EditSession,
    clock: &dyn Clock,
) -> Routed {
    if edit.is_active() {
        return route_edit(key, board, edit);
    }
    match key {
        Key::Up => board.navigate(-1),
        Key::Down => board.navigate(1),
        Key::Left => board.switch_column(-1),
        Key::Right => board.switch_column(1),
        Key::Enter => {
            let result = if board.is_grabbing() {
                board.drop_grabbed(clock)
            } else {
                board.grab()
            };
            return applied(result);
        }
        Key::Char('d' | 'a' | 'r') if board.is_grabbing() => {}
        Key::Char('d') => return applied(board.delete_active()),
        Key::Char('a') => match board.begin_add() {
            Ok(()) => {
                edit.begin(EditMode::Adding, "");
            }
            Err(err) => ignored(err),
        },
        Key::Char('r') => {
            let (mode, seed) = if board.active() == ColumnKind::FinishedOn {
                (EditMode::SettingDate, board.begin_set_date())
            } else {
                (EditMode::Renaming, board.begin_rename())
            };
            match seed {
                Ok(seed) => {
                    edit.begin(mode, seed);
                }
                Err(err) => ignored(err),
            }
        }
        _ => return Routed::Unhandled,
    }
    Routed::Consumed
}

fn route_edit(key: Key, board: &mut BoardModel, edit: &mut EditSession) -> Routed {
    match edit.handle(key) {
        EditOutcome::Committed { mode, text } => applied(match mode {
            EditMode::Adding => board.commit_add(text),
            EditMode::Renaming => board.commit_rename(text),
            EditMode::SettingDate => board.commit_set_date(text),
            EditMode::None => return Routed::Consumed,
        }),
        EditOutcome::Pending | EditOutcome::Cancelled => Routed::Consumed,
    }
}

fn applied(result: Result<(), BoardError>) -> Routed {
    match result {
        Ok(()) => Routed::Mutated,
        Err(err) => {
            ignored(err);
            Routed::Consumed
        }
    }
}

fn ignored(err: BoardError) {
    tracing::debug!(%err, "key ignored");
}
