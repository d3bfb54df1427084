use crate::input::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    None,
    Adding,
    Renaming,
    SettingDate,
}

impl EditMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            EditMode::None => "",
            EditMode::Adding => "+ Add: ",
            EditMode::Renaming => "Renaming: ",
            EditMode::SettingDate => "Set Date/Time: ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Still capturing text.
    Pending,
    Committed { mode: EditMode, text: String },
    Cancelled,
}

/// Modal text capture for add, rename, and set-date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    mode: EditMode,
    buffer: String,
}

impl EditSession {
    /// Starts capturing text seeded with `seed`. Returns false when a session
    /// is already running.
    pub fn begin(&mut self, mode: EditMode, seed: impl Into<String>) -> bool {
        if self.is_active() || mode == EditMode::None {
            return false;
        }
        self.mode = mode;
        self.buffer = seed.into();
        true
    }

    pub fn is_active(&self) -> bool {
        self.mode != EditMode::None
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn handle(&mut self, key: Key) -> EditOutcome {
        if !self.is_active() {
            return EditOutcome::Pending;
        }
        match key {
            Key::Char(ch) => self.buffer.push(ch),
            Key::Backspace => {
                self.buffer.pop();
            }
            Key::Enter => {
                let mode = std::mem::take(&mut self.mode);
                let text = std::mem::take(&mut self.buffer);
                return EditOutcome::Committed { mode, text };
            }
            Key::Esc => {
                self.reset();
                return EditOutcome::Cancelled;
            }
            _ => {}
        }
        EditOutcome::Pending
    }

    fn reset(&mut self) {
        self.mode = EditMode::None;
        self.buffer.clear();
    }
}
