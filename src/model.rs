use crate::clock::Clock;
use serde::{Deserialize, Serialize};

/// Title of the pinned legend item that always heads the To Do column.
pub const ANCHOR_TITLE: &str = "a/d/r/Entr";

pub const TASK_COLUMNS: usize = 3;

const TODO: usize = 0;
const DONE: usize = 2;

/// The three stored columns in Todo, InProgress, Done order.
pub type Columns = [Vec<Item>; TASK_COLUMNS];

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    /// Completion timestamp, empty when unset.
    #[serde(rename = "date", default)]
    pub completed_at: String,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Item {
            title: title.into(),
            completed_at: String::new(),
        }
    }

    fn anchor() -> Self {
        Item::new(ANCHOR_TITLE)
    }

    pub fn is_anchor(&self) -> bool {
        self.title == ANCHOR_TITLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Todo,
    InProgress,
    Done,
    FinishedOn,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 4] = [
        ColumnKind::Todo,
        ColumnKind::InProgress,
        ColumnKind::Done,
        ColumnKind::FinishedOn,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Todo => "TO DO",
            ColumnKind::InProgress => "IN PROGRESS",
            ColumnKind::Done => "DONE",
            ColumnKind::FinishedOn => "Finished On",
        }
    }

    fn position(self) -> usize {
        match self {
            ColumnKind::Todo => 0,
            ColumnKind::InProgress => 1,
            ColumnKind::Done => 2,
            ColumnKind::FinishedOn => 3,
        }
    }

    /// Index of the stored column this kind reads from.
    fn source(self) -> usize {
        match self {
            ColumnKind::FinishedOn => DONE,
            other => other.position(),
        }
    }

    /// Index of the stored column this kind may be mutated through.
    fn writable(self) -> Option<usize> {
        match self {
            ColumnKind::FinishedOn => None,
            other => Some(other.position()),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.writable().is_none()
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("an item is already grabbed")]
    Grabbing,
    #[error("no item is grabbed")]
    NotGrabbing,
    #[error("the finished-on column is read-only")]
    ReadOnlyColumn,
    #[error("the active column is empty")]
    EmptyColumn,
    #[error("the pinned item cannot be changed")]
    AnchorPinned,
    #[error("dates can only be set from the finished-on column")]
    NotDateColumn,
}

/// Columns, selection, and the in-flight grab of one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardModel {
    columns: Columns,
    active: ColumnKind,
    cursors: [usize; TASK_COLUMNS],
    grabbed: Option<Item>,
}

impl Default for BoardModel {
    fn default() -> Self {
        BoardModel::from_columns(Columns::default())
    }
}

impl BoardModel {
    /// Builds a board from stored columns, pinning the anchor at the head of
    /// To Do. Stray anchor copies further down To Do are dropped.
    pub fn from_columns(mut columns: Columns) -> Self {
        columns[TODO].retain(|item| !item.is_anchor());
        columns[TODO].insert(0, Item::anchor());
        BoardModel {
            columns,
            active: ColumnKind::Todo,
            cursors: [0; TASK_COLUMNS],
            grabbed: None,
        }
    }

    /// The stored columns as they should be written to disk.
    pub fn persisted_columns(&self) -> Columns {
        let mut columns = self.columns.clone();
        if columns[TODO].first().is_some_and(Item::is_anchor) {
            columns[TODO].remove(0);
        }
        columns
    }

    pub fn column(&self, kind: ColumnKind) -> &[Item] {
        &self.columns[kind.source()]
    }

    /// Completion dates of Done, in Done's order.
    pub fn finished_on(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns[DONE].iter().map(|item| item.completed_at.as_str())
    }

    pub fn active(&self) -> ColumnKind {
        self.active
    }

    pub fn cursor(&self, kind: ColumnKind) -> usize {
        self.cursors[kind.source()]
    }

    pub fn grabbed(&self) -> Option<&Item> {
        self.grabbed.as_ref()
    }

    pub fn is_grabbing(&self) -> bool {
        self.grabbed.is_some()
    }

    /// Items across the stored columns plus the grab slot, anchor excluded.
    pub fn item_count(&self) -> usize {
        let stored: usize = self.columns.iter().map(Vec::len).sum();
        stored - 1 + usize::from(self.is_grabbing())
    }

    pub fn targets_anchor(&self) -> bool {
        self.active == ColumnKind::Todo && self.cursors[TODO] == 0
    }

    /// Moves the cursor by `delta`. A move that points past a bound leaves
    /// the cursor where it is.
    pub fn navigate(&mut self, delta: isize) {
        let kind = self.active;
        let (lower, upper) = self.bounds(kind);
        let current = self.cursor(kind);
        if (delta < 0 && current <= lower) || (delta > 0 && current >= upper) {
            return;
        }
        let next = (current as isize + delta).clamp(lower as isize, upper as isize);
        self.cursors[kind.source()] = next as usize;
    }

    pub fn switch_column(&mut self, delta: isize) {
        let last = ColumnKind::ALL.len() as isize - 1;
        let position = (self.active.position() as isize + delta).clamp(0, last);
        let next = ColumnKind::ALL[position as usize];
        if next == self.active {
            return;
        }
        self.active = next;
        let (lower, upper) = self.bounds(self.active);
        let slot = &mut self.cursors[self.active.source()];
        *slot = (*slot).clamp(lower, upper);
        if self.active == ColumnKind::Todo && self.columns[TODO].len() > 1 {
            *slot = (*slot).max(1);
        }
    }

    pub fn grab(&mut self) -> Result<(), BoardError> {
        if self.is_grabbing() {
            return Err(BoardError::Grabbing);
        }
        let idx = self.active.writable().ok_or(BoardError::ReadOnlyColumn)?;
        if self.columns[idx].is_empty() {
            return Err(BoardError::EmptyColumn);
        }
        if self.targets_anchor() {
            return Err(BoardError::AnchorPinned);
        }
        let at = self.cursors[idx].min(self.columns[idx].len() - 1);
        let mut item = self.columns[idx].remove(at);
        if idx == DONE {
            item.completed_at.clear();
        }
        self.settle_cursor(idx);
        self.grabbed = Some(item);
        Ok(())
    }

    /// Places the grabbed item at the cursor of the active column.
    pub fn drop_grabbed(&mut self, clock: &dyn Clock) -> Result<(), BoardError> {
        let idx = self.active.writable().ok_or(BoardError::ReadOnlyColumn)?;
        let mut item = self.grabbed.take().ok_or(BoardError::NotGrabbing)?;
        if idx == DONE && item.completed_at.is_empty() {
            item.completed_at = clock.now();
        }
        let column = &mut self.columns[idx];
        let mut at = self.cursors[idx].min(column.len());
        if idx == TODO {
            at = at.max(1);
        }
        column.insert(at, item);
        self.cursors[idx] = at;
        for (cursor, column) in self.cursors.iter_mut().zip(&self.columns) {
            *cursor = (*cursor).min(column.len().saturating_sub(1));
        }
        Ok(())
    }

    pub fn delete_active(&mut self) -> Result<(), BoardError> {
        let (idx, at) = self.editable_target()?;
        self.columns[idx].remove(at);
        self.settle_cursor(idx);
        Ok(())
    }

    pub fn begin_add(&self) -> Result<(), BoardError> {
        if self.is_grabbing() {
            return Err(BoardError::Grabbing);
        }
        self.active.writable().ok_or(BoardError::ReadOnlyColumn)?;
        Ok(())
    }

    /// Inserts a new item right after the cursor, or right after the anchor
    /// in To Do, and selects it.
    pub fn commit_add(&mut self, title: impl Into<String>) -> Result<(), BoardError> {
        self.begin_add()?;
        let idx = self.active.source();
        let column = &mut self.columns[idx];
        let at = if idx == TODO {
            1
        } else {
            (self.cursors[idx] + 1).min(column.len())
        };
        column.insert(at, Item::new(title));
        self.cursors[idx] = at;
        Ok(())
    }

    /// Current title of the target, to seed a rename.
    pub fn begin_rename(&self) -> Result<String, BoardError> {
        if self.active.is_read_only() {
            return Err(BoardError::ReadOnlyColumn);
        }
        let (idx, at) = self.target_index()?;
        Ok(self.columns[idx][at].title.clone())
    }

    pub fn commit_rename(&mut self, title: impl Into<String>) -> Result<(), BoardError> {
        if self.active.is_read_only() {
            return Err(BoardError::ReadOnlyColumn);
        }
        let (idx, at) = self.target_index()?;
        self.columns[idx][at].title = title.into();
        Ok(())
    }

    /// Current completion date of the target, to seed a date edit.
    pub fn begin_set_date(&self) -> Result<String, BoardError> {
        if self.active != ColumnKind::FinishedOn {
            return Err(BoardError::NotDateColumn);
        }
        let (idx, at) = self.target_index()?;
        Ok(self.columns[idx][at].completed_at.clone())
    }

    pub fn commit_set_date(&mut self, date: impl Into<String>) -> Result<(), BoardError> {
        if self.active != ColumnKind::FinishedOn {
            return Err(BoardError::NotDateColumn);
        }
        let (idx, at) = self.target_index()?;
        self.columns[idx][at].completed_at = date.into();
        Ok(())
    }

    /// Valid cursor range of a column given the current grab state.
    fn bounds(&self, kind: ColumnKind) -> (usize, usize) {
        let len = self.column(kind).len();
        let accepts_drop = self.is_grabbing() && !kind.is_read_only();
        let upper = if accepts_drop {
            len
        } else {
            len.saturating_sub(1)
        };
        let lower = if kind == ColumnKind::Todo && !self.is_grabbing() {
            1
        } else {
            0
        };
        (lower.min(upper), upper)
    }

    fn settle_cursor(&mut self, idx: usize) {
        let len = self.columns[idx].len();
        let mut cursor = self.cursors[idx].min(len.saturating_sub(1));
        if idx == TODO && len > 1 {
            cursor = cursor.max(1);
        }
        self.cursors[idx] = cursor;
    }

    /// Stored position of the non-anchor item under the cursor.
    fn target_index(&self) -> Result<(usize, usize), BoardError> {
        if self.is_grabbing() {
            return Err(BoardError::Grabbing);
        }
        let idx = self.active.source();
        let at = self.cursors[idx];
        match self.columns[idx].get(at) {
            None => Err(BoardError::EmptyColumn),
            Some(_) if idx == TODO && at == 0 => Err(BoardError::AnchorPinned),
            Some(_) => Ok((idx, at)),
        }
    }

    fn editable_target(&self) -> Result<(usize, usize), BoardError> {
        if self.active.is_read_only() {
            return Err(BoardError::ReadOnlyColumn);
        }
        self.target_index()
    }
}
