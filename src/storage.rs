use crate::model::{BoardModel, Columns, Item, TASK_COLUMNS};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_BOARD_FILE: &str = "dodone.json";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("serializing board: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("writing {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

pub trait BoardStore {
    /// Loads the board; unreadable data yields an empty board.
    fn load(&self) -> BoardModel;
    fn save(&self, board: &BoardModel) -> Result<(), StoreError>;
    fn location(&self) -> &Path;
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStore { path: path.into() }
    }
}

impl BoardStore for JsonStore {
    fn load(&self) -> BoardModel {
        let columns = match fs::read_to_string(&self.path) {
            Ok(data) => parse_document(&data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no board file yet, starting empty");
                Columns::default()
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "board file unreadable, starting empty");
                Columns::default()
            }
        };
        let board = BoardModel::from_columns(columns);
        tracing::info!(
            path = %self.path.display(),
            items = board.item_count(),
            "board loaded"
        );
        board
    }

    fn save(&self, board: &BoardModel) -> Result<(), StoreError> {
        let document = to_document(&board.persisted_columns())?;
        atomic_write(&self.path, &document).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "board saved");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Serializes the columns with four-space indentation.
pub fn to_document(columns: &Columns) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    columns.serialize(&mut serializer)?;
    Ok(out)
}

/// Parses a board document. Malformed input yields empty columns; a
/// malformed column only empties that column.
pub fn parse_document(data: &str) -> Columns {
    let mut columns = Columns::default();
    let entries = match serde_json::from_str::<Value>(data) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            tracing::warn!("board document is not an array, starting empty");
            return columns;
        }
        Err(err) => {
            tracing::warn!(%err, "board document is not valid JSON, starting empty");
            return columns;
        }
    };
    for (idx, entry) in entries.into_iter().take(TASK_COLUMNS).enumerate() {
        match serde_json::from_value::<Vec<Item>>(entry) {
            Ok(items) => columns[idx] = items,
            Err(err) => tracing::warn!(column = idx, %err, "skipping malformed column"),
        }
    }
    columns
}

/// Writes `content` to `path` through a temp file in the same directory.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
