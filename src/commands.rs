use crate::clock::LocalClock;
use crate::model::{BoardModel, ColumnKind, Item};
use crate::storage::{BoardStore, JsonStore};
use crate::ui;
use anyhow::Result;
use std::io::{self, Write};

pub fn tui(store: JsonStore) -> Result<()> {
    let board = store.load();
    ui::run(board, store, Box::new(LocalClock))
}

pub fn list(store: &JsonStore) -> Result<()> {
    let board = store.load();
    let mut out = io::stdout().lock();
    write_board(&mut out, &board)?;
    Ok(())
}

fn write_board(out: &mut impl Write, board: &BoardModel) -> io::Result<()> {
    for kind in [ColumnKind::Todo, ColumnKind::InProgress, ColumnKind::Done] {
        writeln!(out, "{}", kind.label())?;
        let items: Vec<&Item> = board
            .column(kind)
            .iter()
            .filter(|item| !(kind == ColumnKind::Todo && item.is_anchor()))
            .collect();
        if items.is_empty() {
            writeln!(out, "  (empty)")?;
        }
        for item in items {
            write_item(out, kind, item)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_item(out: &mut impl Write, kind: ColumnKind, item: &Item) -> io::Result<()> {
    if kind != ColumnKind::Done {
        return writeln!(out, "  - {}", item.title);
    }
    let finished = if item.completed_at.is_empty() {
        "(not set)"
    } else {
        item.completed_at.as_str()
    };
    writeln!(out, "  - {}  [{}]", item.title, finished)
}
