//! Undo/redo history of a model.
//!
//! Commands address items by [`ItemPath`] rather than by handle: removing and
//! re-inserting an item creates a new arena entry, but its path is the same.
//! Re-inserted items therefore receive fresh identifiers.

use std::collections::VecDeque;

use super::builder::ItemBuilder;
use super::role::ItemDataRole;
use super::session_model::SessionModel;
use super::tag_info::{ItemPath, TagRow};
use super::variant::Variant;
use crate::error::Result;

/// One recorded model mutation.
#[derive(Debug, Clone)]
pub(crate) enum UndoCommand {
    SetProperty {
        path: ItemPath,
        name: String,
        old: Variant,
        new: Variant,
    },
    SetData {
        path: ItemPath,
        role: ItemDataRole,
        old: Variant,
        new: Variant,
    },
    Insert {
        parent: ItemPath,
        tag_row: TagRow,
        item: ItemBuilder,
    },
    Remove {
        parent: ItemPath,
        tag_row: TagRow,
        item: ItemBuilder,
    },
    /// Paths are taken in the tree state they are resolved against: `*_before`
    /// before the move (used by redo), `*_after` after it (used by undo).
    Move {
        item_before: ItemPath,
        to_parent_before: ItemPath,
        to: TagRow,
        item_after: ItemPath,
        from_parent_after: ItemPath,
        from: TagRow,
    },
    Group(Vec<UndoCommand>),
}

impl UndoCommand {
    pub(crate) fn description(&self) -> &'static str {
        match self {
            UndoCommand::SetProperty { .. } => "set property",
            UndoCommand::SetData { .. } => "set data",
            UndoCommand::Insert { .. } => "insert item",
            UndoCommand::Remove { .. } => "remove item",
            UndoCommand::Move { .. } => "move item",
            UndoCommand::Group(_) => "insert items",
        }
    }

    pub(crate) fn undo(&self, model: &SessionModel) -> Result<()> {
        match self {
            UndoCommand::SetProperty { path, name, old, .. } => {
                model.item_from_path(path)?.set_property(name, old.clone())?;
            }
            UndoCommand::SetData { path, role, old, .. } => {
                model.item_from_path(path)?.set_data(*role, old.clone())?;
            }
            UndoCommand::Insert { parent, tag_row, .. } => {
                model.remove_item(&model.item_from_path(parent)?, tag_row.clone())?;
            }
            UndoCommand::Remove {
                parent,
                tag_row,
                item,
            } => {
                model.insert_item(item.clone(), &model.item_from_path(parent)?, tag_row.clone())?;
            }
            UndoCommand::Move {
                item_after,
                from_parent_after,
                from,
                ..
            } => {
                let item = model.item_from_path(item_after)?;
                let parent = model.item_from_path(from_parent_after)?;
                model.move_item(&item, &parent, from.clone())?;
            }
            UndoCommand::Group(commands) => {
                for command in commands.iter().rev() {
                    command.undo(model)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn redo(&self, model: &SessionModel) -> Result<()> {
        match self {
            UndoCommand::SetProperty { path, name, new, .. } => {
                model.item_from_path(path)?.set_property(name, new.clone())?;
            }
            UndoCommand::SetData { path, role, new, .. } => {
                model.item_from_path(path)?.set_data(*role, new.clone())?;
            }
            UndoCommand::Insert {
                parent,
                tag_row,
                item,
            } => {
                model.insert_item(item.clone(), &model.item_from_path(parent)?, tag_row.clone())?;
            }
            UndoCommand::Remove { parent, tag_row, .. } => {
                model.remove_item(&model.item_from_path(parent)?, tag_row.clone())?;
            }
            UndoCommand::Move {
                item_before,
                to_parent_before,
                to,
                ..
            } => {
                let item = model.item_from_path(item_before)?;
                let parent = model.item_from_path(to_parent_before)?;
                model.move_item(&item, &parent, to.clone())?;
            }
            UndoCommand::Group(commands) => {
                for command in commands {
                    command.redo(model)?;
                }
            }
        }
        Ok(())
    }
}

/// Bounded history of model mutations.
#[derive(Debug, Default)]
pub struct UndoStack {
    undo: VecDeque<UndoCommand>,
    redo: Vec<UndoCommand>,
    limit: Option<usize>,
}

impl UndoStack {
    /// Creates a stack keeping at most `limit` commands (`None` for no limit).
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// The command limit.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable commands.
    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    /// Number of redoable commands.
    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    /// Drops the whole history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Records a fresh mutation; the redo history is discarded.
    pub(crate) fn push(&mut self, command: UndoCommand) {
        self.redo.clear();
        self.push_undo(command);
    }

    /// Puts a redone command back without touching the redo history.
    pub(crate) fn push_undo(&mut self, command: UndoCommand) {
        if self.limit == Some(0) {
            return;
        }
        self.undo.push_back(command);
        if let Some(limit) = self.limit {
            while self.undo.len() > limit {
                self.undo.pop_front();
            }
        }
    }

    pub(crate) fn push_redo(&mut self, command: UndoCommand) {
        self.redo.push(command);
    }

    pub(crate) fn pop_undo(&mut self) -> Option<UndoCommand> {
        self.undo.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<UndoCommand> {
        self.redo.pop()
    }
}
