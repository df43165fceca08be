//! The session model: owner of an item tree and its single mutation entry
//! point.
//!
//! All structural changes go through [`SessionModel`]. Each mutation
//! validates first, changes the tree while holding the store borrow, then
//! releases the borrow before any callback runs, so callbacks are free to
//! read the model and to mutate it again.
//!
//! # Event order
//!
//! | Mutation        | Events, in order                                                        |
//! |-----------------|-------------------------------------------------------------------------|
//! | insert          | `item_inserted(parent)`                                                 |
//! | remove / take   | `about_to_remove(parent)`, `item_removed(parent)`, `destroy` per item   |
//! | move            | `about_to_remove(old)`, `item_removed(old)`, `item_inserted(new)`       |
//! | set property    | `property_change(item)`, `child_property_change(parent)`                |
//! | clear           | `model_about_to_reset`, `destroy` per item, `model_reset`               |
//!
//! Every item-level event is followed by the matching [`ModelMapper`] event.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use horizon_mvvm_core::logging::{span_names, targets};

use super::builder::ItemBuilder;
use super::container::check_accepts;
use super::item::SessionItem;
use super::role::ItemDataRole;
use super::store::{ItemId, ItemStore};
use super::tag_info::{ItemPath, TagInfo, TagRow};
use super::undo::{UndoCommand, UndoStack};
use super::variant::Variant;
use crate::error::{MvvmError, Result};
use crate::signals::{ItemMapper, ModelMapper};

/// Model type of every model's root item.
pub const ROOT_MODEL_TYPE: &str = "SessionItem";

/// Name of the root item's default tag.
pub const ROOT_TAG: &str = "rootTag";

pub(crate) struct ModelShared {
    model_type: String,
    pub(crate) store: RefCell<ItemStore>,
    mapper: ModelMapper,
    undo: RefCell<Option<UndoStack>>,
    replaying: Cell<bool>,
}

/// Owns a tree of [`SessionItem`]s.
///
/// `SessionModel` is a cheap, clonable handle; clones refer to the same
/// model. The tree is freed when the last handle is dropped.
///
/// # Example
///
/// ```
/// use horizon_mvvm::model::{ItemBuilder, SessionModel, TagRow};
///
/// let model = SessionModel::new("SampleModel");
/// let root = model.root_item();
/// model.append_item(ItemBuilder::new("Layer"), &root, "").unwrap();
/// model.append_item(ItemBuilder::new("Layer"), &root, "").unwrap();
/// assert_eq!(model.top_items().len(), 2);
///
/// model.remove_item(&root, TagRow::default_tag(0)).unwrap();
/// assert_eq!(model.top_items().len(), 1);
/// ```
#[derive(Clone)]
pub struct SessionModel {
    shared: Rc<ModelShared>,
}

struct ReplayGuard<'a>(&'a Cell<bool>);

impl<'a> ReplayGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

type Doomed = Vec<(ItemId, Rc<ItemMapper>)>;

impl SessionModel {
    /// Creates an empty model: a root item with one universal default tag.
    pub fn new(model_type: impl Into<String>) -> Self {
        Self {
            shared: Rc::new(ModelShared {
                model_type: model_type.into(),
                store: RefCell::new(ItemStore::new(ROOT_MODEL_TYPE, TagInfo::universal(ROOT_TAG))),
                mapper: ModelMapper::new(),
                undo: RefCell::new(None),
                replaying: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Rc<ModelShared>) -> Self {
        Self { shared }
    }

    fn weak(&self) -> Weak<ModelShared> {
        Rc::downgrade(&self.shared)
    }

    pub(crate) fn handle(&self, id: ItemId) -> SessionItem {
        SessionItem::new(self.weak(), id)
    }

    /// The model type, e.g. `"SampleModel"`.
    pub fn model_type(&self) -> &str {
        &self.shared.model_type
    }

    /// The model-wide mapper.
    pub fn mapper(&self) -> &ModelMapper {
        &self.shared.mapper
    }

    /// The root item.
    pub fn root_item(&self) -> SessionItem {
        self.handle(self.shared.store.borrow().root())
    }

    /// Items directly under the root.
    pub fn top_items(&self) -> Vec<SessionItem> {
        self.root_item().children().unwrap_or_default()
    }

    /// Number of live items, the root included.
    pub fn item_count(&self) -> usize {
        self.shared.store.borrow().len()
    }

    /// Finds a live item by its identifier.
    pub fn find_item(&self, identifier: u64) -> Option<SessionItem> {
        let id = self.shared.store.borrow().find_identifier(identifier)?;
        Some(self.handle(id))
    }

    /// Resolves a path from the root.
    pub fn item_from_path(&self, path: &ItemPath) -> Result<SessionItem> {
        let id = self.shared.store.borrow().resolve_path(path)?;
        Ok(self.handle(id))
    }

    /// The path from the root to `item`.
    pub fn path_of(&self, item: &SessionItem) -> Result<ItemPath> {
        let id = self.ensure_owned(item)?;
        self.shared.store.borrow().path_of(id)
    }

    /// Checks that `item` is alive and belongs to this model.
    fn ensure_owned(&self, item: &SessionItem) -> Result<ItemId> {
        if !item.belongs_to(&self.shared) {
            return Err(MvvmError::precondition("item belongs to another model"));
        }
        let store = self.shared.store.borrow();
        store.node(item.id())?;
        Ok(item.id())
    }

    // -------------------------------------------------------------------------
    // Structural mutation
    // -------------------------------------------------------------------------

    /// Inserts a new item built from `builder` under `parent` at `tag_row`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the tag does not exist or the row is outside `[0, count]`
    /// - `TypeNotAllowed` if the tag does not accept the builder's model type
    /// - `Capacity` if the tag is already at its maximum
    /// - any error from [`ItemBuilder::validate`]
    pub fn insert_item(
        &self,
        builder: ItemBuilder,
        parent: &SessionItem,
        tag_row: TagRow,
    ) -> Result<SessionItem> {
        self.insert_items(vec![builder], parent, tag_row)?
            .pop()
            .ok_or_else(|| MvvmError::not_found("inserted item"))
    }

    /// Appends a new item under `tag` (empty for the default tag).
    pub fn append_item(
        &self,
        builder: ItemBuilder,
        parent: &SessionItem,
        tag: &str,
    ) -> Result<SessionItem> {
        let row = parent.item_count(tag)?;
        self.insert_item(builder, parent, TagRow::new(tag, row))
    }

    /// Inserts several items into one tag, starting at `tag_row`.
    ///
    /// Every builder is validated and the tag's bounds are checked for the
    /// whole batch before anything is attached: either all items are
    /// inserted or none is.
    pub fn insert_items(
        &self,
        builders: Vec<ItemBuilder>,
        parent: &SessionItem,
        tag_row: TagRow,
    ) -> Result<Vec<SessionItem>> {
        let _span =
            tracing::trace_span!(target: targets::MODEL, span_names::MODEL_MUTATION, op = "insert")
                .entered();
        let parent_id = self.ensure_owned(parent)?;
        for builder in &builders {
            builder.validate()?;
        }
        let recording = self.is_recording();

        let (inserted, parent_mapper, parent_path, snapshots) = {
            let mut store = self.shared.store.borrow_mut();
            let container = store.node(parent_id)?.tags.get(&tag_row.tag)?;
            if tag_row.row > container.len() {
                return Err(MvvmError::not_found(format!(
                    "row {} in tag '{}' ({} item(s))",
                    tag_row.row,
                    container.name(),
                    container.len()
                )));
            }
            for (offset, builder) in builders.iter().enumerate() {
                check_accepts(
                    &container.tag_info,
                    builder.model_type(),
                    container.len() + offset + 1,
                )?;
            }
            let tag = container.name().to_string();
            let parent_path = if recording {
                Some(store.path_of(parent_id)?)
            } else {
                None
            };
            let snapshots = if recording { builders.clone() } else { Vec::new() };

            let mut inserted = Vec::with_capacity(builders.len());
            for (offset, builder) in builders.into_iter().enumerate() {
                let position = TagRow::new(tag.clone(), tag_row.row + offset);
                let id = store.allocate(builder, Some(parent_id))?;
                store.attach(parent_id, &position, id)?;
                inserted.push((id, position));
            }
            (inserted, store.mapper(parent_id)?, parent_path, snapshots)
        };

        if let Some(parent_path) = parent_path {
            let mut commands: Vec<UndoCommand> = snapshots
                .into_iter()
                .zip(&inserted)
                .map(|(item, (_, position))| UndoCommand::Insert {
                    parent: parent_path.clone(),
                    tag_row: position.clone(),
                    item,
                })
                .collect();
            let command = if commands.len() == 1 {
                commands.remove(0)
            } else {
                UndoCommand::Group(commands)
            };
            self.record(command);
        }

        for (_, position) in &inserted {
            tracing::debug!(target: targets::MODEL, tag_row = %position, "item inserted");
            parent_mapper.call_on_item_inserted(parent, position);
            self.shared.mapper.call_on_item_inserted(parent, position);
        }
        Ok(inserted.into_iter().map(|(id, _)| self.handle(id)).collect())
    }

    /// Removes and destroys the item at `tag_row` under `parent`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the tag does not exist or holds no item at that row
    /// - `Capacity` if removal would leave the tag below its minimum
    pub fn remove_item(&self, parent: &SessionItem, tag_row: TagRow) -> Result<()> {
        self.take_item(parent, tag_row).map(|_| ())
    }

    /// Removes the item at `tag_row` under `parent` and returns its subtree
    /// as a detached builder. The live items are destroyed.
    pub fn take_item(&self, parent: &SessionItem, tag_row: TagRow) -> Result<ItemBuilder> {
        let _span =
            tracing::trace_span!(target: targets::MODEL, span_names::MODEL_MUTATION, op = "remove")
                .entered();
        let parent_id = self.ensure_owned(parent)?;
        let (child_id, position, parent_mapper) = {
            let store = self.shared.store.borrow();
            let container = store.node(parent_id)?.tags.get(&tag_row.tag)?;
            container.check_remove(tag_row.row)?;
            (
                container.items[tag_row.row],
                TagRow::new(container.name(), tag_row.row),
                store.mapper(parent_id)?,
            )
        };

        parent_mapper.call_on_about_to_remove_item(parent, &position);
        self.shared
            .mapper
            .call_on_about_to_remove_item(parent, &position);

        let recording = self.is_recording();
        let (snapshot, doomed, parent_path) = {
            let mut store = self.shared.store.borrow_mut();
            if store.tag_row_of(child_id).as_ref() != Some(&position)
                || store.node(child_id)?.parent != Some(parent_id)
            {
                return Err(MvvmError::precondition(
                    "item was moved while its removal was being announced",
                ));
            }
            let parent_path = if recording {
                Some(store.path_of(parent_id)?)
            } else {
                None
            };
            store.detach(child_id)?;
            let snapshot = store.snapshot(child_id)?;
            let doomed = collect_doomed(&store, child_id);
            (snapshot, doomed, parent_path)
        };

        tracing::debug!(target: targets::MODEL, tag_row = %position, "item removed");
        parent_mapper.call_on_item_removed(parent, &position);
        self.shared.mapper.call_on_item_removed(parent, &position);

        if let Some(parent_path) = parent_path {
            self.record(UndoCommand::Remove {
                parent: parent_path,
                tag_row: position,
                item: snapshot.clone(),
            });
        }

        self.destroy(doomed);
        Ok(snapshot)
    }

    /// Moves `item` under `new_parent` so that it ends up at `tag_row`.
    ///
    /// The item and its subtree keep their identity; nothing is destroyed.
    /// Moving an item within its own container interprets the row as the
    /// final position.
    ///
    /// # Errors
    ///
    /// - `Precondition` when moving the root or moving an item into its own
    ///   subtree
    /// - `NotFound`, `TypeNotAllowed`, `Capacity` as for insertion and removal
    pub fn move_item(&self, item: &SessionItem, new_parent: &SessionItem, tag_row: TagRow) -> Result<()> {
        let _span =
            tracing::trace_span!(target: targets::MODEL, span_names::MODEL_MUTATION, op = "move")
                .entered();
        let item_id = self.ensure_owned(item)?;
        let new_parent_id = self.ensure_owned(new_parent)?;

        let plan = {
            let store = self.shared.store.borrow();
            plan_move(&store, item_id, new_parent_id, &tag_row)?
        };
        if plan.is_noop() {
            return Ok(());
        }
        let old_parent = self.handle(plan.old_parent);
        let (old_mapper, new_mapper) = {
            let store = self.shared.store.borrow();
            (store.mapper(plan.old_parent)?, store.mapper(new_parent_id)?)
        };

        old_mapper.call_on_about_to_remove_item(&old_parent, &plan.old_position);
        self.shared
            .mapper
            .call_on_about_to_remove_item(&old_parent, &plan.old_position);

        let recording = self.is_recording();
        let command = {
            let mut store = self.shared.store.borrow_mut();
            let replanned = plan_move(&store, item_id, new_parent_id, &tag_row)?;
            if replanned.old_position != plan.old_position || replanned.old_parent != plan.old_parent {
                return Err(MvvmError::precondition(
                    "item was moved while its removal was being announced",
                ));
            }
            let before = if recording {
                Some((store.path_of(item_id)?, store.path_of(new_parent_id)?))
            } else {
                None
            };
            store.detach(item_id)?;
            store.attach(new_parent_id, &plan.target, item_id)?;
            match before {
                Some((item_before, to_parent_before)) => Some(UndoCommand::Move {
                    item_before,
                    to_parent_before,
                    to: plan.target.clone(),
                    item_after: store.path_of(item_id)?,
                    from_parent_after: store.path_of(plan.old_parent)?,
                    from: plan.old_position.clone(),
                }),
                None => None,
            }
        };

        tracing::debug!(
            target: targets::MODEL,
            from = %plan.old_position,
            to = %plan.target,
            "item moved"
        );
        old_mapper.call_on_item_removed(&old_parent, &plan.old_position);
        self.shared
            .mapper
            .call_on_item_removed(&old_parent, &plan.old_position);
        new_mapper.call_on_item_inserted(new_parent, &plan.target);
        self.shared
            .mapper
            .call_on_item_inserted(new_parent, &plan.target);

        if let Some(command) = command {
            self.record(command);
        }
        Ok(())
    }

    /// Inserts a deep copy of `item` under `parent` at `tag_row`. The copy
    /// receives fresh identifiers.
    pub fn copy_item(&self, item: &SessionItem, parent: &SessionItem, tag_row: TagRow) -> Result<SessionItem> {
        let builder = item.to_builder()?;
        self.insert_item(builder, parent, tag_row)
    }

    /// Destroys every item below the root. Not undoable: the undo history is
    /// dropped.
    pub fn clear(&self) {
        self.shared.mapper.call_on_model_about_to_reset(self);

        let doomed = {
            let mut store = self.shared.store.borrow_mut();
            let root = store.root();
            let top: Vec<ItemId> = store
                .node(root)
                .map(|node| node.tags.all_items())
                .unwrap_or_default();
            let mut doomed = Vec::new();
            for id in top {
                if store.detach(id).is_ok() {
                    doomed.extend(collect_doomed(&store, id));
                }
            }
            doomed
        };
        tracing::debug!(target: targets::MODEL, destroyed = doomed.len(), "model cleared");
        self.destroy(doomed);

        if let Some(undo) = self.shared.undo.borrow_mut().as_mut() {
            undo.clear();
        }
        self.shared.mapper.call_on_model_reset(self);
    }

    /// Fires destroy events for detached items, then frees them.
    fn destroy(&self, doomed: Doomed) {
        for (id, mapper) in &doomed {
            mapper.call_on_item_destroy(&self.handle(*id));
        }
        let ids: Vec<ItemId> = doomed.iter().map(|(id, _)| *id).collect();
        self.shared.store.borrow_mut().free(&ids);
        for (_, mapper) in doomed {
            mapper.clear();
        }
    }

    // -------------------------------------------------------------------------
    // Value mutation
    // -------------------------------------------------------------------------

    pub(crate) fn set_property(&self, id: ItemId, name: &str, value: Variant) -> Result<bool> {
        let recording = self.is_recording();
        let (old, item_mapper, parent_mapper, path) = {
            let mut store = self.shared.store.borrow_mut();
            let node = store.node_mut(id)?;
            let slot = node
                .property_mut(name)
                .ok_or_else(|| MvvmError::not_found(format!("property '{name}'")))?;
            if !slot.is_same_type(&value) {
                return Err(MvvmError::PropertyType {
                    name: name.to_string(),
                    expected: slot.type_name(),
                    found: value.type_name(),
                });
            }
            if slot.same_value(&value) {
                return Ok(false);
            }
            let old = std::mem::replace(slot, value.clone());
            let item_mapper = node.mapper.clone();
            let parent = node.parent;
            let parent_mapper = match parent {
                Some(parent) => Some(store.mapper(parent)?),
                None => None,
            };
            let path = if recording { Some(store.path_of(id)?) } else { None };
            (old, item_mapper, parent_mapper, path)
        };

        tracing::trace!(target: targets::MODEL, property = name, "property changed");
        if let Some(path) = path {
            self.record(UndoCommand::SetProperty {
                path,
                name: name.to_string(),
                old,
                new: value,
            });
        }

        let item = self.handle(id);
        item_mapper.call_on_property_change(&item, name);
        if let Some(parent_mapper) = parent_mapper {
            parent_mapper.call_on_child_property_change(&item, name);
        }
        self.shared.mapper.call_on_property_change(&item, name);
        Ok(true)
    }

    pub(crate) fn set_data(&self, id: ItemId, role: ItemDataRole, value: Variant) -> Result<bool> {
        let recording = self.is_recording();
        let (old, mapper, path) = {
            let mut store = self.shared.store.borrow_mut();
            let node = store.node_mut(id)?;
            let old = node.roles.get(role);
            if !node.roles.set(role, value.clone())? {
                return Ok(false);
            }
            let mapper = node.mapper.clone();
            let path = if recording { Some(store.path_of(id)?) } else { None };
            (old, mapper, path)
        };

        if let Some(path) = path {
            self.record(UndoCommand::SetData {
                path,
                role,
                old,
                new: value,
            });
        }

        let item = self.handle(id);
        mapper.call_on_data_change(&item, role);
        self.shared.mapper.call_on_data_change(&item, role);
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Undo / redo
    // -------------------------------------------------------------------------

    /// Starts recording mutations, keeping at most `limit` commands. Any
    /// previous history is dropped.
    pub fn enable_undo(&self, limit: Option<usize>) {
        *self.shared.undo.borrow_mut() = Some(UndoStack::new(limit));
    }

    /// Stops recording and drops the history.
    pub fn disable_undo(&self) {
        *self.shared.undo.borrow_mut() = None;
    }

    /// Whether mutations are being recorded.
    pub fn is_undo_enabled(&self) -> bool {
        self.shared.undo.borrow().is_some()
    }

    /// Whether there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.shared
            .undo
            .borrow()
            .as_ref()
            .is_some_and(UndoStack::can_undo)
    }

    /// Whether there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.shared
            .undo
            .borrow()
            .as_ref()
            .is_some_and(UndoStack::can_redo)
    }

    /// Number of undoable commands.
    pub fn undo_count(&self) -> usize {
        self.shared
            .undo
            .borrow()
            .as_ref()
            .map_or(0, UndoStack::undo_count)
    }

    /// Reverts the most recent recorded mutation. Returns `Ok(false)` if
    /// there was nothing to undo.
    ///
    /// If replaying fails the history no longer matches the tree; it is
    /// dropped and the error returned.
    pub fn undo(&self) -> Result<bool> {
        let command = self
            .shared
            .undo
            .borrow_mut()
            .as_mut()
            .and_then(UndoStack::pop_undo);
        let Some(command) = command else {
            return Ok(false);
        };
        tracing::debug!(target: targets::UNDO, command = command.description(), "undo");

        let result = {
            let _guard = ReplayGuard::engage(&self.shared.replaying);
            command.undo(self)
        };
        let mut undo = self.shared.undo.borrow_mut();
        match result {
            Ok(()) => {
                if let Some(stack) = undo.as_mut() {
                    stack.push_redo(command);
                }
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(target: targets::UNDO, error = %err, "undo failed, history dropped");
                if let Some(stack) = undo.as_mut() {
                    stack.clear();
                }
                Err(err)
            }
        }
    }

    /// Re-applies the most recently undone mutation. Returns `Ok(false)` if
    /// there was nothing to redo.
    pub fn redo(&self) -> Result<bool> {
        let command = self
            .shared
            .undo
            .borrow_mut()
            .as_mut()
            .and_then(UndoStack::pop_redo);
        let Some(command) = command else {
            return Ok(false);
        };
        tracing::debug!(target: targets::UNDO, command = command.description(), "redo");

        let result = {
            let _guard = ReplayGuard::engage(&self.shared.replaying);
            command.redo(self)
        };
        let mut undo = self.shared.undo.borrow_mut();
        match result {
            Ok(()) => {
                if let Some(stack) = undo.as_mut() {
                    stack.push_undo(command);
                }
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(target: targets::UNDO, error = %err, "redo failed, history dropped");
                if let Some(stack) = undo.as_mut() {
                    stack.clear();
                }
                Err(err)
            }
        }
    }

    fn is_recording(&self) -> bool {
        !self.shared.replaying.get() && self.shared.undo.borrow().is_some()
    }

    fn record(&self, command: UndoCommand) {
        if let Some(stack) = self.shared.undo.borrow_mut().as_mut() {
            tracing::trace!(target: targets::UNDO, command = command.description(), "recorded");
            stack.push(command);
        }
    }
}

impl fmt::Debug for SessionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionModel")
            .field("model_type", &self.shared.model_type)
            .field("items", &self.item_count())
            .finish()
    }
}

fn collect_doomed(store: &ItemStore, id: ItemId) -> Doomed {
    store
        .subtree(id)
        .into_iter()
        .filter_map(|id| store.mapper(id).ok().map(|mapper| (id, mapper)))
        .collect()
}

struct MovePlan {
    old_parent: ItemId,
    old_position: TagRow,
    target: TagRow,
    same_container: bool,
}

impl MovePlan {
    fn is_noop(&self) -> bool {
        self.same_container && self.old_position.row == self.target.row
    }
}

fn plan_move(store: &ItemStore, item: ItemId, new_parent: ItemId, tag_row: &TagRow) -> Result<MovePlan> {
    if store.is_in_subtree(item, new_parent) {
        return Err(MvvmError::precondition(
            "an item cannot be moved into its own subtree",
        ));
    }
    let node = store.node(item)?;
    let old_parent = node
        .parent
        .ok_or_else(|| MvvmError::precondition("the root item cannot be moved"))?;
    let old_position = store
        .tag_row_of(item)
        .ok_or_else(|| MvvmError::not_found("item in its parent"))?;

    let target = store.node(new_parent)?.tags.get(&tag_row.tag)?;
    let same_container = old_parent == new_parent && target.name() == old_position.tag;
    if same_container {
        if tag_row.row >= target.len() {
            return Err(MvvmError::not_found(format!(
                "row {} in tag '{}' ({} item(s))",
                tag_row.row,
                target.name(),
                target.len()
            )));
        }
    } else {
        target.check_insert(&node.model_type, tag_row.row)?;
        store
            .node(old_parent)?
            .tags
            .get(&old_position.tag)?
            .check_remove(old_position.row)?;
    }
    Ok(MovePlan {
        old_parent,
        target: TagRow::new(target.name(), tag_row.row),
        old_position,
        same_container,
    })
}
