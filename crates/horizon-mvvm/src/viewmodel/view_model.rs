//! Projection of an item tree for views.
//!
//! A [`ViewModel`] shows the subtree below one root item. Which children
//! become rows is decided by a [`ChildrenStrategy`]; which cells a row has,
//! by a [`RowStrategy`]. The projection subscribes to the mapper of every
//! projected item and patches itself as the model changes:
//!
//! - an inserted child becomes a new row, at the position the strategy
//!   gives it among the already projected siblings
//! - a removed child takes its row and all rows below it with it
//! - a property or data change marks the affected cells dirty and emits
//!   `data_changed`
//!
//! When the projected rows of a parent are no longer an ordered subset of
//! what the strategy reports, the change cannot be patched and the whole
//! projection is rebuilt between `model_about_to_reset` and `model_reset`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use horizon_mvvm_core::logging::{span_names, targets};
use horizon_mvvm_core::SubscriberId;

use super::index::ModelIndex;
use super::strategies::{
    AllChildrenStrategy, ChildrenStrategy, LabelRowStrategy, PropertiesRowStrategy, RowStrategy,
    TopItemsStrategy, ViewColumn,
};
use super::traits::{ItemFlags, ItemModel, ModelSignals, Orientation, ViewRole};
use crate::error::Result;
use crate::model::{ItemDataRole, ItemId, SessionItem, SessionModel, TagRow, Variant};

struct ProjectedRow {
    parent: Option<ItemId>,
    children: Vec<ItemId>,
    columns: Vec<ViewColumn>,
}

#[derive(Default)]
struct Projection {
    root: Option<ItemId>,
    rows: HashMap<ItemId, ProjectedRow>,
}

impl Projection {
    /// The projected item a parent index refers to; the root for the invalid
    /// index.
    fn node_for(&self, parent: &ModelIndex) -> Option<ItemId> {
        if !parent.is_valid() {
            return self.root;
        }
        if parent.column() != 0 {
            return None;
        }
        parent.item_id().filter(|id| self.rows.contains_key(id))
    }

    fn row_of(&self, id: ItemId) -> Option<usize> {
        let parent = self.rows.get(&id)?.parent?;
        self.rows
            .get(&parent)?
            .children
            .iter()
            .position(|&child| child == id)
    }

    fn index_of(&self, id: ItemId, column: usize) -> ModelIndex {
        if Some(id) == self.root {
            return ModelIndex::invalid();
        }
        let Some(row) = self.rows.get(&id) else {
            return ModelIndex::invalid();
        };
        let (Some(parent), Some(position)) = (row.parent, self.row_of(id)) else {
            return ModelIndex::invalid();
        };
        ModelIndex::new(position, column, self.index_of(parent, 0), id)
    }

    /// `id` and every projected row below it, preorder.
    fn subtree(&self, id: ItemId) -> Vec<ItemId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            if let Some(row) = self.rows.get(&current) {
                stack.extend(row.children.iter().rev().copied());
            }
        }
        result
    }
}

struct PendingRemoval {
    parent: ItemId,
    child: ItemId,
}

struct ViewModelShared {
    model: SessionModel,
    children_strategy: Box<dyn ChildrenStrategy>,
    row_strategy: Box<dyn RowStrategy>,
    projection: RefCell<Projection>,
    pending_removal: RefCell<Option<PendingRemoval>>,
    dirty: RefCell<Vec<(ItemId, usize)>>,
    resetting: Cell<bool>,
    signals: ModelSignals,
    owner: SubscriberId,
}

/// A tree/table projection of a [`SessionModel`], addressed by
/// [`ModelIndex`].
///
/// # Example
///
/// ```
/// use horizon_mvvm::model::{ContainerItem, SessionModel, ViewportAxisItem};
/// use horizon_mvvm::viewmodel::{ItemModel, ModelIndex, ViewModel, ViewRole};
///
/// let model = SessionModel::new("Model");
/// let container = model
///     .append_item(ContainerItem::builder(), &model.root_item(), "")
///     .unwrap();
///
/// let view_model = ViewModel::default_view_model(&model);
/// let container_index = view_model.index(0, 0, &ModelIndex::invalid());
/// assert_eq!(view_model.row_count(&container_index), 0);
///
/// container.append_item(ViewportAxisItem::builder(), "").unwrap();
/// assert_eq!(view_model.row_count(&container_index), 1);
///
/// let axis_index = view_model.index(0, 0, &container_index);
/// let name = view_model.data(&axis_index, ViewRole::Display).unwrap();
/// assert_eq!(name.as_str(), Some("Axis"));
/// ```
pub struct ViewModel {
    shared: Rc<ViewModelShared>,
}

impl ViewModel {
    /// Projects the whole of `model` with the given strategies.
    pub fn new<C, R>(model: &SessionModel, children_strategy: C, row_strategy: R) -> Self
    where
        C: ChildrenStrategy + 'static,
        R: RowStrategy + 'static,
    {
        let shared = Rc::new(ViewModelShared {
            model: model.clone(),
            children_strategy: Box::new(children_strategy),
            row_strategy: Box::new(row_strategy),
            projection: RefCell::new(Projection::default()),
            pending_removal: RefCell::new(None),
            dirty: RefCell::new(Vec::new()),
            resetting: Cell::new(false),
            signals: ModelSignals::new(),
            owner: SubscriberId::next(),
        });

        let weak = Rc::downgrade(&shared);
        model.mapper().set_on_model_about_to_reset(
            move |_| {
                if let Some(shared) = weak.upgrade() {
                    shared.resetting.set(true);
                    shared.signals.model_about_to_reset.emit(());
                }
            },
            shared.owner,
        );
        let weak = Rc::downgrade(&shared);
        model.mapper().set_on_model_reset(
            move |_| {
                if let Some(shared) = weak.upgrade() {
                    let root = shared.root_item();
                    shared.reset_projection(root);
                    shared.resetting.set(false);
                    shared.signals.model_reset.emit(());
                }
            },
            shared.owner,
        );

        shared.reset_projection(Some(model.root_item()));
        Self { shared }
    }

    /// Every item as a tree of display names.
    pub fn default_view_model(model: &SessionModel) -> Self {
        Self::new(model, AllChildrenStrategy, LabelRowStrategy)
    }

    /// A tree of display names without property items.
    pub fn top_items_view_model(model: &SessionModel) -> Self {
        Self::new(model, TopItemsStrategy, LabelRowStrategy)
    }

    /// Top items as rows, their properties as cells.
    pub fn property_table_view_model(model: &SessionModel) -> Self {
        Self::new(model, TopItemsStrategy, PropertiesRowStrategy::new())
    }

    /// The projected model.
    pub fn session_model(&self) -> &SessionModel {
        &self.shared.model
    }

    /// The item whose children are the top-level rows, `None` once it has
    /// been destroyed.
    pub fn root_item(&self) -> Option<SessionItem> {
        self.shared.root_item()
    }

    /// Projects the subtree below `item` instead.
    ///
    /// # Errors
    ///
    /// `Precondition` if `item` belongs to another model, `NotFound` if it
    /// no longer exists.
    pub fn set_root_item(&self, item: &SessionItem) -> Result<()> {
        self.shared.model.path_of(item)?;
        let item = item.clone();
        self.shared
            .signals
            .emit_reset(|| self.shared.reset_projection(Some(item)));
        Ok(())
    }

    /// Drops and rebuilds the whole projection.
    pub fn rebuild(&self) {
        self.shared.rebuild();
    }

    /// The item shown on the row of `index`; the root item for the invalid
    /// index.
    pub fn item_from_index(&self, index: &ModelIndex) -> Option<SessionItem> {
        let id = {
            let projection = self.shared.projection.borrow();
            match index.item_id() {
                Some(id) => projection.rows.contains_key(&id).then_some(id),
                None => projection.root,
            }
        }?;
        Some(self.shared.model.handle(id))
    }

    /// The index of the cell in `column` of the row showing `item`, or the
    /// invalid index if the item is not projected.
    pub fn index_of_item(&self, item: &SessionItem, column: usize) -> ModelIndex {
        let projection = self.shared.projection.borrow();
        match projection.rows.get(&item.id()) {
            Some(row) if column < row.columns.len() => projection.index_of(item.id(), column),
            _ => ModelIndex::invalid(),
        }
    }

    /// The cell kind shown at `index`.
    pub fn column_at(&self, index: &ModelIndex) -> Option<ViewColumn> {
        self.shared.cell(index).map(|(_, column)| column)
    }

    /// Whether the cell changed since the last [`take_dirty`](Self::take_dirty).
    pub fn is_dirty(&self, index: &ModelIndex) -> bool {
        index.item_id().is_some_and(|id| {
            self.shared
                .dirty
                .borrow()
                .contains(&(id, index.column()))
        })
    }

    /// Indices of every cell changed since the last call, in the order they
    /// first changed.
    pub fn take_dirty(&self) -> Vec<ModelIndex> {
        let dirty = std::mem::take(&mut *self.shared.dirty.borrow_mut());
        let projection = self.shared.projection.borrow();
        dirty
            .into_iter()
            .map(|(id, column)| projection.index_of(id, column))
            .filter(ModelIndex::is_valid)
            .collect()
    }
}

impl ViewModelShared {
    fn root_item(&self) -> Option<SessionItem> {
        let root = self.projection.borrow().root?;
        let item = self.model.handle(root);
        item.is_alive().then_some(item)
    }

    fn cell(&self, index: &ModelIndex) -> Option<(SessionItem, ViewColumn)> {
        let id = index.item_id()?;
        let column = {
            let projection = self.projection.borrow();
            projection.rows.get(&id)?.columns.get(index.column())?.clone()
        };
        Some((self.model.handle(id), column))
    }

    fn rebuild(self: &Rc<Self>) {
        let root = self.root_item();
        self.signals.emit_reset(|| self.reset_projection(root));
    }

    /// Replaces the projection with a fresh one below `root`. Emits nothing.
    fn reset_projection(self: &Rc<Self>, root: Option<SessionItem>) {
        let _span = tracing::debug_span!(target: targets::VIEWMODEL, span_names::VIEWMODEL_REBUILD).entered();

        let old: Vec<ItemId> = self.projection.borrow().rows.keys().copied().collect();
        for id in old {
            self.disconnect(id);
        }
        self.dirty.borrow_mut().clear();
        self.pending_removal.borrow_mut().take();

        let mut rows = HashMap::new();
        let root_id = match root.filter(SessionItem::is_alive) {
            Some(root) => match self.project_root(&root, &mut rows) {
                Ok(()) => Some(root.id()),
                Err(err) => {
                    tracing::warn!(target: targets::VIEWMODEL, error = %err, "projection failed");
                    for id in rows.keys() {
                        self.disconnect(*id);
                    }
                    rows.clear();
                    None
                }
            },
            None => None,
        };
        tracing::debug!(target: targets::VIEWMODEL, rows = rows.len(), "projection rebuilt");
        *self.projection.borrow_mut() = Projection { root: root_id, rows };
    }

    fn project_root(self: &Rc<Self>, root: &SessionItem, rows: &mut HashMap<ItemId, ProjectedRow>) -> Result<()> {
        self.project(root, None, rows)?;
        let weak = Rc::downgrade(self);
        root.mapper()?.set_on_item_destroy(
            move |_| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_root_destroyed();
                }
            },
            self.owner,
        );
        Ok(())
    }

    /// Adds `item` and the rows below it to `rows`, subscribing to each.
    fn project(
        self: &Rc<Self>,
        item: &SessionItem,
        parent: Option<ItemId>,
        rows: &mut HashMap<ItemId, ProjectedRow>,
    ) -> Result<()> {
        let columns = match parent {
            Some(_) => self.row_strategy.columns(item)?,
            None => Vec::new(),
        };
        let children = self.children_strategy.children(item)?;
        self.connect(item)?;
        rows.insert(
            item.id(),
            ProjectedRow {
                parent,
                children: children.iter().map(SessionItem::id).collect(),
                columns,
            },
        );
        for child in &children {
            self.project(child, Some(item.id()), rows)?;
        }
        Ok(())
    }

    fn connect(self: &Rc<Self>, item: &SessionItem) -> Result<()> {
        let mapper = item.mapper()?;

        let weak = Rc::downgrade(self);
        mapper.set_on_item_inserted(
            move |parent, tag_row| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_item_inserted(parent, tag_row);
                }
            },
            self.owner,
        );
        let weak = Rc::downgrade(self);
        mapper.set_on_about_to_remove_item(
            move |parent, tag_row| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_about_to_remove_item(parent, tag_row);
                }
            },
            self.owner,
        );
        let weak = Rc::downgrade(self);
        mapper.set_on_item_removed(
            move |parent, _| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_item_removed(parent);
                }
            },
            self.owner,
        );
        let weak = Rc::downgrade(self);
        mapper.set_on_property_change(
            move |item, name| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_property_change(item, name);
                }
            },
            self.owner,
        );
        let weak = Rc::downgrade(self);
        mapper.set_on_data_change(
            move |item, role| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_data_change(item, role);
                }
            },
            self.owner,
        );
        Ok(())
    }

    fn disconnect(&self, id: ItemId) {
        if let Ok(mapper) = self.model.handle(id).mapper() {
            mapper.unsubscribe(self.owner);
        }
    }

    fn on_root_destroyed(self: &Rc<Self>) {
        tracing::debug!(target: targets::VIEWMODEL, "root item destroyed");
        if self.resetting.get() {
            self.reset_projection(None);
        } else {
            self.signals.emit_reset(|| self.reset_projection(None));
        }
    }

    fn on_item_inserted(self: &Rc<Self>, parent: &SessionItem, tag_row: &TagRow) {
        let Ok(child) = parent.item(&tag_row.tag, tag_row.row) else {
            return;
        };
        let desired: Vec<ItemId> = match self.children_strategy.children(parent) {
            Ok(children) => children.iter().map(SessionItem::id).collect(),
            Err(err) => {
                tracing::warn!(target: targets::VIEWMODEL, error = %err, "children unavailable");
                return;
            }
        };
        let Some(position) = desired.iter().position(|&id| id == child.id()) else {
            // Hidden by the strategy.
            return;
        };
        let (current, parent_index) = {
            let projection = self.projection.borrow();
            let Some(row) = projection.rows.get(&parent.id()) else {
                return;
            };
            (row.children.clone(), projection.index_of(parent.id(), 0))
        };
        if current.contains(&child.id()) {
            return;
        }
        if !is_ordered_subset(&current, &desired) {
            tracing::debug!(target: targets::VIEWMODEL, "insertion not patchable");
            self.rebuild();
            return;
        }

        let row = current
            .iter()
            .filter(|id| desired[..position].contains(id))
            .count();
        let mut rows = HashMap::new();
        if let Err(err) = self.project(&child, Some(parent.id()), &mut rows) {
            tracing::warn!(target: targets::VIEWMODEL, error = %err, "projection failed");
            for id in rows.keys() {
                self.disconnect(*id);
            }
            self.rebuild();
            return;
        }

        self.signals
            .rows_about_to_be_inserted
            .emit((parent_index.clone(), row, row));
        {
            let mut projection = self.projection.borrow_mut();
            if let Some(node) = projection.rows.get_mut(&parent.id()) {
                node.children.insert(row, child.id());
            }
            projection.rows.extend(rows);
        }
        tracing::trace!(target: targets::VIEWMODEL, row, "row inserted");
        self.signals.rows_inserted.emit((parent_index, row, row));
    }

    fn on_about_to_remove_item(&self, parent: &SessionItem, tag_row: &TagRow) {
        let Ok(child) = parent.item(&tag_row.tag, tag_row.row) else {
            return;
        };
        let (row, parent_index) = {
            let projection = self.projection.borrow();
            let Some(node) = projection.rows.get(&parent.id()) else {
                return;
            };
            let Some(row) = node.children.iter().position(|&id| id == child.id()) else {
                return;
            };
            (row, projection.index_of(parent.id(), 0))
        };
        self.signals
            .rows_about_to_be_removed
            .emit((parent_index, row, row));
        *self.pending_removal.borrow_mut() = Some(PendingRemoval {
            parent: parent.id(),
            child: child.id(),
        });
    }

    fn on_item_removed(&self, parent: &SessionItem) {
        let pending = self.pending_removal.borrow_mut().take();
        let Some(pending) = pending.filter(|pending| pending.parent == parent.id()) else {
            return;
        };
        let (row, parent_index, doomed) = {
            let projection = self.projection.borrow();
            let Some(row) = projection.row_of(pending.child) else {
                return;
            };
            (
                row,
                projection.index_of(parent.id(), 0),
                projection.subtree(pending.child),
            )
        };
        for id in &doomed {
            self.disconnect(*id);
        }
        {
            let mut projection = self.projection.borrow_mut();
            if let Some(node) = projection.rows.get_mut(&parent.id()) {
                node.children.remove(row);
            }
            for id in &doomed {
                projection.rows.remove(id);
            }
        }
        self.dirty
            .borrow_mut()
            .retain(|(id, _)| !doomed.contains(id));
        tracing::trace!(target: targets::VIEWMODEL, row, "row removed");
        self.signals.rows_removed.emit((parent_index, row, row));
    }

    fn on_property_change(&self, item: &SessionItem, name: &str) {
        let columns: Vec<usize> = {
            let projection = self.projection.borrow();
            let Some(row) = projection.rows.get(&item.id()) else {
                return;
            };
            row.columns
                .iter()
                .enumerate()
                .filter(|(_, column)| matches!(column, ViewColumn::Property(n) if n == name))
                .map(|(i, _)| i)
                .collect()
        };
        for column in columns {
            self.cell_changed(item.id(), column, vec![ViewRole::Display, ViewRole::Edit]);
        }
    }

    fn on_data_change(&self, item: &SessionItem, role: ItemDataRole) {
        let columns: Vec<(usize, bool)> = {
            let projection = self.projection.borrow();
            let Some(row) = projection.rows.get(&item.id()) else {
                return;
            };
            row.columns
                .iter()
                .enumerate()
                .map(|(i, column)| (i, *column == ViewColumn::Label))
                .collect()
        };
        for (column, is_label) in columns {
            match role {
                ItemDataRole::DisplayName if is_label => {
                    self.cell_changed(item.id(), column, vec![ViewRole::Display, ViewRole::Edit]);
                }
                ItemDataRole::ToolTip if is_label => {
                    self.cell_changed(item.id(), column, vec![ViewRole::ToolTip]);
                }
                // Flags of every cell follow these.
                ItemDataRole::Editable | ItemDataRole::Enabled => {
                    self.cell_changed(item.id(), column, Vec::new());
                }
                _ => {}
            }
        }
    }

    fn cell_changed(&self, id: ItemId, column: usize, roles: Vec<ViewRole>) {
        {
            let mut dirty = self.dirty.borrow_mut();
            if !dirty.contains(&(id, column)) {
                dirty.push((id, column));
            }
        }
        let index = self.projection.borrow().index_of(id, column);
        self.signals.emit_data_changed_single(index, roles);
    }
}

impl Drop for ViewModelShared {
    fn drop(&mut self) {
        let ids: Vec<ItemId> = self.projection.get_mut().rows.keys().copied().collect();
        for id in ids {
            self.disconnect(id);
        }
        self.model.mapper().unsubscribe(self.owner);
    }
}

/// Whether `subset` appears in `sequence` in the same relative order.
fn is_ordered_subset(subset: &[ItemId], sequence: &[ItemId]) -> bool {
    let mut remaining = sequence.iter();
    subset.iter().all(|id| remaining.any(|other| other == id))
}

impl ItemModel for ViewModel {
    fn row_count(&self, parent: &ModelIndex) -> usize {
        let projection = self.shared.projection.borrow();
        projection
            .node_for(parent)
            .and_then(|id| projection.rows.get(&id))
            .map_or(0, |row| row.children.len())
    }

    fn column_count(&self, parent: &ModelIndex) -> usize {
        let projection = self.shared.projection.borrow();
        let widest = projection
            .node_for(parent)
            .and_then(|id| projection.rows.get(&id))
            .and_then(|row| {
                row.children
                    .iter()
                    .filter_map(|child| projection.rows.get(child))
                    .map(|child| child.columns.len())
                    .max()
            });
        widest.unwrap_or_else(|| self.shared.row_strategy.horizontal_headers().len())
    }

    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        let projection = self.shared.projection.borrow();
        let Some(parent_id) = projection.node_for(parent) else {
            return ModelIndex::invalid();
        };
        let child = projection
            .rows
            .get(&parent_id)
            .and_then(|node| node.children.get(row).copied());
        match child {
            Some(child)
                if projection
                    .rows
                    .get(&child)
                    .is_some_and(|node| column < node.columns.len()) =>
            {
                ModelIndex::new(row, column, parent.clone(), child)
            }
            _ => ModelIndex::invalid(),
        }
    }

    fn parent(&self, index: &ModelIndex) -> ModelIndex {
        let projection = self.shared.projection.borrow();
        index
            .item_id()
            .and_then(|id| projection.rows.get(&id))
            .and_then(|row| row.parent)
            .map_or_else(ModelIndex::invalid, |parent| projection.index_of(parent, 0))
    }

    fn data(&self, index: &ModelIndex, role: ViewRole) -> Option<Variant> {
        let (item, column) = self.shared.cell(index)?;
        match (column, role) {
            (ViewColumn::Label, ViewRole::Display | ViewRole::Edit) => {
                item.display_name().ok().map(Variant::String)
            }
            (ViewColumn::Label, ViewRole::ToolTip) => item
                .tooltip()
                .ok()
                .filter(|tooltip| !tooltip.is_empty())
                .map(Variant::String),
            (ViewColumn::Property(name), ViewRole::Display | ViewRole::Edit) => {
                item.property_value(&name).ok()
            }
            (ViewColumn::Property(_), ViewRole::ToolTip) => None,
        }
    }

    fn signals(&self) -> &ModelSignals {
        &self.shared.signals
    }

    fn set_data(&self, index: &ModelIndex, value: Variant, role: ViewRole) -> Result<bool> {
        let Some((item, column)) = self.shared.cell(index) else {
            return Ok(false);
        };
        if role == ViewRole::ToolTip || !self.flags(index).editable {
            return Ok(false);
        }
        match column {
            ViewColumn::Label => item.set_data(ItemDataRole::DisplayName, value),
            ViewColumn::Property(name) => item.set_property(&name, value),
        }
    }

    fn flags(&self, index: &ModelIndex) -> ItemFlags {
        let Some((item, column)) = self.shared.cell(index) else {
            return ItemFlags::default();
        };
        let editable = item.is_editable().unwrap_or(false)
            && match &column {
                ViewColumn::Label => true,
                ViewColumn::Property(name) => item.has_property(name),
            };
        ItemFlags::new()
            .with_editable(editable)
            .with_enabled(item.is_enabled().unwrap_or(false))
    }

    fn header_data(&self, section: usize, orientation: Orientation) -> Option<String> {
        match orientation {
            Orientation::Horizontal => self
                .shared
                .row_strategy
                .horizontal_headers()
                .into_iter()
                .nth(section),
            Orientation::Vertical => None,
        }
    }
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let projection = self.shared.projection.borrow();
        f.debug_struct("ViewModel")
            .field("model", &self.shared.model)
            .field("rows", &projection.rows.len().saturating_sub(1))
            .field("dirty", &self.shared.dirty.borrow().len())
            .finish()
    }
}

/// Downgraded handle used by views that must not keep a view model alive.
#[derive(Clone)]
pub struct WeakViewModel(Weak<ViewModelShared>);

impl WeakViewModel {
    /// Whether the view model still exists.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl ViewModel {
    /// A handle that does not keep this view model alive.
    pub fn downgrade(&self) -> WeakViewModel {
        WeakViewModel(Rc::downgrade(&self.shared))
    }
}
