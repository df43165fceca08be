//! The interface views use to read and edit a view model.

use horizon_mvvm_core::Signal;

use super::index::ModelIndex;
use crate::error::Result;
use crate::model::Variant;

/// What a view asks for when it queries a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRole {
    /// Text or value to show.
    Display,
    /// Value to put into an editor.
    Edit,
    /// Hover text.
    ToolTip,
}

/// Flags indicating what operations are allowed on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemFlags {
    /// Cell can be selected.
    pub selectable: bool,
    /// Cell can be edited.
    pub editable: bool,
    /// Cell is enabled.
    pub enabled: bool,
}

impl ItemFlags {
    /// Selectable and enabled.
    pub fn new() -> Self {
        Self {
            selectable: true,
            enabled: true,
            ..Default::default()
        }
    }

    /// Sets the editable flag.
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Header orientation for [`ItemModel::header_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Column headers.
    Horizontal,
    /// Row headers.
    Vertical,
}

/// Hierarchical, index-addressed data as seen by a view.
///
/// The invalid [`ModelIndex`] is the root: `row_count(&ModelIndex::invalid())`
/// is the number of top-level rows.
pub trait ItemModel {
    /// Number of rows under `parent`.
    fn row_count(&self, parent: &ModelIndex) -> usize;

    /// Number of columns of the rows under `parent`.
    fn column_count(&self, parent: &ModelIndex) -> usize;

    /// The index of the cell at `row`, `column` under `parent`, or the
    /// invalid index when out of bounds.
    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex;

    /// The parent of `index`; invalid for top-level rows.
    fn parent(&self, index: &ModelIndex) -> ModelIndex;

    /// The cell's data for `role`, `None` when the cell has none.
    fn data(&self, index: &ModelIndex, role: ViewRole) -> Option<Variant>;

    /// Signals views connect to.
    fn signals(&self) -> &ModelSignals;

    /// Writes `value` into the cell. Returns `Ok(false)` when the cell is not
    /// editable for `role` or the value did not change.
    fn set_data(&self, _index: &ModelIndex, _value: Variant, _role: ViewRole) -> Result<bool> {
        Ok(false)
    }

    /// What the cell allows.
    fn flags(&self, _index: &ModelIndex) -> ItemFlags {
        ItemFlags::new()
    }

    /// Returns `true` if the row at `parent` has children.
    fn has_children(&self, parent: &ModelIndex) -> bool {
        self.row_count(parent) > 0
    }

    /// Header text for a column or row.
    fn header_data(&self, _section: usize, _orientation: Orientation) -> Option<String> {
        None
    }

    /// The cell at `row`, `column` next to `index`.
    fn sibling(&self, index: &ModelIndex, row: usize, column: usize) -> ModelIndex {
        if !index.is_valid() {
            return ModelIndex::invalid();
        }
        self.index(row, column, &index.parent())
    }
}

/// Signals emitted by a view model.
///
/// Row signals carry `(parent, first, last)`; `data_changed` carries
/// `(top_left, bottom_right, roles)`.
pub struct ModelSignals {
    /// Emitted just before rows are inserted.
    pub rows_about_to_be_inserted: Signal<(ModelIndex, usize, usize)>,
    /// Emitted after rows have been inserted.
    pub rows_inserted: Signal<(ModelIndex, usize, usize)>,
    /// Emitted just before rows are removed.
    pub rows_about_to_be_removed: Signal<(ModelIndex, usize, usize)>,
    /// Emitted after rows have been removed.
    pub rows_removed: Signal<(ModelIndex, usize, usize)>,
    /// Emitted when cells of existing rows change.
    pub data_changed: Signal<(ModelIndex, ModelIndex, Vec<ViewRole>)>,
    /// Emitted before the projection is rebuilt.
    pub model_about_to_reset: Signal<()>,
    /// Emitted after the projection has been rebuilt.
    pub model_reset: Signal<()>,
}

impl Default for ModelSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSignals {
    /// Creates a set of signals with no connections.
    pub fn new() -> Self {
        Self {
            rows_about_to_be_inserted: Signal::new(),
            rows_inserted: Signal::new(),
            rows_about_to_be_removed: Signal::new(),
            rows_removed: Signal::new(),
            data_changed: Signal::new(),
            model_about_to_reset: Signal::new(),
            model_reset: Signal::new(),
        }
    }

    /// Emits `data_changed` for a single cell.
    pub fn emit_data_changed_single(&self, index: ModelIndex, roles: Vec<ViewRole>) {
        self.data_changed.emit((index.clone(), index, roles));
    }

    /// Emits the reset pair around `reset_fn`.
    pub fn emit_reset<F>(&self, reset_fn: F)
    where
        F: FnOnce(),
    {
        self.model_about_to_reset.emit(());
        reset_fn();
        self.model_reset.emit(());
    }
}

impl std::fmt::Debug for ModelSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSignals")
            .field("rows_inserted", &self.rows_inserted)
            .field("rows_removed", &self.rows_removed)
            .field("data_changed", &self.data_changed)
            .field("model_reset", &self.model_reset)
            .finish_non_exhaustive()
    }
}
