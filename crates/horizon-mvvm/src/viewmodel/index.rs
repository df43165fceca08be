//! Addressing of view-model cells.
//!
//! A [`ModelIndex`] names one cell of a [`ViewModel`](super::ViewModel):
//! its row and column under a parent index, plus the key of the item the row
//! shows. The invalid index stands for the view-model root.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use slotmap::{Key, KeyData};

use crate::model::ItemId;

/// Position of one cell in a view model.
///
/// Indices are snapshots: after rows are inserted or removed, previously
/// obtained indices may point at other cells. Resolve them immediately, or
/// keep the [`SessionItem`](crate::model::SessionItem) instead.
#[derive(Clone)]
pub struct ModelIndex {
    row: usize,
    column: usize,
    /// `None` for top-level rows.
    parent: Option<Box<ModelIndex>>,
    internal_id: u64,
    valid: bool,
}

impl Default for ModelIndex {
    fn default() -> Self {
        Self::invalid()
    }
}

impl ModelIndex {
    /// The invalid index: the view root, or "no such cell".
    #[inline]
    pub const fn invalid() -> Self {
        Self {
            row: 0,
            column: 0,
            parent: None,
            internal_id: 0,
            valid: false,
        }
    }

    /// A valid index for the row showing `item`.
    pub fn new(row: usize, column: usize, parent: ModelIndex, item: ItemId) -> Self {
        Self {
            row,
            column,
            parent: parent.is_valid().then(|| Box::new(parent)),
            internal_id: item.data().as_ffi(),
            valid: true,
        }
    }

    /// Returns `true` unless this is the invalid index.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Row under the parent. 0 for invalid indices.
    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column. 0 for invalid indices.
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// The parent index, invalid for top-level rows.
    #[inline]
    pub fn parent(&self) -> ModelIndex {
        match &self.parent {
            Some(parent) => (**parent).clone(),
            None => ModelIndex::invalid(),
        }
    }

    /// Returns `true` if this index has a valid parent.
    #[inline]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Raw key of the item shown on this row.
    #[inline]
    pub fn internal_id(&self) -> u64 {
        self.internal_id
    }

    /// Key of the item shown on this row, `None` for invalid indices.
    pub fn item_id(&self) -> Option<ItemId> {
        self.valid
            .then(|| ItemId::from(KeyData::from_ffi(self.internal_id)))
    }

    /// Depth in the tree; top-level rows have depth 0.
    pub fn depth(&self) -> usize {
        self.ancestors().len()
    }

    /// Ancestors from the immediate parent up to the top-level row.
    pub fn ancestors(&self) -> Vec<ModelIndex> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while current.is_valid() {
            ancestors.push(current.clone());
            current = current.parent();
        }
        ancestors
    }

    /// Checks if this index lies below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &ModelIndex) -> bool {
        if !self.is_valid() || !ancestor.is_valid() {
            return false;
        }
        self.ancestors().iter().any(|index| index == ancestor)
    }
}

impl fmt::Debug for ModelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.debug_struct("ModelIndex")
                .field("row", &self.row)
                .field("column", &self.column)
                .field("depth", &self.depth())
                .field("item", &self.item_id())
                .finish()
        } else {
            write!(f, "ModelIndex(invalid)")
        }
    }
}

impl PartialEq for ModelIndex {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_valid(), other.is_valid()) {
            (false, false) => true,
            (true, true) => {
                self.row == other.row
                    && self.column == other.column
                    && self.internal_id == other.internal_id
                    && self.parent == other.parent
            }
            _ => false,
        }
    }
}

impl Eq for ModelIndex {}

impl Hash for ModelIndex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.valid.hash(state);
        if self.valid {
            self.row.hash(state);
            self.column.hash(state);
            // The item key already identifies the parent.
            self.internal_id.hash(state);
        }
    }
}

impl PartialOrd for ModelIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModelIndex {
    /// Invalid first, then shallower indices, then by row and column.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_valid(), other.is_valid()) {
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => self
                .depth()
                .cmp(&other.depth())
                .then(self.row.cmp(&other.row))
                .then(self.column.cmp(&other.column))
                .then(self.internal_id.cmp(&other.internal_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<ItemId> {
        let mut map: SlotMap<ItemId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_invalid_index() {
        let index = ModelIndex::invalid();
        assert!(!index.is_valid());
        assert_eq!(index.row(), 0);
        assert!(!index.has_parent());
        assert_eq!(index.item_id(), None);
    }

    #[test]
    fn test_item_key_round_trip() {
        let ids = keys(3);
        let index = ModelIndex::new(2, 1, ModelIndex::invalid(), ids[2]);
        assert_eq!(index.item_id(), Some(ids[2]));
        assert_eq!(index.column(), 1);
    }

    #[test]
    fn test_hierarchy() {
        let ids = keys(3);
        let level1 = ModelIndex::new(0, 0, ModelIndex::invalid(), ids[0]);
        let level2 = ModelIndex::new(1, 0, level1.clone(), ids[1]);
        let level3 = ModelIndex::new(2, 0, level2.clone(), ids[2]);

        assert_eq!(level3.depth(), 2);
        assert_eq!(level3.ancestors(), vec![level2.clone(), level1.clone()]);
        assert!(level3.is_descendant_of(&level1));
        assert!(!level1.is_descendant_of(&level3));
        assert_eq!(level2.parent(), level1);
    }

    #[test]
    fn test_ordering() {
        let ids = keys(2);
        let root = ModelIndex::invalid();
        let a = ModelIndex::new(0, 0, root.clone(), ids[0]);
        let b = ModelIndex::new(1, 0, root.clone(), ids[1]);
        let c = ModelIndex::new(0, 1, root.clone(), ids[0]);
        assert!(a < b);
        assert!(a < c);
        assert!(root < a);
    }
}
