//! Arena storage for the item tree of one model.
//!
//! Items live in a [`SlotMap`] keyed by [`ItemId`]. Keys are
//! generation-checked: once an item is freed its id never resolves again,
//! even if the slot is reused, so handles held by listeners and views can
//! detect that their item is gone.

use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use super::builder::ItemBuilder;
use super::container::SessionItemTags;
use super::role::ItemRoles;
use super::tag_info::{ItemPath, TagInfo, TagRow};
use super::variant::Variant;
use crate::error::{MvvmError, Result};
use crate::signals::ItemMapper;

new_key_type! {
    /// Arena key of an item within its model.
    pub struct ItemId;
}

/// One item in the arena.
#[derive(Debug)]
pub(crate) struct ItemNode {
    pub(crate) model_type: String,
    /// Model-scoped identity, assigned monotonically and never reused.
    pub(crate) identifier: u64,
    pub(crate) roles: ItemRoles,
    pub(crate) properties: Vec<(String, Variant)>,
    pub(crate) tags: SessionItemTags,
    pub(crate) parent: Option<ItemId>,
    pub(crate) mapper: Rc<ItemMapper>,
}

impl ItemNode {
    pub(crate) fn property(&self, name: &str) -> Option<&Variant> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub(crate) fn property_mut(&mut self, name: &str) -> Option<&mut Variant> {
        self.properties
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

pub(crate) struct ItemStore {
    nodes: SlotMap<ItemId, ItemNode>,
    root: ItemId,
    next_identifier: u64,
}

impl ItemStore {
    /// Creates a store whose root item has `root_tag` as its only tag.
    pub(crate) fn new(root_model_type: &str, root_tag: TagInfo) -> Self {
        let mut store = Self {
            nodes: SlotMap::with_key(),
            root: ItemId::default(),
            next_identifier: 1,
        };
        let root = ItemBuilder::new(root_model_type);
        store.root = store.insert_node(root, SessionItemTags::with_default_tag(root_tag), None);
        store
    }

    pub(crate) fn root(&self) -> ItemId {
        self.root
    }

    pub(crate) fn contains(&self, id: ItemId) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: ItemId) -> Result<&ItemNode> {
        self.nodes.get(id).ok_or_else(|| gone(id))
    }

    pub(crate) fn node_mut(&mut self, id: ItemId) -> Result<&mut ItemNode> {
        self.nodes.get_mut(id).ok_or_else(|| gone(id))
    }

    pub(crate) fn mapper(&self, id: ItemId) -> Result<Rc<ItemMapper>> {
        self.node(id).map(|node| node.mapper.clone())
    }

    /// Creates live nodes for a validated builder subtree. The new subtree
    /// is not linked into any parent container. On error no node of the
    /// subtree is left behind.
    pub(crate) fn allocate(&mut self, builder: ItemBuilder, parent: Option<ItemId>) -> Result<ItemId> {
        let mut created = Vec::new();
        let result = self.allocate_into(builder, parent, &mut created);
        if result.is_err() {
            self.free(&created);
        }
        result
    }

    fn allocate_into(
        &mut self,
        builder: ItemBuilder,
        parent: Option<ItemId>,
        created: &mut Vec<ItemId>,
    ) -> Result<ItemId> {
        let (builder, groups) = builder.into_grouped_children();
        let mut tags = SessionItemTags::default();
        for (info, is_default, _) in &groups {
            tags.register(info.clone(), *is_default)?;
        }

        let id = self.insert_node(builder, tags, parent);
        created.push(id);

        for (info, _, children) in groups {
            let child_ids = children
                .into_iter()
                .map(|child| self.allocate_into(child, Some(id), created))
                .collect::<Result<Vec<ItemId>>>()?;
            if let Some(container) = self
                .nodes
                .get_mut(id)
                .and_then(|node| node.tags.container_mut(info.name()))
            {
                container.items = child_ids;
            }
        }
        Ok(id)
    }

    fn insert_node(&mut self, builder: ItemBuilder, tags: SessionItemTags, parent: Option<ItemId>) -> ItemId {
        let identifier = self.next_identifier;
        self.next_identifier += 1;
        self.nodes.insert(ItemNode {
            model_type: builder.model_type,
            identifier,
            roles: builder.roles,
            properties: builder.properties,
            tags,
            parent,
            mapper: Rc::new(ItemMapper::new()),
        })
    }

    /// Resolves `tag_row` against `parent` and checks that an item of
    /// `model_type` may be inserted there. Returns the resolved position.
    pub(crate) fn check_insert(
        &self,
        parent: ItemId,
        tag_row: &TagRow,
        model_type: &str,
    ) -> Result<TagRow> {
        let container = self.node(parent)?.tags.get(&tag_row.tag)?;
        container.check_insert(model_type, tag_row.row)?;
        Ok(TagRow::new(container.name(), tag_row.row))
    }

    /// Links an allocated subtree into `parent` at a resolved position.
    pub(crate) fn attach(&mut self, parent: ItemId, tag_row: &TagRow, child: ItemId) -> Result<()> {
        let container = self.node_mut(parent)?.tags.get_mut(&tag_row.tag)?;
        container.items.insert(tag_row.row, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlinks `child` from its parent, returning the parent and the position
    /// the child had.
    pub(crate) fn detach(&mut self, child: ItemId) -> Result<(ItemId, TagRow)> {
        let parent = self
            .node(child)?
            .parent
            .ok_or_else(|| MvvmError::precondition("the root item cannot be detached"))?;
        let tag_row = self
            .tag_row_of(child)
            .ok_or_else(|| MvvmError::not_found("item in its parent"))?;
        let container = self.node_mut(parent)?.tags.get_mut(&tag_row.tag)?;
        container.items.remove(tag_row.row);
        self.node_mut(child)?.parent = None;
        Ok((parent, tag_row))
    }

    /// `id` followed by all its descendants, depth first.
    pub(crate) fn subtree(&self, id: ItemId) -> Vec<ItemId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            result.push(current);
            let children = node.tags.all_items();
            stack.extend(children.into_iter().rev());
        }
        result
    }

    /// Drops nodes from the arena.
    pub(crate) fn free(&mut self, ids: &[ItemId]) {
        for &id in ids {
            self.nodes.remove(id);
        }
    }

    /// Describes the live subtree at `id` as a detached builder.
    pub(crate) fn snapshot(&self, id: ItemId) -> Result<ItemBuilder> {
        let node = self.node(id)?;
        let mut builder = ItemBuilder::new(node.model_type.clone());
        builder.roles = node.roles.clone();
        builder.properties = node.properties.clone();
        builder.default_tag = node.tags.default_tag().map(str::to_string);
        for container in node.tags.containers() {
            builder.tags.push(container.tag_info.clone());
            for &child in &container.items {
                builder
                    .children
                    .push((container.name().to_string(), self.snapshot(child)?));
            }
        }
        Ok(builder)
    }

    pub(crate) fn tag_row_of(&self, id: ItemId) -> Option<TagRow> {
        let parent = self.nodes.get(id)?.parent?;
        self.nodes.get(parent)?.tags.tag_row_of(id)
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub(crate) fn is_in_subtree(&self, ancestor: ItemId, id: ItemId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(node_id).and_then(|node| node.parent);
        }
        false
    }

    pub(crate) fn path_of(&self, id: ItemId) -> Result<ItemPath> {
        let mut levels = Vec::new();
        let mut current = id;
        while current != self.root {
            let node = self.node(current)?;
            let parent = node
                .parent
                .ok_or_else(|| MvvmError::not_found("item in the model tree"))?;
            let tag_row = self
                .tag_row_of(current)
                .ok_or_else(|| MvvmError::not_found("item in its parent"))?;
            levels.push(tag_row);
            current = parent;
        }
        levels.reverse();
        Ok(ItemPath::from_levels(levels))
    }

    pub(crate) fn resolve_path(&self, path: &ItemPath) -> Result<ItemId> {
        let mut current = self.root;
        for level in path.levels() {
            let container = self.node(current)?.tags.get(&level.tag)?;
            current = *container
                .items
                .get(level.row)
                .ok_or_else(|| MvvmError::not_found(format!("path {path}")))?;
        }
        Ok(current)
    }

    pub(crate) fn find_identifier(&self, identifier: u64) -> Option<ItemId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.identifier == identifier)
            .map(|(id, _)| id)
    }
}

fn gone(id: ItemId) -> MvvmError {
    MvvmError::not_found(format!("item {id:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemBuilder {
        ItemBuilder::new("Sample")
            .with_default_tag(TagInfo::universal("layers"))
            .with_child(
                "",
                ItemBuilder::new("Layer")
                    .with_property("thickness", 1.0)
                    .with_default_tag(TagInfo::universal("slices"))
                    .with_child("", ItemBuilder::new("Slice")),
            )
            .with_child("", ItemBuilder::new("Layer").with_property("thickness", 2.0))
    }

    fn new_store() -> ItemStore {
        ItemStore::new("SessionItem", TagInfo::universal("rootTag"))
    }

    #[test]
    fn test_allocate_assigns_monotonic_identifiers() {
        let mut store = new_store();
        let sample = store.allocate(sample(), None).unwrap();
        let ids = store.subtree(sample);
        assert_eq!(ids.len(), 4);
        let identifiers: Vec<u64> = ids
            .iter()
            .map(|&id| store.node(id).unwrap().identifier)
            .collect();
        assert_eq!(identifiers, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_attach_detach_and_paths() {
        let mut store = new_store();
        let sample = store.allocate(sample(), None).unwrap();
        let position = store
            .check_insert(store.root(), &TagRow::default_tag(0), "Sample")
            .unwrap();
        assert_eq!(position, TagRow::new("rootTag", 0));
        store.attach(store.root(), &position, sample).unwrap();

        let slice = store.subtree(sample)[2];
        let path = store.path_of(slice).unwrap();
        assert_eq!(path.to_string(), "/rootTag[0]/layers[0]/slices[0]");
        assert_eq!(store.resolve_path(&path).unwrap(), slice);
        assert!(store.is_in_subtree(sample, slice));
        assert!(!store.is_in_subtree(slice, sample));

        let (parent, tag_row) = store.detach(sample).unwrap();
        assert_eq!(parent, store.root());
        assert_eq!(tag_row, TagRow::new("rootTag", 0));
        assert!(store.resolve_path(&path).is_err());
    }

    #[test]
    fn test_snapshot_reproduces_subtree() {
        let mut store = new_store();
        let original = sample();
        let id = store.allocate(original.clone(), None).unwrap();
        assert_eq!(store.snapshot(id).unwrap(), original);
    }

    #[test]
    fn test_free_invalidates_ids() {
        let mut store = new_store();
        let id = store.allocate(sample(), None).unwrap();
        let ids = store.subtree(id);
        store.free(&ids);
        assert!(!store.contains(id));
        assert!(store.node(id).unwrap_err().is_not_found());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_allocate_rejects_duplicate_tags() {
        let mut store = new_store();
        let mut layer = ItemBuilder::new("Layer").with_tag(TagInfo::universal("slices"));
        layer.tags.push(TagInfo::universal("slices"));
        let sample = ItemBuilder::new("Sample")
            .with_default_tag(TagInfo::universal("layers"))
            .with_child("", layer);

        let err = store.allocate(sample, None).unwrap_err();
        assert!(matches!(err, MvvmError::Precondition(_)));
        // The partially built sample was released.
        assert_eq!(store.len(), 1);
    }
}
