//! Tagged child storage.
//!
//! Every item owns a [`SessionItemTags`]: an ordered list of containers, one
//! per registered tag, plus an optional default tag. The arity and type rules
//! of a [`TagInfo`] are checked here before any structural change.

use super::builder::ItemBuilder;
use super::item::SessionItem;
use super::store::ItemId;
use super::tag_info::{TagInfo, TagRow};
use crate::error::{MvvmError, Result};

/// The children stored under one tag.
#[derive(Debug, Clone)]
pub(crate) struct ContainerData {
    pub(crate) tag_info: TagInfo,
    pub(crate) items: Vec<ItemId>,
}

impl ContainerData {
    pub(crate) fn new(tag_info: TagInfo) -> Self {
        Self {
            tag_info,
            items: Vec::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.tag_info.name()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks that a child of `model_type` may be inserted at `row`.
    pub(crate) fn check_insert(&self, model_type: &str, row: usize) -> Result<()> {
        if row > self.items.len() {
            return Err(MvvmError::not_found(format!(
                "row {row} in tag '{}' ({} item(s))",
                self.name(),
                self.items.len()
            )));
        }
        check_accepts(&self.tag_info, model_type, self.items.len() + 1)
    }

    /// Checks that the child at `row` may be removed.
    pub(crate) fn check_remove(&self, row: usize) -> Result<()> {
        if row >= self.items.len() {
            return Err(MvvmError::not_found(format!(
                "row {row} in tag '{}' ({} item(s))",
                self.name(),
                self.items.len()
            )));
        }
        if self.items.len() <= self.tag_info.min() {
            return Err(MvvmError::Capacity {
                tag: self.name().to_string(),
                max: self.tag_info.max_or_unbounded(),
            });
        }
        Ok(())
    }
}

/// Checks type and maximum arity for a tag that would hold `new_count` items.
pub(crate) fn check_accepts(tag_info: &TagInfo, model_type: &str, new_count: usize) -> Result<()> {
    if !tag_info.is_valid_child(model_type) {
        return Err(MvvmError::TypeNotAllowed {
            model_type: model_type.to_string(),
            tag: tag_info.name().to_string(),
        });
    }
    if tag_info.exceeds_max(new_count) {
        return Err(MvvmError::Capacity {
            tag: tag_info.name().to_string(),
            max: tag_info.max_or_unbounded(),
        });
    }
    Ok(())
}

/// All containers of one item.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionItemTags {
    containers: Vec<ContainerData>,
    default_tag: Option<String>,
}

impl SessionItemTags {
    /// Tags holding a single container that is also the default.
    pub(crate) fn with_default_tag(tag_info: TagInfo) -> Self {
        Self {
            default_tag: Some(tag_info.name().to_string()),
            containers: vec![ContainerData::new(tag_info)],
        }
    }

    pub(crate) fn register(&mut self, tag_info: TagInfo, set_as_default: bool) -> Result<()> {
        if self.container(tag_info.name()).is_some() {
            return Err(MvvmError::precondition(format!(
                "tag '{}' is already registered",
                tag_info.name()
            )));
        }
        if set_as_default {
            self.default_tag = Some(tag_info.name().to_string());
        }
        self.containers.push(ContainerData::new(tag_info));
        Ok(())
    }

    pub(crate) fn default_tag(&self) -> Option<&str> {
        self.default_tag.as_deref()
    }

    /// Maps an empty tag name to the default tag.
    pub(crate) fn resolve<'a>(&'a self, tag: &'a str) -> Result<&'a str> {
        if !tag.is_empty() {
            return Ok(tag);
        }
        self.default_tag
            .as_deref()
            .ok_or_else(|| MvvmError::not_found("default tag"))
    }

    pub(crate) fn container(&self, name: &str) -> Option<&ContainerData> {
        self.containers.iter().find(|c| c.name() == name)
    }

    pub(crate) fn container_mut(&mut self, name: &str) -> Option<&mut ContainerData> {
        self.containers.iter_mut().find(|c| c.name() == name)
    }

    /// Resolves `tag` and returns its container or `NotFound`.
    pub(crate) fn get(&self, tag: &str) -> Result<&ContainerData> {
        let name = self.resolve(tag)?;
        self.container(name)
            .ok_or_else(|| MvvmError::not_found(format!("tag '{name}'")))
    }

    pub(crate) fn get_mut(&mut self, tag: &str) -> Result<&mut ContainerData> {
        let name = self.resolve(tag)?.to_string();
        self.container_mut(&name)
            .ok_or_else(|| MvvmError::not_found(format!("tag '{name}'")))
    }

    pub(crate) fn containers(&self) -> &[ContainerData] {
        &self.containers
    }

    /// Every child, in tag registration order.
    pub(crate) fn all_items(&self) -> Vec<ItemId> {
        self.containers
            .iter()
            .flat_map(|c| c.items.iter().copied())
            .collect()
    }

    pub(crate) fn tag_row_of(&self, child: ItemId) -> Option<TagRow> {
        self.containers.iter().find_map(|c| {
            c.items
                .iter()
                .position(|&id| id == child)
                .map(|row| TagRow::new(c.name(), row))
        })
    }
}

/// A handle onto the children stored under one tag of a live item.
///
/// Like [`SessionItem`], the handle does not keep anything alive; every
/// method fails with `NotFound` once the owning item is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemContainer {
    item: SessionItem,
    tag: String,
}

impl ItemContainer {
    pub(crate) fn new(item: SessionItem, tag: String) -> Self {
        Self { item, tag }
    }

    /// The item owning this container.
    pub fn item(&self) -> &SessionItem {
        &self.item
    }

    /// The tag name.
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// The tag descriptor.
    pub fn tag_info(&self) -> Result<TagInfo> {
        self.item
            .tag_infos()?
            .into_iter()
            .find(|info| info.name() == self.tag)
            .ok_or_else(|| MvvmError::not_found(format!("tag '{}'", self.tag)))
    }

    /// The children, in order.
    pub fn items(&self) -> Result<Vec<SessionItem>> {
        self.item.items(&self.tag)
    }

    /// Number of children.
    pub fn item_count(&self) -> Result<usize> {
        self.item.item_count(&self.tag)
    }

    /// Whether the container holds no children.
    pub fn is_empty(&self) -> Result<bool> {
        self.item_count().map(|count| count == 0)
    }

    /// The child at `row`.
    pub fn item_at(&self, row: usize) -> Result<SessionItem> {
        self.item.item(&self.tag, row)
    }

    /// Whether one more child of `model_type` would be accepted.
    pub fn can_insert_type(&self, model_type: &str) -> Result<bool> {
        let info = self.tag_info()?;
        Ok(check_accepts(&info, model_type, self.item_count()? + 1).is_ok())
    }

    /// Inserts a new child at `row`.
    pub fn insert_item(&self, builder: ItemBuilder, row: usize) -> Result<SessionItem> {
        self.item.insert_item(builder, TagRow::new(self.tag.clone(), row))
    }

    /// Appends a new child.
    pub fn append_item(&self, builder: ItemBuilder) -> Result<SessionItem> {
        self.item.append_item(builder, &self.tag)
    }

    /// Appends several children, all or nothing.
    pub fn append_items(&self, builders: Vec<ItemBuilder>) -> Result<Vec<SessionItem>> {
        let row = self.item_count()?;
        self.item
            .model()?
            .insert_items(builders, &self.item, TagRow::new(self.tag.clone(), row))
    }

    /// Removes and destroys the child at `row`.
    pub fn remove_item(&self, row: usize) -> Result<()> {
        self.item.remove_item(TagRow::new(self.tag.clone(), row))
    }
}
