//! Detached items.
//!
//! An [`ItemBuilder`] describes an item that is not part of any model yet:
//! its type, presentation data, properties, tags and child builders. A model
//! turns a builder into live items on insertion, and turns live items back
//! into builders when they are taken out of the tree, copied, or recorded for
//! undo.

use super::container::check_accepts;
use super::role::{ItemDataRole, ItemRoles};
use super::tag_info::TagInfo;
use super::variant::Variant;
use crate::error::{MvvmError, Result};

/// An owned, detached item description.
///
/// # Example
///
/// ```
/// use horizon_mvvm::model::{ItemBuilder, TagInfo};
///
/// let layer = ItemBuilder::new("Layer")
///     .with_property("thickness", 10.0)
///     .with_default_tag(TagInfo::universal("slices"))
///     .with_child("", ItemBuilder::new("Slice"));
///
/// assert!(layer.validate().is_ok());
/// assert_eq!(layer.children("slices").len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    pub(crate) model_type: String,
    pub(crate) roles: ItemRoles,
    pub(crate) properties: Vec<(String, Variant)>,
    pub(crate) tags: Vec<TagInfo>,
    pub(crate) default_tag: Option<String>,
    /// Children in insertion order, keyed by the tag name they were added
    /// under (empty for the default tag).
    pub(crate) children: Vec<(String, ItemBuilder)>,
}

impl ItemBuilder {
    /// Creates a builder for an item of `model_type`. The display name
    /// defaults to the model type.
    pub fn new(model_type: impl Into<String>) -> Self {
        let model_type = model_type.into();
        Self {
            roles: ItemRoles::new(model_type.clone()),
            model_type,
            properties: Vec::new(),
            tags: Vec::new(),
            default_tag: None,
            children: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.roles.display_name = name.into();
        self
    }

    /// Sets the tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.roles.tooltip = tooltip.into();
        self
    }

    /// Sets whether views may edit the item.
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.roles.editable = editable;
        self
    }

    /// Sets whether the item is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.roles.enabled = enabled;
        self
    }

    /// Declares a property. Declaring an existing name replaces its value and
    /// keeps its position.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Registers a tag.
    pub fn with_tag(mut self, tag_info: TagInfo) -> Self {
        self.tags.push(tag_info);
        self
    }

    /// Registers a tag and makes it the default tag.
    pub fn with_default_tag(mut self, tag_info: TagInfo) -> Self {
        self.default_tag = Some(tag_info.name().to_string());
        self.tags.push(tag_info);
        self
    }

    /// Adds a child under `tag` (empty for the default tag).
    ///
    /// Tag existence and arity are checked by [`validate`](Self::validate).
    pub fn with_child(mut self, tag: impl Into<String>, child: ItemBuilder) -> Self {
        self.children.push((tag.into(), child));
        self
    }

    /// Registers a single-item tag named `name` holding `item`.
    ///
    /// Compound items use this to expose sub-items (an axis of a viewport,
    /// the material of a layer) as if they were properties.
    pub fn with_property_item(self, name: impl Into<String>, item: ItemBuilder) -> Self {
        let name = name.into();
        let tag = TagInfo::property_tag(name.clone(), item.model_type.clone());
        self.with_tag(tag).with_child(name, item)
    }

    /// Declares or replaces a property in place.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Variant>) {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((name, value)),
        }
    }

    /// Sets a presentation value in place.
    pub fn set_data(&mut self, role: ItemDataRole, value: Variant) -> Result<()> {
        self.roles.set(role, value).map(|_| ())
    }

    /// Adds a child in place, checking the tag's type and maximum.
    pub fn push_child(&mut self, tag: &str, child: ItemBuilder) -> Result<()> {
        let name = self.resolve_tag(tag)?.to_string();
        let info = self.tag_info(&name)?;
        check_accepts(info, &child.model_type, self.children(&name).len() + 1)?;
        self.children.push((name, child));
        Ok(())
    }

    /// The model type.
    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    /// The display name.
    pub fn display_name(&self) -> &str {
        &self.roles.display_name
    }

    /// The value stored under `role`.
    pub fn data(&self, role: ItemDataRole) -> Variant {
        self.roles.get(role)
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[(String, Variant)] {
        &self.properties
    }

    /// The value of property `name`.
    pub fn property_value(&self, name: &str) -> Option<&Variant> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> &[TagInfo] {
        &self.tags
    }

    /// The default tag name.
    pub fn default_tag(&self) -> Option<&str> {
        self.default_tag.as_deref()
    }

    /// Children added under `tag` (empty for the default tag), in order.
    pub fn children(&self, tag: &str) -> Vec<&ItemBuilder> {
        let Ok(name) = self.resolve_tag(tag) else {
            return Vec::new();
        };
        self.children
            .iter()
            .filter(|(t, _)| self.resolve_tag(t).is_ok_and(|t| t == name))
            .map(|(_, child)| child)
            .collect()
    }

    /// Number of items this builder creates, itself included.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|(_, child)| child.subtree_size())
            .sum::<usize>()
    }

    /// Checks the whole subtree: unique tag names, every child under an
    /// existing tag of an allowed type, and no tag above its maximum.
    pub fn validate(&self) -> Result<()> {
        for (index, tag) in self.tags.iter().enumerate() {
            if self.tags[..index].iter().any(|t| t.name() == tag.name()) {
                return Err(MvvmError::precondition(format!(
                    "tag '{}' registered twice on '{}'",
                    tag.name(),
                    self.model_type
                )));
            }
        }
        if let Some(default) = &self.default_tag {
            self.tag_info(default)?;
        }
        for tag in &self.tags {
            let children = self.children(tag.name());
            for (count, child) in children.iter().enumerate() {
                check_accepts(tag, &child.model_type, count + 1)?;
            }
        }
        for (tag, child) in &self.children {
            let name = self.resolve_tag(tag)?;
            self.tag_info(name)?;
            child.validate()?;
        }
        Ok(())
    }

    fn resolve_tag<'a>(&'a self, tag: &'a str) -> Result<&'a str> {
        if !tag.is_empty() {
            return Ok(tag);
        }
        self.default_tag
            .as_deref()
            .ok_or_else(|| MvvmError::not_found(format!("default tag of '{}'", self.model_type)))
    }

    fn tag_info(&self, name: &str) -> Result<&TagInfo> {
        self.tags
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| MvvmError::not_found(format!("tag '{name}' of '{}'", self.model_type)))
    }

    /// Consumes the builder, grouping children by resolved tag name in tag
    /// registration order. Call only on a validated builder.
    pub(crate) fn into_grouped_children(
        mut self,
    ) -> (Self, Vec<(TagInfo, bool, Vec<ItemBuilder>)>) {
        let children = std::mem::take(&mut self.children);
        let mut groups: Vec<(TagInfo, bool, Vec<ItemBuilder>)> = self
            .tags
            .iter()
            .map(|t| (t.clone(), self.default_tag.as_deref() == Some(t.name()), Vec::new()))
            .collect();
        for (tag, child) in children {
            let name = match self.resolve_tag(&tag) {
                Ok(name) => name.to_string(),
                Err(_) => continue,
            };
            if let Some(group) = groups.iter_mut().find(|(info, _, _)| info.name() == name) {
                group.2.push(child);
            }
        }
        (self, groups)
    }
}

impl PartialEq for ItemBuilder {
    /// Children compare per resolved tag, so adding a child under `""` or
    /// under the default tag's name yields equal builders.
    fn eq(&self, other: &Self) -> bool {
        self.model_type == other.model_type
            && self.roles == other.roles
            && self.properties == other.properties
            && self.tags == other.tags
            && self.default_tag == other.default_tag
            && self.children.len() == other.children.len()
            && self
                .tags
                .iter()
                .all(|tag| self.children(tag.name()) == other.children(tag.name()))
    }
}
