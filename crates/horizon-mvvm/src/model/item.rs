//! Handles onto live items.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use super::builder::ItemBuilder;
use super::container::ItemContainer;
use super::role::ItemDataRole;
use super::session_model::{ModelShared, SessionModel};
use super::store::{ItemId, ItemNode};
use super::tag_info::{ItemPath, TagInfo, TagRow};
use super::variant::{FromVariant, Variant};
use crate::error::{MvvmError, Result};
use crate::signals::ItemMapper;

/// A non-owning handle to one item of a [`SessionModel`].
///
/// Handles are cheap to clone and never keep the item (or the model) alive.
/// Once the item is removed, or the model is dropped, every method returns
/// [`MvvmError::NotFound`] and [`is_alive`](Self::is_alive) reports `false`.
///
/// # Example
///
/// ```
/// use horizon_mvvm::model::{ItemBuilder, SessionModel};
///
/// let model = SessionModel::new("PlotModel");
/// let item = model
///     .append_item(ItemBuilder::new("Axis").with_property("min", 0.0), &model.root_item(), "")
///     .unwrap();
///
/// item.set_property("min", 2.5).unwrap();
/// assert_eq!(item.property::<f64>("min").unwrap(), 2.5);
/// ```
#[derive(Clone)]
pub struct SessionItem {
    model: Weak<ModelShared>,
    id: ItemId,
}

impl SessionItem {
    pub(crate) fn new(model: Weak<ModelShared>, id: ItemId) -> Self {
        Self { model, id }
    }

    /// The arena key of this item.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The model this item belongs to.
    pub fn model(&self) -> Result<SessionModel> {
        self.shared().map(SessionModel::from_shared)
    }

    /// Returns `true` while the item exists.
    pub fn is_alive(&self) -> bool {
        self.model
            .upgrade()
            .is_some_and(|shared| {
                let store = shared.store.borrow();
                store.contains(self.id)
            })
    }

    pub(crate) fn belongs_to(&self, shared: &Rc<ModelShared>) -> bool {
        std::ptr::eq(self.model.as_ptr(), Rc::as_ptr(shared))
    }

    fn shared(&self) -> Result<Rc<ModelShared>> {
        self.model
            .upgrade()
            .ok_or_else(|| MvvmError::not_found("item (model dropped)"))
    }

    fn with_node<R>(&self, f: impl FnOnce(&ItemNode) -> R) -> Result<R> {
        let shared = self.shared()?;
        let store = shared.store.borrow();
        Ok(f(store.node(self.id)?))
    }

    fn handle(&self, id: ItemId) -> SessionItem {
        SessionItem::new(self.model.clone(), id)
    }

    /// The model-unique identifier. Never reused within a model.
    pub fn identifier(&self) -> Result<u64> {
        self.with_node(|node| node.identifier)
    }

    /// The model type, e.g. `"ViewportAxis"`.
    pub fn model_type(&self) -> Result<String> {
        self.with_node(|node| node.model_type.clone())
    }

    /// The mapper broadcasting this item's changes.
    pub fn mapper(&self) -> Result<Rc<ItemMapper>> {
        self.with_node(|node| node.mapper.clone())
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// Reads property `name` as `T`.
    pub fn property<T: FromVariant>(&self, name: &str) -> Result<T> {
        let value = self.property_value(name)?;
        T::from_variant(&value).ok_or_else(|| MvvmError::PropertyType {
            name: name.to_string(),
            expected: T::TYPE_NAME,
            found: value.type_name(),
        })
    }

    /// Reads property `name`.
    pub fn property_value(&self, name: &str) -> Result<Variant> {
        self.with_node(|node| node.property(name).cloned())?
            .ok_or_else(|| MvvmError::not_found(format!("property '{name}'")))
    }

    /// Sets property `name`. Returns `Ok(false)` without notifying anyone if
    /// the property already holds `value`.
    pub fn set_property(&self, name: &str, value: impl Into<Variant>) -> Result<bool> {
        self.model()?.set_property(self.id, name, value.into())
    }

    /// Returns `true` if the item declares property `name`.
    pub fn has_property(&self, name: &str) -> bool {
        self.with_node(|node| node.property(name).is_some())
            .unwrap_or(false)
    }

    /// Property names in declaration order.
    pub fn property_names(&self) -> Result<Vec<String>> {
        self.with_node(|node| node.properties.iter().map(|(n, _)| n.clone()).collect())
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> Result<Vec<(String, Variant)>> {
        self.with_node(|node| node.properties.clone())
    }

    // -------------------------------------------------------------------------
    // Data roles
    // -------------------------------------------------------------------------

    /// Reads the value stored under `role`.
    pub fn data(&self, role: ItemDataRole) -> Result<Variant> {
        self.with_node(|node| node.roles.get(role))
    }

    /// Stores `value` under `role`. Returns `Ok(false)` if nothing changed.
    pub fn set_data(&self, role: ItemDataRole, value: impl Into<Variant>) -> Result<bool> {
        self.model()?.set_data(self.id, role, value.into())
    }

    /// The display name.
    pub fn display_name(&self) -> Result<String> {
        self.with_node(|node| node.roles.display_name.clone())
    }

    /// Sets the display name.
    pub fn set_display_name(&self, name: impl Into<String>) -> Result<bool> {
        self.set_data(ItemDataRole::DisplayName, Variant::String(name.into()))
    }

    /// The tooltip.
    pub fn tooltip(&self) -> Result<String> {
        self.with_node(|node| node.roles.tooltip.clone())
    }

    /// Whether views may edit this item.
    pub fn is_editable(&self) -> Result<bool> {
        self.with_node(|node| node.roles.editable)
    }

    /// Whether this item is enabled.
    pub fn is_enabled(&self) -> Result<bool> {
        self.with_node(|node| node.roles.enabled)
    }

    // -------------------------------------------------------------------------
    // Tree navigation
    // -------------------------------------------------------------------------

    /// The parent, or `None` for the root.
    pub fn parent(&self) -> Result<Option<SessionItem>> {
        self.with_node(|node| node.parent.map(|id| self.handle(id)))
    }

    /// This item's position in its parent.
    pub fn tag_row(&self) -> Result<Option<TagRow>> {
        let shared = self.shared()?;
        let store = shared.store.borrow();
        store.node(self.id)?;
        Ok(store.tag_row_of(self.id))
    }

    /// Path from the model root to this item.
    pub fn path(&self) -> Result<ItemPath> {
        let shared = self.shared()?;
        let store = shared.store.borrow();
        store.path_of(self.id)
    }

    /// All children, in tag registration order.
    pub fn children(&self) -> Result<Vec<SessionItem>> {
        self.with_node(|node| {
            node.tags
                .all_items()
                .into_iter()
                .map(|id| self.handle(id))
                .collect()
        })
    }

    /// Children under `tag` (empty for the default tag).
    pub fn items(&self, tag: &str) -> Result<Vec<SessionItem>> {
        self.with_node(|node| {
            node.tags
                .get(tag)
                .map(|c| c.items.iter().map(|&id| self.handle(id)).collect())
        })?
    }

    /// The child at `row` under `tag`.
    pub fn item(&self, tag: &str, row: usize) -> Result<SessionItem> {
        self.with_node(|node| {
            let container = node.tags.get(tag)?;
            container
                .items
                .get(row)
                .map(|&id| self.handle(id))
                .ok_or_else(|| MvvmError::not_found(format!("row {row} in tag '{}'", container.name())))
        })?
    }

    /// Number of children under `tag`.
    pub fn item_count(&self, tag: &str) -> Result<usize> {
        self.with_node(|node| node.tags.get(tag).map(|c| c.len()))?
    }

    /// Tag descriptors in registration order.
    pub fn tag_infos(&self) -> Result<Vec<TagInfo>> {
        self.with_node(|node| {
            node.tags
                .containers()
                .iter()
                .map(|c| c.tag_info.clone())
                .collect()
        })
    }

    /// The default tag name.
    pub fn default_tag(&self) -> Result<Option<String>> {
        self.with_node(|node| node.tags.default_tag().map(str::to_string))
    }

    /// A handle onto the container of `tag`.
    pub fn container(&self, tag: &str) -> Result<ItemContainer> {
        let name = self.with_node(|node| node.tags.get(tag).map(|c| c.name().to_string()))??;
        Ok(ItemContainer::new(self.clone(), name))
    }

    /// Describes this item and its subtree as a detached builder.
    pub fn to_builder(&self) -> Result<ItemBuilder> {
        let shared = self.shared()?;
        let store = shared.store.borrow();
        store.snapshot(self.id)
    }

    // -------------------------------------------------------------------------
    // Structural conveniences
    // -------------------------------------------------------------------------

    /// Inserts a new child at `tag_row`. See [`SessionModel::insert_item`].
    pub fn insert_item(&self, builder: ItemBuilder, tag_row: TagRow) -> Result<SessionItem> {
        self.model()?.insert_item(builder, self, tag_row)
    }

    /// Appends a new child under `tag`. See [`SessionModel::append_item`].
    pub fn append_item(&self, builder: ItemBuilder, tag: &str) -> Result<SessionItem> {
        self.model()?.append_item(builder, self, tag)
    }

    /// Removes and destroys the child at `tag_row`.
    pub fn remove_item(&self, tag_row: TagRow) -> Result<()> {
        self.model()?.remove_item(self, tag_row)
    }

    /// Removes the child at `tag_row`, returning it as a builder.
    pub fn take_item(&self, tag_row: TagRow) -> Result<ItemBuilder> {
        self.model()?.take_item(self, tag_row)
    }
}

impl PartialEq for SessionItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.model, &other.model)
    }
}

impl Eq for SessionItem {}

impl Hash for SessionItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for SessionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SessionItem");
        s.field("id", &self.id);
        match self.model_type() {
            Ok(model_type) => s.field("model_type", &model_type),
            Err(_) => s.field("alive", &false),
        };
        s.finish()
    }
}
