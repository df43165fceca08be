//! Per-item change notification.

use std::cell::Cell;
use std::fmt;

use horizon_mvvm_core::logging::targets;
use horizon_mvvm_core::{ConnectionId, Signal, SubscriberId};

use crate::model::{ItemDataRole, SessionItem, TagRow};

/// Broadcasts structural and property changes of one item.
///
/// Every item owns exactly one mapper. It holds an independent callback list
/// per event kind. Each registration carries the subscriber's owner token so
/// [`unsubscribe`](Self::unsubscribe) can drop all of one subscriber's
/// callbacks at once. Callbacks run synchronously, in registration order,
/// while the mutation that triggered them is still on the call stack.
///
/// Structural events are reported on the *parent* mapper: inserting a child
/// under item `P` fires `P`'s `item_inserted` with `P` and the child's
/// [`TagRow`].
pub struct ItemMapper {
    destroy: Signal<SessionItem>,
    data_change: Signal<(SessionItem, ItemDataRole)>,
    property_change: Signal<(SessionItem, String)>,
    child_property_change: Signal<(SessionItem, String)>,
    item_inserted: Signal<(SessionItem, TagRow)>,
    item_removed: Signal<(SessionItem, TagRow)>,
    about_to_remove_item: Signal<(SessionItem, TagRow)>,
    active: Cell<bool>,
}

impl Default for ItemMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemMapper {
    /// Creates an active mapper with no subscribers.
    pub fn new() -> Self {
        Self {
            destroy: Signal::new(),
            data_change: Signal::new(),
            property_change: Signal::new(),
            child_property_change: Signal::new(),
            item_inserted: Signal::new(),
            item_removed: Signal::new(),
            about_to_remove_item: Signal::new(),
            active: Cell::new(true),
        }
    }

    /// Called with the item when it is destroyed. The item is already
    /// detached from the tree but its data is still readable.
    pub fn set_on_item_destroy<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem) + 'static,
    {
        self.destroy.connect_owned(owner, move |item| f(item))
    }

    /// Called with the item and role when presentation data changes.
    pub fn set_on_data_change<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, ItemDataRole) + 'static,
    {
        self.data_change
            .connect_owned(owner, move |(item, role)| f(item, *role))
    }

    /// Called with the item and property name when a property changes.
    pub fn set_on_property_change<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &str) + 'static,
    {
        self.property_change
            .connect_owned(owner, move |(item, name)| f(item, name))
    }

    /// Called with the *child* and property name when a property of a direct
    /// child changes.
    pub fn set_on_child_property_change<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &str) + 'static,
    {
        self.child_property_change
            .connect_owned(owner, move |(item, name)| f(item, name))
    }

    /// Called with this item and the new child's position after insertion.
    pub fn set_on_item_inserted<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.item_inserted
            .connect_owned(owner, move |(item, tag_row)| f(item, tag_row))
    }

    /// Called with this item and the former child's position after removal.
    pub fn set_on_item_removed<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.item_removed
            .connect_owned(owner, move |(item, tag_row)| f(item, tag_row))
    }

    /// Called with this item and a child's position just before the child is
    /// removed. The child is still in place.
    pub fn set_on_about_to_remove_item<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.about_to_remove_item
            .connect_owned(owner, move |(item, tag_row)| f(item, tag_row))
    }

    /// Removes every callback registered by `owner`. Idempotent.
    pub fn unsubscribe(&self, owner: SubscriberId) -> usize {
        let removed = self.destroy.disconnect_owner(owner)
            + self.data_change.disconnect_owner(owner)
            + self.property_change.disconnect_owner(owner)
            + self.child_property_change.disconnect_owner(owner)
            + self.item_inserted.disconnect_owner(owner)
            + self.item_removed.disconnect_owner(owner)
            + self.about_to_remove_item.disconnect_owner(owner);
        if removed > 0 {
            tracing::trace!(target: targets::MAPPER, %owner, removed, "unsubscribed");
        }
        removed
    }

    /// Number of callbacks `owner` has registered across all channels.
    pub fn subscription_count(&self, owner: SubscriberId) -> usize {
        self.destroy.owner_connection_count(owner)
            + self.data_change.owner_connection_count(owner)
            + self.property_change.owner_connection_count(owner)
            + self.child_property_change.owner_connection_count(owner)
            + self.item_inserted.owner_connection_count(owner)
            + self.item_removed.owner_connection_count(owner)
            + self.about_to_remove_item.owner_connection_count(owner)
    }

    /// Mutes or unmutes every channel.
    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    /// Whether the mapper currently dispatches.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub(crate) fn call_on_item_destroy(&self, item: &SessionItem) {
        if self.is_active() {
            self.destroy.emit(item.clone());
        }
    }

    pub(crate) fn call_on_data_change(&self, item: &SessionItem, role: ItemDataRole) {
        if self.is_active() {
            self.data_change.emit((item.clone(), role));
        }
    }

    pub(crate) fn call_on_property_change(&self, item: &SessionItem, name: &str) {
        if self.is_active() {
            self.property_change.emit((item.clone(), name.to_string()));
        }
    }

    pub(crate) fn call_on_child_property_change(&self, child: &SessionItem, name: &str) {
        if self.is_active() {
            self.child_property_change
                .emit((child.clone(), name.to_string()));
        }
    }

    pub(crate) fn call_on_item_inserted(&self, parent: &SessionItem, tag_row: &TagRow) {
        if self.is_active() {
            self.item_inserted.emit((parent.clone(), tag_row.clone()));
        }
    }

    pub(crate) fn call_on_item_removed(&self, parent: &SessionItem, tag_row: &TagRow) {
        if self.is_active() {
            self.item_removed.emit((parent.clone(), tag_row.clone()));
        }
    }

    pub(crate) fn call_on_about_to_remove_item(&self, parent: &SessionItem, tag_row: &TagRow) {
        if self.is_active() {
            self.about_to_remove_item
                .emit((parent.clone(), tag_row.clone()));
        }
    }

    /// Drops every callback. Called once the item has been destroyed.
    pub(crate) fn clear(&self) {
        self.destroy.disconnect_all();
        self.data_change.disconnect_all();
        self.property_change.disconnect_all();
        self.child_property_change.disconnect_all();
        self.item_inserted.disconnect_all();
        self.item_removed.disconnect_all();
        self.about_to_remove_item.disconnect_all();
    }
}

impl fmt::Debug for ItemMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemMapper")
            .field("active", &self.active.get())
            .field("property_change", &self.property_change)
            .field("item_inserted", &self.item_inserted)
            .finish_non_exhaustive()
    }
}
