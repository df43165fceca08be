//! Model-wide change notification.

use horizon_mvvm_core::{ConnectionId, Signal, SubscriberId};

use crate::model::{ItemDataRole, SessionItem, SessionModel, TagRow};

/// Broadcasts every change of a model, whichever item it happened on.
///
/// Subscribers that care about the whole tree (undo-aware editors, document
/// dirty flags) use this instead of subscribing to each item's
/// [`ItemMapper`](super::ItemMapper). Events fire after the item-level ones.
#[derive(Debug, Default)]
pub struct ModelMapper {
    data_change: Signal<(SessionItem, ItemDataRole)>,
    property_change: Signal<(SessionItem, String)>,
    item_inserted: Signal<(SessionItem, TagRow)>,
    about_to_remove_item: Signal<(SessionItem, TagRow)>,
    item_removed: Signal<(SessionItem, TagRow)>,
    model_about_to_reset: Signal<SessionModel>,
    model_reset: Signal<SessionModel>,
}

impl ModelMapper {
    /// Creates a mapper with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Presentation data of some item changed.
    pub fn set_on_data_change<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, ItemDataRole) + 'static,
    {
        self.data_change
            .connect_owned(owner, move |(item, role)| f(item, *role))
    }

    /// A property of some item changed.
    pub fn set_on_property_change<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &str) + 'static,
    {
        self.property_change
            .connect_owned(owner, move |(item, name)| f(item, name))
    }

    /// An item was inserted under the given parent.
    pub fn set_on_item_inserted<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.item_inserted
            .connect_owned(owner, move |(parent, tag_row)| f(parent, tag_row))
    }

    /// An item is about to be removed from the given parent.
    pub fn set_on_about_to_remove_item<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.about_to_remove_item
            .connect_owned(owner, move |(parent, tag_row)| f(parent, tag_row))
    }

    /// An item was removed from the given parent.
    pub fn set_on_item_removed<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.item_removed
            .connect_owned(owner, move |(parent, tag_row)| f(parent, tag_row))
    }

    /// The model is about to drop all top-level items.
    pub fn set_on_model_about_to_reset<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionModel) + 'static,
    {
        self.model_about_to_reset.connect_owned(owner, f)
    }

    /// The model finished dropping all top-level items.
    pub fn set_on_model_reset<F>(&self, f: F, owner: SubscriberId) -> ConnectionId
    where
        F: Fn(&SessionModel) + 'static,
    {
        self.model_reset.connect_owned(owner, f)
    }

    /// Removes every callback registered by `owner`.
    pub fn unsubscribe(&self, owner: SubscriberId) -> usize {
        self.data_change.disconnect_owner(owner)
            + self.property_change.disconnect_owner(owner)
            + self.item_inserted.disconnect_owner(owner)
            + self.about_to_remove_item.disconnect_owner(owner)
            + self.item_removed.disconnect_owner(owner)
            + self.model_about_to_reset.disconnect_owner(owner)
            + self.model_reset.disconnect_owner(owner)
    }

    pub(crate) fn call_on_data_change(&self, item: &SessionItem, role: ItemDataRole) {
        self.data_change.emit((item.clone(), role));
    }

    pub(crate) fn call_on_property_change(&self, item: &SessionItem, name: &str) {
        self.property_change.emit((item.clone(), name.to_string()));
    }

    pub(crate) fn call_on_item_inserted(&self, parent: &SessionItem, tag_row: &TagRow) {
        self.item_inserted.emit((parent.clone(), tag_row.clone()));
    }

    pub(crate) fn call_on_about_to_remove_item(&self, parent: &SessionItem, tag_row: &TagRow) {
        self.about_to_remove_item
            .emit((parent.clone(), tag_row.clone()));
    }

    pub(crate) fn call_on_item_removed(&self, parent: &SessionItem, tag_row: &TagRow) {
        self.item_removed.emit((parent.clone(), tag_row.clone()));
    }

    pub(crate) fn call_on_model_about_to_reset(&self, model: &SessionModel) {
        self.model_about_to_reset.emit(model.clone());
    }

    pub(crate) fn call_on_model_reset(&self, model: &SessionModel) {
        self.model_reset.emit(model.clone());
    }
}
