//! Lifetime-bound item subscribers.
//!
//! A listener tracks at most one item. It registers callbacks with that
//! item's [`ItemMapper`](super::ItemMapper) under its own owner token and
//! drops all of them when it switches items, when the item is destroyed, or
//! when the listener itself is dropped. The tracked reference is cleared by
//! the item's destroy event, so a listener never points at a dead item.
//!
//! # Example
//!
//! ```ignore
//! use horizon_mvvm::signals::{ItemListener, ItemListenerBase};
//!
//! struct TitlePrinter {
//!     base: ItemListenerBase,
//! }
//!
//! impl ItemListener for TitlePrinter {
//!     fn listener(&self) -> &ItemListenerBase {
//!         &self.base
//!     }
//!
//!     fn subscribe(&self) -> Result<()> {
//!         self.base.set_on_property_change(|item, name| {
//!             println!("{name} changed on {:?}", item.display_name());
//!         })
//!     }
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use horizon_mvvm_core::logging::targets;
use horizon_mvvm_core::SubscriberId;

use crate::error::{MvvmError, Result};
use crate::model::{ItemDataRole, SessionItem, TagRow};

type ReleaseAction = Box<dyn FnOnce()>;

/// A shared, clearable reference to the listener's current item.
///
/// Closures registered outside the item's mapper (for example on an external
/// widget) capture a `TrackedItem` to find out which item, if any, they
/// should act on.
#[derive(Clone, Default)]
pub struct TrackedItem(Rc<RefCell<Option<SessionItem>>>);

impl TrackedItem {
    /// The tracked item, if any.
    pub fn get(&self) -> Option<SessionItem> {
        self.0.borrow().clone()
    }

    fn set(&self, item: Option<SessionItem>) {
        *self.0.borrow_mut() = item;
    }

    fn take(&self) -> Option<SessionItem> {
        self.0.borrow_mut().take()
    }
}

impl fmt::Debug for TrackedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrackedItem").field(&self.0.borrow()).finish()
    }
}

/// Release actions that run exactly once.
#[derive(Clone, Default)]
struct ReleaseQueue(Rc<RefCell<Vec<ReleaseAction>>>);

impl ReleaseQueue {
    fn push(&self, action: ReleaseAction) {
        self.0.borrow_mut().push(action);
    }

    fn run(&self) {
        let actions = std::mem::take(&mut *self.0.borrow_mut());
        for action in actions {
            action();
        }
    }
}

/// State shared by every listener: owner token, tracked item and release
/// actions.
pub struct ItemListenerBase {
    owner: SubscriberId,
    tracked: TrackedItem,
    releases: ReleaseQueue,
    subscribed: Rc<Cell<bool>>,
}

impl Default for ItemListenerBase {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemListenerBase {
    /// Creates a listener base with a fresh owner token and no item.
    pub fn new() -> Self {
        Self {
            owner: SubscriberId::next(),
            tracked: TrackedItem::default(),
            releases: ReleaseQueue::default(),
            subscribed: Rc::new(Cell::new(false)),
        }
    }

    /// The owner token used for every mapper registration.
    pub fn owner(&self) -> SubscriberId {
        self.owner
    }

    /// The currently tracked item.
    pub fn current_item(&self) -> Option<SessionItem> {
        self.tracked.get()
    }

    /// A shared handle onto the tracked item reference.
    pub fn tracked(&self) -> TrackedItem {
        self.tracked.clone()
    }

    /// Whether `subscribe()` completed for the current item.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed.get()
    }

    /// Registers an action to run once when the current item is released:
    /// destroyed, replaced via `set_item`, or the listener dropped.
    pub fn on_release<F>(&self, action: F)
    where
        F: FnOnce() + 'static,
    {
        self.releases.push(Box::new(action));
    }

    fn current_mapper(&self) -> Result<Rc<super::ItemMapper>> {
        self.current_item()
            .ok_or_else(|| MvvmError::precondition("listener has no item"))?
            .mapper()
    }

    /// Property changes of the tracked item.
    pub fn set_on_property_change<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&SessionItem, &str) + 'static,
    {
        self.current_mapper()?.set_on_property_change(f, self.owner);
        Ok(())
    }

    /// Property changes of the tracked item's direct children.
    pub fn set_on_child_property_change<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&SessionItem, &str) + 'static,
    {
        self.current_mapper()?
            .set_on_child_property_change(f, self.owner);
        Ok(())
    }

    /// Presentation data changes of the tracked item.
    pub fn set_on_data_change<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&SessionItem, ItemDataRole) + 'static,
    {
        self.current_mapper()?.set_on_data_change(f, self.owner);
        Ok(())
    }

    /// Children inserted under the tracked item.
    pub fn set_on_item_inserted<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.current_mapper()?.set_on_item_inserted(f, self.owner);
        Ok(())
    }

    /// Children removed from the tracked item.
    pub fn set_on_item_removed<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.current_mapper()?.set_on_item_removed(f, self.owner);
        Ok(())
    }

    /// Children about to be removed from the tracked item.
    pub fn set_on_about_to_remove_item<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&SessionItem, &TagRow) + 'static,
    {
        self.current_mapper()?
            .set_on_about_to_remove_item(f, self.owner);
        Ok(())
    }

    /// Destruction of the tracked item. The listener has already dropped its
    /// reference when this runs.
    pub fn set_on_item_destroy<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&SessionItem) + 'static,
    {
        self.current_mapper()?.set_on_item_destroy(f, self.owner);
        Ok(())
    }

    /// Starts tracking `item`. Its destroy event clears the reference and
    /// runs the release actions.
    fn attach(&self, item: &SessionItem) -> Result<()> {
        let mapper = item.mapper()?;
        self.tracked.set(Some(item.clone()));

        let tracked = self.tracked.clone();
        let releases = self.releases.clone();
        let subscribed = self.subscribed.clone();
        mapper.set_on_item_destroy(
            move |_| {
                tracing::trace!(target: targets::MAPPER, "tracked item destroyed");
                tracked.take();
                subscribed.set(false);
                releases.run();
            },
            self.owner,
        );
        Ok(())
    }

    /// Stops tracking the current item: drops every mapper registration of
    /// this listener and runs the release actions.
    fn detach(&self) {
        if let Some(item) = self.tracked.take() {
            if let Ok(mapper) = item.mapper() {
                mapper.unsubscribe(self.owner);
            }
        }
        self.subscribed.set(false);
        self.releases.run();
    }
}

impl Drop for ItemListenerBase {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for ItemListenerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemListenerBase")
            .field("owner", &self.owner)
            .field("item", &self.tracked)
            .field("subscribed", &self.subscribed.get())
            .finish()
    }
}

/// A subscriber bound to at most one item at a time.
///
/// Implementors provide [`subscribe`](Self::subscribe), which registers their
/// callbacks on the freshly tracked item, and optionally
/// [`unsubscribe`](Self::unsubscribe), which undoes whatever `subscribe` set
/// up outside the item's mapper. Mapper registrations made through the
/// base's `set_on_*` methods are dropped automatically.
pub trait ItemListener {
    /// The shared listener state.
    fn listener(&self) -> &ItemListenerBase;

    /// Called after a new item has been bound.
    fn subscribe(&self) -> Result<()>;

    /// Called before the current item is unbound by [`set_item`](Self::set_item).
    fn unsubscribe(&self) {}

    /// The currently tracked item.
    fn current_item(&self) -> Option<SessionItem> {
        self.listener().current_item()
    }

    /// Rebinds the listener. Binding the item already tracked is a no-op;
    /// `None` unbinds.
    ///
    /// If `subscribe` fails, the listener is left unbound and the error is
    /// returned.
    fn set_item(&self, item: Option<&SessionItem>) -> Result<()> {
        let base = self.listener();
        if base.current_item().as_ref() == item {
            return Ok(());
        }

        if base.is_subscribed() {
            self.unsubscribe();
        }
        base.detach();

        let Some(item) = item else {
            return Ok(());
        };
        base.attach(item)?;
        if let Err(err) = self.subscribe() {
            base.detach();
            return Err(err);
        }
        base.subscribed.set(true);
        tracing::debug!(
            target: targets::MAPPER,
            owner = %base.owner(),
            item = ?item.id(),
            "listener bound"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemBuilder, SessionModel};

    struct Recorder {
        base: ItemListenerBase,
        events: Rc<RefCell<Vec<String>>>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                base: ItemListenerBase::new(),
                events: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl ItemListener for Recorder {
        fn listener(&self) -> &ItemListenerBase {
            &self.base
        }

        fn subscribe(&self) -> Result<()> {
            let events = self.events.clone();
            self.base.set_on_property_change(move |_, name| {
                events.borrow_mut().push(format!("property:{name}"));
            })?;
            let events = self.events.clone();
            self.base
                .on_release(move || events.borrow_mut().push("released".to_string()));
            self.events.borrow_mut().push("subscribe".to_string());
            Ok(())
        }

        fn unsubscribe(&self) {
            self.events.borrow_mut().push("unsubscribe".to_string());
        }
    }

    fn two_items() -> (SessionModel, SessionItem, SessionItem) {
        let model = SessionModel::new("TestModel");
        let root = model.root_item();
        let a = model
            .append_item(ItemBuilder::new("Item").with_property("x", 0.0), &root, "")
            .unwrap();
        let b = model
            .append_item(ItemBuilder::new("Item").with_property("x", 0.0), &root, "")
            .unwrap();
        (model, a, b)
    }

    #[test]
    fn test_set_item_subscribes_once() {
        let (_model, a, _b) = two_items();
        let recorder = Recorder::new();

        recorder.set_item(Some(&a)).unwrap();
        recorder.set_item(Some(&a)).unwrap();
        a.set_property("x", 1.0).unwrap();

        assert_eq!(
            *recorder.events.borrow(),
            vec!["subscribe".to_string(), "property:x".to_string()]
        );
    }

    #[test]
    fn test_rebind_drops_previous_item() {
        let (_model, a, b) = two_items();
        let recorder = Recorder::new();
        let owner = recorder.listener().owner();

        recorder.set_item(Some(&a)).unwrap();
        recorder.set_item(Some(&b)).unwrap();
        assert_eq!(a.mapper().unwrap().subscription_count(owner), 0);

        a.set_property("x", 1.0).unwrap();
        b.set_property("x", 2.0).unwrap();
        assert_eq!(
            *recorder.events.borrow(),
            vec![
                "subscribe".to_string(),
                "unsubscribe".to_string(),
                "released".to_string(),
                "subscribe".to_string(),
                "property:x".to_string(),
            ]
        );
    }

    #[test]
    fn test_destroy_clears_tracked_item() {
        let (model, a, _b) = two_items();
        let recorder = Recorder::new();
        recorder.set_item(Some(&a)).unwrap();

        model
            .remove_item(&model.root_item(), TagRow::new("rootTag", 0))
            .unwrap();

        assert!(recorder.current_item().is_none());
        assert!(!recorder.listener().is_subscribed());
        assert_eq!(
            recorder.events.borrow().last().map(String::as_str),
            Some("released")
        );

        // Unbinding after destruction does nothing.
        recorder.set_item(None).unwrap();
        assert_eq!(recorder.events.borrow().len(), 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (_model, a, _b) = two_items();
        let recorder = Recorder::new();
        let owner = recorder.listener().owner();
        recorder.set_item(Some(&a)).unwrap();
        assert!(a.mapper().unwrap().subscription_count(owner) > 0);

        drop(recorder);
        assert_eq!(a.mapper().unwrap().subscription_count(owner), 0);
    }

    #[test]
    fn test_base_without_item_rejects_registration() {
        let base = ItemListenerBase::new();
        let err = base.set_on_property_change(|_, _| {}).unwrap_err();
        assert!(matches!(err, MvvmError::Precondition(_)));
    }
}
