//! Signal/slot system for Horizon MVVM.
//!
//! This module provides a type-safe, single-threaded signal/slot mechanism.
//! Signals are emitted when state changes, and connected slots (callbacks)
//! are invoked synchronously, in connection order, before `emit` returns.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`SubscriberId`] - Owner token used to drop every slot of one subscriber
//!
//! # Dispatch Rules
//!
//! - There is no event queue and no locking. A slot runs inside `emit`.
//! - Slots may connect or disconnect slots of the same signal while it is
//!   being emitted. A slot disconnected mid-dispatch is not called afterwards;
//!   a slot connected mid-dispatch is first called on the next emission.
//! - A slot may re-emit the signal it is connected to. Such nested dispatch
//!   observes whatever state the outer slots left behind, so slots must not
//!   rely on observing intermediate states.
//!
//! # Example
//!
//! ```
//! use horizon_mvvm_core::{Signal, SubscriberId};
//!
//! let text_changed = Signal::<String>::new();
//! let owner = SubscriberId::next();
//!
//! text_changed.connect_owned(owner, |text| {
//!     println!("Text is now: {}", text);
//! });
//! text_changed.emit("Hello".to_string());
//!
//! // Drop everything this owner connected
//! assert_eq!(text_changed.disconnect_owner(owner), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// Keys are generation-checked, so a stale ID never removes a newer connection.
    pub struct ConnectionId;
}

/// Counter for generating subscriber tokens.
static SUBSCRIBER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Token identifying the owner of one or more connections.
///
/// Listeners and controllers allocate one token and pass it with every
/// connection they make, so they can later drop all of them at once with
/// [`Signal::disconnect_owner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Allocate a fresh, process-unique token.
    pub fn next() -> Self {
        Self(SUBSCRIBER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value of this token.
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0)
    }
}

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Rc<dyn Fn(&Args)>,
    owner: Option<SubscriberId>,
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is intentionally `!Send`: all mutation and dispatch happen on
/// one thread, in one call stack.
pub struct Signal<Args> {
    /// All active connections.
    connections: RefCell<SlotMap<ConnectionId, Connection<Args>>>,
    /// Connection order; slot map iteration order is not insertion order.
    order: RefCell<Vec<ConnectionId>>,
    /// Whether signal emission is temporarily blocked.
    blocked: Cell<bool>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: RefCell::new(SlotMap::with_key()),
            order: RefCell::new(Vec::new()),
            blocked: Cell::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_mvvm_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// assert!(signal.disconnect(id));
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + 'static,
    {
        self.insert(Connection {
            slot: Rc::new(slot),
            owner: None,
        })
    }

    /// Connect a slot on behalf of `owner`.
    pub fn connect_owned<F>(&self, owner: SubscriberId, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + 'static,
    {
        self.insert(Connection {
            slot: Rc::new(slot),
            owner: Some(owner),
        })
    }

    fn insert(&self, connection: Connection<Args>) -> ConnectionId {
        let id = self.connections.borrow_mut().insert(connection);
        self.order.borrow_mut().push(id);
        id
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.connections.borrow_mut().remove(id).is_some();
        if removed {
            self.order.borrow_mut().retain(|&other| other != id);
        }
        removed
    }

    /// Disconnect every slot connected on behalf of `owner`.
    ///
    /// Returns the number of removed connections. Calling this for an owner
    /// with no connections is a no-op.
    pub fn disconnect_owner(&self, owner: SubscriberId) -> usize {
        let mut connections = self.connections.borrow_mut();
        let before = connections.len();
        connections.retain(|_, conn| conn.owner != Some(owner));
        let removed = before - connections.len();
        if removed > 0 {
            self.order
                .borrow_mut()
                .retain(|id| connections.contains_key(*id));
        }
        removed
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.borrow_mut().clear();
        self.order.borrow_mut().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.borrow().len()
    }

    /// Get the number of slots connected on behalf of `owner`.
    pub fn owner_connection_count(&self, owner: SubscriberId) -> usize {
        self.connections
            .borrow()
            .values()
            .filter(|conn| conn.owner == Some(owner))
            .count()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.set(blocked);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.get()
    }

    /// Emit the signal, invoking all connected slots in connection order.
    #[tracing::instrument(
        skip_all,
        name = "horizon_mvvm::signal",
        target = "horizon_mvvm::signal",
        level = "trace"
    )]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let order = self.order.borrow().clone();
        tracing::trace!(target: targets::SIGNAL, connection_count = order.len(), "emitting signal");

        for id in order {
            // Look the slot up again: an earlier slot may have disconnected it.
            let slot = match self.connections.borrow().get(id) {
                Some(conn) => conn.slot.clone(),
                None => continue,
            };
            slot(&args);
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.borrow().len())
            .field("blocked", &self.blocked.get())
            .finish()
    }
}
