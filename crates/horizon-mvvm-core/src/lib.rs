//! Core reactive primitives for Horizon MVVM.
//!
//! This crate provides the building blocks the item model is made of:
//!
//! - **Signal/Slot System**: single-threaded, in-order, owner-tokened callbacks
//! - **Property System**: value cells with change detection
//! - **Logging**: shared `tracing` targets
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_mvvm_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use property::Property;
pub use signal::{ConnectionId, Signal, SubscriberId};
