//! Change notification: per-item and per-model mappers, and item listeners.
//!
//! Model mutations drain their callbacks synchronously before returning:
//!
//! ```text
//! set_property ──► item mapper ──► parent mapper (child property) ──► model mapper
//! insert/remove ─► parent mapper ─────────────────────────────────────► model mapper
//! ```
//!
//! Callbacks may mutate the model again. Nested dispatch sees whatever state
//! the enclosing callbacks left behind, so callbacks must not rely on
//! observing intermediate model states.

mod item_mapper;
mod listener;
mod model_mapper;

pub use item_mapper::ItemMapper;
pub use listener::{ItemListener, ItemListenerBase, TrackedItem};
pub use model_mapper::ModelMapper;
