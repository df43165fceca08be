//! The item model.
//!
//! A [`SessionModel`] owns a tree of items. Each item has a model type,
//! typed properties, presentation data, and an ordered set of tags, each
//! holding an ordered list of child items constrained by a [`TagInfo`].
//!
//! # Key Types
//!
//! - [`SessionModel`] - owner of the tree and sole mutation entry point
//! - [`SessionItem`] - non-owning, generation-checked handle to one item
//! - [`ItemBuilder`] - detached item description, used for insertion
//! - [`TagInfo`], [`TagRow`], [`ItemPath`] - tag rules and addressing
//! - [`Variant`], [`ComboProperty`] - property values
//! - [`UndoStack`] - opt-in mutation history
//!
//! # Example
//!
//! ```
//! use horizon_mvvm::model::{SessionModel, ViewportAxisItem};
//!
//! let model = SessionModel::new("PlotModel");
//! let axis = model
//!     .append_item(ViewportAxisItem::with_range(1.0, 2.0), &model.root_item(), "")
//!     .unwrap();
//! axis.set_property(ViewportAxisItem::MAX, 4.0).unwrap();
//! assert_eq!(axis.property::<f64>(ViewportAxisItem::MAX).unwrap(), 4.0);
//! ```

mod builder;
mod container;
mod item;
mod role;
mod session_model;
mod standard_items;
mod store;
mod tag_info;
mod undo;
mod variant;

pub use builder::ItemBuilder;
pub use container::ItemContainer;
pub(crate) use container::check_accepts;
pub use item::SessionItem;
pub use role::ItemDataRole;
pub use session_model::{SessionModel, ROOT_MODEL_TYPE, ROOT_TAG};
pub use standard_items::{CompoundItem, ContainerItem, ViewportAxisItem, ViewportItem};
pub use store::ItemId;
pub use tag_info::{ItemPath, TagInfo, TagRow};
pub use undo::UndoStack;
pub use variant::{ComboProperty, FromVariant, Variant};
