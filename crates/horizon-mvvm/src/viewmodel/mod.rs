//! View models: index-addressed projections of an item tree.
//!
//! Views never talk to a [`SessionModel`](crate::model::SessionModel)
//! directly. They read a [`ViewModel`] through the [`ItemModel`] trait and
//! follow its [`ModelSignals`]; the view model in turn follows the item
//! mappers and keeps itself consistent with the tree.

mod index;
mod strategies;
mod traits;
mod view_model;

pub use index::ModelIndex;
pub use strategies::{
    AllChildrenStrategy, ChildrenStrategy, LabelRowStrategy, PropertiesRowStrategy, RowStrategy,
    TopItemsStrategy, ViewColumn,
};
pub use traits::{ItemFlags, ItemModel, ModelSignals, Orientation, ViewRole};
pub use view_model::{ViewModel, WeakViewModel};
