//! Horizon MVVM - a model-view-viewmodel framework for scientific
//! applications.
//!
//! The crate is organized leaf-first:
//!
//! - [`model`]: the item tree ([`SessionModel`], [`SessionItem`]) with tagged
//!   child containers, typed properties and opt-in undo
//! - [`signals`]: per-item and model-wide change notification, and the
//!   [`ItemListener`] abstraction
//! - [`viewmodel`]: projections of the item tree for tree and table views
//! - [`plotting`]: controllers keeping plot widgets and axis items in sync
//! - [`serialization`]: JSON persistence of items, containers and models
//!
//! Everything is single-threaded: a mutation runs all of its callbacks
//! before it returns.
//!
//! # Example
//!
//! ```
//! use horizon_mvvm::model::{SessionModel, ViewportAxisItem};
//! use horizon_mvvm::plotting::{AxisPlotController, PlotAxis};
//! use horizon_mvvm::ItemListener;
//!
//! let model = SessionModel::new("PlotModel");
//! let axis_item = model
//!     .append_item(ViewportAxisItem::with_range(1.0, 2.0), &model.root_item(), "")
//!     .unwrap();
//!
//! let widget = PlotAxis::new();
//! let controller = AxisPlotController::new(widget.clone());
//! controller.set_item(Some(&axis_item)).unwrap();
//! assert_eq!(widget.range().lower, 1.0);
//!
//! widget.set_range(5.0, 6.0);
//! assert_eq!(axis_item.property::<f64>(ViewportAxisItem::MIN).unwrap(), 5.0);
//! ```

pub mod error;
pub mod logging;
pub mod model;
pub mod plotting;
pub mod serialization;
pub mod signals;
pub mod viewmodel;

pub use error::{MvvmError, Result};
pub use model::{ItemBuilder, SessionItem, SessionModel, TagInfo, TagRow, Variant};
pub use signals::{ItemListener, ItemListenerBase, ItemMapper, ModelMapper};

pub use horizon_mvvm_core::{Signal, SubscriberId};
