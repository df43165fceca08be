//! Plotting controllers.
//!
//! A controller is an [`ItemListener`](crate::signals::ItemListener) that
//! keeps a piece of an external plot in step with an item. Plot widgets are
//! reached through the [`AxisWidget`] and [`PlotWidget`] traits, so any
//! plotting library can be adapted by implementing them.

mod axis;
mod axis_controller;
mod scene_adapter;

pub use axis::{AxisRange, AxisWidget, PlotAxis, PlotCanvas, PlotWidget, RangeCallback, ScaleType};
pub use axis_controller::{AxisAccessor, AxisPlotController, AxisPropertyMap};
pub use scene_adapter::{SceneAdapter, SceneRect, ViewportSceneAdapter};
