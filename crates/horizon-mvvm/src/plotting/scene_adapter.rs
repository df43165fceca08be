//! Conversion between axis coordinates and scene (pixel) coordinates.
//!
//! Overlays drawn on top of a plot (region markers, draggable handles) live
//! in scene coordinates but store their positions in axis coordinates. A
//! [`SceneAdapter`] converts between the two for the plot's current ranges.

use std::cell::Cell;

use super::axis::{AxisRange, AxisWidget, PlotWidget, ScaleType};

/// Converts between axis and scene coordinates.
pub trait SceneAdapter {
    /// Axis x to scene x.
    fn to_scene_x(&self, x: f64) -> f64;

    /// Axis y to scene y.
    fn to_scene_y(&self, y: f64) -> f64;

    /// Scene x to axis x.
    fn from_scene_x(&self, x: f64) -> f64;

    /// Scene y to axis y.
    fn from_scene_y(&self, y: f64) -> f64;
}

/// The area of the scene covered by the plot's axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl SceneRect {
    /// Creates a rectangle.
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Maps the ranges of a plot's two axes onto a scene rectangle.
///
/// Scene y grows downwards, so the lower bound of the y axis sits at the
/// bottom edge. Logarithmic axes are mapped in log10 space. A collapsed axis
/// range maps every value to the middle of the rectangle.
#[derive(Debug)]
pub struct ViewportSceneAdapter<P: PlotWidget> {
    plot: P,
    rect: Cell<SceneRect>,
}

impl<P: PlotWidget> ViewportSceneAdapter<P> {
    /// Creates an adapter for `plot` drawn into `rect`.
    pub fn new(plot: P, rect: SceneRect) -> Self {
        Self {
            plot,
            rect: Cell::new(rect),
        }
    }

    /// The scene rectangle.
    pub fn scene_rect(&self) -> SceneRect {
        self.rect.get()
    }

    /// Updates the scene rectangle, typically after a resize.
    pub fn set_scene_rect(&self, rect: SceneRect) {
        self.rect.set(rect);
    }

    /// The adapted plot.
    pub fn plot(&self) -> &P {
        &self.plot
    }
}

impl<P: PlotWidget> SceneAdapter for ViewportSceneAdapter<P> {
    fn to_scene_x(&self, x: f64) -> f64 {
        let rect = self.rect.get();
        let axis = self.plot.x_axis();
        match fraction_of(axis.range(), axis.scale_type(), x) {
            Some(t) => rect.left + t * rect.width,
            None => rect.left + rect.width / 2.0,
        }
    }

    fn to_scene_y(&self, y: f64) -> f64 {
        let rect = self.rect.get();
        let axis = self.plot.y_axis();
        match fraction_of(axis.range(), axis.scale_type(), y) {
            Some(t) => rect.bottom() - t * rect.height,
            None => rect.top + rect.height / 2.0,
        }
    }

    fn from_scene_x(&self, x: f64) -> f64 {
        let rect = self.rect.get();
        let axis = self.plot.x_axis();
        if rect.width == 0.0 {
            return axis.range().lower;
        }
        value_at(axis.range(), axis.scale_type(), (x - rect.left) / rect.width)
    }

    fn from_scene_y(&self, y: f64) -> f64 {
        let rect = self.rect.get();
        let axis = self.plot.y_axis();
        if rect.height == 0.0 {
            return axis.range().lower;
        }
        value_at(axis.range(), axis.scale_type(), (rect.bottom() - y) / rect.height)
    }
}

/// Non-positive values have no logarithm; they are pinned to the smallest
/// positive double.
fn transform(scale: ScaleType, value: f64) -> f64 {
    match scale {
        ScaleType::Linear => value,
        ScaleType::Logarithmic => value.max(f64::MIN_POSITIVE).log10(),
    }
}

fn inverse(scale: ScaleType, value: f64) -> f64 {
    match scale {
        ScaleType::Linear => value,
        ScaleType::Logarithmic => 10f64.powf(value),
    }
}

/// Position of `value` within `range`, 0 at the lower bound and 1 at the
/// upper. `None` for a collapsed range.
fn fraction_of(range: AxisRange, scale: ScaleType, value: f64) -> Option<f64> {
    let lower = transform(scale, range.lower);
    let span = transform(scale, range.upper) - lower;
    if span == 0.0 || !span.is_finite() {
        return None;
    }
    Some((transform(scale, value) - lower) / span)
}

fn value_at(range: AxisRange, scale: ScaleType, fraction: f64) -> f64 {
    let lower = transform(scale, range.lower);
    let upper = transform(scale, range.upper);
    inverse(scale, lower + fraction * (upper - lower))
}
