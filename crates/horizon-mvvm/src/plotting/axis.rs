//! Plot axis widgets as seen by controllers.
//!
//! Controllers never depend on a concrete plotting library. They drive any
//! type implementing [`AxisWidget`]; [`PlotAxis`] and [`PlotCanvas`] are
//! headless implementations used by tests and by applications that render
//! axes themselves.

use std::fmt;
use std::rc::Rc;

use horizon_mvvm_core::{ConnectionId, Property, Signal};

/// The visible interval of an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl AxisRange {
    /// Creates a range; bounds are taken as given.
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `upper - lower`.
    pub fn size(&self) -> f64 {
        self.upper - self.lower
    }

    /// Whether `value` lies within the range, bounds included.
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::new(0.0, 5.0)
    }
}

/// Axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleType {
    /// Linear scale.
    #[default]
    Linear,
    /// Base-10 logarithmic scale.
    Logarithmic,
}

impl ScaleType {
    /// `Logarithmic` for `true`.
    pub fn from_log(is_log: bool) -> Self {
        if is_log {
            Self::Logarithmic
        } else {
            Self::Linear
        }
    }
}

/// Range-changed callback of an [`AxisWidget`].
pub type RangeCallback = Box<dyn Fn(AxisRange)>;

/// One axis of an external plot widget.
///
/// Methods take `&self`: widgets are shared between a plot and its
/// controllers and use interior mutability.
pub trait AxisWidget {
    /// The current range.
    fn range(&self) -> AxisRange;

    /// Sets both bounds.
    fn set_range(&self, lower: f64, upper: f64);

    /// Sets the lower bound.
    fn set_range_lower(&self, lower: f64);

    /// Sets the upper bound.
    fn set_range_upper(&self, upper: f64);

    /// The current scale.
    fn scale_type(&self) -> ScaleType;

    /// Sets the scale.
    fn set_scale_type(&self, scale_type: ScaleType);

    /// Calls `callback` with the new range after every range change.
    fn on_range_changed(&self, callback: RangeCallback) -> ConnectionId;

    /// Removes a callback added with
    /// [`on_range_changed`](Self::on_range_changed).
    fn disconnect_range_changed(&self, id: ConnectionId) -> bool;
}

/// A plot with two axes.
pub trait PlotWidget {
    /// Axis type of this plot.
    type Axis: AxisWidget + Clone + 'static;

    /// The horizontal axis.
    fn x_axis(&self) -> Self::Axis;

    /// The vertical axis.
    fn y_axis(&self) -> Self::Axis;
}

struct PlotAxisState {
    range: Property<AxisRange>,
    scale_type: Property<ScaleType>,
    range_changed: Signal<AxisRange>,
    scale_type_changed: Signal<ScaleType>,
}

/// A headless axis.
///
/// Clones share state. Starts at `0..5` on a linear scale and emits
/// `range_changed` only when the range actually changes.
#[derive(Clone)]
pub struct PlotAxis {
    state: Rc<PlotAxisState>,
}

impl Default for PlotAxis {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotAxis {
    /// Creates an axis spanning `0..5`.
    pub fn new() -> Self {
        Self {
            state: Rc::new(PlotAxisState {
                range: Property::new(AxisRange::default()),
                scale_type: Property::new(ScaleType::default()),
                range_changed: Signal::new(),
                scale_type_changed: Signal::new(),
            }),
        }
    }

    /// The current range.
    pub fn range(&self) -> AxisRange {
        self.state.range.get()
    }

    /// Sets both bounds, swapping them if given in reverse.
    pub fn set_range(&self, lower: f64, upper: f64) {
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        self.apply(AxisRange::new(lower, upper));
    }

    /// Sets the lower bound.
    pub fn set_range_lower(&self, lower: f64) {
        let upper = self.range().upper;
        self.apply(AxisRange::new(lower, upper));
    }

    /// Sets the upper bound.
    pub fn set_range_upper(&self, upper: f64) {
        let lower = self.range().lower;
        self.apply(AxisRange::new(lower, upper));
    }

    fn apply(&self, range: AxisRange) {
        if self.state.range.set(range) {
            self.state.range_changed.emit(range);
        }
    }

    /// The current scale.
    pub fn scale_type(&self) -> ScaleType {
        self.state.scale_type.get()
    }

    /// Sets the scale.
    pub fn set_scale_type(&self, scale_type: ScaleType) {
        if self.state.scale_type.set(scale_type) {
            self.state.scale_type_changed.emit(scale_type);
        }
    }

    /// Emitted after the range changed.
    pub fn range_changed(&self) -> &Signal<AxisRange> {
        &self.state.range_changed
    }

    /// Emitted after the scale changed.
    pub fn scale_type_changed(&self) -> &Signal<ScaleType> {
        &self.state.scale_type_changed
    }
}

impl AxisWidget for PlotAxis {
    fn range(&self) -> AxisRange {
        PlotAxis::range(self)
    }

    fn set_range(&self, lower: f64, upper: f64) {
        PlotAxis::set_range(self, lower, upper);
    }

    fn set_range_lower(&self, lower: f64) {
        PlotAxis::set_range_lower(self, lower);
    }

    fn set_range_upper(&self, upper: f64) {
        PlotAxis::set_range_upper(self, upper);
    }

    fn scale_type(&self) -> ScaleType {
        PlotAxis::scale_type(self)
    }

    fn set_scale_type(&self, scale_type: ScaleType) {
        PlotAxis::set_scale_type(self, scale_type);
    }

    fn on_range_changed(&self, callback: RangeCallback) -> ConnectionId {
        self.state.range_changed.connect(move |range| callback(*range))
    }

    fn disconnect_range_changed(&self, id: ConnectionId) -> bool {
        self.state.range_changed.disconnect(id)
    }
}

impl fmt::Debug for PlotAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlotAxis")
            .field("range", &self.range())
            .field("scale_type", &self.scale_type())
            .field("range_changed", &self.state.range_changed)
            .finish()
    }
}

/// A headless plot with an x and a y [`PlotAxis`].
#[derive(Debug, Clone, Default)]
pub struct PlotCanvas {
    x_axis: PlotAxis,
    y_axis: PlotAxis,
}

impl PlotCanvas {
    /// Creates a plot with two default axes.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlotWidget for PlotCanvas {
    type Axis = PlotAxis;

    fn x_axis(&self) -> PlotAxis {
        self.x_axis.clone()
    }

    fn y_axis(&self) -> PlotAxis {
        self.y_axis.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_defaults() {
        let axis = PlotAxis::new();
        assert_eq!(axis.range(), AxisRange::new(0.0, 5.0));
        assert_eq!(axis.scale_type(), ScaleType::Linear);
    }

    #[test]
    fn test_range_changed_only_on_change() {
        let axis = PlotAxis::new();
        let received = Rc::new(RefCell::new(Vec::new()));
        let r = received.clone();
        axis.on_range_changed(Box::new(move |range| r.borrow_mut().push(range)));

        axis.set_range_lower(1.0);
        axis.set_range_lower(1.0);
        axis.set_range(3.0, 2.0);
        axis.set_range(2.0, 3.0);

        assert_eq!(
            *received.borrow(),
            vec![AxisRange::new(1.0, 5.0), AxisRange::new(2.0, 3.0)]
        );
    }

    #[test]
    fn test_canvas_axes_are_independent() {
        let canvas = PlotCanvas::new();
        let x_count = Rc::new(RefCell::new(0));
        let c = x_count.clone();
        canvas
            .x_axis()
            .range_changed()
            .connect(move |_| *c.borrow_mut() += 1);

        canvas.y_axis().set_range(1.0, 2.0);
        assert_eq!(*x_count.borrow(), 0);
        canvas.x_axis().set_range_upper(7.0);
        assert_eq!(*x_count.borrow(), 1);
        assert_eq!(canvas.x_axis().range().upper, 7.0);
    }

    #[test]
    fn test_disconnect_callback() {
        let axis = PlotAxis::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let id = axis.on_range_changed(Box::new(move |_| *h.borrow_mut() += 1));
        assert!(axis.disconnect_range_changed(id));
        axis.set_range(1.0, 2.0);
        assert_eq!(*hits.borrow(), 0);
        assert!(!axis.disconnect_range_changed(id));
    }

    #[test]
    fn test_scale_type() {
        let axis = PlotAxis::new();
        let changes = Rc::new(RefCell::new(0));
        let c = changes.clone();
        axis.scale_type_changed()
            .connect(move |_| *c.borrow_mut() += 1);
        axis.set_scale_type(ScaleType::from_log(true));
        axis.set_scale_type(ScaleType::Logarithmic);
        assert_eq!(axis.scale_type(), ScaleType::Logarithmic);
        assert_eq!(*changes.borrow(), 1);
    }
}
