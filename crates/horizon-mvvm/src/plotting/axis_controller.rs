//! Two-way binding between a viewport axis item and a plot axis.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use horizon_mvvm_core::logging::targets;

use super::axis::{AxisRange, AxisWidget, PlotWidget, ScaleType};
use crate::error::{MvvmError, Result};
use crate::model::{SessionItem, ViewportAxisItem};
use crate::signals::{ItemListener, ItemListenerBase};

/// Selects one axis of a [`PlotWidget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisAccessor {
    /// The horizontal axis.
    X,
    /// The vertical axis.
    Y,
}

impl AxisAccessor {
    /// The selected axis of `plot`.
    pub fn select<P: PlotWidget>(self, plot: &P) -> P::Axis {
        match self {
            Self::X => plot.x_axis(),
            Self::Y => plot.y_axis(),
        }
    }
}

/// Names of the item properties an axis controller reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPropertyMap {
    /// Lower bound (`f64`).
    pub min: String,
    /// Upper bound (`f64`).
    pub max: String,
    /// Logarithmic flag (`bool`); `None` leaves the widget scale alone.
    pub is_log: Option<String>,
}

impl Default for AxisPropertyMap {
    fn default() -> Self {
        Self {
            min: ViewportAxisItem::MIN.to_string(),
            max: ViewportAxisItem::MAX.to_string(),
            is_log: Some(ViewportAxisItem::IS_LOG.to_string()),
        }
    }
}

/// Set while the controller itself is writing to either side.
#[derive(Clone, Default)]
struct UpdateGuard(Rc<Cell<bool>>);

impl UpdateGuard {
    fn is_active(&self) -> bool {
        self.0.get()
    }

    fn block(&self) -> GuardScope {
        let previous = self.0.replace(true);
        GuardScope {
            flag: self.0.clone(),
            previous,
        }
    }
}

struct GuardScope {
    flag: Rc<Cell<bool>>,
    previous: bool,
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Keeps an [`AxisWidget`] and an axis item in step.
///
/// Binding an item pushes its range and scale into the widget. After that,
/// property changes on the item update the widget, and range changes on the
/// widget (from panning or zooming, say) are written back into the item's
/// `min` and `max` properties. Writes made by the controller itself are not
/// echoed back to the side they came from.
///
/// Unbinding, destroying the item, or dropping the controller disconnects
/// both directions.
///
/// ```
/// use horizon_mvvm::model::{SessionModel, ViewportAxisItem};
/// use horizon_mvvm::plotting::{AxisPlotController, AxisWidget, PlotAxis};
/// use horizon_mvvm::ItemListener;
///
/// let model = SessionModel::new("Plots");
/// let item = model
///     .append_item(ViewportAxisItem::with_range(1.0, 2.0), &model.root_item(), "")
///     .unwrap();
///
/// let axis = PlotAxis::new();
/// let controller = AxisPlotController::new(axis.clone());
/// controller.set_item(Some(&item)).unwrap();
/// assert_eq!(axis.range().upper, 2.0);
///
/// axis.set_range(3.0, 4.0);
/// assert_eq!(item.property::<f64>(ViewportAxisItem::MIN).unwrap(), 3.0);
/// ```
pub struct AxisPlotController<A: AxisWidget + Clone + 'static> {
    base: ItemListenerBase,
    axis: A,
    properties: AxisPropertyMap,
    guard: UpdateGuard,
}

impl<A: AxisWidget + Clone + 'static> AxisPlotController<A> {
    /// Creates an unbound controller for `axis` using the
    /// [`ViewportAxisItem`] property names.
    pub fn new(axis: A) -> Self {
        Self::with_property_map(axis, AxisPropertyMap::default())
    }

    /// Creates an unbound controller reading and writing the given
    /// properties.
    pub fn with_property_map(axis: A, properties: AxisPropertyMap) -> Self {
        Self {
            base: ItemListenerBase::new(),
            axis,
            properties,
            guard: UpdateGuard::default(),
        }
    }

    /// Creates an unbound controller for one axis of `plot`.
    pub fn for_plot<P>(plot: &P, accessor: AxisAccessor) -> Self
    where
        P: PlotWidget<Axis = A>,
    {
        Self::new(accessor.select(plot))
    }

    /// The controlled widget.
    pub fn axis(&self) -> &A {
        &self.axis
    }

    /// The property names in use.
    pub fn property_map(&self) -> &AxisPropertyMap {
        &self.properties
    }
}

impl<A: AxisWidget + Clone + 'static> ItemListener for AxisPlotController<A> {
    fn listener(&self) -> &ItemListenerBase {
        &self.base
    }

    fn subscribe(&self) -> Result<()> {
        let item = self
            .base
            .current_item()
            .ok_or_else(|| MvvmError::precondition("axis controller has no item"))?;

        {
            let _scope = self.guard.block();
            sync_widget(&self.axis, &self.properties, &item)?;
        }

        let axis = self.axis.clone();
        let properties = self.properties.clone();
        let guard = self.guard.clone();
        self.base.set_on_property_change(move |item, name| {
            if guard.is_active() {
                return;
            }
            let _scope = guard.block();
            if let Err(err) = push_property(&axis, &properties, item, name) {
                tracing::warn!(
                    target: targets::PLOTTING,
                    property = name,
                    error = %err,
                    "failed to update axis widget"
                );
            }
        })?;

        let tracked = self.base.tracked();
        let properties = self.properties.clone();
        let guard = self.guard.clone();
        let connection = self.axis.on_range_changed(Box::new(move |range| {
            if guard.is_active() {
                return;
            }
            let Some(item) = tracked.get() else {
                return;
            };
            let _scope = guard.block();
            if let Err(err) = write_range(&item, &properties, &range) {
                tracing::warn!(
                    target: targets::PLOTTING,
                    error = %err,
                    "failed to write axis range into item"
                );
            }
        }));

        let axis = self.axis.clone();
        self.base.on_release(move || {
            axis.disconnect_range_changed(connection);
        });
        Ok(())
    }
}

impl<A: AxisWidget + Clone + 'static> fmt::Debug for AxisPlotController<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxisPlotController")
            .field("base", &self.base)
            .field("range", &self.axis.range())
            .field("properties", &self.properties)
            .finish()
    }
}

fn sync_widget<A: AxisWidget>(
    axis: &A,
    properties: &AxisPropertyMap,
    item: &SessionItem,
) -> Result<()> {
    let lower = item.property::<f64>(&properties.min)?;
    let upper = item.property::<f64>(&properties.max)?;
    tracing::trace!(target: targets::PLOTTING, lower, upper, "syncing axis widget");
    axis.set_range(lower, upper);
    if let Some(is_log) = &properties.is_log {
        if item.has_property(is_log) {
            axis.set_scale_type(ScaleType::from_log(item.property::<bool>(is_log)?));
        }
    }
    Ok(())
}

fn push_property<A: AxisWidget>(
    axis: &A,
    properties: &AxisPropertyMap,
    item: &SessionItem,
    name: &str,
) -> Result<()> {
    if name == properties.min {
        axis.set_range_lower(item.property::<f64>(name)?);
    } else if name == properties.max {
        axis.set_range_upper(item.property::<f64>(name)?);
    } else if properties.is_log.as_deref() == Some(name) {
        axis.set_scale_type(ScaleType::from_log(item.property::<bool>(name)?));
    }
    Ok(())
}

fn write_range(item: &SessionItem, properties: &AxisPropertyMap, range: &AxisRange) -> Result<()> {
    item.set_property(&properties.min, range.lower)?;
    item.set_property(&properties.max, range.upper)?;
    Ok(())
}
