//! Ready-made item types.

use super::builder::ItemBuilder;
use super::item::SessionItem;
use super::tag_info::TagInfo;
use crate::error::Result;

/// One axis of a plot viewport: its range, scale and title.
pub struct ViewportAxisItem;

impl ViewportAxisItem {
    /// Model type name.
    pub const MODEL_TYPE: &'static str = "ViewportAxis";
    /// Lower bound of the visible range (`f64`).
    pub const MIN: &'static str = "min";
    /// Upper bound of the visible range (`f64`).
    pub const MAX: &'static str = "max";
    /// Whether the axis uses a logarithmic scale (`bool`).
    pub const IS_LOG: &'static str = "is_log";
    /// Axis title (`String`).
    pub const TITLE: &'static str = "title";

    /// An axis spanning `0..1` on a linear scale.
    pub fn builder() -> ItemBuilder {
        Self::with_range(0.0, 1.0)
    }

    /// An axis spanning `min..max` on a linear scale.
    pub fn with_range(min: f64, max: f64) -> ItemBuilder {
        ItemBuilder::new(Self::MODEL_TYPE)
            .with_display_name("Axis")
            .with_property(Self::MIN, min)
            .with_property(Self::MAX, max)
            .with_property(Self::IS_LOG, false)
            .with_property(Self::TITLE, "")
    }
}

/// A plain container of arbitrary items under one default tag.
pub struct ContainerItem;

impl ContainerItem {
    /// Model type name.
    pub const MODEL_TYPE: &'static str = "Container";
    /// Name of the default tag.
    pub const ITEMS: &'static str = "items";

    /// An empty container.
    pub fn builder() -> ItemBuilder {
        ItemBuilder::new(Self::MODEL_TYPE).with_default_tag(TagInfo::universal(Self::ITEMS))
    }
}

/// Base for items made of properties and property items.
pub struct CompoundItem;

impl CompoundItem {
    /// Model type name used when no specific type is given.
    pub const MODEL_TYPE: &'static str = "Compound";

    /// An empty compound of `model_type`. Add properties with
    /// [`ItemBuilder::with_property`] and sub-items with
    /// [`ItemBuilder::with_property_item`].
    pub fn builder(model_type: impl Into<String>) -> ItemBuilder {
        ItemBuilder::new(model_type)
    }
}

/// A 2D viewport: two [`ViewportAxisItem`]s held as property items.
pub struct ViewportItem;

impl ViewportItem {
    /// Model type name.
    pub const MODEL_TYPE: &'static str = "Viewport";
    /// Tag of the horizontal axis.
    pub const X_AXIS: &'static str = "xaxis";
    /// Tag of the vertical axis.
    pub const Y_AXIS: &'static str = "yaxis";

    /// A viewport with default axes.
    pub fn builder() -> ItemBuilder {
        CompoundItem::builder(Self::MODEL_TYPE)
            .with_property_item(Self::X_AXIS, ViewportAxisItem::builder().with_display_name("X axis"))
            .with_property_item(Self::Y_AXIS, ViewportAxisItem::builder().with_display_name("Y axis"))
    }

    /// The horizontal axis of a live viewport.
    pub fn x_axis(viewport: &SessionItem) -> Result<SessionItem> {
        viewport.item(Self::X_AXIS, 0)
    }

    /// The vertical axis of a live viewport.
    pub fn y_axis(viewport: &SessionItem) -> Result<SessionItem> {
        viewport.item(Self::Y_AXIS, 0)
    }
}
