//! JSON persistence for items, containers, models and project files.
//!
//! Converters are layered: the container converter writes a tag descriptor
//! and delegates each item to callbacks, the item converter supplies those
//! callbacks recursively, and the model converter and [`JsonDocument`] sit
//! on top.
//!
//! ```
//! use horizon_mvvm::model::{SessionModel, ViewportItem};
//! use horizon_mvvm::serialization::JsonModelConverter;
//!
//! let source = SessionModel::new("PlotModel");
//! source.append_item(ViewportItem::builder(), &source.root_item(), "").unwrap();
//!
//! let converter = JsonModelConverter::new();
//! let json = converter.to_json(&source).unwrap();
//!
//! let target = SessionModel::new("PlotModel");
//! converter.from_json(&json, &target).unwrap();
//! assert_eq!(target.item_count(), source.item_count());
//! ```

mod container_converter;
mod document;
mod format;
mod item_converter;
mod model_converter;
mod tag_info_converter;

pub use container_converter::{
    ConverterCallbacks, CreateItemCallback, CreateJsonCallback, JsonItemContainerConverter,
    UpdateItemCallback,
};
pub use document::JsonDocument;
pub use format::JsonFormatAssistant;
pub use item_converter::JsonItemConverter;
pub use model_converter::{JsonModelConverter, ParsedModel};
pub use tag_info_converter::JsonTagInfoConverter;
