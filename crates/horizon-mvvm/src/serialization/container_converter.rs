//! Item containers to and from JSON.
//!
//! A container is written as `{"tagInfo": {...}, "items": [...]}`. How each
//! item is written and read is up to the [`ConverterCallbacks`]; the
//! container converter only handles the envelope and the tag descriptor.

use std::fmt;
use std::rc::Rc;

use horizon_mvvm_core::logging::targets;
use serde_json::{Map, Value, json};

use super::format::{JsonFormatAssistant, array_field};
use super::tag_info_converter::JsonTagInfoConverter;
use crate::error::{MvvmError, Result};
use crate::model::{check_accepts, ItemBuilder, ItemContainer, SessionItem, TagInfo};

/// Serializes one item.
pub type CreateJsonCallback = Rc<dyn Fn(&SessionItem) -> Result<Value>>;
/// Builds a detached item from JSON; `None` skips the entry.
pub type CreateItemCallback = Rc<dyn Fn(&Value) -> Result<Option<ItemBuilder>>>;
/// Updates an existing item from JSON.
pub type UpdateItemCallback = Rc<dyn Fn(&Value, &SessionItem) -> Result<()>>;
/// Checks that an update of an existing item from JSON would succeed,
/// without changing the item.
pub type CheckItemCallback = Rc<dyn Fn(&Value, &SessionItem) -> Result<()>>;

/// Item-level hooks used by [`JsonItemContainerConverter`].
///
/// A missing `create_json` writes `{}` per item, a missing `create_item`
/// skips every entry and a missing `update_item` leaves items untouched.
/// When `check_item` is set, a merge runs it over every entry before the
/// first update, so a rejected entry leaves the whole container unchanged.
#[derive(Clone, Default)]
pub struct ConverterCallbacks {
    /// Serializes one item.
    pub create_json: Option<CreateJsonCallback>,
    /// Builds one item.
    pub create_item: Option<CreateItemCallback>,
    /// Updates one existing item.
    pub update_item: Option<UpdateItemCallback>,
    /// Validates one update without applying it.
    pub check_item: Option<CheckItemCallback>,
}

impl ConverterCallbacks {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the serialization callback.
    pub fn with_create_json<F>(mut self, f: F) -> Self
    where
        F: Fn(&SessionItem) -> Result<Value> + 'static,
    {
        self.create_json = Some(Rc::new(f));
        self
    }

    /// Sets the construction callback.
    pub fn with_create_item<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Option<ItemBuilder>> + 'static,
    {
        self.create_item = Some(Rc::new(f));
        self
    }

    /// Sets the update callback.
    pub fn with_update_item<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &SessionItem) -> Result<()> + 'static,
    {
        self.update_item = Some(Rc::new(f));
        self
    }

    /// Sets the update check callback.
    pub fn with_check_item<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &SessionItem) -> Result<()> + 'static,
    {
        self.check_item = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for ConverterCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterCallbacks")
            .field("create_json", &self.create_json.is_some())
            .field("create_item", &self.create_item.is_some())
            .field("update_item", &self.update_item.is_some())
            .field("check_item", &self.check_item.is_some())
            .finish()
    }
}

/// Converts the content of an [`ItemContainer`] to and from JSON.
///
/// Reading supports two modes:
///
/// - [`from_json`](Self::from_json) rebuilds an empty container from
///   scratch and fails on a non-empty one;
/// - [`merge_json`](Self::merge_json) updates the items of a populated
///   container in place, which lets older project files be loaded into
///   items that already have their sub-items.
#[derive(Debug, Clone, Default)]
pub struct JsonItemContainerConverter {
    callbacks: ConverterCallbacks,
    tag_info_converter: JsonTagInfoConverter,
}

impl JsonItemContainerConverter {
    /// Creates a converter using `callbacks` for the items.
    pub fn new(callbacks: ConverterCallbacks) -> Self {
        Self {
            callbacks,
            tag_info_converter: JsonTagInfoConverter::new(),
        }
    }

    /// Serializes the tag descriptor and every item of `container`.
    pub fn to_json(&self, container: &ItemContainer) -> Result<Value> {
        let tag_info = self.tag_info_converter.to_json(&container.tag_info()?)?;
        let items = container
            .items()?
            .iter()
            .map(|item| self.create_json(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(json!({
            (JsonFormatAssistant::TAG_INFO_KEY): tag_info,
            (JsonFormatAssistant::ITEMS_KEY): items,
        }))
    }

    /// Reads the tag descriptor and builds every item without touching any
    /// model.
    pub fn parse(&self, json: &Value) -> Result<(TagInfo, Vec<ItemBuilder>)> {
        if !JsonFormatAssistant::new().is_item_container(json) {
            return Err(MvvmError::format("value does not describe an item container"));
        }
        let tag_info = self
            .tag_info_converter
            .from_json(&json[JsonFormatAssistant::TAG_INFO_KEY])?;
        let mut builders = Vec::new();
        for entry in array_field(json, JsonFormatAssistant::ITEMS_KEY)? {
            if let Some(builder) = self.create_item(entry)? {
                builders.push(builder);
            }
        }
        Ok((tag_info, builders))
    }

    /// Populates the empty `container` from `json`.
    ///
    /// Every item is built before any is inserted, and the batch is inserted
    /// in one step: on error the container is left empty.
    ///
    /// # Errors
    ///
    /// - `Format` if `json` is not a container object
    /// - `Precondition` if `container` already holds items
    /// - `SchemaMismatch` if `json` describes a differently named tag
    /// - any insertion error (type, capacity) for the batch
    pub fn from_json(&self, json: &Value, container: &ItemContainer) -> Result<()> {
        let builders = self.load_plan(json, container)?;
        tracing::debug!(
            target: targets::SERIALIZATION,
            tag = container.tag_name(),
            count = builders.len(),
            "populating container"
        );
        if !builders.is_empty() {
            container.append_items(builders)?;
        }
        Ok(())
    }

    /// Runs every check of [`from_json`](Self::from_json) without inserting
    /// anything.
    pub fn check_load(&self, json: &Value, container: &ItemContainer) -> Result<()> {
        self.load_plan(json, container).map(|_| ())
    }

    /// Updates the items of the populated `container` from `json`.
    ///
    /// A single-item tag updates its one item from each entry. Any other tag
    /// needs exactly as many entries as it has items and updates them
    /// pairwise, in order. Every entry is checked before the first update.
    ///
    /// # Errors
    ///
    /// - `Format` if `json` is not a container object
    /// - `Precondition` if `container` is empty
    /// - `SchemaMismatch` if the tag name or the item count differs
    /// - any error from the item check or update callbacks
    pub fn merge_json(&self, json: &Value, container: &ItemContainer) -> Result<()> {
        let pairs = self.merge_plan(json, container)?;
        for (entry, item) in &pairs {
            self.check_item(entry, item)?;
        }
        tracing::debug!(
            target: targets::SERIALIZATION,
            tag = container.tag_name(),
            count = pairs.len(),
            "merging container"
        );
        for (entry, item) in &pairs {
            self.update_item(entry, item)?;
        }
        Ok(())
    }

    /// Runs every check of [`merge_json`](Self::merge_json) without updating
    /// anything.
    pub fn check_merge(&self, json: &Value, container: &ItemContainer) -> Result<()> {
        for (entry, item) in &self.merge_plan(json, container)? {
            self.check_item(entry, item)?;
        }
        Ok(())
    }

    fn load_plan(&self, json: &Value, container: &ItemContainer) -> Result<Vec<ItemBuilder>> {
        if !JsonFormatAssistant::new().is_item_container(json) {
            return Err(MvvmError::format("value does not describe an item container"));
        }
        if !container.is_empty()? {
            return Err(MvvmError::precondition(format!(
                "container '{}' is not empty",
                container.tag_name()
            )));
        }

        let (tag_info, builders) = self.parse(json)?;
        check_tag_name(&tag_info, container)?;
        let live_info = container.tag_info()?;
        for (count, builder) in builders.iter().enumerate() {
            check_accepts(&live_info, builder.model_type(), count + 1)?;
        }
        Ok(builders)
    }

    /// Pairs each entry with the item it updates.
    fn merge_plan<'a>(
        &self,
        json: &'a Value,
        container: &ItemContainer,
    ) -> Result<Vec<(&'a Value, SessionItem)>> {
        if !JsonFormatAssistant::new().is_item_container(json) {
            return Err(MvvmError::format("value does not describe an item container"));
        }
        if container.is_empty()? {
            return Err(MvvmError::precondition(format!(
                "container '{}' is empty, nothing to merge into",
                container.tag_name()
            )));
        }

        let tag_info = self
            .tag_info_converter
            .from_json(&json[JsonFormatAssistant::TAG_INFO_KEY])?;
        check_tag_name(&tag_info, container)?;

        let entries = array_field(json, JsonFormatAssistant::ITEMS_KEY)?;
        if container.tag_info()?.is_single_property_tag() {
            let item = container.item_at(0)?;
            return Ok(entries.iter().map(|entry| (entry, item.clone())).collect());
        }

        let items = container.items()?;
        if entries.len() != items.len() {
            return Err(MvvmError::SchemaMismatch {
                expected: format!("{} item(s) in '{}'", items.len(), container.tag_name()),
                found: format!("{} item(s)", entries.len()),
            });
        }
        Ok(entries.iter().zip(items).collect())
    }

    fn create_json(&self, item: &SessionItem) -> Result<Value> {
        match &self.callbacks.create_json {
            Some(create_json) => create_json(item),
            None => Ok(Value::Object(Map::new())),
        }
    }

    fn create_item(&self, json: &Value) -> Result<Option<ItemBuilder>> {
        match &self.callbacks.create_item {
            Some(create_item) => create_item(json),
            None => Ok(None),
        }
    }

    fn update_item(&self, json: &Value, item: &SessionItem) -> Result<()> {
        match &self.callbacks.update_item {
            Some(update_item) => update_item(json, item),
            None => Ok(()),
        }
    }

    fn check_item(&self, json: &Value, item: &SessionItem) -> Result<()> {
        match &self.callbacks.check_item {
            Some(check_item) => check_item(json, item),
            None => Ok(()),
        }
    }
}

fn check_tag_name(tag_info: &TagInfo, container: &ItemContainer) -> Result<()> {
    if tag_info.name() != container.tag_name() {
        return Err(MvvmError::SchemaMismatch {
            expected: container.tag_name().to_string(),
            found: tag_info.name().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerItem, SessionModel};
    use std::cell::RefCell;

    /// Items are written as `{"type": ..., "value": <double property>}`.
    fn value_callbacks() -> ConverterCallbacks {
        ConverterCallbacks::new()
            .with_create_json(|item| {
                Ok(json!({
                    "type": item.model_type()?,
                    "value": item.property::<f64>("value")?,
                }))
            })
            .with_create_item(|json| {
                let model_type = json["type"]
                    .as_str()
                    .ok_or_else(|| MvvmError::format("type"))?;
                let value = json["value"]
                    .as_f64()
                    .ok_or_else(|| MvvmError::format("value"))?;
                Ok(Some(ItemBuilder::new(model_type).with_property("value", value)))
            })
            .with_update_item(|json, item| {
                let value = json["value"]
                    .as_f64()
                    .ok_or_else(|| MvvmError::format("value"))?;
                item.set_property("value", value).map(|_| ())
            })
    }

    fn container_with(model: &SessionModel, values: &[f64]) -> ItemContainer {
        let item = model
            .append_item(ContainerItem::builder(), &model.root_item(), "")
            .unwrap();
        for value in values {
            item.append_item(ItemBuilder::new("Point").with_property("value", *value), "")
                .unwrap();
        }
        item.container(ContainerItem::ITEMS).unwrap()
    }

    #[test]
    fn test_to_json() {
        let model = SessionModel::new("Model");
        let container = container_with(&model, &[1.0, 2.0]);
        let converter = JsonItemContainerConverter::new(value_callbacks());

        let json = converter.to_json(&container).unwrap();
        assert_eq!(json["tagInfo"]["name"], "items");
        assert_eq!(
            json["items"],
            json!([{"type": "Point", "value": 1.0}, {"type": "Point", "value": 2.0}])
        );
    }

    #[test]
    fn test_from_json_into_empty_container() {
        let model = SessionModel::new("Model");
        let source = container_with(&model, &[1.0, 2.0, 3.0]);
        let target = container_with(&model, &[]);
        let converter = JsonItemContainerConverter::new(value_callbacks());

        let json = converter.to_json(&source).unwrap();
        converter.from_json(&json, &target).unwrap();

        let values: Vec<f64> = target
            .items()
            .unwrap()
            .iter()
            .map(|item| item.property::<f64>("value").unwrap())
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_json_requires_empty_container() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[7.0]);
        let converter = JsonItemContainerConverter::new(value_callbacks());
        let json = json!({
            "tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []},
            "items": [{"type": "Point", "value": 1.0}],
        });

        let err = converter.from_json(&json, &target).unwrap_err();
        assert!(matches!(err, MvvmError::Precondition(_)));
        assert_eq!(target.item_count().unwrap(), 1);
        assert_eq!(target.item_at(0).unwrap().property::<f64>("value").unwrap(), 7.0);
    }

    #[test]
    fn test_from_json_tag_mismatch() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[]);
        let converter = JsonItemContainerConverter::new(value_callbacks());
        let json = json!({
            "tagInfo": {"name": "layers", "min": 0, "max": null, "modelTypes": []},
            "items": [],
        });

        let err = converter.from_json(&json, &target).unwrap_err();
        assert!(matches!(
            err,
            MvvmError::SchemaMismatch { ref expected, ref found }
                if expected == "items" && found == "layers"
        ));
    }

    #[test]
    fn test_from_json_malformed() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[]);
        let converter = JsonItemContainerConverter::new(value_callbacks());

        let no_items = json!({"tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []}});
        assert!(matches!(
            converter.from_json(&no_items, &target),
            Err(MvvmError::Format(_))
        ));

        let bad_tag = json!({"tagInfo": {"name": "items"}, "items": []});
        assert!(matches!(
            converter.from_json(&bad_tag, &target),
            Err(MvvmError::Format(_))
        ));
    }

    #[test]
    fn test_from_json_is_atomic() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[]);
        let converter = JsonItemContainerConverter::new(value_callbacks());
        let json = json!({
            "tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []},
            "items": [{"type": "Point", "value": 1.0}, {"type": "Point"}],
        });

        assert!(converter.from_json(&json, &target).is_err());
        assert!(target.is_empty().unwrap());
    }

    #[test]
    fn test_merge_json_updates_in_place() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[1.0, 2.0]);
        let before = target.items().unwrap();
        let converter = JsonItemContainerConverter::new(value_callbacks());
        let json = json!({
            "tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []},
            "items": [{"type": "Point", "value": 10.0}, {"type": "Point", "value": 20.0}],
        });

        converter.merge_json(&json, &target).unwrap();
        assert_eq!(target.items().unwrap(), before);
        assert_eq!(before[1].property::<f64>("value").unwrap(), 20.0);
    }

    #[test]
    fn test_merge_json_count_mismatch() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[1.0, 2.0]);
        let converter = JsonItemContainerConverter::new(value_callbacks());
        let json = json!({
            "tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []},
            "items": [{"type": "Point", "value": 10.0}],
        });

        let err = converter.merge_json(&json, &target).unwrap_err();
        assert!(matches!(err, MvvmError::SchemaMismatch { .. }));
        assert_eq!(target.item_at(0).unwrap().property::<f64>("value").unwrap(), 1.0);
    }

    #[test]
    fn test_merge_json_checks_every_entry_first() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[1.0, 2.0]);
        let checked = Rc::new(RefCell::new(0));
        let c = checked.clone();
        let converter = JsonItemContainerConverter::new(value_callbacks().with_check_item(
            move |json, _| {
                *c.borrow_mut() += 1;
                json["value"]
                    .as_f64()
                    .map(|_| ())
                    .ok_or_else(|| MvvmError::format("value"))
            },
        ));
        let json = json!({
            "tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []},
            "items": [{"type": "Point", "value": 10.0}, {"type": "Point"}],
        });

        assert!(converter.check_merge(&json, &target).is_err());
        let err = converter.merge_json(&json, &target).unwrap_err();
        assert!(matches!(err, MvvmError::Format(_)));
        assert_eq!(target.item_at(0).unwrap().property::<f64>("value").unwrap(), 1.0);
        assert_eq!(*checked.borrow(), 4);
    }

    #[test]
    fn test_check_load_leaves_container_empty() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[]);
        let converter = JsonItemContainerConverter::new(value_callbacks());
        let json = json!({
            "tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []},
            "items": [{"type": "Point", "value": 1.0}],
        });

        converter.check_load(&json, &target).unwrap();
        assert!(target.is_empty().unwrap());
    }

    #[test]
    fn test_merge_json_requires_items() {
        let model = SessionModel::new("Model");
        let target = container_with(&model, &[]);
        let converter = JsonItemContainerConverter::new(value_callbacks());
        let json = json!({
            "tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []},
            "items": [],
        });
        assert!(matches!(
            converter.merge_json(&json, &target),
            Err(MvvmError::Precondition(_))
        ));
    }

    #[test]
    fn test_missing_callbacks() {
        let model = SessionModel::new("Model");
        let source = container_with(&model, &[1.0]);
        let target = container_with(&model, &[]);
        let converter = JsonItemContainerConverter::default();

        let json = converter.to_json(&source).unwrap();
        assert_eq!(json["items"], json!([{}]));

        let created = Rc::new(RefCell::new(0));
        let c = created.clone();
        let counting = JsonItemContainerConverter::new(ConverterCallbacks::new().with_create_item(
            move |_| {
                *c.borrow_mut() += 1;
                Ok(None)
            },
        ));
        counting.from_json(&json, &target).unwrap();
        assert_eq!(*created.borrow(), 1);
        assert!(target.is_empty().unwrap());
    }
}
