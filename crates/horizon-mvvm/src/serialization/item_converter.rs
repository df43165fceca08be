//! Whole items to and from JSON.

use serde_json::{Value, json};

use super::container_converter::{ConverterCallbacks, JsonItemContainerConverter};
use super::format::{JsonFormatAssistant, array_field, object, str_field};
use crate::error::{MvvmError, Result};
use crate::model::{ItemBuilder, ItemContainer, ItemDataRole, SessionItem, Variant};

/// Converts items, with their properties and every container, to and from
/// JSON:
///
/// ```text
/// {
///   "modelType": "ViewportAxis",
///   "identifier": 3,
///   "displayName": "X axis",
///   "toolTip": "", "editable": true, "enabled": true,
///   "properties": [{"name": "min", "value": {"type": "double", "value": 0.0}}],
///   "defaultTag": null,
///   "tags": [{"tagInfo": {...}, "items": [...]}]
/// }
/// ```
///
/// Identifiers are written for reference only; items built from JSON get
/// fresh identifiers from the model they are inserted into.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonItemConverter;

impl JsonItemConverter {
    /// Creates a converter.
    pub fn new() -> Self {
        Self
    }

    /// A container converter whose callbacks recurse into this converter.
    pub fn container_converter(&self) -> JsonItemContainerConverter {
        JsonItemContainerConverter::new(
            ConverterCallbacks::new()
                .with_create_json(|item| JsonItemConverter::new().to_json(item))
                .with_create_item(|json| JsonItemConverter::new().from_json(json).map(Some))
                .with_update_item(|json, item| JsonItemConverter::new().apply_update(json, item))
                .with_check_item(|json, item| JsonItemConverter::new().check_update(json, item)),
        )
    }

    /// Serializes `item` and its whole subtree.
    pub fn to_json(&self, item: &SessionItem) -> Result<Value> {
        let properties = item
            .properties()?
            .into_iter()
            .map(|(name, value)| {
                Ok(json!({
                    (JsonFormatAssistant::NAME_KEY): name,
                    (JsonFormatAssistant::VALUE_KEY): serde_json::to_value(&value)?,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        let containers = self.container_converter();
        let tags = item
            .tag_infos()?
            .iter()
            .map(|info| containers.to_json(&item.container(info.name())?))
            .collect::<Result<Vec<_>>>()?;

        Ok(json!({
            (JsonFormatAssistant::MODEL_TYPE_KEY): item.model_type()?,
            (JsonFormatAssistant::IDENTIFIER_KEY): item.identifier()?,
            (JsonFormatAssistant::DISPLAY_NAME_KEY): item.display_name()?,
            (JsonFormatAssistant::TOOLTIP_KEY): item.tooltip()?,
            (JsonFormatAssistant::EDITABLE_KEY): item.is_editable()?,
            (JsonFormatAssistant::ENABLED_KEY): item.is_enabled()?,
            (JsonFormatAssistant::PROPERTIES_KEY): properties,
            (JsonFormatAssistant::DEFAULT_TAG_KEY): item.default_tag()?,
            (JsonFormatAssistant::TAGS_KEY): tags,
        }))
    }

    /// Builds a detached item, children included, from `json`.
    ///
    /// # Errors
    ///
    /// `Format` for a malformed object, or the [`ItemBuilder::validate`]
    /// error when the described children do not fit their tags.
    pub fn from_json(&self, json: &Value) -> Result<ItemBuilder> {
        if !JsonFormatAssistant::new().is_session_item(json) {
            return Err(MvvmError::format("value does not describe an item"));
        }
        let mut builder = ItemBuilder::new(str_field(json, JsonFormatAssistant::MODEL_TYPE_KEY)?)
            .with_display_name(str_field(json, JsonFormatAssistant::DISPLAY_NAME_KEY)?);
        read_roles(json, &mut builder)?;

        for entry in array_field(json, JsonFormatAssistant::PROPERTIES_KEY)? {
            let (name, value) = read_property(entry)?;
            builder.set_property(name, value);
        }

        let default_tag = default_tag(json)?;
        let containers = self.container_converter();
        for entry in array_field(json, JsonFormatAssistant::TAGS_KEY)? {
            let (tag_info, children) = containers.parse(entry)?;
            let name = tag_info.name().to_string();
            builder = if default_tag == Some(name.as_str()) {
                builder.with_default_tag(tag_info)
            } else {
                builder.with_tag(tag_info)
            };
            for child in children {
                builder = builder.with_child(name.clone(), child);
            }
        }

        builder.validate()?;
        Ok(builder)
    }

    /// Updates the live `item` from `json` without changing its structure.
    ///
    /// Properties the item declares take the serialized values; unknown
    /// properties and tags are ignored. Each container present on both sides
    /// is rebuilt when empty and merged otherwise. The whole subtree is
    /// checked first, so on error the item is left unchanged.
    ///
    /// # Errors
    ///
    /// `Format` for a malformed object, `SchemaMismatch` if the model types
    /// differ, `PropertyType` if a serialized value has another kind than
    /// the property, or any error from the container checks.
    pub fn update_item(&self, json: &Value, item: &SessionItem) -> Result<()> {
        self.check_update(json, item)?;
        self.apply_update(json, item)
    }

    /// Runs every check of [`update_item`](Self::update_item) without
    /// touching `item`.
    pub fn check_update(&self, json: &Value, item: &SessionItem) -> Result<()> {
        check_model_type(json, item)?;
        for entry in array_field(json, JsonFormatAssistant::PROPERTIES_KEY)? {
            let (name, value) = read_property(entry)?;
            if !item.has_property(name) {
                continue;
            }
            let current = item.property_value(name)?;
            if !current.is_same_type(&value) {
                return Err(MvvmError::PropertyType {
                    name: name.to_string(),
                    expected: current.type_name(),
                    found: value.type_name(),
                });
            }
        }

        let containers = self.container_converter();
        for (entry, container) in shared_containers(json, item)? {
            if container.is_empty()? {
                containers.check_load(entry, &container)?;
            } else {
                containers.check_merge(entry, &container)?;
            }
        }
        Ok(())
    }

    /// Writes `json` into a checked `item`.
    fn apply_update(&self, json: &Value, item: &SessionItem) -> Result<()> {
        check_model_type(json, item)?;
        for entry in array_field(json, JsonFormatAssistant::PROPERTIES_KEY)? {
            let (name, value) = read_property(entry)?;
            if item.has_property(name) {
                item.set_property(name, value)?;
            }
        }

        let containers = self.container_converter();
        for (entry, container) in shared_containers(json, item)? {
            if container.is_empty()? {
                containers.from_json(entry, &container)?;
            } else {
                containers.merge_json(entry, &container)?;
            }
        }
        Ok(())
    }
}

fn check_model_type(json: &Value, item: &SessionItem) -> Result<()> {
    if !JsonFormatAssistant::new().is_session_item(json) {
        return Err(MvvmError::format("value does not describe an item"));
    }
    let model_type = str_field(json, JsonFormatAssistant::MODEL_TYPE_KEY)?;
    let expected = item.model_type()?;
    if model_type != expected {
        return Err(MvvmError::SchemaMismatch {
            expected,
            found: model_type.to_string(),
        });
    }
    Ok(())
}

/// Tag entries of `json` paired with the container of `item` they name.
/// Entries for tags the item does not have are skipped.
fn shared_containers<'a>(json: &'a Value, item: &SessionItem) -> Result<Vec<(&'a Value, ItemContainer)>> {
    let tag_names: Vec<String> = item
        .tag_infos()?
        .into_iter()
        .map(|info| info.name().to_string())
        .collect();
    let mut shared = Vec::new();
    for entry in array_field(json, JsonFormatAssistant::TAGS_KEY)? {
        let tag_info = &entry[JsonFormatAssistant::TAG_INFO_KEY];
        let name = str_field(tag_info, JsonFormatAssistant::NAME_KEY)?;
        if tag_names.iter().any(|tag| tag == name) {
            shared.push((entry, item.container(name)?));
        }
    }
    Ok(shared)
}

fn read_property(entry: &Value) -> Result<(&str, Variant)> {
    object(entry, "property")?;
    let name = str_field(entry, JsonFormatAssistant::NAME_KEY)?;
    let value = entry
        .get(JsonFormatAssistant::VALUE_KEY)
        .ok_or_else(|| MvvmError::format(format!("property '{name}' has no value")))?;
    Ok((name, serde_json::from_value(value.clone())?))
}

fn read_roles(json: &Value, builder: &mut ItemBuilder) -> Result<()> {
    if let Some(tooltip) = json.get(JsonFormatAssistant::TOOLTIP_KEY) {
        builder.set_data(ItemDataRole::ToolTip, read_scalar(tooltip)?)?;
    }
    if let Some(editable) = json.get(JsonFormatAssistant::EDITABLE_KEY) {
        builder.set_data(ItemDataRole::Editable, read_scalar(editable)?)?;
    }
    if let Some(enabled) = json.get(JsonFormatAssistant::ENABLED_KEY) {
        builder.set_data(ItemDataRole::Enabled, read_scalar(enabled)?)?;
    }
    Ok(())
}

/// Role values are written as plain JSON strings and booleans.
fn read_scalar(value: &Value) -> Result<Variant> {
    match value {
        Value::Bool(flag) => Ok(Variant::Bool(*flag)),
        Value::String(text) => Ok(Variant::String(text.clone())),
        other => Err(MvvmError::format(format!("unexpected role value {other}"))),
    }
}

fn default_tag(json: &Value) -> Result<Option<&str>> {
    match &json[JsonFormatAssistant::DEFAULT_TAG_KEY] {
        Value::Null => Ok(None),
        Value::String(name) => Ok(Some(name.as_str())),
        _ => Err(MvvmError::format("'defaultTag' must be a string or null")),
    }
}
