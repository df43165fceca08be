//! JSON keys and shape checks shared by the converters.

use serde_json::{Map, Value};

use crate::error::{MvvmError, Result};

/// Knows the keys of every JSON object the converters produce, and tells
/// which kind of object a value represents.
///
/// Stateless; construct one wherever it is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatAssistant;

impl JsonFormatAssistant {
    /// Tag descriptor of a container.
    pub const TAG_INFO_KEY: &'static str = "tagInfo";
    /// Items of a container or top items of a model.
    pub const ITEMS_KEY: &'static str = "items";

    /// Tag name.
    pub const NAME_KEY: &'static str = "name";
    /// Minimum arity.
    pub const MIN_KEY: &'static str = "min";
    /// Maximum arity, `null` when unbounded.
    pub const MAX_KEY: &'static str = "max";
    /// Accepted model types.
    pub const MODEL_TYPES_KEY: &'static str = "modelTypes";

    /// Model type of an item.
    pub const MODEL_TYPE_KEY: &'static str = "modelType";
    /// Model-scoped identifier of an item.
    pub const IDENTIFIER_KEY: &'static str = "identifier";
    /// Display name of an item.
    pub const DISPLAY_NAME_KEY: &'static str = "displayName";
    /// Tooltip of an item.
    pub const TOOLTIP_KEY: &'static str = "toolTip";
    /// Editable flag of an item.
    pub const EDITABLE_KEY: &'static str = "editable";
    /// Enabled flag of an item.
    pub const ENABLED_KEY: &'static str = "enabled";
    /// Properties of an item, as `[{name, value}]`.
    pub const PROPERTIES_KEY: &'static str = "properties";
    /// Property value.
    pub const VALUE_KEY: &'static str = "value";
    /// Default tag name of an item, `null` when it has none.
    pub const DEFAULT_TAG_KEY: &'static str = "defaultTag";
    /// Containers of an item.
    pub const TAGS_KEY: &'static str = "tags";

    /// Model type of a model.
    pub const MODEL_KEY: &'static str = "model";
    /// Models of a document.
    pub const MODELS_KEY: &'static str = "models";

    /// Creates an assistant.
    pub fn new() -> Self {
        Self
    }

    /// `{name, min, max, modelTypes}`.
    pub fn is_tag_info(&self, json: &Value) -> bool {
        has_keys(
            json,
            &[
                Self::NAME_KEY,
                Self::MIN_KEY,
                Self::MAX_KEY,
                Self::MODEL_TYPES_KEY,
            ],
        )
    }

    /// `{tagInfo, items: [...]}`.
    pub fn is_item_container(&self, json: &Value) -> bool {
        has_keys(json, &[Self::TAG_INFO_KEY, Self::ITEMS_KEY])
            && json[Self::ITEMS_KEY].is_array()
    }

    /// `{modelType, identifier, displayName, properties, defaultTag, tags}`.
    pub fn is_session_item(&self, json: &Value) -> bool {
        has_keys(
            json,
            &[
                Self::MODEL_TYPE_KEY,
                Self::IDENTIFIER_KEY,
                Self::DISPLAY_NAME_KEY,
                Self::PROPERTIES_KEY,
                Self::DEFAULT_TAG_KEY,
                Self::TAGS_KEY,
            ],
        ) && json[Self::PROPERTIES_KEY].is_array()
            && json[Self::TAGS_KEY].is_array()
    }

    /// `{model, items: [...]}`.
    pub fn is_session_model(&self, json: &Value) -> bool {
        has_keys(json, &[Self::MODEL_KEY, Self::ITEMS_KEY]) && json[Self::ITEMS_KEY].is_array()
    }

    /// `{models: [...]}`.
    pub fn is_document(&self, json: &Value) -> bool {
        has_keys(json, &[Self::MODELS_KEY]) && json[Self::MODELS_KEY].is_array()
    }
}

fn has_keys(json: &Value, keys: &[&str]) -> bool {
    json.as_object()
        .is_some_and(|object| keys.iter().all(|key| object.contains_key(*key)))
}

pub(crate) fn object<'a>(json: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    json.as_object()
        .ok_or_else(|| MvvmError::format(format!("{what} is not a JSON object")))
}

pub(crate) fn str_field<'a>(json: &'a Value, key: &str) -> Result<&'a str> {
    json.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| MvvmError::format(format!("'{key}' is missing or not a string")))
}

pub(crate) fn array_field<'a>(json: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    json.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| MvvmError::format(format!("'{key}' is missing or not an array")))
}
