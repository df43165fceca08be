//! Tag descriptors to and from JSON.

use serde_json::Value;

use super::format::JsonFormatAssistant;
use crate::error::{MvvmError, Result};
use crate::model::TagInfo;

/// Converts [`TagInfo`] to and from `{name, min, max, modelTypes}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTagInfoConverter;

impl JsonTagInfoConverter {
    /// Creates a converter.
    pub fn new() -> Self {
        Self
    }

    /// Serializes `tag_info`.
    pub fn to_json(&self, tag_info: &TagInfo) -> Result<Value> {
        Ok(serde_json::to_value(tag_info)?)
    }

    /// Parses a tag descriptor.
    ///
    /// # Errors
    ///
    /// `Format` if `json` lacks a key or a key holds the wrong kind of value.
    pub fn from_json(&self, json: &Value) -> Result<TagInfo> {
        if !JsonFormatAssistant::new().is_tag_info(json) {
            return Err(MvvmError::format("value does not describe a tag"));
        }
        Ok(serde_json::from_value(json.clone())?)
    }
}
