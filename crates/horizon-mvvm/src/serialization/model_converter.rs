//! Whole models to and from JSON.

use horizon_mvvm_core::logging::targets;
use serde_json::{Value, json};

use super::format::{JsonFormatAssistant, array_field, str_field};
use super::item_converter::JsonItemConverter;
use crate::error::{MvvmError, Result};
use crate::model::{ItemBuilder, SessionModel, TagRow, ROOT_TAG};

/// A model read from JSON but not yet inserted anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModel {
    /// Model type recorded in the JSON.
    pub model_type: String,
    /// Top items, in order.
    pub items: Vec<ItemBuilder>,
}

/// Converts a model to and from `{"model": <type>, "items": [...]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelConverter {
    items: JsonItemConverter,
}

impl JsonModelConverter {
    /// Creates a converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the top items of `model`.
    pub fn to_json(&self, model: &SessionModel) -> Result<Value> {
        let items = model
            .top_items()
            .iter()
            .map(|item| self.items.to_json(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(json!({
            (JsonFormatAssistant::MODEL_KEY): model.model_type(),
            (JsonFormatAssistant::ITEMS_KEY): items,
        }))
    }

    /// Reads a model description without touching any model.
    pub fn parse(&self, json: &Value) -> Result<ParsedModel> {
        if !JsonFormatAssistant::new().is_session_model(json) {
            return Err(MvvmError::format("value does not describe a model"));
        }
        let model_type = str_field(json, JsonFormatAssistant::MODEL_KEY)?.to_string();
        let items = array_field(json, JsonFormatAssistant::ITEMS_KEY)?
            .iter()
            .map(|entry| self.items.from_json(entry))
            .collect::<Result<Vec<_>>>()?;
        Ok(ParsedModel { model_type, items })
    }

    /// Populates the empty `model` from `json`.
    ///
    /// # Errors
    ///
    /// - `Format` if `json` is malformed
    /// - `SchemaMismatch` if `json` describes another model type
    /// - `Precondition` if `model` already has top items
    pub fn from_json(&self, json: &Value, model: &SessionModel) -> Result<()> {
        let parsed = self.parse(json)?;
        check_target(&parsed, model)?;
        populate(parsed, model)
    }
}

/// Checks that `parsed` can be loaded into `model`.
pub(crate) fn check_target(parsed: &ParsedModel, model: &SessionModel) -> Result<()> {
    if parsed.model_type != model.model_type() {
        return Err(MvvmError::SchemaMismatch {
            expected: model.model_type().to_string(),
            found: parsed.model_type.clone(),
        });
    }
    if !model.top_items().is_empty() {
        return Err(MvvmError::precondition(format!(
            "model '{}' is not empty",
            model.model_type()
        )));
    }
    Ok(())
}

/// Inserts the top items of a checked `parsed` into `model`, all or nothing.
pub(crate) fn populate(parsed: ParsedModel, model: &SessionModel) -> Result<()> {
    tracing::debug!(
        target: targets::SERIALIZATION,
        model = model.model_type(),
        count = parsed.items.len(),
        "loading model"
    );
    if parsed.items.is_empty() {
        return Ok(());
    }
    model.insert_items(parsed.items, &model.root_item(), TagRow::new(ROOT_TAG, 0))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerItem, ViewportAxisItem, ViewportItem};

    fn populated() -> SessionModel {
        let model = SessionModel::new("PlotModel");
        let root = model.root_item();
        model.append_item(ViewportItem::builder(), &root, "").unwrap();
        let container = model.append_item(ContainerItem::builder(), &root, "").unwrap();
        container
            .append_item(ViewportAxisItem::with_range(-1.0, 1.0), "")
            .unwrap();
        model
    }

    #[test]
    fn test_round_trip() {
        let source = populated();
        let converter = JsonModelConverter::new();
        let json = converter.to_json(&source).unwrap();
        assert_eq!(json["model"], "PlotModel");

        let target = SessionModel::new("PlotModel");
        converter.from_json(&json, &target).unwrap();

        assert_eq!(target.item_count(), source.item_count());
        let expected: Vec<_> = source
            .top_items()
            .iter()
            .map(|item| item.to_builder().unwrap())
            .collect();
        let actual: Vec<_> = target
            .top_items()
            .iter()
            .map(|item| item.to_builder().unwrap())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_wrong_model_type() {
        let json = JsonModelConverter::new().to_json(&populated()).unwrap();
        let target = SessionModel::new("OtherModel");
        let err = JsonModelConverter::new().from_json(&json, &target).unwrap_err();
        assert!(matches!(err, MvvmError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_requires_empty_model() {
        let json = JsonModelConverter::new().to_json(&populated()).unwrap();
        let target = populated();
        let before = target.item_count();
        let err = JsonModelConverter::new().from_json(&json, &target).unwrap_err();
        assert!(matches!(err, MvvmError::Precondition(_)));
        assert_eq!(target.item_count(), before);
    }

    #[test]
    fn test_malformed() {
        let target = SessionModel::new("PlotModel");
        let err = JsonModelConverter::new()
            .from_json(&json!({"items": []}), &target)
            .unwrap_err();
        assert!(matches!(err, MvvmError::Format(_)));

        let err = JsonModelConverter::new()
            .from_json(&json!({"model": "PlotModel", "items": [{"modelType": 1}]}), &target)
            .unwrap_err();
        assert!(matches!(err, MvvmError::Format(_)));
        assert!(target.top_items().is_empty());
    }
}
