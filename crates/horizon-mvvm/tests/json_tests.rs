//! Tests for JSON persistence of containers, items, models and documents.

use horizon_mvvm::model::{
    ComboProperty, ContainerItem, ItemContainer, SessionModel, TagRow, ViewportAxisItem,
    ViewportItem,
};
use horizon_mvvm::serialization::{
    ConverterCallbacks, JsonDocument, JsonItemContainerConverter, JsonItemConverter,
    JsonModelConverter,
};
use horizon_mvvm::{ItemBuilder, MvvmError, SessionItem};
use serde_json::{Value, json};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A container holding three axes with distinct ranges.
fn axis_container(model: &SessionModel) -> ItemContainer {
    let container = model
        .append_item(ContainerItem::builder(), &model.root_item(), "")
        .unwrap();
    for (min, max) in [(0.0, 1.0), (-5.0, 5.0), (1.0, 1000.0)] {
        container
            .append_item(ViewportAxisItem::with_range(min, max), "")
            .unwrap();
    }
    container
        .item(ContainerItem::ITEMS, 2)
        .unwrap()
        .set_property(ViewportAxisItem::IS_LOG, true)
        .unwrap();
    container.container(ContainerItem::ITEMS).unwrap()
}

fn empty_container(model: &SessionModel) -> ItemContainer {
    model
        .append_item(ContainerItem::builder(), &model.root_item(), "")
        .unwrap()
        .container(ContainerItem::ITEMS)
        .unwrap()
}

fn property_sets(container: &ItemContainer) -> Vec<Vec<(String, horizon_mvvm::Variant)>> {
    container
        .items()
        .unwrap()
        .iter()
        .map(|item| item.properties().unwrap())
        .collect()
}

/// Callbacks that persist only the range of an axis.
fn range_callbacks() -> ConverterCallbacks {
    ConverterCallbacks::new()
        .with_create_json(|item: &SessionItem| {
            Ok(json!({
                "min": item.property::<f64>(ViewportAxisItem::MIN)?,
                "max": item.property::<f64>(ViewportAxisItem::MAX)?,
            }))
        })
        .with_create_item(|json: &Value| {
            let (Some(min), Some(max)) = (json["min"].as_f64(), json["max"].as_f64()) else {
                return Err(MvvmError::Format("axis entry needs min and max".into()));
            };
            Ok(Some(ViewportAxisItem::with_range(min, max)))
        })
}

#[test]
fn test_container_round_trip() {
    init_tracing();
    let source_model = SessionModel::new("SampleModel");
    let source = axis_container(&source_model);
    let converter = JsonItemConverter::new().container_converter();

    let json = converter.to_json(&source).unwrap();
    assert_eq!(json["tagInfo"]["name"], ContainerItem::ITEMS);
    assert_eq!(json["items"].as_array().unwrap().len(), 3);

    let target_model = SessionModel::new("SampleModel");
    let target = empty_container(&target_model);
    converter.from_json(&json, &target).unwrap();

    assert_eq!(property_sets(&target), property_sets(&source));
}

#[test]
fn test_to_json_has_no_side_effects() {
    let model = SessionModel::new("SampleModel");
    let container = axis_container(&model);
    let converter = JsonItemConverter::new().container_converter();
    let before = property_sets(&container);

    let first = converter.to_json(&container).unwrap();
    let second = converter.to_json(&container).unwrap();

    assert_eq!(first, second);
    assert_eq!(property_sets(&container), before);
}

#[test]
fn test_injected_callbacks() {
    let source_model = SessionModel::new("SampleModel");
    let source = axis_container(&source_model);
    let converter = JsonItemContainerConverter::new(range_callbacks());

    let json = converter.to_json(&source).unwrap();
    assert_eq!(json["items"][1], json!({"min": -5.0, "max": 5.0}));

    let target_model = SessionModel::new("SampleModel");
    let target = empty_container(&target_model);
    converter.from_json(&json, &target).unwrap();

    let ranges: Vec<(f64, f64)> = target
        .items()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item.property::<f64>(ViewportAxisItem::MIN).unwrap(),
                item.property::<f64>(ViewportAxisItem::MAX).unwrap(),
            )
        })
        .collect();
    assert_eq!(ranges, vec![(0.0, 1.0), (-5.0, 5.0), (1.0, 1000.0)]);
    // The callbacks do not persist the scale.
    assert!(!target.item_at(2).unwrap().property::<bool>(ViewportAxisItem::IS_LOG).unwrap());
}

#[test]
fn test_callback_error_leaves_container_empty() {
    let model = SessionModel::new("SampleModel");
    let target = empty_container(&model);
    let json = json!({
        "tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []},
        "items": [{"min": 0.0, "max": 1.0}, {"min": 2.0}],
    });

    let err = JsonItemContainerConverter::new(range_callbacks())
        .from_json(&json, &target)
        .unwrap_err();
    assert!(matches!(err, MvvmError::Format(_)));
    assert!(target.is_empty().unwrap());
}

#[test]
fn test_from_json_into_populated_container() {
    let source_model = SessionModel::new("SampleModel");
    let source = axis_container(&source_model);
    let converter = JsonItemConverter::new().container_converter();
    let json = converter.to_json(&source).unwrap();

    let target_model = SessionModel::new("SampleModel");
    let target = axis_container(&target_model);
    target.item_at(0).unwrap().set_property(ViewportAxisItem::MIN, 0.5).unwrap();
    let before = property_sets(&target);

    let err = converter.from_json(&json, &target).unwrap_err();
    assert!(matches!(err, MvvmError::Precondition(_)));
    assert_eq!(property_sets(&target), before);
}

#[test]
fn test_merge_into_populated_container() {
    let source_model = SessionModel::new("SampleModel");
    let source = axis_container(&source_model);
    let converter = JsonItemConverter::new().container_converter();
    let json = converter.to_json(&source).unwrap();

    let target_model = SessionModel::new("SampleModel");
    let target = empty_container(&target_model);
    for _ in 0..3 {
        target.append_item(ViewportAxisItem::builder()).unwrap();
    }
    let identifiers: Vec<u64> = target
        .items()
        .unwrap()
        .iter()
        .map(|item| item.identifier().unwrap())
        .collect();

    converter.merge_json(&json, &target).unwrap();

    assert_eq!(property_sets(&target), property_sets(&source));
    let after: Vec<u64> = target
        .items()
        .unwrap()
        .iter()
        .map(|item| item.identifier().unwrap())
        .collect();
    assert_eq!(after, identifiers);
}

#[test]
fn test_rejected_merge_leaves_container_unchanged() {
    let source_model = SessionModel::new("SampleModel");
    let source = axis_container(&source_model);
    let converter = JsonItemConverter::new().container_converter();
    let mut json = converter.to_json(&source).unwrap();
    json["items"][0]["properties"][0]["value"]["value"] = json!(42.0);
    json["items"][1]["modelType"] = json!("Bogus");

    let target_model = SessionModel::new("SampleModel");
    let target = empty_container(&target_model);
    for _ in 0..3 {
        target.append_item(ViewportAxisItem::builder()).unwrap();
    }
    let before = property_sets(&target);

    let err = converter.merge_json(&json, &target).unwrap_err();
    assert!(matches!(err, MvvmError::SchemaMismatch { .. }));
    assert_eq!(property_sets(&target), before);
    assert_eq!(
        target.item_at(0).unwrap().property::<f64>(ViewportAxisItem::MIN).unwrap(),
        0.0
    );
}

#[test]
fn test_tag_name_mismatch() {
    let model = SessionModel::new("SampleModel");
    let target = empty_container(&model);
    let json = json!({
        "tagInfo": {"name": "samples", "min": 0, "max": null, "modelTypes": []},
        "items": [],
    });

    let err = JsonItemConverter::new()
        .container_converter()
        .from_json(&json, &target)
        .unwrap_err();
    assert!(matches!(err, MvvmError::SchemaMismatch { .. }));
}

#[test]
fn test_malformed_container_json() {
    let model = SessionModel::new("SampleModel");
    let target = empty_container(&model);
    let converter = JsonItemConverter::new().container_converter();

    for json in [
        json!([]),
        json!({"items": []}),
        json!({"tagInfo": {"name": "items"}, "items": []}),
        json!({"tagInfo": {"name": "items", "min": 0, "max": null, "modelTypes": []}}),
    ] {
        let err = converter.from_json(&json, &target).unwrap_err();
        assert!(matches!(err, MvvmError::Format(_)), "{json}");
    }
    assert!(target.is_empty().unwrap());
}

#[test]
fn test_item_round_trip_keeps_property_items() {
    let model = SessionModel::new("PlotModel");
    let viewport = model
        .append_item(ViewportItem::builder(), &model.root_item(), "")
        .unwrap();
    ViewportItem::y_axis(&viewport)
        .unwrap()
        .set_property(ViewportAxisItem::TITLE, "Intensity")
        .unwrap();

    let converter = JsonItemConverter::new();
    let builder = converter.from_json(&converter.to_json(&viewport).unwrap()).unwrap();
    assert_eq!(builder, viewport.to_builder().unwrap());

    let copy = model.insert_item(builder, &model.root_item(), TagRow::default_tag(1)).unwrap();
    let title: String = ViewportItem::y_axis(&copy)
        .unwrap()
        .property(ViewportAxisItem::TITLE)
        .unwrap();
    assert_eq!(title, "Intensity");
    assert_ne!(copy.identifier().unwrap(), viewport.identifier().unwrap());
}

#[test]
fn test_combo_property_survives() {
    let model = SessionModel::new("SampleModel");
    let combo = ComboProperty::new(["gauss", "lorentz", "voigt"])
        .with_current_index(2)
        .unwrap();
    let item = model
        .append_item(
            ItemBuilder::new("Peak").with_property("shape", combo.clone()),
            &model.root_item(),
            "",
        )
        .unwrap();

    let converter = JsonItemConverter::new();
    let builder = converter.from_json(&converter.to_json(&item).unwrap()).unwrap();
    let copy = model.append_item(builder, &model.root_item(), "").unwrap();

    assert_eq!(copy.property::<ComboProperty>("shape").unwrap(), combo);
}

#[test]
fn test_non_finite_doubles_survive() {
    let model = SessionModel::new("SampleModel");
    let item = model
        .append_item(
            ViewportAxisItem::with_range(f64::NAN, f64::INFINITY)
                .with_property("floor", f64::NEG_INFINITY),
            &model.root_item(),
            "",
        )
        .unwrap();

    let converter = JsonItemConverter::new();
    let json = converter.to_json(&item).unwrap();
    assert_eq!(json["properties"][1]["value"], json!({"type": "double", "value": "inf"}));

    let text = serde_json::to_string(&json).unwrap();
    let reread: Value = serde_json::from_str(&text).unwrap();
    let copy = model
        .append_item(converter.from_json(&reread).unwrap(), &model.root_item(), "")
        .unwrap();
    assert!(copy.property::<f64>(ViewportAxisItem::MIN).unwrap().is_nan());
    assert_eq!(copy.property::<f64>(ViewportAxisItem::MAX).unwrap(), f64::INFINITY);
    assert_eq!(copy.property::<f64>("floor").unwrap(), f64::NEG_INFINITY);
}

#[test]
fn test_combo_index_out_of_range_is_format_error() {
    let json = json!({
        "modelType": "Peak", "identifier": 1, "displayName": "Peak",
        "properties": [{
            "name": "shape",
            "value": {"type": "combo", "value": {"values": ["gauss"], "current": 3}},
        }],
        "defaultTag": null, "tags": [],
    });

    let err = JsonItemConverter::new().from_json(&json).unwrap_err();
    assert!(matches!(err, MvvmError::Format(_)));
}

#[test]
fn test_model_round_trip() {
    let source = SessionModel::new("PlotModel");
    source
        .append_item(ViewportItem::builder(), &source.root_item(), "")
        .unwrap();
    axis_container(&source);

    let converter = JsonModelConverter::new();
    let json = converter.to_json(&source).unwrap();
    let target = SessionModel::new("PlotModel");
    converter.from_json(&json, &target).unwrap();

    assert_eq!(target.item_count(), source.item_count());
    assert_eq!(converter.to_json(&target).unwrap()["items"].as_array().unwrap().len(), 2);
    let source_builders: Vec<_> = source.top_items().iter().map(|i| i.to_builder().unwrap()).collect();
    let target_builders: Vec<_> = target.top_items().iter().map(|i| i.to_builder().unwrap()).collect();
    assert_eq!(target_builders, source_builders);
}

#[test]
fn test_document_round_trip() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let samples = SessionModel::new("SampleModel");
    axis_container(&samples);
    let plots = SessionModel::new("PlotModel");
    plots
        .append_item(ViewportItem::builder(), &plots.root_item(), "")
        .unwrap();
    JsonDocument::new(vec![samples.clone(), plots.clone()])
        .save(&path)
        .unwrap();

    let loaded = JsonDocument::new(vec![
        SessionModel::new("SampleModel"),
        SessionModel::new("PlotModel"),
    ]);
    loaded.load(&path).unwrap();

    let loaded_samples = loaded.models()[0].top_items()[0]
        .container(ContainerItem::ITEMS)
        .unwrap();
    let original_samples = samples.top_items()[0].container(ContainerItem::ITEMS).unwrap();
    assert_eq!(property_sets(&loaded_samples), property_sets(&original_samples));
    assert_eq!(loaded.models()[1].item_count(), plots.item_count());
}

#[test]
fn test_document_with_swapped_models() {
    let samples = SessionModel::new("SampleModel");
    let plots = SessionModel::new("PlotModel");
    let json = JsonDocument::new(vec![samples, plots]).to_json().unwrap();

    let swapped = JsonDocument::new(vec![
        SessionModel::new("PlotModel"),
        SessionModel::new("SampleModel"),
    ]);
    let err = swapped.from_json(&json).unwrap_err();
    assert!(matches!(err, MvvmError::SchemaMismatch { .. }));
}
