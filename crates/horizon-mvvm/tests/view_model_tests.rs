//! Tests for view models following a live session model.

use std::cell::RefCell;
use std::rc::Rc;

use horizon_mvvm::model::{
    ContainerItem, ItemDataRole, SessionModel, TagRow, ViewportAxisItem, ViewportItem,
};
use horizon_mvvm::plotting::{AxisPlotController, PlotAxis};
use horizon_mvvm::serialization::JsonModelConverter;
use horizon_mvvm::viewmodel::{
    AllChildrenStrategy, ItemModel, ModelIndex, Orientation, PropertiesRowStrategy,
    TopItemsStrategy, ViewModel, ViewRole,
};
use horizon_mvvm::{ItemListener, SessionItem, Variant};

fn add_axes(model: &SessionModel, count: usize) -> Vec<SessionItem> {
    (0..count)
        .map(|i| {
            model
                .append_item(
                    ViewportAxisItem::with_range(0.0, i as f64 + 1.0)
                        .with_display_name(format!("axis{i}")),
                    &model.root_item(),
                    "",
                )
                .unwrap()
        })
        .collect()
}

fn display_names(view_model: &ViewModel, parent: &ModelIndex) -> Vec<String> {
    (0..view_model.row_count(parent))
        .filter_map(|row| view_model.data(&view_model.index(row, 0, parent), ViewRole::Display))
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_fixed_column_table() {
    let model = SessionModel::new("PlotModel");
    add_axes(&model, 2);
    model
        .append_item(ContainerItem::builder(), &model.root_item(), "")
        .unwrap();
    let view_model = ViewModel::new(
        &model,
        TopItemsStrategy,
        PropertiesRowStrategy::with_properties([ViewportAxisItem::MAX, ViewportAxisItem::IS_LOG]),
    );

    let root = ModelIndex::invalid();
    assert_eq!(view_model.row_count(&root), 3);
    assert_eq!(view_model.column_count(&root), 2);
    assert_eq!(
        view_model.header_data(0, Orientation::Horizontal).as_deref(),
        Some("max")
    );
    assert_eq!(view_model.header_data(0, Orientation::Vertical), None);

    assert_eq!(
        view_model.data(&view_model.index(1, 0, &root), ViewRole::Display),
        Some(Variant::Double(2.0))
    );
    // The container has neither property.
    let missing = view_model.index(2, 1, &root);
    assert!(missing.is_valid());
    assert_eq!(view_model.data(&missing, ViewRole::Display), None);
    assert!(!view_model.flags(&missing).editable);
}

#[test]
fn test_data_changed_for_property_cell() {
    let model = SessionModel::new("PlotModel");
    let axes = add_axes(&model, 2);
    let view_model = ViewModel::property_table_view_model(&model);
    let changed = Rc::new(RefCell::new(Vec::new()));
    let c = changed.clone();
    view_model
        .signals()
        .data_changed
        .connect(move |(top_left, _, _)| c.borrow_mut().push((top_left.row(), top_left.column())));

    axes[1].set_property(ViewportAxisItem::MIN, -1.0).unwrap();
    assert_eq!(*changed.borrow(), vec![(1, 0)]);
}

#[test]
fn test_view_follows_undo() {
    let model = SessionModel::new("PlotModel");
    model.enable_undo(None);
    let view_model = ViewModel::default_view_model(&model);
    let root = ModelIndex::invalid();

    add_axes(&model, 2);
    assert_eq!(display_names(&view_model, &root), vec!["axis0", "axis1"]);

    model.undo().unwrap();
    assert_eq!(display_names(&view_model, &root), vec!["axis0"]);

    model.redo().unwrap();
    assert_eq!(display_names(&view_model, &root), vec!["axis0", "axis1"]);

    let first = model.top_items()[0].clone();
    first.set_display_name("renamed").unwrap();
    assert_eq!(display_names(&view_model, &root), vec!["renamed", "axis1"]);
    model.undo().unwrap();
    assert_eq!(display_names(&view_model, &root), vec!["axis0", "axis1"]);
}

#[test]
fn test_view_follows_json_load() {
    let source = SessionModel::new("PlotModel");
    add_axes(&source, 3);
    let json = JsonModelConverter::new().to_json(&source).unwrap();

    let target = SessionModel::new("PlotModel");
    let view_model = ViewModel::default_view_model(&target);
    let inserted = Rc::new(RefCell::new(0));
    let i = inserted.clone();
    view_model
        .signals()
        .rows_inserted
        .connect(move |(_, first, last)| *i.borrow_mut() += last - first + 1);

    JsonModelConverter::new().from_json(&json, &target).unwrap();
    assert_eq!(*inserted.borrow(), 3);
    assert_eq!(
        display_names(&view_model, &ModelIndex::invalid()),
        vec!["axis0", "axis1", "axis2"]
    );
}

#[test]
fn test_widget_edits_reach_the_table() {
    let model = SessionModel::new("PlotModel");
    let viewport = model
        .append_item(ViewportItem::builder(), &model.root_item(), "")
        .unwrap();
    let x_axis = ViewportItem::x_axis(&viewport).unwrap();

    let view_model = ViewModel::new(&model, AllChildrenStrategy, PropertiesRowStrategy::new());
    view_model.set_root_item(&viewport).unwrap();
    let root = ModelIndex::invalid();
    assert_eq!(view_model.row_count(&root), 2);

    let widget = PlotAxis::new();
    let controller = AxisPlotController::new(widget.clone());
    controller.set_item(Some(&x_axis)).unwrap();
    view_model.take_dirty();

    widget.set_range(2.0, 8.0);

    let min_index = view_model.index_of_item(&x_axis, 0);
    let max_index = view_model.index_of_item(&x_axis, 1);
    assert_eq!(view_model.take_dirty(), vec![min_index.clone(), max_index.clone()]);
    assert_eq!(
        view_model.data(&max_index, ViewRole::Display),
        Some(Variant::Double(8.0))
    );
}

#[test]
fn test_table_edits_reach_the_widget() {
    let model = SessionModel::new("PlotModel");
    let axis_item = add_axes(&model, 1).remove(0);
    let widget = PlotAxis::new();
    let controller = AxisPlotController::new(widget.clone());
    controller.set_item(Some(&axis_item)).unwrap();

    let view_model = ViewModel::property_table_view_model(&model);
    let max_index = view_model.index(0, 1, &ModelIndex::invalid());
    assert!(view_model
        .set_data(&max_index, Variant::Double(10.0), ViewRole::Edit)
        .unwrap());

    assert_eq!(widget.range().upper, 10.0);
}

#[test]
fn test_moving_top_items_reorders_rows() {
    let model = SessionModel::new("PlotModel");
    let axes = add_axes(&model, 3);
    let view_model = ViewModel::default_view_model(&model);
    let root = model.root_item();

    model.move_item(&axes[0], &root, TagRow::default_tag(2)).unwrap();
    assert_eq!(
        display_names(&view_model, &ModelIndex::invalid()),
        vec!["axis1", "axis2", "axis0"]
    );
    assert_eq!(view_model.index_of_item(&axes[0], 0).row(), 2);
}

#[test]
fn test_tooltip_role() {
    let model = SessionModel::new("PlotModel");
    let axis = add_axes(&model, 1).remove(0);
    let view_model = ViewModel::default_view_model(&model);
    let index = view_model.index_of_item(&axis, 0);

    assert_eq!(view_model.data(&index, ViewRole::ToolTip), None);
    axis.set_data(ItemDataRole::ToolTip, "Horizontal range")
        .unwrap();
    assert_eq!(
        view_model.data(&index, ViewRole::ToolTip),
        Some(Variant::String("Horizontal range".into()))
    );
    assert!(!view_model
        .set_data(&index, Variant::String("x".into()), ViewRole::ToolTip)
        .unwrap());
}
