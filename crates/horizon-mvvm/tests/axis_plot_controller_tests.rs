//! Tests for keeping plot axes and viewport axis items in sync.

use std::cell::RefCell;
use std::rc::Rc;

use horizon_mvvm::model::{SessionModel, TagRow, ViewportAxisItem, ViewportItem};
use horizon_mvvm::plotting::{
    AxisAccessor, AxisPlotController, AxisRange, PlotAxis, PlotCanvas, PlotWidget, ScaleType,
};
use horizon_mvvm::{ItemListener, SessionItem, SubscriberId};

/// Counts range changes reported by a widget axis.
fn count_range_changes(axis: &PlotAxis) -> Rc<RefCell<usize>> {
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    axis.range_changed().connect(move |_| *c.borrow_mut() += 1);
    count
}

/// Records the names of properties changed on an item.
fn record_property_changes(item: &SessionItem) -> Rc<RefCell<Vec<String>>> {
    let names = Rc::new(RefCell::new(Vec::new()));
    let n = names.clone();
    item.mapper().unwrap().set_on_property_change(
        move |_, name| n.borrow_mut().push(name.to_string()),
        SubscriberId::next(),
    );
    names
}

fn add_axis(model: &SessionModel, min: f64, max: f64) -> SessionItem {
    model
        .append_item(
            ViewportAxisItem::with_range(min, max),
            &model.root_item(),
            "",
        )
        .unwrap()
}

#[test]
fn test_initial_state() {
    let canvas = PlotCanvas::new();
    let controller = AxisPlotController::for_plot(&canvas, AxisAccessor::X);

    assert!(controller.current_item().is_none());
    assert_eq!(canvas.x_axis().range(), AxisRange::new(0.0, 5.0));
}

#[test]
fn test_set_item_syncs_only_the_selected_axis() {
    let model = SessionModel::new("PlotModel");
    let item = model
        .append_item(ViewportAxisItem::builder(), &model.root_item(), "")
        .unwrap();
    let canvas = PlotCanvas::new();
    let x_changes = count_range_changes(&canvas.x_axis());
    let y_changes = count_range_changes(&canvas.y_axis());

    let controller = AxisPlotController::for_plot(&canvas, AxisAccessor::X);
    controller.set_item(Some(&item)).unwrap();

    assert_eq!(*x_changes.borrow(), 1);
    assert_eq!(*y_changes.borrow(), 0);
    assert_eq!(canvas.x_axis().range(), AxisRange::new(0.0, 1.0));
    assert_eq!(canvas.x_axis().scale_type(), ScaleType::Linear);
}

#[test]
fn test_widget_range_change_updates_item() {
    let model = SessionModel::new("PlotModel");
    let item = add_axis(&model, 0.0, 1.0);
    let canvas = PlotCanvas::new();
    let controller = AxisPlotController::for_plot(&canvas, AxisAccessor::X);
    controller.set_item(Some(&item)).unwrap();
    let changes = record_property_changes(&item);

    canvas.x_axis().set_range(1.0, 2.0);

    assert_eq!(*changes.borrow(), vec!["min", "max"]);
    assert_eq!(item.property::<f64>(ViewportAxisItem::MIN).unwrap(), 1.0);
    assert_eq!(item.property::<f64>(ViewportAxisItem::MAX).unwrap(), 2.0);
}

#[test]
fn test_item_range_change_updates_widget() {
    let model = SessionModel::new("PlotModel");
    let item = add_axis(&model, 0.0, 1.0);
    let canvas = PlotCanvas::new();
    let controller = AxisPlotController::for_plot(&canvas, AxisAccessor::X);
    controller.set_item(Some(&item)).unwrap();
    let widget_changes = count_range_changes(&canvas.x_axis());
    let property_changes = record_property_changes(&item);

    item.set_property(ViewportAxisItem::MIN, 1.0).unwrap();
    item.set_property(ViewportAxisItem::MAX, 2.0).unwrap();

    assert_eq!(*widget_changes.borrow(), 2);
    assert_eq!(canvas.x_axis().range(), AxisRange::new(1.0, 2.0));
    // No write back into the item.
    assert_eq!(*property_changes.borrow(), vec!["min", "max"]);
}

#[test]
fn test_log_scale_follows_item() {
    let model = SessionModel::new("PlotModel");
    let item = add_axis(&model, 1.0, 100.0);
    let canvas = PlotCanvas::new();
    let controller = AxisPlotController::for_plot(&canvas, AxisAccessor::X);
    controller.set_item(Some(&item)).unwrap();

    item.set_property(ViewportAxisItem::IS_LOG, true).unwrap();
    assert_eq!(canvas.x_axis().scale_type(), ScaleType::Logarithmic);

    item.set_property(ViewportAxisItem::IS_LOG, false).unwrap();
    assert_eq!(canvas.x_axis().scale_type(), ScaleType::Linear);
}

#[test]
fn test_y_axis_controller() {
    let model = SessionModel::new("PlotModel");
    let viewport = model
        .append_item(ViewportItem::builder(), &model.root_item(), "")
        .unwrap();
    let y_item = ViewportItem::y_axis(&viewport).unwrap();
    y_item.set_property(ViewportAxisItem::MAX, 3.0).unwrap();

    let canvas = PlotCanvas::new();
    let controller = AxisPlotController::for_plot(&canvas, AxisAccessor::Y);
    controller.set_item(Some(&y_item)).unwrap();
    assert_eq!(canvas.y_axis().range(), AxisRange::new(0.0, 3.0));
    assert_eq!(canvas.x_axis().range(), AxisRange::new(0.0, 5.0));

    canvas.y_axis().set_range(-1.0, 1.0);
    assert_eq!(y_item.property::<f64>(ViewportAxisItem::MIN).unwrap(), -1.0);

    let x_item = ViewportItem::x_axis(&viewport).unwrap();
    assert_eq!(x_item.property::<f64>(ViewportAxisItem::MIN).unwrap(), 0.0);
}

#[test]
fn test_one_controller_two_items() {
    let model = SessionModel::new("PlotModel");
    let first = add_axis(&model, 1.0, 2.0);
    let second = add_axis(&model, 10.0, 20.0);
    let axis = PlotAxis::new();
    let controller = AxisPlotController::new(axis.clone());

    controller.set_item(Some(&first)).unwrap();
    let widget_changes = count_range_changes(&axis);
    controller.set_item(Some(&second)).unwrap();
    assert_eq!(*widget_changes.borrow(), 1);
    assert_eq!(axis.range(), AxisRange::new(10.0, 20.0));

    // The first item no longer drives the widget.
    first.set_property(ViewportAxisItem::MIN, 0.5).unwrap();
    assert_eq!(axis.range(), AxisRange::new(10.0, 20.0));

    // And the widget no longer writes into it.
    axis.set_range(100.0, 200.0);
    assert_eq!(first.property::<f64>(ViewportAxisItem::MIN).unwrap(), 0.5);
    assert_eq!(second.property::<f64>(ViewportAxisItem::MIN).unwrap(), 100.0);
    assert_eq!(second.property::<f64>(ViewportAxisItem::MAX).unwrap(), 200.0);

    // Rebinding to the same item changes nothing.
    controller.set_item(Some(&second)).unwrap();
    assert_eq!(*widget_changes.borrow(), 2);
}

#[test]
fn test_rebinding_after_previous_item_destroyed() {
    let model = SessionModel::new("PlotModel");
    let first = add_axis(&model, 1.0, 2.0);
    let second = add_axis(&model, 3.0, 4.0);
    let axis = PlotAxis::new();
    let controller = AxisPlotController::new(axis.clone());
    controller.set_item(Some(&first)).unwrap();

    model.remove_item(&model.root_item(), TagRow::default_tag(0)).unwrap();
    assert!(controller.current_item().is_none());

    controller.set_item(Some(&second)).unwrap();
    assert_eq!(axis.range(), AxisRange::new(3.0, 4.0));
    second.set_property(ViewportAxisItem::MAX, 5.0).unwrap();
    assert_eq!(axis.range().upper, 5.0);
}

#[test]
fn test_removed_items_and_dropped_controller() {
    let model = SessionModel::new("PlotModel");
    let first = add_axis(&model, 1.0, 2.0);
    let _second = add_axis(&model, 3.0, 4.0);
    let axis = PlotAxis::new();
    let controller = AxisPlotController::new(axis.clone());
    controller.set_item(Some(&first)).unwrap();

    let root = model.root_item();
    model.remove_item(&root, TagRow::default_tag(0)).unwrap();
    model.remove_item(&root, TagRow::default_tag(0)).unwrap();
    assert!(!first.is_alive());
    assert_eq!(axis.range_changed().connection_count(), 0);

    // Nothing left to write into.
    axis.set_range(7.0, 8.0);
    assert_eq!(axis.range(), AxisRange::new(7.0, 8.0));

    drop(controller);
    axis.set_range(9.0, 10.0);
}

#[test]
fn test_drop_disconnects_widget() {
    let model = SessionModel::new("PlotModel");
    let item = add_axis(&model, 1.0, 2.0);
    let axis = PlotAxis::new();
    {
        let controller = AxisPlotController::new(axis.clone());
        controller.set_item(Some(&item)).unwrap();
        assert_eq!(axis.range_changed().connection_count(), 1);
    }
    assert_eq!(axis.range_changed().connection_count(), 0);

    axis.set_range(3.0, 4.0);
    assert_eq!(item.property::<f64>(ViewportAxisItem::MIN).unwrap(), 1.0);
    item.set_property(ViewportAxisItem::MAX, 9.0).unwrap();
    assert_eq!(axis.range(), AxisRange::new(3.0, 4.0));
}

#[test]
fn test_end_to_end_sync() {
    let model = SessionModel::new("PlotModel");
    let item = add_axis(&model, 1.0, 2.0);
    let changes = record_property_changes(&item);
    let axis = PlotAxis::new();
    let controller = AxisPlotController::new(axis.clone());

    controller.set_item(Some(&item)).unwrap();
    assert_eq!(axis.range(), AxisRange::new(1.0, 2.0));
    assert!(changes.borrow().is_empty());

    axis.set_range(5.0, 6.0);
    assert_eq!(item.property::<f64>(ViewportAxisItem::MIN).unwrap(), 5.0);
    assert_eq!(item.property::<f64>(ViewportAxisItem::MAX).unwrap(), 6.0);
    assert_eq!(*changes.borrow(), vec!["min", "max"]);
}

#[test]
fn test_setting_current_value_is_silent() {
    let model = SessionModel::new("PlotModel");
    let item = add_axis(&model, 1.0, 2.0);
    let axis = PlotAxis::new();
    let controller = AxisPlotController::new(axis.clone());
    controller.set_item(Some(&item)).unwrap();
    let widget_changes = count_range_changes(&axis);
    let property_changes = record_property_changes(&item);

    assert!(!item.set_property(ViewportAxisItem::MIN, 1.0).unwrap());
    axis.set_range(1.0, 2.0);

    assert_eq!(*widget_changes.borrow(), 0);
    assert!(property_changes.borrow().is_empty());
}

#[test]
fn test_widget_change_of_one_bound_writes_one_property() {
    let model = SessionModel::new("PlotModel");
    let item = add_axis(&model, 1.0, 2.0);
    let axis = PlotAxis::new();
    let controller = AxisPlotController::new(axis.clone());
    controller.set_item(Some(&item)).unwrap();
    let property_changes = record_property_changes(&item);

    axis.set_range_upper(4.0);
    assert_eq!(*property_changes.borrow(), vec!["max"]);
}

#[test]
fn test_unbind() {
    let model = SessionModel::new("PlotModel");
    let item = add_axis(&model, 1.0, 2.0);
    let axis = PlotAxis::new();
    let controller = AxisPlotController::new(axis.clone());
    controller.set_item(Some(&item)).unwrap();

    controller.set_item(None).unwrap();
    assert!(controller.current_item().is_none());
    assert_eq!(axis.range_changed().connection_count(), 0);
    assert_eq!(
        item.mapper()
            .unwrap()
            .subscription_count(controller.listener().owner()),
        0
    );
}
