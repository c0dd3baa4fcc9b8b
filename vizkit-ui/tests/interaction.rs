mod common;

use futures::executor::block_on;
use vizkit_core::zoom::ZoomTransform;
use vizkit_ui::{
    CalendarHeatmap, EventKind, FetchOutcome, GanttChart, MemoryDom, NodeId, PointerEvent,
    RenderOutcome, StackedBarChart, UiElement,
};

use common::{
    data_surface, mark_with_index, marks, overlays, ScriptedFetcher, GANTT_PAYLOAD,
    STACKED_PAYLOAD,
};

const GUTTER: f64 = 120.0;

fn gantt(dom: &MemoryDom, host: NodeId) -> GanttChart<MemoryDom, ScriptedFetcher> {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(200, GANTT_PAYLOAD);
    let chart = GanttChart::new(dom.clone(), fetcher, host, "api/tasks");
    assert_eq!(block_on(chart.obtain_datas()), FetchOutcome::Loaded(3));
    assert!(chart.render().is_drawn());
    chart
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("numeric attribute");
    assert!(
        (actual - expected).abs() < 1e-2,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn zoom_is_clamped_and_bars_follow_the_rescaled_axis() {
    let dom = MemoryDom::new();
    let host = dom.create_host(920.0, 0.0);
    let chart = gantt(&dom, host);
    let base = chart.base_scale().unwrap();

    let applied = chart
        .apply_zoom(ZoomTransform::new(50.0, -1200.0, 0.0))
        .unwrap();
    assert_eq!(applied.k, 20.0);
    assert_eq!(chart.transform(), applied);

    let scaled = applied.rescale_x(base.linear());
    let tasks = chart.core().records().clone();
    for (index, task) in tasks.iter().enumerate() {
        let bar = mark_with_index(&dom, host, index);
        let start = task.start.unwrap().timestamp_millis() as f64;
        let end = task.end.unwrap().timestamp_millis() as f64;
        assert_close(dom.number(bar, "x"), scaled.map(start));
        assert_close(dom.number(bar, "width"), scaled.map(end) - scaled.map(start));
    }

    let low = chart.apply_zoom(ZoomTransform::new(0.3, 0.0, 0.0)).unwrap();
    assert_eq!(low.k, 0.5);
}

#[test]
fn zoom_keeps_drawn_bars_after_records_change() {
    let dom = MemoryDom::new();
    let host = dom.create_host(920.0, 0.0);
    let chart = gantt(&dom, host);
    let base = chart.base_scale().unwrap();
    let drawn = chart.core().records().clone();

    let replacement = vizkit_data::gantt_tasks_from_str(
        r#"[{"label": "Later", "start": "2030-01-01", "end": "2030-06-01"}]"#,
        &vizkit_core::WidgetConfig::default(),
    )
    .unwrap();
    chart.set_datas(replacement);

    let applied = chart
        .apply_zoom(ZoomTransform::new(2.0, -50.0, 0.0))
        .unwrap();
    let scaled = applied.rescale_x(base.linear());
    for (index, task) in drawn.iter().enumerate() {
        let bar = mark_with_index(&dom, host, index);
        let start = task.start.unwrap().timestamp_millis() as f64;
        let end = task.end.unwrap().timestamp_millis() as f64;
        assert_close(dom.number(bar, "x"), scaled.map(start));
        assert_close(dom.number(bar, "width"), scaled.map(end) - scaled.map(start));
    }
}

#[test]
fn unparseable_date_draws_an_empty_bar_beside_valid_ones() {
    let dom = MemoryDom::new();
    let host = dom.create_host(800.0, 0.0);
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(
        200,
        r#"[{"label": "Valid", "start": "2024-03-01", "end": "2024-03-10"},
            {"label": "Broken", "start": "sometime soon", "end": "2024-03-05"}]"#,
    );
    let chart = GanttChart::new(dom.clone(), fetcher, host, "api/tasks");
    assert_eq!(block_on(chart.obtain_datas()), FetchOutcome::Loaded(2));
    assert_eq!(chart.render(), RenderOutcome::Drawn { marks: 2 });

    // 800 host minus the 120px label gutter
    let valid = mark_with_index(&dom, host, 0);
    assert_close(dom.number(valid, "x"), 0.0);
    assert_close(dom.number(valid, "width"), 680.0);
    let broken = mark_with_index(&dom, host, 1);
    assert_close(dom.number(broken, "width"), 0.0);
    assert!(dom.number(broken, "x").is_some_and(f64::is_finite));
}

#[test]
fn wheel_zooms_around_the_pointer() {
    let dom = MemoryDom::new();
    let host = dom.create_host(920.0, 0.0);
    let chart = gantt(&dom, host);
    let surface = data_surface(&dom, host);

    let wheel = PointerEvent {
        local_x: GUTTER + 100.0,
        delta_y: -500.0,
        ..PointerEvent::default()
    };
    dom.dispatch(surface, EventKind::Wheel, wheel);

    let transform = chart.transform();
    assert!((transform.k - 2.0).abs() < 1e-9);
    assert!((transform.x + 100.0).abs() < 1e-9);
}

#[test]
fn drag_pans_the_time_axis() {
    let dom = MemoryDom::new();
    let host = dom.create_host(920.0, 0.0);
    let chart = gantt(&dom, host);
    let surface = data_surface(&dom, host);
    let first = mark_with_index(&dom, host, 0);
    let x_before = dom.number(first, "x").unwrap();

    dom.dispatch(surface, EventKind::PointerDown, PointerEvent::at(200.0, 40.0));
    dom.dispatch(surface, EventKind::PointerMove, PointerEvent::at(260.0, 40.0));
    dom.dispatch(surface, EventKind::PointerUp, PointerEvent::at(260.0, 40.0));
    dom.dispatch(surface, EventKind::PointerMove, PointerEvent::at(400.0, 40.0));

    assert_eq!(chart.transform(), ZoomTransform::new(1.0, 60.0, 0.0));
    assert_close(dom.number(first, "x"), x_before + 60.0);
}

#[test]
fn clicking_a_bar_toggles_its_tooltip() {
    let dom = MemoryDom::new();
    let host = dom.create_host(920.0, 0.0);
    let _chart = gantt(&dom, host);
    let bar = mark_with_index(&dom, host, 1);

    dom.dispatch(bar, EventKind::Click, PointerEvent::at(300.0, 80.0));
    let tooltips = overlays(&dom, "vizkit-tooltip");
    assert_eq!(tooltips.len(), 1);
    assert_eq!(
        dom.attribute(tooltips[0], "style").as_deref(),
        Some("left:312px;top:92px")
    );
    let title = dom.find_by_class(tooltips[0], "vizkit-overlay-title")[0];
    assert_eq!(dom.text(title), "Build");

    dom.dispatch(bar, EventKind::Click, PointerEvent::at(300.0, 80.0));
    assert!(overlays(&dom, "vizkit-tooltip").is_empty());
}

#[test]
fn clicking_elsewhere_closes_the_tooltip() {
    let dom = MemoryDom::new();
    let host = dom.create_host(920.0, 0.0);
    let _chart = gantt(&dom, host);
    let bar = mark_with_index(&dom, host, 0);

    dom.dispatch(bar, EventKind::Click, PointerEvent::at(10.0, 10.0));
    assert_eq!(overlays(&dom, "vizkit-tooltip").len(), 1);
    dom.dispatch(dom.body_id(), EventKind::Click, PointerEvent::default());
    assert!(overlays(&dom, "vizkit-tooltip").is_empty());
}

#[test]
fn hover_emphasizes_and_leave_restores() {
    let dom = MemoryDom::new();
    let host = dom.create_host(920.0, 0.0);
    let _chart = gantt(&dom, host);
    let bar = mark_with_index(&dom, host, 2);

    dom.dispatch(bar, EventKind::PointerEnter, PointerEvent::default());
    assert!(dom.attribute(bar, "stroke").is_some());

    dom.dispatch(bar, EventKind::Click, PointerEvent::default());
    dom.dispatch(bar, EventKind::PointerLeave, PointerEvent::default());
    assert!(dom.attribute(bar, "stroke").is_none());
    assert!(overlays(&dom, "vizkit-tooltip").is_empty());
}

#[test]
fn stacked_bars_order_rows_by_total() {
    let dom = MemoryDom::new();
    let host = dom.create_host(620.0, 0.0);
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(200, STACKED_PAYLOAD);
    let chart = StackedBarChart::new(dom.clone(), fetcher, host, "api/survey");
    block_on(chart.obtain_datas());
    assert_eq!(chart.render(), RenderOutcome::Drawn { marks: 3 });

    let labels: Vec<String> = dom
        .find_by_class(host, "vizkit-row-label")
        .into_iter()
        .map(|node| dom.text(node))
        .collect();
    assert_eq!(labels, vec!["A", "B"]);

    // content width 500 over a 0..30 domain
    let second = mark_with_index(&dom, host, 1);
    assert_close(dom.number(second, "x"), 500.0 / 3.0);
    assert_close(dom.number(second, "width"), 1000.0 / 3.0);
    let totals: Vec<String> = dom
        .find_by_class(host, "vizkit-total")
        .into_iter()
        .map(|node| dom.text(node))
        .collect();
    assert_eq!(totals, vec!["30", "10"]);
}

#[test]
fn segment_modal_shows_share_and_closes_on_backdrop() {
    let dom = MemoryDom::new();
    let host = dom.create_host(620.0, 0.0);
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(200, STACKED_PAYLOAD);
    let chart = StackedBarChart::new(dom.clone(), fetcher, host, "api/survey");
    block_on(chart.obtain_datas());
    chart.render();

    let segment = mark_with_index(&dom, host, 1);
    dom.dispatch(segment, EventKind::Click, PointerEvent::at(200.0, 40.0));
    let panels = overlays(&dom, "vizkit-modal");
    assert_eq!(panels.len(), 1);
    let values: Vec<String> = dom
        .descendants(panels[0])
        .into_iter()
        .filter(|node| dom.tag(*node).as_deref() == Some("strong"))
        .map(|node| dom.text(node))
        .collect();
    assert!(values.contains(&"66.7%".to_string()), "{values:?}");
    let description = dom.find_by_class(panels[0], "vizkit-overlay-description")[0];
    assert_eq!(dom.text(description), "second");

    dom.dispatch(panels[0], EventKind::Click, PointerEvent::default());
    assert!(chart.core().has_overlay());

    let backdrop = overlays(&dom, "vizkit-modal-backdrop")[0];
    dom.dispatch(backdrop, EventKind::Click, PointerEvent::default());
    assert!(!chart.core().has_overlay());
    assert!(overlays(&dom, "vizkit-modal-backdrop").is_empty());
}

#[test]
fn calendar_draws_every_day_and_colors_known_ones() {
    let dom = MemoryDom::new();
    // 32px gutter plus 54 weeks of 10px cells
    let host = dom.create_host(572.0, 0.0);
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(
        200,
        r##"[{"date": "2024-03-09", "value": 4, "label": "Deploys", "color": "#FF0000"},
             {"date": "not a date", "value": 1}]"##,
    );
    let chart = CalendarHeatmap::new(dom.clone(), fetcher.clone(), host, "api/events", 2024);
    assert_eq!(block_on(chart.obtain_datas()), FetchOutcome::Loaded(2));
    assert_eq!(fetcher.urls(), vec!["/api/events?year=2024".to_string()]);
    assert_eq!(chart.render(), RenderOutcome::Drawn { marks: 366 });

    let cell = |date: &str| {
        marks(&dom, host)
            .into_iter()
            .find(|node| dom.attribute(*node, "data-date").as_deref() == Some(date))
            .expect("cell for date")
    };
    assert_eq!(dom.attribute(cell("2024-03-09"), "fill").as_deref(), Some("#ff0000"));
    assert_eq!(dom.attribute(cell("2024-03-10"), "fill").as_deref(), Some("#ebedf0"));

    // 2024-01-01 is a Monday, so the first Sunday opens the second column
    let jan1 = dom.number(cell("2024-01-01"), "x").unwrap();
    assert_close(dom.number(cell("2024-01-07"), "x"), jan1 + 10.0);
    assert_close(dom.number(cell("2024-01-06"), "x"), jan1);

    dom.dispatch(cell("2024-03-10"), EventKind::Click, PointerEvent::default());
    assert!(overlays(&dom, "vizkit-tooltip").is_empty());
    dom.dispatch(cell("2024-03-09"), EventKind::Click, PointerEvent::default());
    assert_eq!(overlays(&dom, "vizkit-tooltip").len(), 1);
}

#[test]
fn wide_calendar_stays_under_the_height_cap() {
    let dom = MemoryDom::new();
    let host = dom.create_host(6000.0, 0.0);
    let fetcher = ScriptedFetcher::new();
    let chart = CalendarHeatmap::new(dom.clone(), fetcher, host, "api/events", 2024);
    assert_eq!(chart.render(), RenderOutcome::Drawn { marks: 366 });

    let root = dom.children(host)[0];
    let svg = dom.children(root)[0];
    let height = dom.number(svg, "height").unwrap();
    assert!(height <= 768.0, "calendar height {height}");

    let bottom = marks(&dom, host)
        .into_iter()
        .filter_map(|cell| Some(dom.number(cell, "y")? + dom.number(cell, "height")?))
        .fold(0.0, f64::max);
    // marks sit under the 30px header
    assert!(30.0 + bottom <= height + 1e-2, "cells reach {bottom}");
}

#[test]
fn next_year_fetches_once_and_renders_twice() {
    let dom = MemoryDom::new();
    let host = dom.create_host(572.0, 0.0);
    let fetcher = ScriptedFetcher::new();
    let chart = CalendarHeatmap::new(dom.clone(), fetcher.clone(), host, "api/events", 2024);
    chart.render();
    assert_eq!(chart.core().generation(), 1);

    assert_eq!(block_on(chart.next_year()), FetchOutcome::Loaded(0));
    assert_eq!(chart.year(), 2025);
    assert_eq!(fetcher.urls(), vec!["/api/events?year=2025".to_string()]);
    assert_eq!(chart.core().generation(), 3);
    assert_eq!(marks(&dom, host).len(), 365);
    assert_eq!(dom.children(host).len(), 1);

    assert_eq!(block_on(chart.previous_year()), FetchOutcome::Loaded(0));
    assert_eq!(chart.year(), 2024);
    assert_eq!(marks(&dom, host).len(), 366);
}
