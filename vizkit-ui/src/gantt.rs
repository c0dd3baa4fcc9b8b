//! Gantt chart: one row per task label, bars on a time axis that zooms and pans.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use futures::future::{FutureExt, LocalBoxFuture};
use tracing::debug;
use vizkit_core::dimensions::{Dimensions, LayoutKind};
use vizkit_core::geometry::Rect;
use vizkit_core::scale::{BandScale, TimeScale};
use vizkit_core::zoom::ZoomTransform;
use vizkit_core::{GanttTask, WidgetConfig, WidgetKind};
use vizkit_data::gantt_tasks_from_value;

use crate::axis::draw_time_axis;
use crate::dom::{
    coord, Dom, DomError, ElementSpec, EventKind, Handler, PointerEvent, Propagation, Subtree,
};
use crate::fetch::{endpoint, Fetch, FetchOutcome};
use crate::frame::row_frame;
use crate::overlay::OverlayContent;
use crate::widget::{MarkClick, RenderOutcome, UiElement, WidgetCore};

/// Wheel delta (pixels) to zoom exponent.
const WHEEL_SENSITIVITY: f64 = 0.002;
const BAR_RADIUS: f64 = 3.0;

pub struct GanttChart<D: Dom, F: Fetch> {
    inner: Rc<GanttInner<D, F>>,
}

impl<D: Dom, F: Fetch> Clone for GanttChart<D, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct GanttInner<D: Dom, F: Fetch> {
    core: Rc<WidgetCore<D, F, GanttTask>>,
    view: RefCell<Option<GanttView<D>>>,
}

/// Live state of the mounted chart, needed to redraw on zoom.
struct GanttView<D: Dom> {
    base: TimeScale,
    transform: ZoomTransform,
    axis: D::Node,
    bars: Vec<DrawnBar<D>>,
    drag_from: Option<f64>,
}

/// Bar node plus the instants it was drawn from.
struct DrawnBar<D: Dom> {
    node: D::Node,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl<D: Dom, F: Fetch> GanttChart<D, F> {
    pub fn new(dom: D, fetcher: F, container: D::Node, prefix: impl Into<String>) -> Self {
        Self::with_config(dom, fetcher, container, prefix, WidgetConfig::default())
    }

    pub fn with_config(
        dom: D,
        fetcher: F,
        container: D::Node,
        prefix: impl Into<String>,
        config: WidgetConfig,
    ) -> Self {
        let core = WidgetCore::new(WidgetKind::Gantt, dom, fetcher, container, prefix, config);
        Self {
            inner: Rc::new(GanttInner {
                core: Rc::new(core),
                view: RefCell::new(None),
            }),
        }
    }

    pub fn core(&self) -> &WidgetCore<D, F, GanttTask> {
        &self.inner.core
    }

    /// Current zoom; identity until the user zooms or pans.
    pub fn transform(&self) -> ZoomTransform {
        self.inner
            .view
            .borrow()
            .as_ref()
            .map_or(ZoomTransform::IDENTITY, |view| view.transform)
    }

    /// Unzoomed time scale of the mounted chart.
    pub fn base_scale(&self) -> Option<TimeScale> {
        self.inner.view.borrow().as_ref().map(|view| view.base)
    }

    /// Clamps `transform` to the zoom extent, then repositions the axis and every bar.
    /// `None` when nothing is mounted.
    pub fn apply_zoom(&self, transform: ZoomTransform) -> Option<ZoomTransform> {
        self.inner.apply_zoom(transform)
    }
}

impl<D: Dom, F: Fetch> GanttInner<D, F> {
    fn render(self: &Rc<Self>) -> RenderOutcome {
        let band = BandScale::new(
            self.core.records().iter().map(|task| task.label.clone()),
            (0.0, 0.0),
            self.core.config().band_padding,
        );
        let dims = match self.core.prepare(LayoutKind::Rows(band.len())) {
            Ok(dims) => dims,
            Err(reason) => return RenderOutcome::Skipped(reason),
        };

        let mut tree = self.core.begin();
        let previous = self.view.borrow_mut().take();
        drop(previous);

        let band = band.with_range((0.0, dims.content_height));
        match self.build(&mut tree, &dims, &band) {
            Ok(view) => {
                let marks = view.bars.len();
                *self.view.borrow_mut() = Some(view);
                self.core.commit(tree, marks)
            }
            Err(err) => {
                drop(tree);
                self.core.abandon(err)
            }
        }
    }

    fn build(
        self: &Rc<Self>,
        tree: &mut Subtree<D>,
        dims: &Dimensions,
        band: &BandScale,
    ) -> Result<GanttView<D>, DomError> {
        let dom = self.core.dom();
        let config = self.core.config();
        let frame = row_frame(dom, tree, self.core.container(), "vizkit-gantt", dims, band)?;

        let records = self.core.records();
        let base = time_domain(&records, (0.0, dims.content_width));
        draw_time_axis(dom, &frame.axis, &base, config.tick_count)?;

        let mut bars = Vec::with_capacity(records.len());
        for (index, task) in records.iter().enumerate() {
            let y = band.position(&task.label).unwrap_or(f64::NAN);
            let rect = Rect::span(
                base.map_opt(task.start),
                base.map_opt(task.end),
                y,
                band.bandwidth(),
            );
            let bar = ElementSpec::new("rect")
                .class("vizkit-mark")
                .attr("x", coord(rect.x))
                .attr("y", coord(rect.y))
                .attr("width", coord(rect.width))
                .attr("height", coord(rect.height))
                .attr("rx", BAR_RADIUS)
                .attr("fill", &task.color)
                .attr("data-index", index)
                .append_to(dom, &frame.marks)?;
            self.core
                .wire_mark(tree, &bar, index, MarkClick::Tooltip(task_content(task)))?;
            bars.push(DrawnBar {
                node: bar,
                start: task.start,
                end: task.end,
            });
        }
        drop(records);

        self.wire_zoom(tree, &frame.surface, dims.gutter())?;
        self.core.wire_document(tree)?;

        Ok(GanttView {
            base,
            transform: ZoomTransform::IDENTITY,
            axis: frame.axis,
            bars,
            drag_from: None,
        })
    }

    fn wire_zoom(
        self: &Rc<Self>,
        tree: &mut Subtree<D>,
        surface: &D::Node,
        gutter: f64,
    ) -> Result<(), DomError> {
        tree.listen(
            surface,
            EventKind::Wheel,
            self.handler(move |inner, event| {
                let factor = 2f64.powf(-event.delta_y * WHEEL_SENSITIVITY);
                let current = inner.current_transform();
                let next = current.scale_around(
                    factor,
                    event.local_x - gutter,
                    inner.core.config().zoom_extent,
                );
                inner.apply_zoom(next);
                Propagation::Stop
            }),
        )?;
        tree.listen(
            surface,
            EventKind::PointerDown,
            self.handler(|inner, event| {
                inner.set_drag(Some(event.client_x));
                Propagation::Continue
            }),
        )?;
        tree.listen(
            surface,
            EventKind::PointerMove,
            self.handler(|inner, event| {
                let from = inner.view.borrow().as_ref().and_then(|view| view.drag_from);
                if let Some(from) = from {
                    inner.set_drag(Some(event.client_x));
                    let next = inner.current_transform().translate_by(event.client_x - from, 0.0);
                    inner.apply_zoom(next);
                }
                Propagation::Continue
            }),
        )?;
        for kind in [EventKind::PointerUp, EventKind::PointerLeave] {
            tree.listen(
                surface,
                kind,
                self.handler(|inner, _| {
                    inner.set_drag(None);
                    Propagation::Continue
                }),
            )?;
        }
        Ok(())
    }

    fn handler<H>(self: &Rc<Self>, f: H) -> Handler
    where
        H: Fn(&GanttInner<D, F>, &PointerEvent) -> Propagation + 'static,
    {
        let weak = Rc::downgrade(self);
        Rc::new(move |event: &PointerEvent| match weak.upgrade() {
            Some(inner) => f(&inner, event),
            None => Propagation::Continue,
        })
    }

    fn current_transform(&self) -> ZoomTransform {
        self.view
            .borrow()
            .as_ref()
            .map_or(ZoomTransform::IDENTITY, |view| view.transform)
    }

    fn set_drag(&self, from: Option<f64>) {
        if let Some(view) = self.view.borrow_mut().as_mut() {
            view.drag_from = from;
        }
    }

    fn apply_zoom(&self, transform: ZoomTransform) -> Option<ZoomTransform> {
        let mut slot = self.view.borrow_mut();
        let view = slot.as_mut()?;
        let dom = self.core.dom();
        let config = self.core.config();

        let transform = transform.constrained(config.zoom_extent);
        view.transform = transform;
        let scale = TimeScale::from_linear(transform.rescale_x(view.base.linear()));
        if let Err(err) = draw_time_axis(dom, &view.axis, &scale, config.tick_count) {
            debug!(error = %err, "axis redraw failed");
        }

        for (index, bar) in view.bars.iter().enumerate() {
            let rect = Rect::span(scale.map_opt(bar.start), scale.map_opt(bar.end), 0.0, 0.0);
            let result = dom
                .set_attribute(&bar.node, "x", &coord(rect.x))
                .and_then(|_| dom.set_attribute(&bar.node, "width", &coord(rect.width)));
            if let Err(err) = result {
                debug!(index, error = %err, "bar reposition failed");
            }
        }
        Some(transform)
    }
}

impl<D: Dom, F: Fetch> UiElement for GanttChart<D, F> {
    type Record = GanttTask;

    fn obtain_datas(&self) -> LocalBoxFuture<'_, FetchOutcome> {
        async move {
            let url = endpoint(&self.inner.core.source(), &[]);
            self.inner.core.acquire(url, gantt_tasks_from_value).await
        }
        .boxed_local()
    }

    fn set_datas(&self, records: Vec<GanttTask>) {
        self.inner.core.set_records(records);
    }

    fn render(&self) -> RenderOutcome {
        self.inner.render()
    }

    fn destroy(&self) {
        let previous = self.inner.view.borrow_mut().take();
        drop(previous);
        self.inner.core.destroy();
    }
}

/// Earliest start to latest end. An empty chart spans the next day; a single instant
/// is widened by a day so the axis stays readable.
fn time_domain(tasks: &[GanttTask], range: (f64, f64)) -> TimeScale {
    let instants = tasks.iter().flat_map(|task| [task.start, task.end]).flatten();
    let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for at in instants {
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(at), hi.max(at)),
            None => (at, at),
        });
    }
    let (start, mut end) = bounds.unwrap_or_else(|| {
        let now = Utc::now();
        (now, now)
    });
    if end <= start {
        end = start + Duration::days(1);
    }
    TimeScale::new(start, end, range)
}

fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "--".to_string())
}

fn task_content(task: &GanttTask) -> OverlayContent {
    OverlayContent::new(task.label.as_str())
        .row("Category", task.category.as_str())
        .row("Start", format_timestamp(task.start))
        .row("End", format_timestamp(task.end))
        .description(task.description.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(label: &str, start: (u32, u32), end: (u32, u32)) -> GanttTask {
        GanttTask {
            label: label.to_string(),
            start: Utc.with_ymd_and_hms(2024, start.0, start.1, 0, 0, 0).single(),
            end: Utc.with_ymd_and_hms(2024, end.0, end.1, 0, 0, 0).single(),
            ..GanttTask::default()
        }
    }

    #[test]
    fn domain_spans_earliest_start_to_latest_end() {
        let tasks = vec![task("a", (3, 1), (3, 10)), task("b", (2, 15), (4, 1))];
        let scale = time_domain(&tasks, (0.0, 100.0));
        assert_eq!(scale.map_opt(tasks[1].start), 0.0);
        assert_eq!(scale.map_opt(tasks[1].end), 100.0);
    }

    #[test]
    fn collapsed_domain_is_widened() {
        let tasks = vec![task("a", (3, 1), (3, 1))];
        let scale = time_domain(&tasks, (0.0, 100.0));
        let start = tasks[0].start.unwrap();
        assert_eq!(scale.map(start), 0.0);
        assert_eq!(scale.map(start + Duration::days(1)), 100.0);
    }

    #[test]
    fn missing_timestamps_show_placeholder() {
        assert_eq!(format_timestamp(None), "--");
        let content = task_content(&GanttTask::default());
        assert_eq!(content.rows[1], ("Start".to_string(), "--".to_string()));
    }
}
