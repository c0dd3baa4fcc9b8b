//! Stacked horizontal bars: one bar per label, one segment per record, detail in a modal.

use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use vizkit_core::dimensions::{Dimensions, LayoutKind};
use vizkit_core::geometry::Rect;
use vizkit_core::scale::{BandScale, LinearScale};
use vizkit_core::stack::{stack_layout, StackLayout, StackSegment};
use vizkit_core::{format_numeric, StackedBarRecord, WidgetConfig, WidgetKind};
use vizkit_data::stacked_bars_from_value;

use crate::axis::draw_linear_axis;
use crate::dom::{coord, Dom, DomError, ElementSpec, Subtree};
use crate::fetch::{endpoint, Fetch, FetchOutcome};
use crate::frame::row_frame;
use crate::overlay::OverlayContent;
use crate::widget::{MarkClick, RenderOutcome, UiElement, WidgetCore};

const TOTAL_OFFSET: f64 = 4.0;

pub struct StackedBarChart<D: Dom, F: Fetch> {
    core: Rc<WidgetCore<D, F, StackedBarRecord>>,
}

impl<D: Dom, F: Fetch> Clone for StackedBarChart<D, F> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<D: Dom, F: Fetch> StackedBarChart<D, F> {
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
        let core = WidgetCore::new(
            WidgetKind::StackedBar,
            dom,
            fetcher,
            container,
            prefix,
            config,
        );
        Self {
            core: Rc::new(core),
        }
    }

    pub fn core(&self) -> &WidgetCore<D, F, StackedBarRecord> {
        &self.core
    }

    fn build(
        &self,
        tree: &mut Subtree<D>,
        dims: &Dimensions,
        layout: &StackLayout,
        band: &BandScale,
    ) -> Result<usize, DomError> {
        let dom = self.core.dom();
        let config = self.core.config();
        let frame = row_frame(
            dom,
            tree,
            self.core.container(),
            "vizkit-stacked-bar",
            dims,
            band,
        )?;

        let max = layout.max_total();
        let x = LinearScale::new(
            (0.0, if max > 0.0 { max } else { 1.0 }),
            (0.0, dims.content_width),
        );
        draw_linear_axis(dom, &frame.axis, &x, config.tick_count)?;

        let records = self.core.records();
        for segment in &layout.segments {
            let Some(record) = records.get(segment.index) else {
                continue;
            };
            let y = band.position(&segment.label).unwrap_or(f64::NAN);
            let rect = Rect::span(x.map(segment.from), x.map(segment.to), y, band.bandwidth());
            let node = ElementSpec::new("rect")
                .class("vizkit-mark")
                .attr("x", coord(rect.x))
                .attr("y", coord(rect.y))
                .attr("width", coord(rect.width))
                .attr("height", coord(rect.height))
                .attr("fill", &record.color)
                .attr("data-index", segment.index)
                .append_to(dom, &frame.marks)?;
            let content = segment_content(layout, segment, record);
            self.core
                .wire_mark(tree, &node, segment.index, MarkClick::Modal(content))?;
        }
        drop(records);

        let half = band.bandwidth() / 2.0;
        for (label, total) in &layout.totals {
            let Some(y) = band.position(label) else {
                continue;
            };
            ElementSpec::new("text")
                .class("vizkit-total")
                .attr("x", coord(x.map(*total) + TOTAL_OFFSET))
                .attr("y", coord(y + half))
                .attr("dominant-baseline", "middle")
                .text(format_numeric(*total))
                .append_to(dom, &frame.marks)?;
        }

        self.core.wire_document(tree)?;
        Ok(layout.segments.len())
    }
}

impl<D: Dom, F: Fetch> UiElement for StackedBarChart<D, F> {
    type Record = StackedBarRecord;

    fn obtain_datas(&self) -> LocalBoxFuture<'_, FetchOutcome> {
        async move {
            let url = endpoint(&self.core.source(), &[]);
            self.core.acquire(url, stacked_bars_from_value).await
        }
        .boxed_local()
    }

    fn set_datas(&self, records: Vec<StackedBarRecord>) {
        self.core.set_records(records);
    }

    fn render(&self) -> RenderOutcome {
        let layout = stack_layout(&self.core.records());
        let labels = layout.labels_by_total();
        let dims = match self.core.prepare(LayoutKind::Rows(labels.len())) {
            Ok(dims) => dims,
            Err(reason) => return RenderOutcome::Skipped(reason),
        };
        let band = BandScale::new(
            labels,
            (0.0, dims.content_height),
            self.core.config().band_padding,
        );

        let mut tree = self.core.begin();
        match self.build(&mut tree, &dims, &layout, &band) {
            Ok(marks) => self.core.commit(tree, marks),
            Err(err) => {
                drop(tree);
                self.core.abandon(err)
            }
        }
    }

    fn destroy(&self) {
        self.core.destroy();
    }
}

fn segment_content(
    layout: &StackLayout,
    segment: &StackSegment,
    record: &StackedBarRecord,
) -> OverlayContent {
    OverlayContent::new(segment.label.as_str())
        .row("Category", segment.category.as_str())
        .row("Value", format_numeric(record.value))
        .row("Share", format!("{:.1}%", layout.percent_of_label(segment)))
        .row("Total", format_numeric(layout.total(&segment.label)))
        .description(record.description.as_str())
}
