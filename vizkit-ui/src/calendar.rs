//! Calendar heat-map: one square per day of a year, weeks as columns and weekdays as rows.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{Datelike, NaiveDate};
use futures::future::{FutureExt, LocalBoxFuture};
use tracing::warn;
use vizkit_core::dimensions::{Dimensions, LayoutKind, CALENDAR_GUTTER, CALENDAR_WEEKS};
use vizkit_core::scale::{BandScale, LinearScale};
use vizkit_core::{format_numeric, CalendarEntry, WidgetConfig, WidgetKind};
use vizkit_data::calendar_entries_from_value;

use crate::dom::{coord, Dom, DomError, ElementSpec, Subtree};
use crate::fetch::{endpoint, Fetch, FetchOutcome};
use crate::overlay::OverlayContent;
use crate::widget::{MarkClick, RenderOutcome, SkipReason, UiElement, WidgetCore};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const CELL_PADDING: f64 = 0.1;
const LABEL_OFFSET: f64 = 8.0;

pub struct CalendarHeatmap<D: Dom, F: Fetch> {
    core: Rc<WidgetCore<D, F, CalendarEntry>>,
    year: Rc<Cell<i32>>,
}

impl<D: Dom, F: Fetch> Clone for CalendarHeatmap<D, F> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            year: Rc::clone(&self.year),
        }
    }
}

impl<D: Dom, F: Fetch> CalendarHeatmap<D, F> {
    pub fn new(
        dom: D,
        fetcher: F,
        container: D::Node,
        prefix: impl Into<String>,
        year: i32,
    ) -> Self {
        Self::with_config(dom, fetcher, container, prefix, year, WidgetConfig::default())
    }

    pub fn with_config(
        dom: D,
        fetcher: F,
        container: D::Node,
        prefix: impl Into<String>,
        year: i32,
        config: WidgetConfig,
    ) -> Self {
        let core = WidgetCore::new(WidgetKind::Calendar, dom, fetcher, container, prefix, config);
        Self {
            core: Rc::new(core),
            year: Rc::new(Cell::new(year)),
        }
    }

    pub fn core(&self) -> &WidgetCore<D, F, CalendarEntry> {
        &self.core
    }

    pub fn year(&self) -> i32 {
        self.year.get()
    }

    /// Takes effect on the next fetch and render.
    pub fn set_year(&self, year: i32) {
        self.year.set(year);
    }

    /// Moves to the following year. Renders right away with the records at hand, then
    /// again once the new year's records arrive.
    pub async fn next_year(&self) -> FetchOutcome {
        self.shift_year(1).await
    }

    pub async fn previous_year(&self) -> FetchOutcome {
        self.shift_year(-1).await
    }

    async fn shift_year(&self, delta: i32) -> FetchOutcome {
        self.year.set(self.year.get().saturating_add(delta));
        self.render();
        let outcome = self.obtain_datas().await;
        self.render();
        outcome
    }

    fn build(
        &self,
        tree: &mut Subtree<D>,
        dims: &Dimensions,
        year: i32,
        jan1: NaiveDate,
    ) -> Result<usize, DomError> {
        let dom = self.core.dom();
        let config = self.core.config();
        let cell = dims.cell_size.unwrap_or(0.0);
        let weeks = LinearScale::new(
            (0.0, CALENDAR_WEEKS as f64),
            (0.0, CALENDAR_WEEKS as f64 * cell),
        );
        let weekdays = BandScale::new(WEEKDAYS, (0.0, dims.content_height), CELL_PADDING);
        let side = weekdays.bandwidth();
        let inset = (cell - side) / 2.0;
        let offset = jan1.weekday().num_days_from_sunday();
        let column = |day: NaiveDate| ((day.ordinal0() + offset) / 7) as f64;

        let root = ElementSpec::new("div")
            .class("vizkit vizkit-calendar")
            .attr("style", format!("width:{}px", coord(dims.width)))
            .create(dom)?;
        let root = tree.mount(self.core.container(), root)?;
        let svg = ElementSpec::new("svg")
            .attr("width", coord(dims.width))
            .attr("height", coord(dims.height))
            .append_to(dom, &root)?;

        ElementSpec::new("text")
            .class("vizkit-year")
            .attr("x", 0)
            .attr("y", coord(dims.axis_height - LABEL_OFFSET))
            .text(year.to_string())
            .append_to(dom, &svg)?;

        let months = ElementSpec::new("g")
            .class("vizkit-months")
            .attr(
                "transform",
                format!(
                    "translate({},{})",
                    coord(CALENDAR_GUTTER),
                    coord(dims.axis_height - LABEL_OFFSET)
                ),
            )
            .append_to(dom, &svg)?;
        for (month, name) in (1..=12).zip(MONTHS) {
            let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
                continue;
            };
            ElementSpec::new("text")
                .class("vizkit-month")
                .attr("x", coord(weeks.map(column(first))))
                .text(name)
                .append_to(dom, &months)?;
        }

        let labels = ElementSpec::new("g")
            .class("vizkit-weekdays")
            .attr("transform", format!("translate(0,{})", coord(dims.axis_height)))
            .append_to(dom, &svg)?;
        for name in WEEKDAYS {
            let y = weekdays.position(name).unwrap_or(0.0) + side / 2.0;
            ElementSpec::new("text")
                .class("vizkit-weekday")
                .attr("x", coord(CALENDAR_GUTTER - LABEL_OFFSET / 2.0))
                .attr("y", coord(y))
                .attr("text-anchor", "end")
                .attr("dominant-baseline", "middle")
                .text(name)
                .append_to(dom, &labels)?;
        }

        let marks = ElementSpec::new("g")
            .class("vizkit-marks")
            .attr(
                "transform",
                format!(
                    "translate({},{})",
                    coord(CALENDAR_GUTTER),
                    coord(dims.axis_height)
                ),
            )
            .append_to(dom, &svg)?;

        let records = self.core.records();
        // later entries for the same day win
        let by_day: HashMap<NaiveDate, usize> = records
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.date.map(|date| (date, index)))
            .collect();

        let mut cells = 0;
        for day in jan1.iter_days().take_while(|day| day.year() == year) {
            let weekday = WEEKDAYS[day.weekday().num_days_from_sunday() as usize];
            let entry = by_day.get(&day).map(|&index| (index, &records[index]));
            let fill = entry.map_or(config.empty_cell_color.as_str(), |(_, e)| e.color.as_str());
            let node = ElementSpec::new("rect")
                .class("vizkit-mark")
                .attr("x", coord(weeks.map(column(day)) + inset))
                .attr("y", coord(weekdays.position(weekday).unwrap_or(0.0)))
                .attr("width", coord(side))
                .attr("height", coord(side))
                .attr("rx", 2)
                .attr("fill", fill)
                .attr("data-date", day.format("%Y-%m-%d"))
                .append_to(dom, &marks)?;
            let (key, click) = match entry {
                Some((index, entry)) => (index, MarkClick::Tooltip(entry_content(day, entry))),
                None => (0, MarkClick::Nothing),
            };
            self.core.wire_mark(tree, &node, key, click)?;
            cells += 1;
        }
        drop(records);

        self.core.wire_document(tree)?;
        Ok(cells)
    }
}

impl<D: Dom, F: Fetch> UiElement for CalendarHeatmap<D, F> {
    type Record = CalendarEntry;

    fn obtain_datas(&self) -> LocalBoxFuture<'_, FetchOutcome> {
        async move {
            let url = endpoint(
                &self.core.source(),
                &[("year", self.year.get().to_string())],
            );
            self.core.acquire(url, calendar_entries_from_value).await
        }
        .boxed_local()
    }

    fn set_datas(&self, records: Vec<CalendarEntry>) {
        self.core.set_records(records);
    }

    fn render(&self) -> RenderOutcome {
        let year = self.year.get();
        let dims = match self.core.prepare(LayoutKind::CalendarYear) {
            Ok(dims) => dims,
            Err(reason) => return RenderOutcome::Skipped(reason),
        };
        let Some(jan1) = NaiveDate::from_ymd_opt(year, 1, 1) else {
            warn!(year, "calendar year out of range, render aborted");
            return RenderOutcome::Skipped(SkipReason::OutOfRange);
        };

        let mut tree = self.core.begin();
        match self.build(&mut tree, &dims, year, jan1) {
            Ok(cells) => self.core.commit(tree, cells),
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

fn entry_content(day: NaiveDate, entry: &CalendarEntry) -> OverlayContent {
    OverlayContent::new(entry.label.as_str())
        .row("Date", day.format("%Y-%m-%d").to_string())
        .row("Value", format_numeric(entry.value))
        .description(entry.description.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tooltip_lists_date_and_value() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let entry = CalendarEntry {
            date: Some(day),
            label: "Deploys".to_string(),
            value: 2.5,
            description: "two and a half".to_string(),
            ..CalendarEntry::default()
        };
        let content = entry_content(day, &entry);
        assert_eq!(content.title, "Deploys");
        assert_eq!(
            content.rows,
            vec![
                ("Date".to_string(), "2024-03-09".to_string()),
                ("Value".to_string(), "2.5".to_string()),
            ]
        );
        assert_eq!(content.description, "two and a half");
    }
}
