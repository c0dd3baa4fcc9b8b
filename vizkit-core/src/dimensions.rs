//! Container and content sizing derived from data volume and host box.

use serde::{Deserialize, Serialize};

use crate::{VizError, WidgetConfig};

/// Weeks drawn by the calendar grid (a year touches at most 54 Sunday-start weeks).
pub const CALENDAR_WEEKS: usize = 54;
/// Left margin for weekday labels on the calendar.
pub const CALENDAR_GUTTER: f64 = 32.0;

/// Measured size of the host element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

impl BoxSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// What the widget lays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// One row per band (Gantt, stacked bar).
    Rows(usize),
    /// Seven weekday rows by week columns.
    CalendarYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Outer width, equal to the host width.
    pub width: f64,
    /// Outer height: host height, or the computed height capped at `max_height`.
    pub height: f64,
    /// Horizontal space for marks after the label gutter.
    pub content_width: f64,
    /// Full height of the marks, which may exceed the visible data region.
    pub content_height: f64,
    pub axis_height: f64,
    /// Per-row height for row-based widgets.
    pub row_height: Option<f64>,
    /// Square cell side for the calendar.
    pub cell_size: Option<f64>,
}

impl Dimensions {
    pub fn gutter(&self) -> f64 {
        self.width - self.content_width
    }

    /// Visible height below the fixed axis region.
    pub fn viewport_height(&self) -> f64 {
        (self.height - self.axis_height).max(0.0)
    }

    pub fn scrollable(&self) -> bool {
        self.content_height > self.viewport_height()
    }
}

/// Zero width is an error: rendering must abort instead of drawing a degenerate chart.
pub fn compute_dimensions(
    host: BoxSize,
    layout: LayoutKind,
    config: &WidgetConfig,
) -> Result<Dimensions, VizError> {
    if !(host.width.is_finite() && host.width > 0.0) {
        return Err(VizError::ZeroWidth);
    }

    let width = host.width;
    let (content_width, content_height, row_height, cell_size) = match layout {
        LayoutKind::Rows(rows) => {
            let content_width = (width - config.label_gutter).max(0.0);
            (
                content_width,
                rows as f64 * config.row_height,
                Some(config.row_height),
                None,
            )
        }
        LayoutKind::CalendarYear => {
            let content_width = (width - CALENDAR_GUTTER).max(0.0);
            let mut cell = (content_width / CALENDAR_WEEKS as f64).floor();
            if !has_height(host) {
                // the grid does not scroll, so cells shrink to stay under the cap
                let fit = ((config.max_height - config.axis_height) / 7.0).floor();
                cell = cell.min(fit.max(0.0));
            }
            (content_width, cell * 7.0, None, Some(cell))
        }
    };

    let height = if has_height(host) {
        host.height
    } else {
        (config.axis_height + content_height).min(config.max_height)
    };

    Ok(Dimensions {
        width,
        height,
        content_width,
        content_height,
        axis_height: config.axis_height,
        row_height,
        cell_size,
    })
}

fn has_height(host: BoxSize) -> bool {
    host.height.is_finite() && host.height > 0.0
}
