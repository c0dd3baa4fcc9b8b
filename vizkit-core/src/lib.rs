//! Typed records, configuration and layout math shared by the vizkit widgets.

pub mod dimensions;
pub mod geometry;
pub mod scale;
pub mod stack;
pub mod zoom;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Neutral fill used when a record carries no usable color.
pub const DEFAULT_COLOR: &str = "#9e9e9e";

/// Tunables shared by every widget. Defaults match the stock stylesheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetConfig {
    /// Upper bound (px) for the computed height when the host reports none.
    pub max_height: f64,
    /// Vertical spacing (px) for one row in row-based widgets.
    pub row_height: f64,
    /// Height (px) reserved for the fixed axis region.
    pub axis_height: f64,
    /// Width (px) reserved on the left for row labels.
    pub label_gutter: f64,
    /// Fraction of a band step left empty between bands.
    pub band_padding: f64,
    pub default_color: String,
    pub empty_cell_color: String,
    pub placeholder_label: String,
    pub placeholder_category: String,
    /// Permitted zoom factor range for the Gantt time axis.
    pub zoom_extent: (f64, f64),
    pub tick_count: usize,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            max_height: 768.0,
            row_height: 28.0,
            axis_height: 30.0,
            label_gutter: 120.0,
            band_padding: 0.2,
            default_color: DEFAULT_COLOR.to_string(),
            empty_cell_color: "#ebedf0".to_string(),
            placeholder_label: "Untitled".to_string(),
            placeholder_category: "Uncategorized".to_string(),
            zoom_extent: (0.5, 20.0),
            tick_count: 8,
        }
    }
}

/// The widget families this workspace knows how to draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    Calendar,
    Gantt,
    StackedBar,
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WidgetKind::Calendar => "calendar",
            WidgetKind::Gantt => "gantt",
            WidgetKind::StackedBar => "stacked-bar",
        };
        f.write_str(name)
    }
}

impl FromStr for WidgetKind {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calendar" | "heatmap" => Ok(WidgetKind::Calendar),
            "gantt" => Ok(WidgetKind::Gantt),
            "stacked-bar" | "stacked_bar" | "stackedbar" => Ok(WidgetKind::StackedBar),
            other => Err(VizError::UnknownKind(other.to_string())),
        }
    }
}

/// One day of the calendar heat-map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEntry {
    /// `None` when the source date could not be parsed; such entries are never placed.
    pub date: Option<NaiveDate>,
    pub label: String,
    pub value: f64,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

impl Default for CalendarEntry {
    fn default() -> Self {
        Self {
            date: None,
            label: String::new(),
            value: 0.0,
            color: DEFAULT_COLOR.to_string(),
            description: String::new(),
        }
    }
}

/// One bar of the Gantt chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GanttTask {
    pub label: String,
    pub category: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

impl Default for GanttTask {
    fn default() -> Self {
        Self {
            label: String::new(),
            category: String::new(),
            start: None,
            end: None,
            color: DEFAULT_COLOR.to_string(),
            description: String::new(),
        }
    }
}

/// One segment of a stacked horizontal bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackedBarRecord {
    pub label: String,
    pub category: String,
    pub value: f64,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

impl Default for StackedBarRecord {
    fn default() -> Self {
        Self {
            label: String::new(),
            category: String::new(),
            value: 0.0,
            color: DEFAULT_COLOR.to_string(),
            description: String::new(),
        }
    }
}

/// Transformed records tagged with the widget they belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "records", rename_all = "kebab-case")]
pub enum WidgetRecords {
    Calendar(Vec<CalendarEntry>),
    Gantt(Vec<GanttTask>),
    StackedBar(Vec<StackedBarRecord>),
}

impl WidgetRecords {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetRecords::Calendar(_) => WidgetKind::Calendar,
            WidgetRecords::Gantt(_) => WidgetKind::Gantt,
            WidgetRecords::StackedBar(_) => WidgetKind::StackedBar,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            WidgetRecords::Calendar(items) => items.len(),
            WidgetRecords::Gantt(items) => items.len(),
            WidgetRecords::StackedBar(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors raised by the pure layers (transform, layout).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VizError {
    #[error("payload is not a JSON array")]
    NotAnArray,
    #[error("could not read payload: {0}")]
    Parse(String),
    #[error("host container reports zero width")]
    ZeroWidth,
    #[error("unknown widget kind: {0}")]
    UnknownKind(String),
}

/// Renders a number without a trailing `.0` for integral values.
pub fn format_numeric(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else if (value * 10.0).fract().abs() < 1e-9 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}
