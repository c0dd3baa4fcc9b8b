//! Loosely typed JSON payloads to validated widget records.
//!
//! A payload must be a JSON array; anything else fails the whole batch. Inside the
//! array every field falls back to its own default, so one malformed item degrades
//! to placeholder values instead of dropping its siblings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use vizkit_core::{
    CalendarEntry, GanttTask, StackedBarRecord, VizError, WidgetConfig, WidgetKind,
    WidgetRecords,
};

const LABEL_FIELDS: [&str; 3] = ["label", "name", "title"];
const CATEGORY_FIELDS: [&str; 2] = ["category", "group"];
const VALUE_FIELDS: [&str; 2] = ["value", "count"];
const DESCRIPTION_FIELDS: [&str; 2] = ["description", "detail"];

/// Parse and transform a payload string for the given widget.
pub fn transform_payload_str(
    kind: WidgetKind,
    payload: &str,
    config: &WidgetConfig,
) -> Result<WidgetRecords, VizError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| VizError::Parse(err.to_string()))?;
    transform_payload(kind, &value, config)
}

/// Transform an already parsed payload for the given widget.
pub fn transform_payload(
    kind: WidgetKind,
    payload: &Value,
    config: &WidgetConfig,
) -> Result<WidgetRecords, VizError> {
    Ok(match kind {
        WidgetKind::Calendar => {
            WidgetRecords::Calendar(calendar_entries_from_value(payload, config)?)
        }
        WidgetKind::Gantt => WidgetRecords::Gantt(gantt_tasks_from_value(payload, config)?),
        WidgetKind::StackedBar => {
            WidgetRecords::StackedBar(stacked_bars_from_value(payload, config)?)
        }
    })
}

pub fn calendar_entries_from_str(
    payload: &str,
    config: &WidgetConfig,
) -> Result<Vec<CalendarEntry>, VizError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| VizError::Parse(err.to_string()))?;
    calendar_entries_from_value(&value, config)
}

pub fn calendar_entries_from_value(
    payload: &Value,
    config: &WidgetConfig,
) -> Result<Vec<CalendarEntry>, VizError> {
    Ok(items(payload)?
        .iter()
        .map(|item| {
            let fields = Fields::of(item);
            CalendarEntry {
                date: fields.date(&["date", "day"]),
                label: fields.label(config),
                value: fields.number(&VALUE_FIELDS).unwrap_or(0.0),
                color: fields.color(config),
                description: fields.description(),
            }
        })
        .collect())
}

pub fn gantt_tasks_from_str(
    payload: &str,
    config: &WidgetConfig,
) -> Result<Vec<GanttTask>, VizError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| VizError::Parse(err.to_string()))?;
    gantt_tasks_from_value(&value, config)
}

pub fn gantt_tasks_from_value(
    payload: &Value,
    config: &WidgetConfig,
) -> Result<Vec<GanttTask>, VizError> {
    Ok(items(payload)?
        .iter()
        .map(|item| {
            let fields = Fields::of(item);
            GanttTask {
                label: fields.label(config),
                category: fields.category(config),
                start: fields.datetime(&["start", "startDate", "start_date"]),
                end: fields.datetime(&["end", "endDate", "end_date"]),
                color: fields.color(config),
                description: fields.description(),
            }
        })
        .collect())
}

pub fn stacked_bars_from_str(
    payload: &str,
    config: &WidgetConfig,
) -> Result<Vec<StackedBarRecord>, VizError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| VizError::Parse(err.to_string()))?;
    stacked_bars_from_value(&value, config)
}

pub fn stacked_bars_from_value(
    payload: &Value,
    config: &WidgetConfig,
) -> Result<Vec<StackedBarRecord>, VizError> {
    Ok(items(payload)?
        .iter()
        .map(|item| {
            let fields = Fields::of(item);
            StackedBarRecord {
                label: fields.label(config),
                category: fields.category(config),
                value: fields.number(&VALUE_FIELDS).unwrap_or(0.0),
                color: fields.color(config),
                description: fields.description(),
            }
        })
        .collect())
}

fn items(payload: &Value) -> Result<&[Value], VizError> {
    payload
        .as_array()
        .map(Vec::as_slice)
        .ok_or(VizError::NotAnArray)
}

/// Field lookup over one raw item; non-object items behave as empty objects.
struct Fields<'a>(Option<&'a Map<String, Value>>);

impl<'a> Fields<'a> {
    fn of(item: &'a Value) -> Self {
        Self(item.as_object())
    }

    fn first(&self, keys: &[&str]) -> Option<&'a Value> {
        let map = self.0?;
        keys.iter()
            .filter_map(|key| map.get(*key))
            .find(|value| !value.is_null())
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        match self.first(keys)? {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    fn number(&self, keys: &[&str]) -> Option<f64> {
        let number = match self.first(keys)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        number.is_finite().then_some(number)
    }

    fn datetime(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        self.first(keys)
            .and_then(Value::as_str)
            .and_then(parse_datetime)
    }

    fn date(&self, keys: &[&str]) -> Option<NaiveDate> {
        let text = self.first(keys).and_then(Value::as_str)?;
        parse_date(text).or_else(|| parse_datetime(text).map(|dt| dt.date_naive()))
    }

    fn label(&self, config: &WidgetConfig) -> String {
        self.text(&LABEL_FIELDS)
            .unwrap_or_else(|| config.placeholder_label.clone())
    }

    fn category(&self, config: &WidgetConfig) -> String {
        self.text(&CATEGORY_FIELDS)
            .unwrap_or_else(|| config.placeholder_category.clone())
    }

    fn color(&self, config: &WidgetConfig) -> String {
        self.first(&["color", "colour"])
            .and_then(Value::as_str)
            .and_then(normalize_color)
            .unwrap_or_else(|| config.default_color.clone())
    }

    fn description(&self) -> String {
        self.text(&DESCRIPTION_FIELDS).unwrap_or_default()
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(value)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` and the `rgb()/rgba()/hsl()/hsla()` forms.
pub fn normalize_color(value: &str) -> Option<String> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        let valid =
            matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
        return valid.then(|| value.to_lowercase());
    }

    let lower = value.to_lowercase();
    let functional = ["rgb(", "rgba(", "hsl(", "hsla("]
        .iter()
        .any(|prefix| lower.starts_with(prefix));
    (functional && lower.ends_with(')')).then_some(lower)
}
