//! Framework-neutral WASM <-> JavaScript bridge: payload normalization and stack layout
//! without any DOM.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use vizkit_core::stack::StackLayout;
use vizkit_core::{VizError, WidgetConfig, WidgetKind};
use wasm_bindgen::prelude::*;

/// Partial override of [`WidgetConfig`]; absent fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
struct JsWidgetConfig {
    #[serde(default)]
    max_height: Option<f64>,
    #[serde(default)]
    row_height: Option<f64>,
    #[serde(default)]
    band_padding: Option<f64>,
    #[serde(default)]
    default_color: Option<String>,
    #[serde(default)]
    placeholder_label: Option<String>,
    #[serde(default)]
    placeholder_category: Option<String>,
}

impl From<JsWidgetConfig> for WidgetConfig {
    fn from(cfg: JsWidgetConfig) -> Self {
        let mut base = WidgetConfig::default();
        if let Some(height) = cfg.max_height {
            base.max_height = height;
        }
        if let Some(height) = cfg.row_height {
            base.row_height = height;
        }
        if let Some(padding) = cfg.band_padding {
            base.band_padding = padding;
        }
        if let Some(color) = cfg.default_color {
            base.default_color = color;
        }
        if let Some(label) = cfg.placeholder_label {
            base.placeholder_label = label;
        }
        if let Some(category) = cfg.placeholder_category {
            base.placeholder_category = category;
        }
        base
    }
}

/// Normalizes a raw payload into widget records:
/// `{ kind: "gantt", records: [...] }`.
#[wasm_bindgen]
pub fn transform_records(
    kind: &str,
    payload: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let kind: WidgetKind = kind.parse().map_err(viz_error)?;
    let payload = read_payload(payload)?;
    let cfg = read_config(config)?;

    let records = vizkit_data::transform_payload(kind, &payload, &cfg).map_err(viz_error)?;
    to_value(&records)
        .map_err(|err| JsValue::from_str(&format!("could not serialize records: {err}")))
}

/// Stacked offsets and per-label totals for a stacked-bar payload.
#[wasm_bindgen]
pub fn stack_layout(payload: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let payload = read_payload(payload)?;
    let cfg = read_config(config)?;
    let records = vizkit_data::stacked_bars_from_value(&payload, &cfg).map_err(viz_error)?;
    let layout: StackLayout = vizkit_core::stack::stack_layout(&records);

    to_value(&layout)
        .map_err(|err| JsValue::from_str(&format!("could not serialize layout: {err}")))
}

fn read_payload(payload: JsValue) -> Result<serde_json::Value, JsValue> {
    from_value::<serde_json::Value>(payload)
        .map_err(|err| JsValue::from_str(&format!("could not read JSON payload: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<WidgetConfig, JsValue> {
    match config {
        Some(js_cfg) => {
            let cfg: JsWidgetConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("could not read config: {err}")))?;
            Ok(WidgetConfig::from(cfg))
        }
        None => Ok(WidgetConfig::default()),
    }
}

fn viz_error(err: VizError) -> JsValue {
    JsValue::from_str(&format!("vizkit error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: JsWidgetConfig =
            serde_json::from_str(r#"{"row_height": 40, "placeholder_label": "n/a"}"#).unwrap();
        let cfg = WidgetConfig::from(cfg);
        assert_eq!(cfg.row_height, 40.0);
        assert_eq!(cfg.placeholder_label, "n/a");
        assert_eq!(cfg.max_height, WidgetConfig::default().max_height);
        assert_eq!(cfg.placeholder_category, "Uncategorized");
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(
            WidgetConfig::from(JsWidgetConfig::default()),
            WidgetConfig::default()
        );
    }
}
