/// Key under which the stylesheet is installed once per document.
pub const STYLE_KEY: &str = "vizkit-ui";

/// Default CSS for the widgets along with easy-to-override design tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --vizkit-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --vizkit-text: #1f2933;
  --vizkit-muted: #52606d;
  --vizkit-axis: #9aa5b1;
  --vizkit-surface: #ffffff;
  --vizkit-border: rgba(148, 163, 184, 0.28);
  --vizkit-emphasis: #11181c;
  --vizkit-backdrop: rgba(15, 23, 42, 0.45);
  --vizkit-radius: 10px;
}

.vizkit {
  font-family: var(--vizkit-font-family);
  color: var(--vizkit-text);
  font-size: 12px;
  position: relative;
}

.vizkit-axis-region {
  position: sticky;
  top: 0;
  background: var(--vizkit-surface);
  z-index: 1;
}

.vizkit-data-region {
  overflow-y: auto;
  overflow-x: hidden;
}

.vizkit-tick line,
.vizkit-domain {
  stroke: var(--vizkit-axis);
}

.vizkit-tick text,
.vizkit-row-label,
.vizkit-weekday,
.vizkit-month {
  fill: var(--vizkit-muted);
}

.vizkit-mark {
  cursor: pointer;
  transition: opacity 120ms ease;
}

.vizkit-gantt .vizkit-data-region svg {
  cursor: grab;
}

.vizkit-tooltip {
  position: fixed;
  pointer-events: none;
  background: var(--vizkit-surface);
  border: 1px solid var(--vizkit-border);
  border-radius: var(--vizkit-radius);
  box-shadow: 0 12px 24px rgba(15, 23, 42, 0.12);
  padding: 8px 12px;
  font-family: var(--vizkit-font-family);
  font-size: 12px;
  z-index: 1000;
}

.vizkit-modal-backdrop {
  position: fixed;
  inset: 0;
  background: var(--vizkit-backdrop);
  display: flex;
  align-items: center;
  justify-content: center;
  z-index: 1000;
}

.vizkit-modal {
  background: var(--vizkit-surface);
  border-radius: var(--vizkit-radius);
  padding: 20px 24px;
  min-width: 240px;
  font-family: var(--vizkit-font-family);
}

.vizkit-overlay-title {
  font-weight: 600;
  margin: 0 0 6px;
}

.vizkit-overlay-row {
  display: flex;
  justify-content: space-between;
  gap: 16px;
  color: var(--vizkit-muted);
}

.vizkit-overlay-description {
  margin: 6px 0 0;
}
"#;

#[cfg(target_arch = "wasm32")]
pub use web::ensure_styles;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Document, Node};

    /// Injects `css` in a `<style data-vizkit="key">` tag unless one is already present.
    pub fn ensure_styles(document: &Document, key: &str, css: &str) -> Result<(), JsValue> {
        let selector = format!("style[data-vizkit=\"{key}\"]");
        if document.query_selector(&selector)?.is_some() {
            return Ok(());
        }

        let head = document
            .head()
            .ok_or_else(|| JsValue::from_str("document has no <head>"))?;

        let style_el = document.create_element("style")?;
        style_el.set_attribute("data-vizkit", key)?;
        style_el.set_text_content(Some(css));
        head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

        Ok(())
    }
}
