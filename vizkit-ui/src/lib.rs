//! Interactive chart widgets (calendar heat-map, Gantt chart, stacked bars) drawn as SVG
//! into a host element.
//!
//! Every widget follows the same lifecycle: fetch, transform, lay out, render, react to
//! the pointer, destroy. Drawing goes through the [`Dom`] trait, so the widgets run
//! against the browser on wasm32 and against [`MemoryDom`] anywhere else.

pub mod axis;
pub mod calendar;
pub mod dom;
pub mod fetch;
mod frame;
pub mod gantt;
pub mod memory;
pub mod overlay;
pub mod stacked_bar;
pub mod styles;
pub mod widget;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use calendar::CalendarHeatmap;
pub use dom::{Dom, DomError, EventKind, PointerEvent, Propagation, Subtree};
pub use fetch::{endpoint, Fetch, FetchError, FetchOutcome, FetchResponse};
pub use gantt::GanttChart;
pub use memory::{MemoryDom, NodeId};
pub use stacked_bar::StackedBarChart;
pub use widget::{RenderOutcome, SkipReason, UiElement, WidgetCore};

#[cfg(target_arch = "wasm32")]
mod bindings {
    use std::io;

    use chrono::{Datelike, Utc};
    use js_sys::Promise;
    use serde::Serialize;
    use serde_json::Value;
    use serde_wasm_bindgen::{from_value, to_value};
    use tracing_subscriber::fmt::MakeWriter;
    use vizkit_core::{VizError, WidgetConfig};
    use vizkit_data::{
        calendar_entries_from_value, gantt_tasks_from_value, stacked_bars_from_value,
    };
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::future_to_promise;

    use crate::fetch::HttpFetcher;
    use crate::web::WebDom;
    use crate::{CalendarHeatmap, DomError, GanttChart, StackedBarChart, UiElement};

    fn host(selector: &str) -> Result<(WebDom, web_sys::Element), JsValue> {
        console_error_panic_hook::set_once();
        let dom = WebDom::from_window().map_err(dom_error)?;
        let container = dom.query(selector).map_err(dom_error)?;
        Ok((dom, container))
    }

    fn dom_error(err: DomError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }

    fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
        to_value(value).map_err(|err| JsValue::from_str(&format!("could not serialize: {err}")))
    }

    /// Runs a raw JS array through the same normalization as a fetched payload.
    fn records<R>(
        payload: JsValue,
        config: &WidgetConfig,
        transform: fn(&Value, &WidgetConfig) -> Result<Vec<R>, VizError>,
    ) -> Result<Vec<R>, JsValue> {
        let payload: Value = from_value(payload)
            .map_err(|err| JsValue::from_str(&format!("could not read records: {err}")))?;
        transform(&payload, config).map_err(|err| JsValue::from_str(&err.to_string()))
    }

    #[wasm_bindgen]
    pub struct CalendarHandle {
        widget: CalendarHeatmap<WebDom, HttpFetcher>,
    }

    #[wasm_bindgen]
    impl CalendarHandle {
        /// Binds to the element matching `selector`; `year` defaults to the current one.
        #[wasm_bindgen(constructor)]
        pub fn new(
            prefix: &str,
            selector: &str,
            year: Option<i32>,
        ) -> Result<CalendarHandle, JsValue> {
            let (dom, container) = host(selector)?;
            let year = year.unwrap_or_else(|| Utc::now().year());
            Ok(Self {
                widget: CalendarHeatmap::new(dom, HttpFetcher, container, prefix, year),
            })
        }

        #[wasm_bindgen(getter)]
        pub fn year(&self) -> i32 {
            self.widget.year()
        }

        #[wasm_bindgen(js_name = obtainDatas)]
        pub fn obtain_datas(&self) -> Promise {
            let widget = self.widget.clone();
            future_to_promise(async move { to_js(&widget.obtain_datas().await) })
        }

        #[wasm_bindgen(js_name = setDatas)]
        pub fn set_datas(&self, payload: JsValue) -> Result<(), JsValue> {
            let config = self.widget.core().config();
            let records = records(payload, config, calendar_entries_from_value)?;
            self.widget.set_datas(records);
            Ok(())
        }

        pub fn render(&self) -> Result<JsValue, JsValue> {
            to_js(&self.widget.render())
        }

        pub fn destroy(&self) {
            self.widget.destroy();
        }

        #[wasm_bindgen(js_name = nextYear)]
        pub fn next_year(&self) -> Promise {
            let widget = self.widget.clone();
            future_to_promise(async move { to_js(&widget.next_year().await) })
        }

        #[wasm_bindgen(js_name = previousYear)]
        pub fn previous_year(&self) -> Promise {
            let widget = self.widget.clone();
            future_to_promise(async move { to_js(&widget.previous_year().await) })
        }
    }

    #[wasm_bindgen]
    pub struct GanttHandle {
        widget: GanttChart<WebDom, HttpFetcher>,
    }

    #[wasm_bindgen]
    impl GanttHandle {
        #[wasm_bindgen(constructor)]
        pub fn new(prefix: &str, selector: &str) -> Result<GanttHandle, JsValue> {
            let (dom, container) = host(selector)?;
            Ok(Self {
                widget: GanttChart::new(dom, HttpFetcher, container, prefix),
            })
        }

        #[wasm_bindgen(js_name = obtainDatas)]
        pub fn obtain_datas(&self) -> Promise {
            let widget = self.widget.clone();
            future_to_promise(async move { to_js(&widget.obtain_datas().await) })
        }

        #[wasm_bindgen(js_name = setDatas)]
        pub fn set_datas(&self, payload: JsValue) -> Result<(), JsValue> {
            let config = self.widget.core().config();
            let records = records(payload, config, gantt_tasks_from_value)?;
            self.widget.set_datas(records);
            Ok(())
        }

        pub fn render(&self) -> Result<JsValue, JsValue> {
            to_js(&self.widget.render())
        }

        pub fn destroy(&self) {
            self.widget.destroy();
        }
    }

    #[wasm_bindgen]
    pub struct StackedBarHandle {
        widget: StackedBarChart<WebDom, HttpFetcher>,
    }

    #[wasm_bindgen]
    impl StackedBarHandle {
        #[wasm_bindgen(constructor)]
        pub fn new(prefix: &str, selector: &str) -> Result<StackedBarHandle, JsValue> {
            let (dom, container) = host(selector)?;
            Ok(Self {
                widget: StackedBarChart::new(dom, HttpFetcher, container, prefix),
            })
        }

        #[wasm_bindgen(js_name = obtainDatas)]
        pub fn obtain_datas(&self) -> Promise {
            let widget = self.widget.clone();
            future_to_promise(async move { to_js(&widget.obtain_datas().await) })
        }

        #[wasm_bindgen(js_name = setDatas)]
        pub fn set_datas(&self, payload: JsValue) -> Result<(), JsValue> {
            let config = self.widget.core().config();
            let records = records(payload, config, stacked_bars_from_value)?;
            self.widget.set_datas(records);
            Ok(())
        }

        pub fn render(&self) -> Result<JsValue, JsValue> {
            to_js(&self.widget.render())
        }

        pub fn destroy(&self) {
            self.widget.destroy();
        }
    }

    /// Buffers one formatted event and hands it to `console.log` when dropped.
    struct ConsoleWriter(Vec<u8>);

    impl io::Write for ConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.0);
            let line = line.trim_end();
            if !line.is_empty() {
                web_sys::console::log_1(&JsValue::from_str(line));
            }
        }
    }

    struct Console;

    impl<'a> MakeWriter<'a> for Console {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter(Vec::new())
        }
    }

    /// Routes `tracing` output to the browser console. `level` is one of
    /// trace/debug/info/warn/error and defaults to `warn`.
    #[wasm_bindgen(js_name = initLogging)]
    pub fn init_logging(level: Option<String>) -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let level = match level.as_deref() {
            Some(level) => level
                .parse::<tracing::Level>()
                .map_err(|err| JsValue::from_str(&format!("unknown log level {level}: {err}")))?,
            None => tracing::Level::WARN,
        };
        // a second call keeps the first subscriber
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .without_time()
            .with_ansi(false)
            .with_writer(Console)
            .try_init();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use bindings::{init_logging, CalendarHandle, GanttHandle, StackedBarHandle};

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(_: Option<String>) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "browser logging is only available on wasm32",
    ))
}
