//! Browser implementation of [`Dom`] on top of `web-sys`.

use vizkit_core::dimensions::BoxSize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, MouseEvent, WheelEvent};

use crate::dom::{Dom, DomError, EventKind, Handler, PointerEvent, Propagation, SVG_TAGS};
use crate::styles;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone)]
pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn from_window() -> Result<Self, DomError> {
        let document = web_sys::window()
            .ok_or_else(|| DomError("no window".to_string()))?
            .document()
            .ok_or_else(|| DomError("window has no document".to_string()))?;
        Ok(Self::new(document))
    }

    pub fn query(&self, selector: &str) -> Result<Element, DomError> {
        self.document
            .query_selector(selector)
            .map_err(js_error)?
            .ok_or_else(|| DomError(format!("no element matches {selector}")))
    }
}

pub struct WebListener {
    target: Element,
    kind: EventKind,
    closure: Option<Closure<dyn FnMut(Event)>>,
}

impl Drop for WebListener {
    fn drop(&mut self) {
        let Some(closure) = self.closure.take() else {
            return;
        };
        let callback = closure.as_ref().unchecked_ref();
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind.dom_name(), callback);
        // the closure may be the one running right now; release it on a later tick
        wasm_bindgen_futures::spawn_local(async move {
            drop(closure);
        });
    }
}

impl Dom for WebDom {
    type Node = Element;
    type Listener = WebListener;

    fn create_element(&self, tag: &str) -> Result<Element, DomError> {
        if SVG_TAGS.contains(&tag) {
            self.document.create_element_ns(Some(SVG_NS), tag)
        } else {
            self.document.create_element(tag)
        }
        .map_err(js_error)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) -> Result<(), DomError> {
        node.set_attribute(name, value).map_err(js_error)
    }

    fn remove_attribute(&self, node: &Element, name: &str) -> Result<(), DomError> {
        node.remove_attribute(name).map_err(js_error)
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent.append_child(child).map(|_| ()).map_err(js_error)
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn clear_children(&self, node: &Element) {
        while let Some(child) = node.first_child() {
            if node.remove_child(&child).is_err() {
                break;
            }
        }
    }

    fn body(&self) -> Result<Element, DomError> {
        self.document
            .body()
            .map(Element::from)
            .ok_or_else(|| DomError("document has no body".to_string()))
    }

    fn measure(&self, node: &Element) -> BoxSize {
        BoxSize::new(f64::from(node.client_width()), f64::from(node.client_height()))
    }

    fn listen(
        &self,
        node: &Element,
        kind: EventKind,
        handler: Handler,
    ) -> Result<WebListener, DomError> {
        let target = node.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if kind == EventKind::Wheel {
                event.prevent_default();
            }
            if handler(&pointer_event(&target, &event)) == Propagation::Stop {
                event.stop_propagation();
            }
        });
        node.add_event_listener_with_callback(kind.dom_name(), closure.as_ref().unchecked_ref())
            .map_err(js_error)?;
        Ok(WebListener {
            target: node.clone(),
            kind,
            closure: Some(closure),
        })
    }

    fn install_stylesheet(&self, key: &str, css: &str) -> Result<(), DomError> {
        styles::ensure_styles(&self.document, key, css).map_err(js_error)
    }
}

fn pointer_event(target: &Element, event: &Event) -> PointerEvent {
    let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
        return PointerEvent::default();
    };
    let client_x = f64::from(mouse.client_x());
    let client_y = f64::from(mouse.client_y());
    PointerEvent {
        client_x,
        client_y,
        local_x: client_x - target.get_bounding_client_rect().left(),
        delta_y: event.dyn_ref::<WheelEvent>().map_or(0.0, WheelEvent::delta_y),
    }
}

fn js_error(err: JsValue) -> DomError {
    DomError(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}
