//! Minimal DOM surface the widgets draw through, plus scoped ownership of what they mount.

use std::fmt;
use std::rc::Rc;

use vizkit_core::dimensions::BoxSize;

/// Tags created in the SVG namespace.
pub const SVG_TAGS: [&str; 6] = ["svg", "g", "rect", "text", "line", "title"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("DOM operation failed: {0}")]
pub struct DomError(pub String);

/// Pointer events the widgets react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerEnter,
    PointerLeave,
    Click,
    Wheel,
    PointerDown,
    PointerMove,
    PointerUp,
}

impl EventKind {
    /// Browser event name.
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::PointerEnter => "mouseenter",
            EventKind::PointerLeave => "mouseleave",
            EventKind::Click => "click",
            EventKind::Wheel => "wheel",
            EventKind::PointerDown => "mousedown",
            EventKind::PointerMove => "mousemove",
            EventKind::PointerUp => "mouseup",
        }
    }

    /// Enter/leave fire on the target only.
    pub fn bubbles(self) -> bool {
        !matches!(self, EventKind::PointerEnter | EventKind::PointerLeave)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    /// Viewport coordinates, used to place floating overlays.
    pub client_x: f64,
    pub client_y: f64,
    /// Horizontal position relative to the node the handler listens on.
    pub local_x: f64,
    /// Wheel delta; 0 for other events.
    pub delta_y: f64,
}

impl PointerEvent {
    pub fn at(client_x: f64, client_y: f64) -> Self {
        Self {
            client_x,
            client_y,
            local_x: client_x,
            delta_y: 0.0,
        }
    }
}

/// Whether an event keeps bubbling after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

pub type Handler = Rc<dyn Fn(&PointerEvent) -> Propagation>;

/// Document operations used by the widgets. Implemented by the browser DOM on wasm32
/// and by [`crate::memory::MemoryDom`] everywhere else.
pub trait Dom: Clone + 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;
    /// Registration token; dropping it detaches the handler.
    type Listener: 'static;

    fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;
    fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), DomError>;
    fn set_text(&self, node: &Self::Node, text: &str);
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;
    /// Detaches `node` from its parent; a detached node is left alone.
    fn remove(&self, node: &Self::Node);
    fn clear_children(&self, node: &Self::Node);
    fn body(&self) -> Result<Self::Node, DomError>;
    fn measure(&self, node: &Self::Node) -> BoxSize;
    fn listen(
        &self,
        node: &Self::Node,
        kind: EventKind,
        handler: Handler,
    ) -> Result<Self::Listener, DomError>;
    /// Installs `css` once per document under `key`.
    fn install_stylesheet(&self, key: &str, css: &str) -> Result<(), DomError>;
}

/// Formats a coordinate for an attribute, trimming float noise.
pub fn coord(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{rounded}")
}

/// Declarative element description, appended in one go.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    tag: &'static str,
    attributes: Vec<(&'static str, String)>,
    text: Option<String>,
}

impl ElementSpec {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            text: None,
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl fmt::Display) -> Self {
        self.attributes.push((name, value.to_string()));
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn create<D: Dom>(&self, dom: &D) -> Result<D::Node, DomError> {
        let node = dom.create_element(self.tag)?;
        for (name, value) in &self.attributes {
            dom.set_attribute(&node, name, value)?;
        }
        if let Some(text) = &self.text {
            dom.set_text(&node, text);
        }
        Ok(node)
    }

    pub fn append_to<D: Dom>(&self, dom: &D, parent: &D::Node) -> Result<D::Node, DomError> {
        let node = self.create(dom)?;
        dom.append_child(parent, &node)?;
        Ok(node)
    }
}

/// Nodes and listeners created by one render. Dropping it unmounts the nodes and
/// detaches the listeners, whichever way the owning code exits.
pub struct Subtree<D: Dom> {
    dom: D,
    roots: Vec<D::Node>,
    listeners: Vec<D::Listener>,
}

impl<D: Dom> Subtree<D> {
    pub fn new(dom: &D) -> Self {
        Self {
            dom: dom.clone(),
            roots: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Appends `node` to `parent` and takes ownership of it.
    pub fn mount(&mut self, parent: &D::Node, node: D::Node) -> Result<D::Node, DomError> {
        self.dom.append_child(parent, &node)?;
        self.roots.push(node.clone());
        Ok(node)
    }

    /// Listener on any node, including ones this subtree does not own (e.g. the body).
    pub fn listen(
        &mut self,
        node: &D::Node,
        kind: EventKind,
        handler: Handler,
    ) -> Result<(), DomError> {
        let listener = self.dom.listen(node, kind, handler)?;
        self.listeners.push(listener);
        Ok(())
    }

    pub fn roots(&self) -> &[D::Node] {
        &self.roots
    }
}

impl<D: Dom> Drop for Subtree<D> {
    fn drop(&mut self) {
        self.listeners.clear();
        for root in self.roots.drain(..) {
            self.dom.remove(&root);
        }
    }
}

impl<D: Dom> fmt::Debug for Subtree<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subtree")
            .field("roots", &self.roots)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
