//! In-memory document used as the host outside the browser (tests, CLI rendering).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use vizkit_core::dimensions::BoxSize;

use crate::dom::{Dom, DomError, EventKind, Handler, PointerEvent, Propagation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    size: BoxSize,
    listeners: Vec<(u64, EventKind, Handler)>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            size: BoxSize::default(),
            listeners: Vec::new(),
        }
    }
}

struct Arena {
    nodes: Vec<NodeData>,
    body: NodeId,
    next_listener: u64,
    stylesheets: BTreeMap<String, String>,
}

impl Arena {
    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| DomError(format!("unknown node {id:?}")))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| DomError(format!("unknown node {id:?}")))
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(id.0).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.retain(|child| *child != id);
        }
    }
}

/// Shared handle to a tree of nodes rooted at a `<body>`.
///
/// Nodes live in an append-only arena: removal detaches a node but never frees its
/// slot, so memory grows with every render. Meant for tests and one-shot rendering.
#[derive(Clone)]
pub struct MemoryDom {
    arena: Rc<RefCell<Arena>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        let arena = Arena {
            nodes: vec![NodeData::new("body")],
            body: NodeId(0),
            next_listener: 0,
            stylesheets: BTreeMap::new(),
        };
        Self {
            arena: Rc::new(RefCell::new(arena)),
        }
    }

    /// A sized `<div>` attached to the body, standing in for the host page element.
    pub fn create_host(&self, width: f64, height: f64) -> NodeId {
        let mut arena = self.arena.borrow_mut();
        let id = NodeId(arena.nodes.len());
        let mut node = NodeData::new("div");
        node.size = BoxSize::new(width, height);
        node.parent = Some(arena.body);
        arena.nodes.push(node);
        let body = arena.body;
        arena.nodes[body.0].children.push(id);
        id
    }

    pub fn set_size(&self, node: NodeId, size: BoxSize) {
        if let Ok(data) = self.arena.borrow_mut().node_mut(node) {
            data.size = size;
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.arena.borrow().node(node).ok().map(|n| n.tag.clone())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.arena
            .borrow()
            .node(node)
            .ok()
            .and_then(|n| n.attributes.get(name).cloned())
    }

    /// Attribute parsed as a number, for geometry assertions.
    pub fn number(&self, node: NodeId, name: &str) -> Option<f64> {
        self.attribute(node, name)?.parse().ok()
    }

    pub fn text(&self, node: NodeId) -> String {
        self.arena
            .borrow()
            .node(node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().node(node).ok().and_then(|n| n.parent)
    }

    pub fn body_id(&self) -> NodeId {
        self.arena.borrow().body
    }

    /// Attached descendants of `root` (excluding it) in document order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let arena = self.arena.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = arena
            .node(root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Ok(node) = arena.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Attached descendants of `root` carrying `class` in their class list.
    pub fn find_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| {
                self.attribute(*id, "class")
                    .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
            })
            .collect()
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.arena
            .borrow()
            .node(node)
            .map(|n| n.listeners.len())
            .unwrap_or(0)
    }

    pub fn stylesheet(&self, key: &str) -> Option<String> {
        self.arena.borrow().stylesheets.get(key).cloned()
    }

    /// Runs handlers on `target` then up its ancestors until one returns `Stop`.
    /// Returns how many handlers ran.
    pub fn dispatch(&self, target: NodeId, kind: EventKind, event: PointerEvent) -> usize {
        let mut path = vec![target];
        if kind.bubbles() {
            let mut current = self.parent(target);
            while let Some(id) = current {
                path.push(id);
                current = self.parent(id);
            }
        }

        let mut ran = 0;
        for node in path {
            // Handlers may mutate the tree; collect them before calling.
            let handlers: Vec<Handler> = match self.arena.borrow().node(node) {
                Ok(data) => data
                    .listeners
                    .iter()
                    .filter(|(_, k, _)| *k == kind)
                    .map(|(_, _, handler)| Rc::clone(handler))
                    .collect(),
                Err(_) => Vec::new(),
            };
            let mut stopped = false;
            for handler in handlers {
                ran += 1;
                if handler(&event) == Propagation::Stop {
                    stopped = true;
                }
            }
            if stopped {
                break;
            }
        }
        ran
    }

    /// Serializes `node` and its attached subtree as markup.
    pub fn to_markup(&self, node: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        write_markup(&arena, node, &mut out);
        out
    }
}

fn write_markup(arena: &Arena, id: NodeId, out: &mut String) {
    let Ok(node) = arena.node(id) else {
        return;
    };
    out.push('<');
    out.push_str(&node.tag);
    if node.tag == "svg" {
        out.push_str(" xmlns=\"http://www.w3.org/2000/svg\"");
    }
    for (name, value) in &node.attributes {
        out.push_str(&format!(" {name}=\"{}\"", escape(value)));
    }
    out.push('>');
    out.push_str(&escape(&node.text));
    for child in &node.children {
        write_markup(arena, *child, out);
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Detaches its handler when dropped.
pub struct MemoryListener {
    arena: Weak<RefCell<Arena>>,
    node: NodeId,
    id: u64,
}

impl Drop for MemoryListener {
    fn drop(&mut self) {
        let Some(arena) = self.arena.upgrade() else {
            return;
        };
        let Ok(mut arena) = arena.try_borrow_mut() else {
            return;
        };
        if let Ok(node) = arena.node_mut(self.node) {
            node.listeners.retain(|(id, _, _)| *id != self.id);
        }
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;
    type Listener = MemoryListener;

    fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        let mut arena = self.arena.borrow_mut();
        let id = NodeId(arena.nodes.len());
        arena.nodes.push(NodeData::new(tag));
        Ok(id)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.arena
            .borrow_mut()
            .node_mut(*node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<(), DomError> {
        self.arena.borrow_mut().node_mut(*node)?.attributes.remove(name);
        Ok(())
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        if let Ok(data) = self.arena.borrow_mut().node_mut(*node) {
            data.text = text.to_string();
        }
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        let mut arena = self.arena.borrow_mut();
        arena.node(*parent)?;
        arena.node(*child)?;
        arena.detach(*child);
        arena.node_mut(*child)?.parent = Some(*parent);
        arena.node_mut(*parent)?.children.push(*child);
        Ok(())
    }

    fn remove(&self, node: &NodeId) {
        self.arena.borrow_mut().detach(*node);
    }

    fn clear_children(&self, node: &NodeId) {
        let mut arena = self.arena.borrow_mut();
        let children = match arena.node_mut(*node) {
            Ok(data) => std::mem::take(&mut data.children),
            Err(_) => return,
        };
        for child in children {
            if let Ok(data) = arena.node_mut(child) {
                data.parent = None;
            }
        }
    }

    fn body(&self) -> Result<NodeId, DomError> {
        Ok(self.arena.borrow().body)
    }

    fn measure(&self, node: &NodeId) -> BoxSize {
        self.arena
            .borrow()
            .node(*node)
            .map(|n| n.size)
            .unwrap_or_default()
    }

    fn listen(
        &self,
        node: &NodeId,
        kind: EventKind,
        handler: Handler,
    ) -> Result<MemoryListener, DomError> {
        let mut arena = self.arena.borrow_mut();
        let id = arena.next_listener;
        arena.next_listener += 1;
        arena.node_mut(*node)?.listeners.push((id, kind, handler));
        Ok(MemoryListener {
            arena: Rc::downgrade(&self.arena),
            node: *node,
            id,
        })
    }

    fn install_stylesheet(&self, key: &str, css: &str) -> Result<(), DomError> {
        self.arena
            .borrow_mut()
            .stylesheets
            .entry(key.to_string())
            .or_insert_with(|| css.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, Subtree};
    use std::cell::Cell;

    #[test]
    fn subtree_drop_unmounts_and_detaches() {
        let dom = MemoryDom::new();
        let host = dom.create_host(100.0, 50.0);
        let body = dom.body_id();
        {
            let mut tree = Subtree::new(&dom);
            let node = ElementSpec::new("div").class("chart").create(&dom).unwrap();
            tree.mount(&host, node).unwrap();
            let keep = Rc::new(|_: &PointerEvent| Propagation::Continue);
            tree.listen(&body, EventKind::Click, keep).unwrap();
            assert_eq!(dom.children(host).len(), 1);
            assert_eq!(dom.listener_count(body), 1);
        }
        assert!(dom.children(host).is_empty());
        assert_eq!(dom.listener_count(body), 0);
    }

    #[test]
    fn stop_halts_bubbling() {
        let dom = MemoryDom::new();
        let host = dom.create_host(100.0, 50.0);
        let inner = ElementSpec::new("rect").append_to(&dom, &host).unwrap();
        let body_hits = Rc::new(Cell::new(0));

        let hits = Rc::clone(&body_hits);
        let _body = dom
            .listen(
                &dom.body_id(),
                EventKind::Click,
                Rc::new(move |_: &PointerEvent| {
                    hits.set(hits.get() + 1);
                    Propagation::Continue
                }),
            )
            .unwrap();
        dom.dispatch(inner, EventKind::Click, PointerEvent::default());
        assert_eq!(body_hits.get(), 1);

        let _stop = dom
            .listen(
                &inner,
                EventKind::Click,
                Rc::new(|_: &PointerEvent| Propagation::Stop),
            )
            .unwrap();
        dom.dispatch(inner, EventKind::Click, PointerEvent::default());
        assert_eq!(body_hits.get(), 1);
    }

    #[test]
    fn markup_escapes_text() {
        let dom = MemoryDom::new();
        let host = dom.create_host(10.0, 10.0);
        ElementSpec::new("text")
            .attr("x", 3)
            .text("a < b")
            .append_to(&dom, &host)
            .unwrap();
        assert_eq!(dom.to_markup(host), "<div><text x=\"3\">a &lt; b</text></div>");
    }
}
