//! Floating tooltip and modal panels, mounted on the document body.

use std::rc::Rc;

use crate::dom::{
    coord, Dom, DomError, ElementSpec, EventKind, Handler, PointerEvent, Propagation, Subtree,
};

/// Offset between the pointer and the tooltip corner.
const POINTER_OFFSET: f64 = 12.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayContent {
    pub title: String,
    pub rows: Vec<(String, String)>,
    pub description: String,
}

impl OverlayContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn row(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((name.into(), value.into()));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

pub fn tooltip<D: Dom>(
    dom: &D,
    content: &OverlayContent,
    event: &PointerEvent,
) -> Result<Subtree<D>, DomError> {
    let body = dom.body()?;
    let mut tree = Subtree::new(dom);
    let node = ElementSpec::new("div")
        .class("vizkit-tooltip")
        .attr("role", "tooltip")
        .attr(
            "style",
            format!(
                "left:{}px;top:{}px",
                coord(event.client_x + POINTER_OFFSET),
                coord(event.client_y + POINTER_OFFSET)
            ),
        )
        .create(dom)?;
    let node = tree.mount(&body, node)?;
    write_content(dom, &node, content)?;
    Ok(tree)
}

/// Backdrop plus centered panel. Clicking the backdrop runs `on_close`; clicks inside
/// the panel stop there.
pub fn modal<D: Dom>(
    dom: &D,
    content: &OverlayContent,
    on_close: Handler,
) -> Result<Subtree<D>, DomError> {
    let body = dom.body()?;
    let mut tree = Subtree::new(dom);
    let backdrop = ElementSpec::new("div")
        .class("vizkit-modal-backdrop")
        .create(dom)?;
    let backdrop = tree.mount(&body, backdrop)?;
    let panel = ElementSpec::new("div")
        .class("vizkit-modal")
        .attr("role", "dialog")
        .append_to(dom, &backdrop)?;
    write_content(dom, &panel, content)?;

    tree.listen(&backdrop, EventKind::Click, on_close)?;
    tree.listen(
        &panel,
        EventKind::Click,
        Rc::new(|_: &PointerEvent| Propagation::Stop),
    )?;
    Ok(tree)
}

fn write_content<D: Dom>(
    dom: &D,
    parent: &D::Node,
    content: &OverlayContent,
) -> Result<(), DomError> {
    ElementSpec::new("p")
        .class("vizkit-overlay-title")
        .text(content.title.as_str())
        .append_to(dom, parent)?;
    for (name, value) in &content.rows {
        let row = ElementSpec::new("div")
            .class("vizkit-overlay-row")
            .append_to(dom, parent)?;
        ElementSpec::new("span").text(name.as_str()).append_to(dom, &row)?;
        ElementSpec::new("strong").text(value.as_str()).append_to(dom, &row)?;
    }
    if !content.description.is_empty() {
        ElementSpec::new("p")
            .class("vizkit-overlay-description")
            .text(content.description.as_str())
            .append_to(dom, parent)?;
    }
    Ok(())
}
