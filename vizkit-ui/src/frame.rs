//! Skeleton shared by the row charts: a fixed axis strip above a scrollable data region.

use vizkit_core::dimensions::Dimensions;
use vizkit_core::scale::BandScale;

use crate::dom::{coord, Dom, DomError, ElementSpec, Subtree};

const LABEL_PADDING: f64 = 8.0;

pub(crate) struct RowFrame<D: Dom> {
    /// Axis group, translated past the gutter and onto the strip's bottom edge.
    pub axis: D::Node,
    /// Data-region svg; pan and zoom listen here.
    pub surface: D::Node,
    /// Mark group, translated past the gutter.
    pub marks: D::Node,
}

pub(crate) fn row_frame<D: Dom>(
    dom: &D,
    tree: &mut Subtree<D>,
    container: &D::Node,
    class: &str,
    dims: &Dimensions,
    band: &BandScale,
) -> Result<RowFrame<D>, DomError> {
    let gutter = dims.gutter();
    let root = ElementSpec::new("div")
        .class(&format!("vizkit {class}"))
        .attr("style", format!("width:{}px", coord(dims.width)))
        .create(dom)?;
    let root = tree.mount(container, root)?;

    let axis_region = ElementSpec::new("div")
        .class("vizkit-axis-region")
        .append_to(dom, &root)?;
    let axis_svg = ElementSpec::new("svg")
        .attr("width", coord(dims.width))
        .attr("height", coord(dims.axis_height))
        .append_to(dom, &axis_region)?;
    let axis = ElementSpec::new("g")
        .class("vizkit-axis")
        .attr(
            "transform",
            format!("translate({},{})", coord(gutter), coord(dims.axis_height - 1.0)),
        )
        .append_to(dom, &axis_svg)?;

    let data_region = ElementSpec::new("div")
        .class("vizkit-data-region")
        .attr(
            "style",
            format!("max-height:{}px", coord(dims.viewport_height())),
        )
        .append_to(dom, &root)?;
    let surface = ElementSpec::new("svg")
        .attr("width", coord(dims.width))
        .attr("height", coord(dims.content_height))
        .append_to(dom, &data_region)?;

    let labels = ElementSpec::new("g")
        .class("vizkit-labels")
        .append_to(dom, &surface)?;
    let half = band.bandwidth() / 2.0;
    for label in band.domain() {
        let Some(y) = band.position(label) else {
            continue;
        };
        ElementSpec::new("text")
            .class("vizkit-row-label")
            .attr("x", coord(gutter - LABEL_PADDING))
            .attr("y", coord(y + half))
            .attr("text-anchor", "end")
            .attr("dominant-baseline", "middle")
            .text(label)
            .append_to(dom, &labels)?;
    }

    let marks = ElementSpec::new("g")
        .class("vizkit-marks")
        .attr("transform", format!("translate({},0)", coord(gutter)))
        .append_to(dom, &surface)?;

    Ok(RowFrame {
        axis,
        surface,
        marks,
    })
}
