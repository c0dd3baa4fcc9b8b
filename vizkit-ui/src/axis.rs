//! Axis ticks drawn into a dedicated group. Each call clears the group first, so
//! redrawing after a zoom never leaves stale ticks behind.

use vizkit_core::format_numeric;
use vizkit_core::scale::{LinearScale, TimeScale};

use crate::dom::{coord, Dom, DomError, ElementSpec};

const TICK_SIZE: f64 = 6.0;

pub fn draw_time_axis<D: Dom>(
    dom: &D,
    group: &D::Node,
    scale: &TimeScale,
    count: usize,
) -> Result<usize, DomError> {
    dom.clear_children(group);
    domain_line(dom, group, scale.linear().range())?;
    let (interval, ticks) = scale.ticks(count);
    for at in &ticks {
        let label = at.format(interval.label_format()).to_string();
        tick(dom, group, scale.map(*at), &label)?;
    }
    Ok(ticks.len())
}

pub fn draw_linear_axis<D: Dom>(
    dom: &D,
    group: &D::Node,
    scale: &LinearScale,
    count: usize,
) -> Result<usize, DomError> {
    dom.clear_children(group);
    domain_line(dom, group, scale.range())?;
    let ticks = scale.ticks(count);
    for value in &ticks {
        tick(dom, group, scale.map(*value), &format_numeric(*value))?;
    }
    Ok(ticks.len())
}

fn domain_line<D: Dom>(dom: &D, group: &D::Node, range: (f64, f64)) -> Result<(), DomError> {
    ElementSpec::new("line")
        .class("vizkit-domain")
        .attr("x1", coord(range.0))
        .attr("x2", coord(range.1))
        .attr("stroke", "currentColor")
        .append_to(dom, group)?;
    Ok(())
}

fn tick<D: Dom>(dom: &D, group: &D::Node, x: f64, label: &str) -> Result<(), DomError> {
    let tick = ElementSpec::new("g")
        .class("vizkit-tick")
        .attr("transform", format!("translate({},0)", coord(x)))
        .append_to(dom, group)?;
    ElementSpec::new("line")
        .attr("y2", -TICK_SIZE)
        .attr("stroke", "currentColor")
        .append_to(dom, &tick)?;
    ElementSpec::new("text")
        .attr("y", -(TICK_SIZE + 3.0))
        .attr("text-anchor", "middle")
        .text(label)
        .append_to(dom, &tick)?;
    Ok(())
}
