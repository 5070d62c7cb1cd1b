//! The rendering walk.
//!
//! Walks the resolved document in order and turns each visible shape into
//! Cairo calls: effective style and transform come from the ancestor chain,
//! clipping is applied per shape, geometry is emitted, then fill and stroke
//! run with the resolved paint sources.

use std::f64::consts::PI;

use crate::document::Document;
use crate::error::RenderingError;
use crate::gradient::{Gradient, GradientVariant};
use crate::node::{Element, Node};
use crate::path_builder::{
    arc_segment, ArcParameterization, CubicBezierCurve, EllipticalArc, Path, PathCommand,
};
use crate::shapes::Shape;
use crate::style::{ResolvedPaint, ResolvedStyle, Style};
use crate::svgsym_log;
use crate::transform::Transform;

pub struct DrawingCtx<'a> {
    document: &'a Document,
    cr: cairo::Context,

    /// Maps viewBox space onto the output surface; everything accumulates on
    /// top of this.
    base: Transform,
}

impl<'a> DrawingCtx<'a> {
    pub fn new(document: &'a Document, cr: cairo::Context, base: Transform) -> DrawingCtx<'a> {
        DrawingCtx { document, cr, base }
    }

    /// Draws every top-level item in document order.
    pub fn render_document(&mut self) -> Result<(), RenderingError> {
        for child in self.document.root.children() {
            self.draw_node(&child)?;
        }

        Ok(())
    }

    fn draw_node(&mut self, node: &Node) -> Result<(), RenderingError> {
        {
            let data = node.borrow();

            if data.is_defs || data.is_flow_root {
                return Ok(());
            }

            match data.element {
                Element::Group | Element::Svg => (),

                Element::Shape(ref shape) => {
                    let shape = shape.clone();
                    drop(data);
                    return self.draw_shape(node, &shape);
                }

                // an unresolved use is inert; clip paths only ever produce
                // clip regions
                Element::Use(_) | Element::ClipPath => return Ok(()),
            }
        }

        for child in node.children() {
            self.draw_node(&child)?;
        }

        Ok(())
    }

    fn draw_shape(&mut self, node: &Node, shape: &Shape) -> Result<(), RenderingError> {
        if let Shape::Path(path) = shape {
            if path.is_errored() || path.is_empty() {
                return Ok(());
            }
        }

        let style = self.resolve_style(node);

        if style.fill.is_none() && style.stroke.is_none() {
            return Ok(());
        }

        let transform = self.resolve_transform(node);

        self.cr.save()?;

        if let Some(clip) = style.clip.clone() {
            self.apply_clip(&clip, transform)?;
        }

        self.cr.set_matrix(transform.into());

        self.emit_shape(shape)?;

        if let Some(ref fill) = style.fill {
            self.cr.set_fill_rule(cairo::FillRule::from(style.fill_rule));

            if self.set_paint(fill, style.fill_opacity)? {
                if style.stroke.is_some() {
                    self.cr.fill_preserve()?;
                } else {
                    self.cr.fill()?;
                }
            }
        }

        if let Some(ref stroke) = style.stroke {
            setup_cr_for_stroke(&self.cr, &style);

            if self.set_paint(stroke, style.stroke_opacity)? {
                self.cr.stroke()?;
            }
        }

        // drop whatever is left when a paint was skipped
        self.cr.new_path();

        // restoring also resets the clip region for the next shape
        self.cr.restore()?;

        Ok(())
    }

    /// Merges the styles of the ancestor chain, root first, then the node's
    /// own, and applies the defaulting rules.
    fn resolve_style(&self, node: &Node) -> ResolvedStyle {
        let mut chain: Vec<Node> = node.ancestors().collect();
        chain.reverse();

        let mut merged = Style::default();
        for n in &chain {
            merged.merge_from(&n.borrow().style);
        }

        merged.to_resolved(&self.document.gradients)
    }

    /// Accumulates the ancestor transforms, root first, on top of the base
    /// matrix.
    fn resolve_transform(&self, node: &Node) -> Transform {
        let mut chain: Vec<Node> = node.ancestors().collect();
        chain.reverse();

        let mut t = self.base;
        for n in &chain {
            t = t.pre_transform(&n.borrow().transform);
        }

        t
    }

    /// Intersects the clip region with every shape of the referenced clip
    /// subtree.  Only geometry is taken from the clip shapes; their styles
    /// are ignored.
    fn apply_clip(&mut self, clip_root: &Node, transform: Transform) -> Result<(), RenderingError> {
        self.emit_clip_node(clip_root, transform)?;
        self.cr.clip();

        Ok(())
    }

    fn emit_clip_node(&mut self, node: &Node, transform: Transform) -> Result<(), RenderingError> {
        let data = node.borrow();
        let t = transform.pre_transform(&data.transform);

        if let Element::Shape(ref shape) = data.element {
            if let Shape::Path(path) = shape {
                if path.is_errored() {
                    return Ok(());
                }
            }

            let shape = shape.clone();
            drop(data);

            self.cr.set_matrix(t.into());
            self.emit_shape(&shape)?;

            return Ok(());
        }

        drop(data);

        for child in node.children() {
            self.emit_clip_node(&child, t)?;
        }

        Ok(())
    }

    /// Emits a shape's geometry as the current Cairo path.
    fn emit_shape(&mut self, shape: &Shape) -> Result<(), RenderingError> {
        match shape {
            Shape::Rect(r) => emit_path(&self.cr, &r.make_path()),
            Shape::Line(l) => emit_path(&self.cr, &l.make_path()),
            Shape::Polyline(p) => emit_path(&self.cr, &p.make_path()),
            Shape::Polygon(p) => emit_path(&self.cr, &p.make_path()),
            Shape::Path(p) => emit_path(&self.cr, p),

            Shape::Circle(c) => {
                if c.r <= 0.0 {
                    return Ok(());
                }

                self.cr.save()?;
                self.cr.translate(c.cx, c.cy);
                self.cr.arc(0.0, 0.0, c.r, 0.0, 2.0 * PI);
                self.cr.close_path();
                self.cr.restore()?;

                Ok(())
            }

            Shape::Ellipse(e) => {
                if e.rx <= 0.0 || e.ry <= 0.0 {
                    return Ok(());
                }

                // Half-radius translate/scale with a fixed arc of radius 2;
                // note the center offset, which is part of the expected
                // geometry of this renderer.
                self.cr.save()?;
                self.cr.translate(e.cx + e.rx / 2.0, e.cy + e.ry / 2.0);
                self.cr.scale(e.rx / 2.0, e.ry / 2.0);
                self.cr.arc(0.0, 0.0, 2.0, 0.0, 2.0 * PI);
                self.cr.close_path();
                self.cr.restore()?;

                Ok(())
            }
        }
    }

    fn set_paint(&mut self, paint: &ResolvedPaint, opacity: f64) -> Result<bool, RenderingError> {
        match paint {
            ResolvedPaint::Color(rgba) => {
                self.cr.set_source_rgba(
                    f64::from(rgba.red_f32()),
                    f64::from(rgba.green_f32()),
                    f64::from(rgba.blue_f32()),
                    f64::from(rgba.alpha_f32()) * opacity,
                );
                Ok(true)
            }

            ResolvedPaint::Gradient(gradient) => self.set_gradient(gradient, opacity),
        }
    }

    fn set_gradient(&mut self, gradient: &Gradient, opacity: f64) -> Result<bool, RenderingError> {
        let g = match gradient.variant {
            GradientVariant::Linear { x1, y1, x2, y2 } => {
                cairo::Gradient::clone(&cairo::LinearGradient::new(
                    x1.unwrap_or(0.0),
                    y1.unwrap_or(0.0),
                    x2.unwrap_or(0.0),
                    y2.unwrap_or(0.0),
                ))
            }

            GradientVariant::Radial { cx, cy, r } => {
                let r = r.unwrap_or(0.0);
                if r <= 0.0 {
                    svgsym_log!("radial gradient with no radius, painting nothing");
                    return Ok(false);
                }

                let cx = cx.unwrap_or(0.0);
                let cy = cy.unwrap_or(0.0);

                cairo::Gradient::clone(&cairo::RadialGradient::new(cx, cy, 0.0, cx, cy, r))
            }
        };

        // The pattern matrix maps user space into gradient space, so the
        // accumulated gradient transform goes in inverted.
        match gradient.transform.invert() {
            Some(m) => g.set_matrix(m.into()),
            None => {
                svgsym_log!("gradient transform is not invertible, painting nothing");
                return Ok(false);
            }
        }

        g.set_extend(cairo::Extend::from(gradient.spread.unwrap_or_default()));

        for stop in &gradient.stops {
            // stops without a color paint nothing
            if let Some(rgba) = stop.color {
                g.add_color_stop_rgba(
                    stop.offset.0,
                    f64::from(rgba.red_f32()),
                    f64::from(rgba.green_f32()),
                    f64::from(rgba.blue_f32()),
                    f64::from(rgba.alpha_f32()) * stop.opacity.0 * opacity,
                );
            }
        }

        self.cr.set_source(&g)?;

        Ok(true)
    }
}

fn setup_cr_for_stroke(cr: &cairo::Context, style: &ResolvedStyle) {
    cr.set_line_width(style.stroke_width);
    cr.set_miter_limit(style.miter_limit);
    cr.set_line_cap(cairo::LineCap::from(style.line_cap));
    cr.set_line_join(cairo::LineJoin::from(style.line_join));

    if !style.dashes.is_empty() {
        cr.set_dash(&style.dashes, style.dash_offset);
    } else {
        cr.set_dash(&[], 0.0);
    }
}

/// Replays a stored path into the Cairo context.
///
/// A `ClosePath` followed by anything but a `MoveTo` re-anchors the next
/// subpath at the current point with a synthesized `MoveTo`.
fn emit_path(cr: &cairo::Context, path: &Path) -> Result<(), RenderingError> {
    let mut after_close = false;

    for command in path.commands() {
        if after_close && !matches!(command, PathCommand::MoveTo(..)) {
            if let Ok((x, y)) = cr.current_point() {
                cr.move_to(x, y);
            }
        }
        after_close = false;

        match *command {
            PathCommand::MoveTo(x, y) => cr.move_to(x, y),
            PathCommand::LineTo(x, y) => cr.line_to(x, y),

            // a raised quadratic replays exactly like the cubic it stores
            PathCommand::CurveTo(ref curve) | PathCommand::QuadraticTo(ref curve) => {
                curve_to_cairo(cr, curve)
            }

            PathCommand::Arc(ref arc) => arc_to_cairo(cr, arc),

            PathCommand::ClosePath => {
                cr.close_path();
                after_close = true;
            }
        }
    }

    Ok(())
}

fn curve_to_cairo(cr: &cairo::Context, curve: &CubicBezierCurve) {
    let CubicBezierCurve { pt1, pt2, to } = *curve;
    cr.curve_to(pt1.0, pt1.1, pt2.0, pt2.1, to.0, to.1);
}

/// Flattens an elliptical arc into cubic segments of at most a bit over 90
/// degrees each.
fn arc_to_cairo(cr: &cairo::Context, arc: &EllipticalArc) {
    match arc.center_parameterization() {
        ArcParameterization::CenterParameters {
            center,
            radii,
            theta1,
            delta_theta,
        } => {
            let n_segs = (delta_theta / (PI * 0.5 + 0.001)).abs().ceil() as u32;
            let d_theta = delta_theta / f64::from(n_segs);

            let mut theta = theta1;
            for _ in 0..n_segs {
                let segment = arc_segment(center, radii, arc.x_axis_rotation, theta, theta + d_theta);
                curve_to_cairo(cr, &segment);
                theta += d_theta;
            }
        }

        ArcParameterization::LineTo => {
            let (x2, y2) = arc.to;
            cr.line_to(x2, y2);
        }

        ArcParameterization::Omit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_builder::PathBuilder;

    fn test_context() -> (cairo::ImageSurface, cairo::Context) {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 10, 10).unwrap();
        let cr = cairo::Context::new(&surface).unwrap();
        (surface, cr)
    }

    #[test]
    fn close_followed_by_draw_gets_a_move_to() {
        let (_surface, cr) = test_context();

        let mut builder = PathBuilder::default();
        builder.parse("M1 2 L3 4 Z L5 6").unwrap();

        emit_path(&cr, &builder.into_path()).unwrap();

        let segments: Vec<cairo::PathSegment> = cr.copy_path().unwrap().iter().collect();

        // the second subpath is re-anchored at the point the close returned
        // to, i.e. the start of the first subpath
        let n = segments.len();
        assert!(segments
            .iter()
            .any(|s| matches!(s, cairo::PathSegment::ClosePath)));
        assert!(
            matches!(segments[n - 2], cairo::PathSegment::MoveTo((x, y)) if x == 1.0 && y == 2.0)
        );
        assert!(
            matches!(segments[n - 1], cairo::PathSegment::LineTo((x, y)) if x == 5.0 && y == 6.0)
        );
    }

    #[test]
    fn zero_radius_arc_draws_a_line() {
        let (_surface, cr) = test_context();

        let mut builder = PathBuilder::default();
        builder.parse("M0 0 A 0 5 0 0 1 10 0").unwrap();

        emit_path(&cr, &builder.into_path()).unwrap();

        let segments: Vec<cairo::PathSegment> = cr.copy_path().unwrap().iter().collect();

        assert_eq!(segments.len(), 2);
        assert!(
            matches!(segments[1], cairo::PathSegment::LineTo((x, y)) if x == 10.0 && y == 0.0)
        );
    }
}
