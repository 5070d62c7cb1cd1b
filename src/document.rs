//! Main SVG document structure and its XML-driven construction.
//!
//! The external XML parser hands us a generic node tree; [`DocumentBuilder`]
//! walks it in document order and populates a [`Document`].  The builder owns
//! the transient parse state: the container cursor (passed down the
//! recursion) and the `defs`/`flowRoot` nesting counters.

use crate::error::LoadingError;
use crate::gradient::{ColorStop, Gradient, GradientVariant, SpreadMethod};
use crate::node::{Element, Node, NodeData, Use};
use crate::parsers::{parse_dimension, Parse, UnitInterval};
use crate::path_builder::PathBuilder;
use crate::shapes::{Circle, Ellipse, Line, Points, Polygon, Polyline, Rect, Shape};
use crate::svgsym_log;
use crate::transform::Transform;
use crate::viewbox::ViewBox;

/// A loaded SVG document.
///
/// Created empty, populated by the builder, mutated in place by the
/// reference resolver, and read-only while rendering.
pub struct Document {
    /// Tree of nodes; the root is the `<svg>` element.
    pub(crate) root: Node,

    /// Declared width, in points.
    pub(crate) width: Option<f64>,

    /// Declared height, in points.
    pub(crate) height: Option<f64>,

    pub(crate) view_box: Option<ViewBox>,

    /// Flat, ordered list of the document's gradients.
    pub(crate) gradients: Vec<Gradient>,

    /// Whether the reference-resolution passes have run.
    pub(crate) resolved: bool,
}

impl Document {
    /// Builds a `Document` from an in-memory XML document.
    pub fn load_from_bytes(bytes: &[u8]) -> Result<Document, LoadingError> {
        let text = std::str::from_utf8(bytes).map_err(|_| LoadingError::Encoding)?;
        Document::load_from_str(text)
    }

    pub fn load_from_str(text: &str) -> Result<Document, LoadingError> {
        let xml = roxmltree::Document::parse(text)?;
        Ok(DocumentBuilder::default().build(&xml))
    }

    /// Returns the first gradient whose id matches `fragment`.
    pub(crate) fn gradient(&self, fragment: &str) -> Option<&Gradient> {
        self.gradients
            .iter()
            .find(|g| g.id.as_deref() == Some(fragment))
    }

    /// Depth-first search for the first node that has the wanted id and
    /// satisfies `accept`.
    pub(crate) fn node_by_id<P>(&self, fragment: &str, accept: P) -> Option<Node>
    where
        P: Fn(&NodeData) -> bool,
    {
        self.root.descendants().find(|n| {
            let data = n.borrow();
            data.id.as_deref() == Some(fragment) && accept(&data)
        })
    }
}

/// Looks up an attribute by its local name, ignoring any namespace prefix
/// (`xlink:href` and `href` are the same attribute here).
fn attr<'a>(xml: &roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    xml.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value())
}

fn f64_attr(xml: &roxmltree::Node<'_, '_>, name: &str) -> Option<f64> {
    let value = attr(xml, name)?;

    match f64::parse_str(value) {
        Ok(v) => Some(v),
        Err(_) => {
            svgsym_log!("ignoring attribute {}=\"{}\"", name, value);
            None
        }
    }
}

#[derive(Default)]
struct DocumentBuilder {
    width: Option<f64>,
    height: Option<f64>,
    view_box: Option<ViewBox>,
    gradients: Vec<Gradient>,

    defs_nesting: u32,
    flow_root_nesting: u32,
}

impl DocumentBuilder {
    fn build(mut self, xml: &roxmltree::Document<'_>) -> Document {
        let root_element = xml.root_element();

        if root_element.tag_name().name() == "svg" {
            self.read_header(&root_element);
        } else {
            svgsym_log!(
                "document root is <{}>, not <svg>",
                root_element.tag_name().name()
            );
        }

        let root = Node::new(NodeData::new(Element::Svg));

        for child in root_element.children().filter(|c| c.is_element()) {
            self.element(&child, &root);
        }

        Document {
            root,
            width: self.width,
            height: self.height,
            view_box: self.view_box,
            gradients: self.gradients,
            resolved: false,
        }
    }

    fn read_header(&mut self, xml: &roxmltree::Node<'_, '_>) {
        self.width = attr(xml, "width").and_then(parse_dimension);
        self.height = attr(xml, "height").and_then(parse_dimension);

        if let Some(vb) = attr(xml, "viewBox") {
            match ViewBox::parse_str(vb) {
                Ok(v) => self.view_box = Some(v),
                Err(_) => svgsym_log!("ignoring invalid viewBox \"{}\"", vb),
            }
        }
    }

    /// Per-element dispatch on the local name.
    fn element(&mut self, xml: &roxmltree::Node<'_, '_>, parent: &Node) {
        let name = xml.tag_name().name();

        match name {
            "defs" => {
                self.defs_nesting += 1;
                self.children(xml, parent);
                self.defs_nesting -= 1;
            }

            "flowRoot" => {
                self.flow_root_nesting += 1;
                self.children(xml, parent);
                self.flow_root_nesting -= 1;
            }

            "g" => {
                let node = self.insert(Element::Group, xml, parent);
                self.children(xml, &node);
            }

            "clipPath" => {
                let node = self.insert(Element::ClipPath, xml, parent);
                self.children(xml, &node);
            }

            "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" | "path" => {
                let shape = build_shape(name, xml);
                self.insert(Element::Shape(shape), xml, parent);
            }

            "use" => {
                let use_ = Use {
                    href: attr(xml, "href").map(str::to_string),
                    x: f64_attr(xml, "x"),
                    y: f64_attr(xml, "y"),
                    width: f64_attr(xml, "width"),
                    height: f64_attr(xml, "height"),
                };
                self.insert(Element::Use(use_), xml, parent);
            }

            "linearGradient" => {
                let variant = GradientVariant::Linear {
                    x1: f64_attr(xml, "x1"),
                    y1: f64_attr(xml, "y1"),
                    x2: f64_attr(xml, "x2"),
                    y2: f64_attr(xml, "y2"),
                };
                self.gradient(variant, xml);
            }

            "radialGradient" => {
                let variant = GradientVariant::Radial {
                    cx: f64_attr(xml, "cx"),
                    cy: f64_attr(xml, "cy"),
                    r: f64_attr(xml, "r"),
                };
                self.gradient(variant, xml);
            }

            "svg" => {
                // nested documents are not supported
                svgsym_log!("ignoring nested <svg> element");
            }

            _ => {
                // unknown elements are skipped, but their subtrees are still
                // walked; exclusion of regions like flowRoot happens through
                // the nesting flags, not by pruning
                self.children(xml, parent);
            }
        }
    }

    fn children(&mut self, xml: &roxmltree::Node<'_, '_>, parent: &Node) {
        for child in xml.children().filter(|c| c.is_element()) {
            self.element(&child, parent);
        }
    }

    /// Creates a node, applies the cross-cutting attribute passes, and
    /// inserts it under the current container.
    fn insert(&mut self, element: Element, xml: &roxmltree::Node<'_, '_>, parent: &Node) -> Node {
        let mut data = NodeData::new(element);

        data.is_defs = self.defs_nesting > 0;
        data.is_flow_root = self.flow_root_nesting > 0;

        apply_common_attributes(&mut data, xml);

        let node = Node::new(data);
        parent.append(node.clone());
        node
    }

    fn gradient(&mut self, variant: GradientVariant, xml: &roxmltree::Node<'_, '_>) {
        let mut gradient = Gradient::new(variant);

        gradient.id = attr(xml, "id").map(str::to_string);
        gradient.href = attr(xml, "href").map(str::to_string);

        if let Some(value) = attr(xml, "spreadMethod") {
            match SpreadMethod::parse_str(value) {
                Ok(spread) => gradient.spread = Some(spread),
                Err(_) => svgsym_log!("ignoring spreadMethod \"{}\"", value),
            }
        }

        if let Some(t) = attr(xml, "gradientTransform") {
            gradient.transform = Transform::from_attribute(t);
        }

        // stops are collected from the whole subtree, in document order
        for child in xml.descendants().filter(|c| c.is_element()) {
            if child.tag_name().name() == "stop" {
                gradient.stops.push(parse_stop(&child));
            }
        }

        self.gradients.push(gradient);
    }
}

/// The fixed attribute-pass order for every newly created node: id first,
/// then presentation attributes followed by the `style` shorthand (both
/// write the same record, so the shorthand overwrites), then `transform`,
/// then the `clip-path` reference.  The order is positional, not
/// specificity-based.
fn apply_common_attributes(data: &mut NodeData, xml: &roxmltree::Node<'_, '_>) {
    if let Some(id) = attr(xml, "id") {
        data.id = Some(id.to_string());
    }

    for attribute in xml.attributes() {
        data.style.set_property(attribute.name(), attribute.value());
    }
    if let Some(declarations) = attr(xml, "style") {
        data.style.apply_declarations(declarations);
    }

    if let Some(t) = attr(xml, "transform") {
        data.transform = Transform::from_attribute(t);
    }

    if let Some(clip) = attr(xml, "clip-path") {
        data.style.set_property("clip-path", clip);
    }
}

fn build_shape(name: &str, xml: &roxmltree::Node<'_, '_>) -> Shape {
    match name {
        "rect" => Shape::Rect(Rect {
            x: f64_attr(xml, "x").unwrap_or(0.0),
            y: f64_attr(xml, "y").unwrap_or(0.0),
            width: f64_attr(xml, "width").unwrap_or(0.0),
            height: f64_attr(xml, "height").unwrap_or(0.0),
            rx: f64_attr(xml, "rx"),
            ry: f64_attr(xml, "ry"),
        }),

        "circle" => Shape::Circle(Circle {
            cx: f64_attr(xml, "cx").unwrap_or(0.0),
            cy: f64_attr(xml, "cy").unwrap_or(0.0),
            r: f64_attr(xml, "r").unwrap_or(0.0),
        }),

        "ellipse" => Shape::Ellipse(Ellipse {
            cx: f64_attr(xml, "cx").unwrap_or(0.0),
            cy: f64_attr(xml, "cy").unwrap_or(0.0),
            rx: f64_attr(xml, "rx").unwrap_or(0.0),
            ry: f64_attr(xml, "ry").unwrap_or(0.0),
        }),

        "line" => Shape::Line(Line {
            x1: f64_attr(xml, "x1").unwrap_or(0.0),
            y1: f64_attr(xml, "y1").unwrap_or(0.0),
            x2: f64_attr(xml, "x2").unwrap_or(0.0),
            y2: f64_attr(xml, "y2").unwrap_or(0.0),
        }),

        "polyline" => Shape::Polyline(Polyline {
            points: points_attr(xml),
        }),

        "polygon" => Shape::Polygon(Polygon {
            points: points_attr(xml),
        }),

        "path" => {
            let mut builder = PathBuilder::default();

            if let Some(d) = attr(xml, "d") {
                if let Err(e) = builder.parse(d) {
                    // creating a partial path is OK; the error flag makes the
                    // shape render as empty
                    svgsym_log!("could not parse path: {}", e);
                }
            }

            Shape::Path(builder.into_path())
        }

        _ => unreachable!("build_shape called for <{}>", name),
    }
}

fn points_attr(xml: &roxmltree::Node<'_, '_>) -> Points {
    match attr(xml, "points") {
        Some(value) => match Points::parse_str(value) {
            Ok(points) => points,
            Err(_) => {
                svgsym_log!("ignoring invalid points \"{}\"", value);
                Points::default()
            }
        },
        None => Points::default(),
    }
}

fn parse_stop(xml: &roxmltree::Node<'_, '_>) -> ColorStop {
    let mut stop = ColorStop {
        offset: UnitInterval(0.0),
        color: None,
        opacity: UnitInterval(1.0),
    };

    if let Some(value) = attr(xml, "offset") {
        match UnitInterval::parse_str(value) {
            Ok(offset) => stop.offset = offset,
            Err(_) => svgsym_log!("ignoring stop offset \"{}\"", value),
        }
    }

    // attributes first, then the style shorthand with the same keys on top
    if let Some(value) = attr(xml, "stop-color") {
        set_stop_color(&mut stop, value);
    }
    if let Some(value) = attr(xml, "stop-opacity") {
        set_stop_opacity(&mut stop, value);
    }

    if let Some(declarations) = attr(xml, "style") {
        for declaration in declarations.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                match name.trim() {
                    "stop-color" => set_stop_color(&mut stop, value.trim()),
                    "stop-opacity" => set_stop_opacity(&mut stop, value.trim()),
                    _ => (),
                }
            }
        }
    }

    stop
}

fn set_stop_color(stop: &mut ColorStop, value: &str) {
    if value.trim() == "none" {
        stop.color = None;
    } else {
        match cssparser::RGBA::parse_str(value) {
            Ok(rgba) => stop.color = Some(rgba),
            Err(_) => svgsym_log!("ignoring stop-color \"{}\"", value),
        }
    }
}

fn set_stop_opacity(stop: &mut ColorStop, value: &str) {
    match UnitInterval::parse_str(value) {
        Ok(opacity) => stop.opacity = opacity,
        Err(_) => svgsym_log!("ignoring stop-opacity \"{}\"", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Paint;
    use cssparser::RGBA;

    fn load(s: &str) -> Document {
        Document::load_from_str(s).unwrap()
    }

    fn shapes(document: &Document) -> Vec<Node> {
        document
            .root
            .descendants()
            .filter(|n| n.borrow().is_shape())
            .collect()
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(Document::load_from_str("<svg><rect</svg>").is_err());
        assert!(Document::load_from_bytes(b"\xff\xfe<svg/>").is_err());
    }

    #[test]
    fn parses_header_dimensions() {
        let doc = load(r#"<svg width="2.54cm" height="36pt" viewBox="0 0 100 50"/>"#);

        assert_eq!(doc.width, Some(72.0));
        assert_eq!(doc.height, Some(36.0));
        let vb = doc.view_box.unwrap();
        assert_eq!((vb.width(), vb.height()), (100.0, 50.0));
    }

    #[test]
    fn viewbox_origin_zero_is_not_unset() {
        let doc = load(r#"<svg viewBox="0 0 10 10"/>"#);
        assert!(doc.view_box.is_some());
        assert!(doc.width.is_none());
        assert!(doc.height.is_none());
    }

    #[test]
    fn builds_shapes_in_document_order() {
        let doc = load(
            r#"<svg>
                 <rect width="10" height="10"/>
                 <g><circle r="5"/><line x2="3" y2="4"/></g>
                 <polygon points="0,0 1,0 1,1"/>
               </svg>"#,
        );

        let shapes = shapes(&doc);
        assert_eq!(shapes.len(), 4);
        assert!(matches!(
            shapes[0].borrow().element,
            Element::Shape(Shape::Rect(_))
        ));
        assert!(matches!(
            shapes[1].borrow().element,
            Element::Shape(Shape::Circle(_))
        ));

        // the circle's parent is the group
        assert!(shapes[1].parent().unwrap().borrow().is_group());
    }

    #[test]
    fn defs_descendants_are_flagged() {
        let doc = load(
            r#"<svg>
                 <defs><g id="sym"><rect width="4" height="4"/></g></defs>
                 <circle r="1"/>
               </svg>"#,
        );

        let shapes = shapes(&doc);
        assert!(shapes[0].borrow().is_defs);
        assert!(!shapes[1].borrow().is_defs);

        // flagged nodes are still visible to id lookup
        assert!(doc.node_by_id("sym", |d| d.is_group()).is_some());
    }

    #[test]
    fn style_shorthand_overwrites_presentation_attributes() {
        let doc = load(r#"<svg><rect width="1" height="1" fill="red" style="fill: blue"/></svg>"#);

        let shapes = shapes(&doc);
        let data = shapes[0].borrow();
        assert_eq!(data.style.fill, Some(Paint::Color(RGBA::new(0, 0, 255, 255))));
    }

    #[test]
    fn transform_and_clip_attributes_are_applied() {
        let doc = load(
            r#"<svg>
                 <clipPath id="c"><rect width="5" height="5"/></clipPath>
                 <rect width="1" height="1" transform="translate(3 4)" clip-path="url(#c)"/>
               </svg>"#,
        );

        let shapes = shapes(&doc);
        // the clipPath's own rect comes first in document order
        let data = shapes[1].borrow();
        assert_eq!(data.transform.transform_point(0.0, 0.0), (3.0, 4.0));
        assert_eq!(data.style.clip_path.as_deref(), Some("c"));
    }

    #[test]
    fn collects_gradients_with_stops() {
        let doc = load(
            r##"<svg>
                 <linearGradient id="a" x1="0" y1="0" x2="10" y2="0" spreadMethod="reflect">
                   <stop offset="0%" stop-color="#ff0000"/>
                   <stop offset="50%" stop-color="blue" stop-opacity="0.5"/>
                   <stop offset="200%" style="stop-color: none; stop-opacity: 0.25"/>
                 </linearGradient>
                 <radialGradient id="b" cx="5" cy="5" r="4" href="#a"/>
               </svg>"##,
        );

        assert_eq!(doc.gradients.len(), 2);

        let a = doc.gradient("a").unwrap();
        assert_eq!(a.spread, Some(SpreadMethod::Reflect));
        assert_eq!(a.stops.len(), 3);
        assert_eq!(a.stops[0].color, Some(RGBA::new(255, 0, 0, 255)));
        assert_eq!(a.stops[1].offset, UnitInterval(0.5));
        assert_eq!(a.stops[1].opacity, UnitInterval(0.5));
        // offsets clamp, the shorthand overwrites, `none` paints nothing
        assert_eq!(a.stops[2].offset, UnitInterval(1.0));
        assert_eq!(a.stops[2].color, None);
        assert_eq!(a.stops[2].opacity, UnitInterval(0.25));

        let b = doc.gradient("b").unwrap();
        assert_eq!(b.href.as_deref(), Some("#a"));
    }

    #[test]
    fn xlink_href_matches_by_local_name() {
        let doc = load(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink">
                 <use xlink:href="#missing" x="1"/>
               </svg>"##,
        );

        let node = doc.root.first_child().unwrap();
        match &node.borrow().element {
            Element::Use(u) => {
                assert_eq!(u.href.as_deref(), Some("#missing"));
                assert_eq!(u.x, Some(1.0));
                assert_eq!(u.y, None);
            }
            _ => panic!("expected a use node"),
        };
    }

    #[test]
    fn bad_path_data_sets_the_error_flag() {
        let doc = load(r#"<svg><path d="M 0 0 L 10 10 ~"/></svg>"#);

        let shapes = shapes(&doc);
        match &shapes[0].borrow().element {
            Element::Shape(Shape::Path(path)) => {
                assert!(path.is_errored());
                // the prefix before the failure is retained
                assert_eq!(path.commands().len(), 2);
            }
            _ => panic!("expected a path"),
        };
    }

    #[test]
    fn unknown_elements_are_walked_through() {
        let doc = load(r#"<svg><a><rect width="2" height="2"/></a></svg>"#);

        assert_eq!(shapes(&doc).len(), 1);
    }
}
