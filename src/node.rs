//! Tree nodes, the representation of SVG elements.
//!
//! The element tree uses the [rctree crate][rctree]: `rctree::Node` owns its
//! children and holds a weak pointer to its parent.  The weak edge is only
//! ever followed upward, to collect the ancestor chain for style and
//! transform resolution; ownership stays strictly tree-shaped.
//!
//! [rctree]: https://docs.rs/rctree

use crate::shapes::Shape;
use crate::style::Style;
use crate::transform::Transform;

/// Strong reference to an element in the tree.
pub type Node = rctree::Node<NodeData>;

/// Weak reference to an element in the tree.
pub type WeakNode = rctree::WeakNode<NodeData>;

/// Data for a single node.
#[derive(Clone)]
pub struct NodeData {
    pub id: Option<String>,

    pub element: Element,

    /// Composed `transform` attribute.
    pub transform: Transform,

    pub style: Style,

    /// Set when the node was inserted inside a `<defs>` region; such nodes
    /// are skipped by rendering but stay visible to reference resolution.
    pub is_defs: bool,

    /// Same, for `<flowRoot>` regions.
    pub is_flow_root: bool,
}

#[derive(Clone)]
pub enum Element {
    /// The document root.
    Svg,

    /// `<g>`
    Group,

    /// One of the shape elements; the payload carries its geometry.
    Shape(Shape),

    /// `<use>`; replaced in place by the reference resolver, and inert if
    /// its target never resolves.
    Use(Use),

    /// `<clipPath>`; owns child shapes that only ever generate clip
    /// regions, never pixels.
    ClipPath,
}

#[derive(Clone, Default)]
pub struct Use {
    pub href: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,

    // parsed but not consumed by resolution
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl NodeData {
    pub fn new(element: Element) -> NodeData {
        NodeData {
            id: None,
            element,
            transform: Transform::identity(),
            style: Style::default(),
            is_defs: false,
            is_flow_root: false,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.element, Element::Group)
    }

    pub fn is_shape(&self) -> bool {
        matches!(self.element, Element::Shape(_))
    }
}
