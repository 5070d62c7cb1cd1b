//! The reference-resolution passes.
//!
//! After parsing, the document is mutated in place by exactly three passes,
//! in this order: gradient href merging, clip-path lookup, and `<use>`
//! expansion.  All of them are first-match-wins and degrade gracefully on a
//! missing target.

use crate::document::Document;
use crate::node::{Element, Node};
use crate::style::fragment_of;
use crate::svgsym_log;
use crate::transform::Transform;

// Backstop for pathological `<use>` fan-out: the total number of nodes that
// expansion may clone into the tree.
const MAX_REFERENCED_NODES: usize = 50_000;

/// Runs the three passes once; later calls are no-ops.
pub fn resolve_references(document: &mut Document) {
    if document.resolved {
        return;
    }
    document.resolved = true;

    resolve_gradient_hrefs(document);
    resolve_clip_paths(document);
    resolve_use_elements(document);
}

/// Pass 1: merge each gradient with its referenced gradient.
///
/// A single sweep in list order; every pending href is looked up once
/// against the current state of the list, so a reference to an earlier
/// gradient sees that gradient already merged, while a forward reference
/// merges one level.  The merged node replaces the referencing one in its
/// list slot.
fn resolve_gradient_hrefs(document: &mut Document) {
    for i in 0..document.gradients.len() {
        let href = match document.gradients[i].href.take() {
            Some(href) => href,
            None => continue,
        };

        let fragment = fragment_of(&href);

        let referenced = document
            .gradients
            .iter()
            .find(|g| g.id.as_deref() == Some(fragment.as_str()))
            .cloned();

        match referenced {
            Some(referenced) => {
                let merged = document.gradients[i].resolve_from(&referenced);
                document.gradients[i] = merged;
            }
            None => {
                svgsym_log!("gradient reference \"{}\" not found", href);
            }
        }
    }
}

/// Pass 2: look up every `clip-path` reference and store the target on the
/// referencing style.  Misses leave the pointer unset and the clip is
/// silently skipped when drawing.
fn resolve_clip_paths(document: &mut Document) {
    let nodes: Vec<Node> = document.root.descendants().collect();

    for node in nodes {
        let fragment = match node.borrow().style.clip_path.clone() {
            Some(fragment) => fragment,
            None => continue,
        };

        let target = document.node_by_id(&fragment, |d| {
            matches!(d.element, Element::ClipPath | Element::Group)
        });

        match target {
            Some(target) => {
                node.borrow_mut().style.clip_node = Some(target.downgrade());
            }
            None => {
                svgsym_log!("clip-path \"#{}\" not found, clipping skipped", fragment);
            }
        }
    }
}

/// Pass 3: replace every `<use>` with a deep clone of its target.
fn resolve_use_elements(document: &mut Document) {
    let root = document.root.clone();
    let mut expansions = 0;
    resolve_uses_under(document, &root, &mut expansions);
}

/// Depth-first walk.  When a `<use>` is replaced, the walk continues into
/// the replacement, so nested references cloned in from elsewhere resolve in
/// the same pass.
fn resolve_uses_under(document: &Document, node: &Node, expansions: &mut usize) {
    let mut child = node.first_child();

    while let Some(current) = child {
        let next = current.next_sibling();

        let is_use = matches!(current.borrow().element, Element::Use(_));

        if is_use {
            if let Some(replacement) = expand_use(document, &current, expansions) {
                resolve_uses_under(document, &replacement, expansions);
            }
        } else {
            resolve_uses_under(document, &current, expansions);
        }

        child = next;
    }
}

/// Expands one `<use>` node.  Returns the clone that replaced it, or `None`
/// when the node stays inert (no href, missing target, expansion limit).
fn expand_use(document: &Document, use_node: &Node, expansions: &mut usize) -> Option<Node> {
    let (href, x, y, use_style, use_transform, is_defs, is_flow_root) = {
        let data = use_node.borrow();

        let u = match data.element {
            Element::Use(ref u) => u,
            _ => unreachable!("expand_use on a non-use node"),
        };

        if u.width.is_some() || u.height.is_some() {
            svgsym_log!("width/height on <use> are ignored");
        }

        (
            u.href.clone(),
            u.x,
            u.y,
            data.style.clone(),
            data.transform,
            data.is_defs,
            data.is_flow_root,
        )
    };

    let href = href?;
    let fragment = fragment_of(&href);

    let target = match document.node_by_id(&fragment, |d| d.is_shape() || d.is_group()) {
        Some(target) => target,
        None => {
            svgsym_log!("<use> reference \"{}\" not found", href);
            return None;
        }
    };

    // a target that encloses the reference would clone itself forever
    if use_node.ancestors().any(|a| a == target) {
        svgsym_log!("circular <use> reference \"{}\"", href);
        return None;
    }

    *expansions += target.descendants().count();
    if *expansions > MAX_REFERENCED_NODES {
        svgsym_log!("too many referenced nodes, leaving \"{}\" unresolved", href);
        return None;
    }

    let clone = target.make_deep_copy();

    // ids are dropped so the clone can never be referenced itself
    for n in clone.descendants() {
        n.borrow_mut().id = None;
    }

    {
        let mut data = clone.borrow_mut();

        // The target's own transform happens first on points, then the use's
        // transform, then the implicit x/y translate.  The translate exists
        // only when at least one coordinate was given explicitly.
        data.transform = data.transform.pre_transform(&use_transform);
        if x.is_some() || y.is_some() {
            let t = Transform::new_translate(x.unwrap_or(0.0), y.unwrap_or(0.0));
            data.transform = data.transform.pre_transform(&t);
        }

        // the use's set style fields overlay the clone's
        data.style.merge_from(&use_style);
    }

    // the clone takes its structural position from the use node
    for n in clone.descendants() {
        let mut data = n.borrow_mut();
        data.is_defs = is_defs;
        data.is_flow_root = is_flow_root;
    }

    use_node.insert_after(clone.clone());
    use_node.detach();

    Some(clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::GradientVariant;
    use crate::node::NodeData;
    use crate::shapes::Shape;
    use crate::style::Paint;
    use cssparser::RGBA;

    fn load_resolved(s: &str) -> Document {
        let mut doc = Document::load_from_str(s).unwrap();
        resolve_references(&mut doc);
        doc
    }

    fn shape_nodes(doc: &Document) -> Vec<Node> {
        doc.root
            .descendants()
            .filter(|n| n.borrow().is_shape())
            .collect()
    }

    fn data_of(node: &Node) -> std::cell::Ref<'_, NodeData> {
        node.borrow()
    }

    #[test]
    fn gradient_chain_merges_backward_references_fully() {
        let doc = load_resolved(
            r##"<svg>
                 <linearGradient id="base" x1="0" y1="0" x2="10" y2="0">
                   <stop offset="0" stop-color="red"/>
                 </linearGradient>
                 <linearGradient id="mid" href="#base" y2="5"/>
                 <linearGradient id="leaf" href="#mid">
                   <stop offset="1" stop-color="blue"/>
                 </linearGradient>
               </svg>"##,
        );

        let leaf = doc.gradient("leaf").unwrap();
        assert!(leaf.href.is_none());
        assert_eq!(
            leaf.variant,
            GradientVariant::Linear {
                x1: Some(0.0),
                y1: Some(0.0),
                x2: Some(10.0),
                y2: Some(5.0),
            }
        );
        // referenced stops come first
        assert_eq!(leaf.stops.len(), 2);
        assert_eq!(leaf.stops[0].color, Some(RGBA::new(255, 0, 0, 255)));
        assert_eq!(leaf.stops[1].color, Some(RGBA::new(0, 0, 255, 255)));
    }

    #[test]
    fn unresolved_references_degrade_silently() {
        let doc = load_resolved(
            r##"<svg>
                 <linearGradient id="g" href="#nosuch"/>
                 <rect width="5" height="5" clip-path="url(#nope)"/>
                 <use href="#gone"/>
               </svg>"##,
        );

        assert!(doc.gradient("g").unwrap().href.is_none());

        let shapes = shape_nodes(&doc);
        assert!(data_of(&shapes[0]).style.clip_node.is_none());

        // the use node is left inert
        let uses: Vec<Node> = doc
            .root
            .descendants()
            .filter(|n| matches!(n.borrow().element, Element::Use(_)))
            .collect();
        assert_eq!(uses.len(), 1);
    }

    #[test]
    fn clip_reference_is_installed() {
        let doc = load_resolved(
            r#"<svg>
                 <clipPath id="c"><circle r="4"/></clipPath>
                 <rect width="5" height="5" clip-path="url(#c)"/>
               </svg>"#,
        );

        let shapes = shape_nodes(&doc);
        let rect = &shapes[1];
        let clip = data_of(rect).style.clip_node.clone().unwrap();
        let clip = clip.upgrade().unwrap();
        assert!(matches!(clip.borrow().element, Element::ClipPath));
    }

    #[test]
    fn use_is_replaced_in_place_by_a_clone() {
        let doc = load_resolved(
            r##"<svg>
                 <defs>
                   <g id="sym" fill="red">
                     <rect width="4" height="4"/>
                   </g>
                 </defs>
                 <circle r="1"/>
                 <use href="#sym" x="10" fill="blue" transform="scale(2)"/>
               </svg>"##,
        );

        // root children, in order: the defs group, the circle, the clone
        let children: Vec<Node> = doc.root.children().collect();
        assert_eq!(children.len(), 3);

        let clone = &children[2];
        let data = data_of(clone);
        assert!(data.is_group());

        // the clone cannot be referenced again
        assert!(data.id.is_none());

        // no longer flagged as defs content, so it renders
        assert!(!data.is_defs);

        // the use's own style overlays the clone's
        assert_eq!(data.style.fill, Some(Paint::Color(RGBA::new(0, 0, 255, 255))));

        // points go through the implicit translate first, then the scale
        assert_eq!(data.transform.transform_point(0.0, 0.0), (20.0, 0.0));

        // the original defs subtree is untouched
        assert!(data_of(&children[0]).is_defs);
        assert!(data_of(&children[0]).id.is_some());
    }

    #[test]
    fn use_of_shape_without_coordinates_adds_no_translate() {
        let doc = load_resolved(
            r##"<svg>
                 <defs><rect id="r" width="4" height="4"/></defs>
                 <use href="#r"/>
               </svg>"##,
        );

        let children: Vec<Node> = doc.root.children().collect();
        let clone = &children[1];
        let data = data_of(clone);

        assert!(matches!(data.element, Element::Shape(Shape::Rect(_))));
        assert_eq!(data.transform, Transform::identity());
    }

    #[test]
    fn nested_use_inside_cloned_subtree_resolves() {
        let doc = load_resolved(
            r##"<svg>
                 <defs>
                   <rect id="leaf" width="2" height="2"/>
                   <g id="sym"><use href="#leaf" y="3"/></g>
                 </defs>
                 <use href="#sym"/>
               </svg>"##,
        );

        // the expanded group contains the expanded rect
        let children: Vec<Node> = doc.root.children().collect();
        let group_clone = children.last().unwrap();
        assert!(data_of(group_clone).is_group());

        let inner: Vec<Node> = group_clone.children().collect();
        assert_eq!(inner.len(), 1);
        let inner_data = data_of(&inner[0]);
        assert!(inner_data.is_shape());
        assert!(!inner_data.is_defs);
        assert_eq!(inner_data.transform.transform_point(0.0, 0.0), (0.0, 3.0));
    }

    #[test]
    fn self_referential_use_stays_inert() {
        // a target that encloses its own reference is refused; the use node
        // stays in place instead of cloning itself forever
        let doc = load_resolved(
            r##"<svg>
                 <g id="loop"><use href="#loop"/></g>
               </svg>"##,
        );

        // svg root, the group, and the untouched use node
        assert_eq!(doc.root.descendants().count(), 3);
        assert!(doc
            .root
            .descendants()
            .any(|n| matches!(n.borrow().element, Element::Use(_))));
    }

    #[test]
    fn resolution_runs_only_once() {
        let mut doc = Document::load_from_str(
            r##"<svg>
                 <defs><rect id="r" width="4" height="4"/></defs>
                 <use href="#r"/>
               </svg>"##,
        )
        .unwrap();

        resolve_references(&mut doc);
        let count = doc.root.descendants().count();

        resolve_references(&mut doc);
        assert_eq!(doc.root.descendants().count(), count);
    }
}
