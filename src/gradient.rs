//! Gradient paint servers; the `linearGradient` and `radialGradient` elements.
//!
//! Gradients live in a flat, ordered list on the document.  A gradient may
//! reference another one by href; the reference-resolution pass merges the
//! two into a single node that replaces the referencing one in place.

use cssparser::{Parser, RGBA};

use crate::error::*;
use crate::parsers::{Parse, UnitInterval};
use crate::transform::Transform;

/// Contents of a `<stop>` element.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    /// `<stop offset="..."/>`, clamped to [0, 1] at parse time.
    pub offset: UnitInterval,

    /// `stop-color`; `None` (from `stop-color: none`) paints nothing.
    pub color: Option<RGBA>,

    /// `stop-opacity`, 1.0 when unset.
    pub opacity: UnitInterval,
}

/// spreadMethod attribute for gradients
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SpreadMethod {
    Pad,
    Reflect,
    Repeat,
}

impl Default for SpreadMethod {
    fn default() -> SpreadMethod {
        SpreadMethod::Pad
    }
}

impl Parse for SpreadMethod {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<SpreadMethod, ParseError<'i>> {
        let loc = parser.current_source_location();
        let token = parser.next()?;

        match token {
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("pad") => {
                Ok(SpreadMethod::Pad)
            }
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("reflect") => {
                Ok(SpreadMethod::Reflect)
            }
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("repeat") => {
                Ok(SpreadMethod::Repeat)
            }
            _ => Err(loc.new_basic_unexpected_token_error(token.clone()).into()),
        }
    }
}

impl From<SpreadMethod> for cairo::Extend {
    fn from(s: SpreadMethod) -> cairo::Extend {
        match s {
            SpreadMethod::Pad => cairo::Extend::Pad,
            SpreadMethod::Reflect => cairo::Extend::Reflect,
            SpreadMethod::Repeat => cairo::Extend::Repeat,
        }
    }
}

/// Coordinates specific to each gradient type.  `None` means the attribute
/// was not given; a referenced gradient may still supply it.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientVariant {
    Linear {
        x1: Option<f64>,
        y1: Option<f64>,
        x2: Option<f64>,
        y2: Option<f64>,
    },

    Radial {
        cx: Option<f64>,
        cy: Option<f64>,
        r: Option<f64>,
    },
}

impl GradientVariant {
    fn resolve_from(&self, fallback: &GradientVariant) -> GradientVariant {
        match (self, fallback) {
            (
                GradientVariant::Linear { x1, y1, x2, y2 },
                GradientVariant::Linear {
                    x1: fx1,
                    y1: fy1,
                    x2: fx2,
                    y2: fy2,
                },
            ) => GradientVariant::Linear {
                x1: x1.or(*fx1),
                y1: y1.or(*fy1),
                x2: x2.or(*fx2),
                y2: y2.or(*fy2),
            },

            (
                GradientVariant::Radial { cx, cy, r },
                GradientVariant::Radial {
                    cx: f_cx,
                    cy: f_cy,
                    r: f_r,
                },
            ) => GradientVariant::Radial {
                cx: cx.or(*f_cx),
                cy: cy.or(*f_cy),
                r: r.or(*f_r),
            },

            // if the variants are of different types there is nothing to resolve
            _ => self.clone(),
        }
    }
}

/// A `linearGradient` or `radialGradient` element.
#[derive(Debug, Clone)]
pub struct Gradient {
    pub id: Option<String>,

    /// Pending reference to another gradient, consumed by the resolver.
    pub href: Option<String>,

    pub variant: GradientVariant,

    pub stops: Vec<ColorStop>,

    /// Composed `gradientTransform` list.
    pub transform: Transform,

    pub spread: Option<SpreadMethod>,
}

impl Gradient {
    pub fn new(variant: GradientVariant) -> Gradient {
        Gradient {
            id: None,
            href: None,
            variant,
            stops: Vec::new(),
            transform: Transform::identity(),
            spread: None,
        }
    }

    /// Merges a referenced gradient into this one.
    ///
    /// Fields of `self` win whenever they are set; the referenced gradient
    /// supplies defaults.  Stops and transforms concatenate instead, the
    /// referenced gradient's own entries first.
    pub fn resolve_from(&self, fallback: &Gradient) -> Gradient {
        let mut stops = fallback.stops.clone();
        stops.extend(self.stops.iter().copied());

        Gradient {
            id: self.id.clone(),
            href: None,
            variant: self.variant.resolve_from(&fallback.variant),
            stops,
            transform: fallback.transform.pre_transform(&self.transform),
            spread: self.spread.or(fallback.spread),
        }
    }
}
