//! Style records: presentation attributes, the inline `style` shorthand,
//! inheritance merging, and the defaulting rules applied before drawing.
//!
//! Every field of [`Style`] is an `Option`; `None` always means "not
//! explicitly set, inherit".  Merging copies the set fields of a later writer
//! over an accumulator, so whatever wrote last wins.

use cssparser::{Parser, RGBA};

use crate::error::*;
use crate::gradient::Gradient;
use crate::node::{Node, WeakNode};
use crate::parsers::{optional_comma, Parse, ParseValue, UnitInterval};
use crate::svgsym_log;

/// A paint for filling or stroking: nothing, a solid color, or a reference
/// to a gradient by id fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    None,
    Color(RGBA),
    Ref { fragment: String },
}

impl Parse for Paint {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Paint, ParseError<'i>> {
        if parser
            .try_parse(|i| i.expect_ident_matching("none"))
            .is_ok()
        {
            Ok(Paint::None)
        } else if let Ok(url) = parser.try_parse(|i| i.expect_url().map(|u| u.to_string())) {
            Ok(Paint::Ref {
                fragment: fragment_of(&url),
            })
        } else {
            Ok(RGBA::parse(parser).map(Paint::Color)?)
        }
    }
}

/// Strips the leading `#` of a same-document reference.
///
/// References without a fragment cannot name anything in this document; they
/// are kept verbatim and simply never match an id.
pub fn fragment_of(href: &str) -> String {
    let href = href.trim();
    href.strip_prefix('#').unwrap_or(href).to_string()
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl Parse for FillRule {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<FillRule, ParseError<'i>> {
        let loc = parser.current_source_location();
        let token = parser.next()?;

        match token {
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("nonzero") => {
                Ok(FillRule::NonZero)
            }
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("evenodd") => {
                Ok(FillRule::EvenOdd)
            }
            _ => Err(loc.new_basic_unexpected_token_error(token.clone()).into()),
        }
    }
}

impl From<FillRule> for cairo::FillRule {
    fn from(f: FillRule) -> cairo::FillRule {
        match f {
            FillRule::NonZero => cairo::FillRule::Winding,
            FillRule::EvenOdd => cairo::FillRule::EvenOdd,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StrokeLinecap {
    Butt,
    Round,
    Square,
}

impl Parse for StrokeLinecap {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<StrokeLinecap, ParseError<'i>> {
        let loc = parser.current_source_location();
        let token = parser.next()?;

        match token {
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("butt") => {
                Ok(StrokeLinecap::Butt)
            }
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("round") => {
                Ok(StrokeLinecap::Round)
            }
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("square") => {
                Ok(StrokeLinecap::Square)
            }
            _ => Err(loc.new_basic_unexpected_token_error(token.clone()).into()),
        }
    }
}

impl From<StrokeLinecap> for cairo::LineCap {
    fn from(c: StrokeLinecap) -> cairo::LineCap {
        match c {
            StrokeLinecap::Butt => cairo::LineCap::Butt,
            StrokeLinecap::Round => cairo::LineCap::Round,
            StrokeLinecap::Square => cairo::LineCap::Square,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StrokeLinejoin {
    Miter,
    Round,
    Bevel,
}

impl Parse for StrokeLinejoin {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<StrokeLinejoin, ParseError<'i>> {
        let loc = parser.current_source_location();
        let token = parser.next()?;

        match token {
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("miter") => {
                Ok(StrokeLinejoin::Miter)
            }
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("round") => {
                Ok(StrokeLinejoin::Round)
            }
            cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case("bevel") => {
                Ok(StrokeLinejoin::Bevel)
            }
            _ => Err(loc.new_basic_unexpected_token_error(token.clone()).into()),
        }
    }
}

impl From<StrokeLinejoin> for cairo::LineJoin {
    fn from(j: StrokeLinejoin) -> cairo::LineJoin {
        match j {
            StrokeLinejoin::Miter => cairo::LineJoin::Miter,
            StrokeLinejoin::Round => cairo::LineJoin::Round,
            StrokeLinejoin::Bevel => cairo::LineJoin::Bevel,
        }
    }
}

/// `stroke-dasharray`.  Assignment replaces the whole array, never merges.
#[derive(Debug, Clone, PartialEq)]
pub enum Dasharray {
    None,
    Array(Box<[f64]>),
}

impl Parse for Dasharray {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Dasharray, ParseError<'i>> {
        if parser
            .try_parse(|p| p.expect_ident_matching("none"))
            .is_ok()
        {
            return Ok(Dasharray::None);
        }

        let mut dasharray = Vec::new();

        loop {
            let loc = parser.current_source_location();
            let d = f64::parse(parser)?;
            if d < 0.0 {
                return Err(loc.new_custom_error(ValueErrorKind::value_error(
                    "dash lengths must not be negative",
                )));
            }
            dasharray.push(d);

            if parser.is_exhausted() {
                break;
            }

            optional_comma(parser);
        }

        Ok(Dasharray::Array(dasharray.into_boxed_slice()))
    }
}

/// The raw style record attached to each node.
#[derive(Clone, Default)]
pub struct Style {
    pub fill: Option<Paint>,
    pub fill_opacity: Option<UnitInterval>,
    pub fill_rule: Option<FillRule>,

    pub stroke: Option<Paint>,
    pub stroke_opacity: Option<UnitInterval>,
    pub stroke_width: Option<f64>,
    pub stroke_line_cap: Option<StrokeLinecap>,
    pub stroke_line_join: Option<StrokeLinejoin>,
    pub stroke_miter_limit: Option<f64>,
    pub stroke_dasharray: Option<Dasharray>,
    pub stroke_dash_offset: Option<f64>,

    /// Fragment of a `clip-path="url(#...)"` reference.
    pub clip_path: Option<String>,
    /// Resolved clip target, installed by the reference-resolution pass.
    /// Travels together with `clip_path` during merging.
    pub clip_node: Option<WeakNode>,
}

impl Style {
    /// Sets one presentation property from an attribute or `style` declaration.
    ///
    /// Unknown names are ignored; a malformed value leaves the field alone.
    pub fn set_property(&mut self, name: &str, value: &str) {
        match name {
            "fill" => set_field(&mut self.fill, name, value),
            "fill-opacity" => set_field(&mut self.fill_opacity, name, value),
            "fill-rule" => set_field(&mut self.fill_rule, name, value),
            "stroke" => set_field(&mut self.stroke, name, value),
            "stroke-opacity" => set_field(&mut self.stroke_opacity, name, value),
            "stroke-width" => set_field(&mut self.stroke_width, name, value),
            "stroke-linecap" => set_field(&mut self.stroke_line_cap, name, value),
            "stroke-linejoin" => set_field(&mut self.stroke_line_join, name, value),
            "stroke-miterlimit" => set_field(&mut self.stroke_miter_limit, name, value),
            "stroke-dasharray" => set_field(&mut self.stroke_dasharray, name, value),
            "stroke-dashoffset" => set_field(&mut self.stroke_dash_offset, name, value),
            "clip-path" => match UrlRef::parse_str(value) {
                Ok(UrlRef(fragment)) => {
                    self.clip_path = Some(fragment);
                    self.clip_node = None;
                }
                Err(_) => svgsym_log!("ignoring invalid value for clip-path: \"{}\"", value),
            },
            _ => (),
        }
    }

    /// Applies a `style="a: b; c: d"` shorthand.  Declarations use the same
    /// names as the presentation attributes and overwrite them, since both
    /// write into the same record.
    pub fn apply_declarations(&mut self, declarations: &str) {
        for declaration in declarations.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }

            if let Some((name, value)) = declaration.split_once(':') {
                self.set_property(name.trim(), value.trim());
            }
        }
    }

    /// Copies every set field of `other` into `self`.
    pub fn merge_from(&mut self, other: &Style) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field.clone();
                }
            };
        }

        take!(fill);
        take!(fill_opacity);
        take!(fill_rule);
        take!(stroke);
        take!(stroke_opacity);
        take!(stroke_width);
        take!(stroke_line_cap);
        take!(stroke_line_join);
        take!(stroke_miter_limit);
        take!(stroke_dasharray);
        take!(stroke_dash_offset);

        // the reference string carries its resolved pointer along
        if other.clip_path.is_some() {
            self.clip_path = other.clip_path.clone();
            self.clip_node = other.clip_node.clone();
        }
    }

    /// Applies the defaulting rules to a fully merged style.
    pub fn to_resolved(&self, gradients: &[Gradient]) -> ResolvedStyle {
        ResolvedStyle {
            fill: resolve_paint(&self.fill, gradients),
            fill_opacity: self.fill_opacity.unwrap_or_default().0,
            fill_rule: self.fill_rule.unwrap_or(FillRule::NonZero),

            stroke: resolve_paint(&self.stroke, gradients),
            stroke_opacity: self.stroke_opacity.unwrap_or_default().0,
            // zero and negative widths resolve to the default as well
            stroke_width: self.stroke_width.filter(|w| *w > 0.0).unwrap_or(1.0),
            line_cap: self.stroke_line_cap.unwrap_or(StrokeLinecap::Butt),
            line_join: self.stroke_line_join.unwrap_or(StrokeLinejoin::Miter),
            miter_limit: self.stroke_miter_limit.unwrap_or(4.0),
            dashes: resolve_dashes(&self.stroke_dasharray),
            dash_offset: self.stroke_dash_offset.unwrap_or(0.0),

            clip: self.clip_node.as_ref().and_then(WeakNode::upgrade),
        }
    }
}

/// A `url(#fragment)` value, as used by the `clip-path` attribute.
struct UrlRef(String);

impl Parse for UrlRef {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<UrlRef, ParseError<'i>> {
        let url = parser.expect_url()?.to_string();
        Ok(UrlRef(fragment_of(&url)))
    }
}

fn set_field<T: Parse>(field: &mut Option<T>, name: &str, value: &str) {
    match name.parse_attr(value) {
        Ok(v) => *field = Some(v),
        Err(e) => svgsym_log!("ignoring property: {}", e),
    }
}

/// A style with no sentinels left: everything a shape needs to be drawn.
pub struct ResolvedStyle {
    pub fill: Option<ResolvedPaint>,
    pub fill_opacity: f64,
    pub fill_rule: FillRule,

    pub stroke: Option<ResolvedPaint>,
    pub stroke_opacity: f64,
    pub stroke_width: f64,
    pub line_cap: StrokeLinecap,
    pub line_join: StrokeLinejoin,
    pub miter_limit: f64,
    pub dashes: Vec<f64>,
    pub dash_offset: f64,

    pub clip: Option<Node>,
}

pub enum ResolvedPaint {
    Color(RGBA),
    Gradient(Gradient),
}

fn resolve_paint(paint: &Option<Paint>, gradients: &[Gradient]) -> Option<ResolvedPaint> {
    match paint {
        // nothing set anywhere in the ancestor chain: no paint
        None => None,
        Some(Paint::None) => None,
        Some(Paint::Color(c)) => Some(ResolvedPaint::Color(*c)),
        Some(Paint::Ref { fragment }) => {
            let gradient = gradients
                .iter()
                .find(|g| g.id.as_deref() == Some(fragment.as_str()));

            match gradient {
                Some(g) => Some(ResolvedPaint::Gradient(g.clone())),
                None => {
                    svgsym_log!("reference \"#{}\" not found, painting nothing", fragment);
                    None
                }
            }
        }
    }
}

fn resolve_dashes(dasharray: &Option<Dasharray>) -> Vec<f64> {
    match dasharray {
        None | Some(Dasharray::None) => Vec::new(),
        Some(Dasharray::Array(dashes)) => {
            // Cairo rejects a dash pattern that adds up to zero
            if dashes.iter().all(|d| *d == 0.0) {
                Vec::new()
            } else {
                dashes.to_vec()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paint() {
        assert_eq!(Paint::parse_str("none").unwrap(), Paint::None);
        assert_eq!(
            Paint::parse_str("#ff8040").unwrap(),
            Paint::Color(RGBA::new(255, 128, 64, 255))
        );
        assert_eq!(
            Paint::parse_str("url(#grad)").unwrap(),
            Paint::Ref {
                fragment: "grad".to_string()
            }
        );
        assert!(Paint::parse_str("42").is_err());
    }

    #[test]
    fn parses_dasharray() {
        assert_eq!(Dasharray::parse_str("none").unwrap(), Dasharray::None);
        assert_eq!(
            Dasharray::parse_str("10,6").unwrap(),
            Dasharray::Array(vec![10.0, 6.0].into_boxed_slice())
        );
        assert_eq!(
            Dasharray::parse_str("5 5 20").unwrap(),
            Dasharray::Array(vec![5.0, 5.0, 20.0].into_boxed_slice())
        );

        assert!(Dasharray::parse_str("20,40,-20").is_err());
        assert!(Dasharray::parse_str("").is_err());
        assert!(Dasharray::parse_str("10,").is_err());
    }

    #[test]
    fn style_shorthand_overwrites_presentation_attribute() {
        let mut style = Style::default();

        // attribute first, shorthand second, both write the same record
        style.set_property("fill", "red");
        style.apply_declarations("fill: blue; stroke-width: 2");

        assert_eq!(style.fill, Some(Paint::Color(RGBA::new(0, 0, 255, 255))));
        assert_eq!(style.stroke_width, Some(2.0));
    }

    #[test]
    fn bad_values_leave_fields_alone() {
        let mut style = Style::default();

        style.set_property("fill", "red");
        style.set_property("fill", "not-a-color");
        style.set_property("stroke-width", "thick");

        assert_eq!(style.fill, Some(Paint::Color(RGBA::new(255, 0, 0, 255))));
        assert_eq!(style.stroke_width, None);
    }

    #[test]
    fn merge_lets_later_writers_win() {
        let mut parent = Style::default();
        parent.set_property("fill", "red");
        parent.set_property("stroke-width", "3");

        let mut child = Style::default();
        child.set_property("fill", "none");

        let mut acc = Style::default();
        acc.merge_from(&parent);
        acc.merge_from(&child);

        assert_eq!(acc.fill, Some(Paint::None));
        assert_eq!(acc.stroke_width, Some(3.0));
    }

    #[test]
    fn unset_paint_resolves_to_no_paint() {
        let resolved = Style::default().to_resolved(&[]);
        assert!(resolved.fill.is_none());
        assert!(resolved.stroke.is_none());
    }

    #[test]
    fn unresolvable_gradient_reference_resolves_to_no_paint() {
        let mut style = Style::default();
        style.set_property("fill", "url(#nosuch)");

        let resolved = style.to_resolved(&[]);
        assert!(resolved.fill.is_none());
    }

    #[test]
    fn stroke_defaults() {
        let mut style = Style::default();
        style.set_property("stroke", "black");

        let resolved = style.to_resolved(&[]);
        assert!(matches!(resolved.stroke, Some(ResolvedPaint::Color(_))));
        assert_eq!(resolved.stroke_width, 1.0);
        assert_eq!(resolved.line_cap, StrokeLinecap::Butt);
        assert_eq!(resolved.line_join, StrokeLinejoin::Miter);
        assert_eq!(resolved.miter_limit, 4.0);
        assert!(resolved.dashes.is_empty());

        // a non-positive width also falls back to the default
        style.set_property("stroke-width", "0");
        assert_eq!(style.to_resolved(&[]).stroke_width, 1.0);
    }

    #[test]
    fn all_zero_dashes_resolve_to_undashed() {
        let mut style = Style::default();
        style.set_property("stroke-dasharray", "0 0 0");

        assert!(style.to_resolved(&[]).dashes.is_empty());
    }
}
