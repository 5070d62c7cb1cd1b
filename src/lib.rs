//! Render SVG map symbols into RGBA bitmaps with Cairo.
//!
//! This crate turns an SVG document into a fixed-size, straight-alpha
//! bitmap.  It is built for map-symbol glyphs (icons, flags, emblems): a
//! symbol is loaded once and rasterized at whatever pixel sizes the map
//! renderer needs, preserving the document's aspect ratio.
//!
//! The supported SVG subset covers the basic shapes, paths, groups,
//! transforms, presentation attributes and the inline `style` shorthand,
//! linear and radial gradients (including `href` chains between them),
//! `clip-path` references, and `<use>`.  Text, filters, markers, patterns
//! and scripting are out of scope.
//!
//! # Basic usage
//!
//! * Create an [`SvgSymbol`] from the document bytes.
//! * Call [`SvgSymbol::rasterize`] with the wanted output size.
//! * Read the packed RGB buffer and, when present, the opacity mask.
//!
//! ```no_run
//! let bytes = std::fs::read("marker.svg").unwrap();
//!
//! let mut symbol = svgsym::SvgSymbol::from_bytes(&bytes).unwrap();
//! let image = symbol.rasterize(48).unwrap();
//!
//! // 3 bytes per pixel, row-major
//! assert_eq!(image.rgb.len(), (image.width * image.height * 3) as usize);
//! ```
//!
//! Rendering is synchronous and single-threaded; a symbol must not be
//! rasterized from two threads at once (the `&mut self` receiver enforces
//! this).
//!
//! Set the `SVGSYM_LOG` environment variable to get a dump of everything the
//! library quietly recovers from: malformed path data, unresolvable
//! references, ignored attribute values.

#![doc(html_root_url = "https://docs.rs/svgsym")]
#![allow(rustdoc::private_intra_doc_links)]
#![allow(clippy::too_many_arguments)]
#![warn(nonstandard_style, rust_2018_idioms)]

pub use crate::api::*;

mod api;
mod color;
mod document;
mod drawing_ctx;
mod error;
mod gradient;
pub mod log;
mod node;
mod parsers;
mod path_builder;
mod path_parser;
mod rect;
mod resolve;
mod shapes;
mod style;
mod surface_utils;
mod transform;
mod viewbox;
