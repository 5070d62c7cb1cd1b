//! Public entry points: load an SVG symbol and rasterize it.

use crate::document::Document;
use crate::drawing_ctx::DrawingCtx;
use crate::rect::Rect;
use crate::resolve::resolve_references;
use crate::surface_utils::{Pixel, PixelOps};
use crate::transform::Transform;
use crate::viewbox::ViewBox;

pub use crate::error::{LoadingError, RenderingError};

/// A loaded SVG symbol document, ready to be rasterized.
///
/// ```no_run
/// let svg = br##"<svg width="20" height="10"><rect width="20" height="10" fill="#336699"/></svg>"##;
///
/// let mut symbol = svgsym::SvgSymbol::from_bytes(svg).unwrap();
/// let image = symbol.rasterize(64).unwrap();
///
/// assert_eq!((image.width, image.height), (64, 32));
/// ```
pub struct SvgSymbol {
    document: Document,
}

/// The result of rasterizing a symbol.
#[derive(Debug)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,

    /// Packed RGB, 3 bytes per pixel, row-major, top to bottom.
    pub rgb: Vec<u8>,

    /// One byte per pixel: 0 where the pixel is transparent, 1 where it is
    /// opaque.  Present only when at least one pixel was mostly transparent
    /// (alpha below 128); a fully opaque image carries no mask.
    pub mask: Option<Vec<u8>>,
}

impl SvgSymbol {
    /// Loads a symbol from an in-memory SVG document.
    pub fn from_bytes(bytes: &[u8]) -> Result<SvgSymbol, LoadingError> {
        Document::load_from_bytes(bytes).map(|document| SvgSymbol { document })
    }

    pub fn from_str(s: &str) -> Result<SvgSymbol, LoadingError> {
        Document::load_from_str(s).map(|document| SvgSymbol { document })
    }

    /// The document's resolved size in user units: the declared
    /// width/height, with the viewBox supplying whichever of the two is
    /// missing.
    pub fn resolved_size(&self) -> Result<(f64, f64), RenderingError> {
        let layout = Layout::of(&self.document)?;
        Ok((layout.width, layout.height))
    }

    /// Renders the document into a bitmap.
    ///
    /// `size` applies to the larger of the document's two dimensions; the
    /// other output dimension keeps the aspect ratio.  The same symbol can
    /// be rasterized repeatedly at different sizes.
    pub fn rasterize(&mut self, size: u32) -> Result<RasterImage, RenderingError> {
        if size == 0 {
            return Err(RenderingError::InvalidSize);
        }

        let layout = Layout::of(&self.document)?;
        let (out_width, out_height) = layout.scale_to(size);

        let mut surface = cairo::ImageSurface::create(
            cairo::Format::ARgb32,
            out_width as i32,
            out_height as i32,
        )?;

        let vb = layout.view_box;
        let base = Transform::new_scale(
            f64::from(out_width) / vb.width(),
            f64::from(out_height) / vb.height(),
        )
        .pre_translate(-vb.x0, -vb.y0);

        resolve_references(&mut self.document);

        {
            let cr = cairo::Context::new(&surface)?;
            DrawingCtx::new(&self.document, cr, base).render_document()?;
        }

        read_back(&mut surface, out_width, out_height)
    }
}

/// Resolved document geometry: concrete dimensions plus the viewBox that the
/// base matrix maps onto the surface.
struct Layout {
    width: f64,
    height: f64,
    view_box: ViewBox,
}

impl Layout {
    fn of(document: &Document) -> Result<Layout, RenderingError> {
        let mut width = document.width;
        let mut height = document.height;

        // the viewBox supplies missing dimensions
        if let Some(vb) = document.view_box {
            width = width.or(Some(vb.width()));
            height = height.or(Some(vb.height()));
        }

        let width = width.unwrap_or(0.0);
        let height = height.unwrap_or(0.0);
        if width <= 0.0 || height <= 0.0 {
            return Err(RenderingError::InvalidSize);
        }

        // without an explicit viewBox the declared size is the user space
        let view_box = document
            .view_box
            .unwrap_or_else(|| ViewBox::from(Rect::from_size(width, height)));

        if view_box.is_empty() {
            return Err(RenderingError::InvalidSize);
        }

        Ok(Layout {
            width,
            height,
            view_box,
        })
    }

    /// Output pixel dimensions: `size` on the larger axis, the other axis
    /// scaled to preserve the aspect ratio.
    fn scale_to(&self, size: u32) -> (u32, u32) {
        if self.width >= self.height {
            let h = (f64::from(size) * self.height / self.width).round() as u32;
            (size, h.max(1))
        } else {
            let w = (f64::from(size) * self.width / self.height).round() as u32;
            (w.max(1), size)
        }
    }
}

/// Converts the premultiplied surface into a straight-alpha RGB buffer plus
/// the optional opacity mask.
fn read_back(
    surface: &mut cairo::ImageSurface,
    width: u32,
    height: u32,
) -> Result<RasterImage, RenderingError> {
    let stride = surface.stride() as usize;

    surface.flush();
    let data = surface
        .data()
        .map_err(|e| RenderingError::Rendering(format!("{:?}", e)))?;

    let (width, height) = (width as usize, height as usize);

    let mut rgb = Vec::with_capacity(width * height * 3);
    let mut mask = vec![1u8; width * height];
    let mut any_translucent = false;

    for y in 0..height {
        let row = &data[y * stride..y * stride + width * 4];

        for (x, chunk) in row.chunks_exact(4).enumerate() {
            let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let pixel = Pixel::from_u32(word);

            let straight = pixel.unpremultiply();
            rgb.extend_from_slice(&[straight.r, straight.g, straight.b]);

            if pixel.a < 128 {
                mask[y * width + x] = 0;
                any_translucent = true;
            }
        }
    }

    drop(data);

    Ok(RasterImage {
        width: width as u32,
        height: height as u32,
        rgb,
        mask: if any_translucent { Some(mask) } else { None },
    })
}
