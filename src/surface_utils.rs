//! Pixel utilities for reading Cairo image surfaces back out.
//!
//! Cairo's `ARgb32` surfaces hold premultiplied pixels packed as
//! platform-endian `0xaarrggbb` words; these helpers convert them into
//! straight-alpha [`Pixel`] values.

/// A pixel consisting of R, G, B and A values.
pub type Pixel = rgb::RGBA8;

pub trait PixelOps {
    fn premultiply(self) -> Self;
    fn unpremultiply(self) -> Self;
    fn to_u32(&self) -> u32;
    fn from_u32(x: u32) -> Self;
}

impl PixelOps for Pixel {
    /// Returns a premultiplied value of this pixel.
    #[inline]
    fn premultiply(self) -> Self {
        let a = self.a as u32;
        self.map_rgb(|x| (((x as u32) * a + 127) / 255) as u8)
    }

    /// Returns an unpremultiplied value of this pixel.
    ///
    /// Channels divide back out as `channel * 255 / alpha`, clamped to the
    /// byte range; a fully transparent pixel becomes transparent black.
    #[inline]
    fn unpremultiply(self) -> Self {
        if self.a == 0 {
            Self {
                r: 0,
                g: 0,
                b: 0,
                a: 0,
            }
        } else {
            let alpha = u32::from(self.a);
            self.map_rgb(|x| ((u32::from(x) * 255 / alpha).min(255)) as u8)
        }
    }

    /// Returns the pixel value as a `u32`, in the same format as
    /// `cairo::Format::ARgb32`.
    #[inline]
    fn to_u32(&self) -> u32 {
        (u32::from(self.a) << 24)
            | (u32::from(self.r) << 16)
            | (u32::from(self.g) << 8)
            | u32::from(self.b)
    }

    /// Converts a `u32` in the same format as `cairo::Format::ARgb32` into a
    /// `Pixel`.
    #[inline]
    fn from_u32(x: u32) -> Self {
        Self {
            r: ((x >> 16) & 0xFF) as u8,
            g: ((x >> 8) & 0xFF) as u8,
            b: (x & 0xFF) as u8,
            a: ((x >> 24) & 0xFF) as u8,
        }
    }
}
