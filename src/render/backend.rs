use std::any::Any;
use std::io::Write;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use crate::geometry::{PathData, Transform};
use crate::style::{Color, FillStyle, StrokeStyle};

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Straight (non premultiplied) RGBA, one byte per channel.
    Rgba8,
}

/// Finished raster result handed to the host.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: PixelFormat,
}

impl PixelBuffer {
    pub fn from_raw(pixels: Vec<u8>, width: u32, height: u32, stride: u32, format: PixelFormat) -> Self {
        assert!(
            pixels.len() >= (height as usize) * (stride as usize),
            "pixel buffer too small for image dimensions"
        );

        Self {
            pixels,
            width,
            height,
            stride,
            format,
        }
    }

    /// Buffer of the given size where every pixel is `color`.
    pub fn filled(size: SurfaceSize, color: Color) -> Self {
        let pixels = [color.r, color.g, color.b, color.a].repeat(size.width as usize * size.height as usize);
        Self::from_raw(pixels, size.width, size.height, size.width.saturating_mul(4), PixelFormat::Rgba8)
    }

    /// Zero sized buffer for hosts that cannot represent "nothing rendered yet".
    pub fn empty() -> Self {
        Self::from_raw(Vec::new(), 0, 0, 0, PixelFormat::Rgba8)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    /// Color of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.stride as usize + x as usize * 4;
        let p = self.pixels.get(i..i + 4)?;
        Some(Color::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Encodes the buffer as an RGBA PNG image.
    pub fn write_png<W: Write>(&self, out: W) -> Result<()> {
        if self.is_empty() {
            return Err(anyhow!("cannot encode an empty pixel buffer"));
        }

        let mut encoder = png::Encoder::new(out, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;

        let row_len = self.width as usize * 4;
        if self.stride as usize == row_len {
            writer.write_image_data(&self.pixels[..row_len * self.height as usize])?;
        } else {
            let packed: Vec<u8> = self
                .pixels
                .chunks(self.stride as usize)
                .take(self.height as usize)
                .flat_map(|row| row[..row_len].iter().copied())
                .collect();
            writer.write_image_data(&packed)?;
        }
        Ok(())
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_png(&mut out)?;
        Ok(out)
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

/// Primitive drawing operations a backend must implement.
///
/// A device knows nothing about documents or elements: every call carries the geometry in
/// local coordinates together with the fully composed transform to device space. Calls occur
/// on the thread that owns the [`RenderEngine`](crate::engine::RenderEngine).
pub trait Device: Any {
    /// Human readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Prepare a target of the given size for the next render pass.
    fn allocate_buffer(&mut self, size: SurfaceSize) -> Result<()>;

    /// Reset every pixel of the target to `color`.
    fn clear(&mut self, color: Color) -> Result<()>;

    /// Fill `path` after mapping it through `transform`.
    fn fill(&mut self, path: &PathData, fill: &FillStyle, transform: &Transform) -> Result<()>;

    /// Stroke `path` after mapping it through `transform`. The stroke width is in local units.
    fn stroke(&mut self, path: &PathData, stroke: &StrokeStyle, transform: &Transform) -> Result<()>;

    /// Return the current contents of the target.
    fn present(&mut self) -> Result<PixelBuffer>;

    /// Turn edge smoothing on or off. Devices that do not rasterize ignore it.
    fn set_anti_alias(&mut self, _on: bool) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_buffer_reports_pixels() {
        let buf = PixelBuffer::filled(SurfaceSize::new(2, 3), Color::rgb(1, 2, 3));
        assert_eq!(buf.pixels.len(), 2 * 3 * 4);
        assert_eq!(buf.pixel(1, 2), Some(Color::rgb(1, 2, 3)));
        assert_eq!(buf.pixel(2, 0), None);
    }

    #[test]
    fn empty_buffer_cannot_be_encoded() {
        let buf = PixelBuffer::empty();
        assert!(buf.is_empty());
        assert!(buf.to_png().is_err());
    }

    #[test]
    fn png_encoding_has_signature() {
        let buf = PixelBuffer::filled(SurfaceSize::new(4, 4), Color::WHITE);
        let png = buf.to_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    #[should_panic(expected = "pixel buffer too small")]
    fn from_raw_checks_length() {
        PixelBuffer::from_raw(vec![0; 4], 2, 2, 8, PixelFormat::Rgba8);
    }
}
