use std::any::Any;
use anyhow::{anyhow, Result};
use crate::config::EngineConfig;
use crate::geometry::{PathData, PathSegment, Transform};
use crate::render::backend::{Device, PixelBuffer, PixelFormat, SurfaceSize};
use crate::style::{Color, FillRule, FillStyle, LineCap, LineJoin, StrokeStyle};

/// Device rendering through the cairo graphics library onto an ARGB32 image surface.
pub struct CairoDevice {
    surface: Option<cairo::ImageSurface>,
    anti_alias: bool,
}

impl CairoDevice {
    pub fn new() -> Self {
        Self {
            surface: None,
            anti_alias: true,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            anti_alias: config.anti_alias,
            ..Self::new()
        }
    }

    /// Creates a cairo context (CR) on the surface, set up for a draw with `transform`.
    fn ctx(&self, transform: &Transform) -> Result<cairo::Context> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| anyhow!("CairoDevice used before allocate_buffer"))?;

        let cr = cairo::Context::new(surface)?;
        cr.set_matrix(cairo::Matrix::new(
            transform.a as f64,
            transform.b as f64,
            transform.c as f64,
            transform.d as f64,
            transform.e as f64,
            transform.f as f64,
        ));
        cr.set_antialias(if self.anti_alias {
            cairo::Antialias::Default
        } else {
            cairo::Antialias::None
        });
        Ok(cr)
    }
}

impl Default for CairoDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn set_color(cr: &cairo::Context, color: Color) {
    let (r, g, b, a) = color.to_f64();
    cr.set_source_rgba(r, g, b, a);
}

fn append_path(cr: &cairo::Context, path: &PathData) {
    cr.new_path();
    for segment in path.segments() {
        match *segment {
            PathSegment::MoveTo(p) => cr.move_to(p.x as f64, p.y as f64),
            PathSegment::LineTo(p) => cr.line_to(p.x as f64, p.y as f64),
            PathSegment::QuadTo { ctrl, to } => {
                // Cairo has no quadratic curves; elevate to a cubic.
                let (x0, y0) = cr.current_point().unwrap_or((ctrl.x as f64, ctrl.y as f64));
                let (cx, cy) = (ctrl.x as f64, ctrl.y as f64);
                let (x, y) = (to.x as f64, to.y as f64);
                cr.curve_to(
                    x0 + 2.0 / 3.0 * (cx - x0),
                    y0 + 2.0 / 3.0 * (cy - y0),
                    x + 2.0 / 3.0 * (cx - x),
                    y + 2.0 / 3.0 * (cy - y),
                    x,
                    y,
                );
            }
            PathSegment::CubicTo { ctrl1, ctrl2, to } => cr.curve_to(
                ctrl1.x as f64,
                ctrl1.y as f64,
                ctrl2.x as f64,
                ctrl2.y as f64,
                to.x as f64,
                to.y as f64,
            ),
            PathSegment::Close => cr.close_path(),
        }
    }
}

/// Premultiplied native-endian ARGB32 to straight RGBA8.
fn unpremultiply_argb32(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let row_len = width as usize * 4;
    let mut out = Vec::with_capacity(row_len * height as usize);
    for row in data.chunks(stride as usize).take(height as usize) {
        for px in row[..row_len].chunks_exact(4) {
            let argb = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
            let a = argb >> 24;
            let channel = |shift: u32| {
                let c = (argb >> shift) & 0xff;
                match a {
                    0 => 0,
                    _ => ((c * 255 + a / 2) / a).min(255) as u8,
                }
            };
            out.extend_from_slice(&[channel(16), channel(8), channel(0), a as u8]);
        }
    }
    out
}

impl Device for CairoDevice {
    fn name(&self) -> &str {
        "CairoDevice"
    }

    fn allocate_buffer(&mut self, size: SurfaceSize) -> Result<()> {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, size.width as i32, size.height as i32)?;
        self.surface = Some(surface);
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        let cr = self.ctx(&Transform::identity())?;
        cr.set_operator(cairo::Operator::Source);
        set_color(&cr, color);
        cr.paint()?;
        Ok(())
    }

    fn fill(&mut self, path: &PathData, fill: &FillStyle, transform: &Transform) -> Result<()> {
        let cr = self.ctx(transform)?;
        append_path(&cr, path);
        cr.set_fill_rule(match fill.rule {
            FillRule::NonZero => cairo::FillRule::Winding,
            FillRule::EvenOdd => cairo::FillRule::EvenOdd,
        });
        set_color(&cr, fill.color);
        cr.fill()?;
        Ok(())
    }

    fn stroke(&mut self, path: &PathData, stroke: &StrokeStyle, transform: &Transform) -> Result<()> {
        let cr = self.ctx(transform)?;
        append_path(&cr, path);
        cr.set_line_width(stroke.width as f64);
        cr.set_miter_limit(stroke.miter_limit as f64);
        cr.set_line_cap(match stroke.line_cap {
            LineCap::Butt => cairo::LineCap::Butt,
            LineCap::Round => cairo::LineCap::Round,
            LineCap::Square => cairo::LineCap::Square,
        });
        cr.set_line_join(match stroke.line_join {
            LineJoin::Miter => cairo::LineJoin::Miter,
            LineJoin::Round => cairo::LineJoin::Round,
            LineJoin::Bevel => cairo::LineJoin::Bevel,
        });
        set_color(&cr, stroke.color);
        cr.stroke()?;
        Ok(())
    }

    fn present(&mut self) -> Result<PixelBuffer> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| anyhow!("CairoDevice used before allocate_buffer"))?;

        // Flush the surface to ensure all operations are completed.
        surface.flush();
        let width = surface.width() as u32;
        let height = surface.height() as u32;
        let stride = surface.stride() as u32;

        let mut pixels = Vec::new();
        surface.with_data(|data| pixels = unpremultiply_argb32(data, width, height, stride))?;

        Ok(PixelBuffer::from_raw(pixels, width, height, width * 4, PixelFormat::Rgba8))
    }

    fn set_anti_alias(&mut self, on: bool) {
        self.anti_alias = on;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpremultiplies_native_argb() {
        let px = (128u32 << 24 | 64 << 16 | 32 << 8 | 0).to_ne_bytes();
        let out = unpremultiply_argb32(&px, 1, 1, 4);
        assert_eq!(out, vec![128, 64, 0, 128]);
    }

    #[test]
    fn fills_through_cairo() {
        let mut dev = CairoDevice::new();
        dev.allocate_buffer(SurfaceSize::new(10, 10)).unwrap();
        dev.clear(Color::WHITE).unwrap();
        let fill = FillStyle { color: Color::rgb(0, 255, 0), rule: FillRule::NonZero };
        dev.fill(&PathData::rect(0.0, 0.0, 4.0, 4.0, 0.0, 0.0), &fill, &Transform::translate(5.0, 5.0))
            .unwrap();

        let buf = dev.present().unwrap();
        assert_eq!(buf.pixel(7, 7), Some(Color::rgb(0, 255, 0)));
        assert_eq!(buf.pixel(1, 1), Some(Color::WHITE));
    }
}
