use std::any::Any;
use anyhow::{anyhow, Result};
use tiny_skia::{Paint, Pixmap, Stroke};
use crate::config::EngineConfig;
use crate::geometry::{PathData, PathSegment, Transform};
use crate::render::backend::{Device, PixelBuffer, PixelFormat, SurfaceSize};
use crate::style::{Color, FillRule, FillStyle, LineCap, LineJoin, StrokeStyle};

/// CPU rasterizer backed by `tiny-skia`.
pub struct SoftwareDevice {
    pixmap: Option<Pixmap>,
    anti_alias: bool,
}

impl SoftwareDevice {
    pub fn new() -> Self {
        Self {
            pixmap: None,
            anti_alias: true,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new().with_anti_alias(config.anti_alias)
    }

    pub fn with_anti_alias(mut self, on: bool) -> Self {
        self.anti_alias = on;
        self
    }

    fn pixmap_mut(&mut self) -> Result<&mut Pixmap> {
        self.pixmap
            .as_mut()
            .ok_or_else(|| anyhow!("SoftwareDevice used before allocate_buffer"))
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = self.anti_alias;
        paint
    }
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn to_skia_transform(t: &Transform) -> tiny_skia::Transform {
    tiny_skia::Transform::from_row(t.a, t.b, t.c, t.d, t.e, t.f)
}

/// `None` when tiny-skia considers the path empty.
fn to_skia_path(path: &PathData) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for segment in path.segments() {
        match *segment {
            PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
            PathSegment::LineTo(p) => pb.line_to(p.x, p.y),
            PathSegment::QuadTo { ctrl, to } => pb.quad_to(ctrl.x, ctrl.y, to.x, to.y),
            PathSegment::CubicTo { ctrl1, ctrl2, to } => pb.cubic_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y),
            PathSegment::Close => pb.close(),
        }
    }
    pb.finish()
}

impl Device for SoftwareDevice {
    fn name(&self) -> &str {
        "SoftwareDevice"
    }

    fn allocate_buffer(&mut self, size: SurfaceSize) -> Result<()> {
        let pixmap = Pixmap::new(size.width, size.height)
            .ok_or_else(|| anyhow!("cannot allocate a {}x{} pixmap", size.width, size.height))?;
        self.pixmap = Some(pixmap);
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        let pixmap = self.pixmap_mut()?;
        pixmap.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
        Ok(())
    }

    fn fill(&mut self, path: &PathData, fill: &FillStyle, transform: &Transform) -> Result<()> {
        let Some(path) = to_skia_path(path) else {
            return Ok(());
        };
        let paint = self.paint(fill.color);
        let rule = match fill.rule {
            FillRule::NonZero => tiny_skia::FillRule::Winding,
            FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        };

        let pixmap = self.pixmap_mut()?;
        pixmap.fill_path(&path, &paint, rule, to_skia_transform(transform), None);
        Ok(())
    }

    fn stroke(&mut self, path: &PathData, stroke: &StrokeStyle, transform: &Transform) -> Result<()> {
        let Some(path) = to_skia_path(path) else {
            return Ok(());
        };
        let paint = self.paint(stroke.color);
        let skia_stroke = Stroke {
            width: stroke.width,
            miter_limit: stroke.miter_limit,
            line_cap: match stroke.line_cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match stroke.line_join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            ..Stroke::default()
        };

        let pixmap = self.pixmap_mut()?;
        pixmap.stroke_path(&path, &paint, &skia_stroke, to_skia_transform(transform), None);
        Ok(())
    }

    fn present(&mut self) -> Result<PixelBuffer> {
        let pixmap = self.pixmap_mut()?;
        let (width, height) = (pixmap.width(), pixmap.height());

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

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
