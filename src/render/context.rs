//! Graphics context: the per-pass state between an element tree and a [`Device`].
//!
//! The context keeps two LIFO stacks. The transform stack holds fully composed transforms
//! (user space of the current element to device pixels) and the style stack holds fully
//! resolved [`Style`]s. Both start with a base frame that can never be popped. Elements enter
//! a scope with [`GraphicsContext::scope`], which pushes onto both stacks and pops them again
//! when the returned guard goes out of scope, on every exit path.

use std::ops::{Deref, DerefMut};
use anyhow::Result;
use crate::geometry::{PathData, Transform};
use crate::render::backend::{Device, PixelBuffer, SurfaceSize};
use crate::style::{Color, FillStyle, StrokeStyle, Style, StyleDecl};

pub struct GraphicsContext<'d> {
    device: &'d mut dyn Device,
    size: SurfaceSize,
    clear_color: Color,
    transforms: Vec<Transform>,
    styles: Vec<Style>,
    finalized: bool,
}

impl<'d> GraphicsContext<'d> {
    /// Borrows `device` for one render pass and asks it for a target of `size`.
    pub fn new(device: &'d mut dyn Device, size: SurfaceSize) -> Result<Self> {
        log::debug!("allocating {}x{} target on {}", size.width, size.height, device.name());
        device.allocate_buffer(size)?;

        Ok(Self {
            device,
            size,
            clear_color: Color::TRANSPARENT,
            transforms: vec![Transform::identity()],
            styles: vec![Style::base()],
            finalized: false,
        })
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Resets every pixel to the clear color and starts a new pass.
    pub fn clear(&mut self) -> Result<()> {
        log::debug!("clearing target to {}", self.clear_color);
        self.finalized = false;
        self.device.clear(self.clear_color)
    }

    /// Pushes `local` composed with the current transform.
    pub fn push_transform(&mut self, local: Transform) {
        let composed = self.current_transform().multiply(&local);
        self.transforms.push(composed);
    }

    /// Pops the last pushed transform.
    ///
    /// # Panics
    ///
    /// Panics when only the base frame is left.
    pub fn pop_transform(&mut self) {
        assert!(self.transforms.len() > 1, "transform stack underflow: popped the base frame");
        self.transforms.pop();
    }

    /// Pushes the style that results from applying `decl` to the current style.
    pub fn push_style(&mut self, decl: &StyleDecl) {
        let resolved = self.current_style().cascade(decl);
        self.styles.push(resolved);
    }

    /// Pops the last pushed style.
    ///
    /// # Panics
    ///
    /// Panics when only the base frame is left.
    pub fn pop_style(&mut self) {
        assert!(self.styles.len() > 1, "style stack underflow: popped the base frame");
        self.styles.pop();
    }

    pub fn current_transform(&self) -> Transform {
        self.transforms.last().copied().unwrap_or_default()
    }

    pub fn current_style(&self) -> &Style {
        // The base frame is never popped.
        &self.styles[self.styles.len() - 1]
    }

    /// Number of frames pushed on top of the base frames, as `(transforms, styles)`.
    pub fn depth(&self) -> (usize, usize) {
        (self.transforms.len() - 1, self.styles.len() - 1)
    }

    /// Enters a scope with a local transform and style declaration.
    ///
    /// Both frames are popped when the guard is dropped.
    pub fn scope<'a>(&'a mut self, local: Transform, decl: &StyleDecl) -> StateGuard<'a, 'd> {
        self.push_transform(local);
        self.push_style(decl);
        StateGuard { ctx: self }
    }

    /// Fills `path` (local coordinates) with the current transform.
    pub fn fill_path(&mut self, path: &PathData, fill: &FillStyle) -> Result<()> {
        let transform = self.current_transform();
        log::trace!("fill {} segments with {}", path.segments().len(), fill.color);
        self.device.fill(path, fill, &transform)
    }

    /// Strokes `path` (local coordinates) with the current transform.
    pub fn stroke_path(&mut self, path: &PathData, stroke: &StrokeStyle) -> Result<()> {
        let transform = self.current_transform();
        log::trace!("stroke {} segments with {} width {}", path.segments().len(), stroke.color, stroke.width);
        self.device.stroke(path, stroke, &transform)
    }

    /// Returns the finished raster of this pass.
    pub fn finalize(&mut self) -> Result<PixelBuffer> {
        if self.finalized {
            log::warn!("finalize called twice without clear; buffer contents may be stale");
        }
        self.finalized = true;
        log::debug!("presenting {}", self.device.name());
        self.device.present()
    }
}

/// Scope guard returned by [`GraphicsContext::scope`].
///
/// Dereferences to the context. Dropping the guard pops the style frame and then the
/// transform frame it pushed.
pub struct StateGuard<'a, 'd> {
    ctx: &'a mut GraphicsContext<'d>,
}

impl<'d> Deref for StateGuard<'_, 'd> {
    type Target = GraphicsContext<'d>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'d> DerefMut for StateGuard<'_, 'd> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for StateGuard<'_, '_> {
    fn drop(&mut self) {
        self.ctx.pop_style();
        self.ctx.pop_transform();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::recording::RecordingDevice;
    use crate::render::DisplayItem;
    use crate::style::{FillRule, Paint};

    fn square() -> PathData {
        PathData::rect(0.0, 0.0, 10.0, 10.0, 0.0, 0.0)
    }

    #[test]
    fn scopes_compose_and_unwind() {
        let mut dev = RecordingDevice::new();
        let mut ctx = GraphicsContext::new(&mut dev, SurfaceSize::new(20, 20)).unwrap();

        {
            let mut outer = ctx.scope(Transform::translate(10.0, 0.0), &StyleDecl::default());
            {
                let inner = outer.scope(Transform::translate(0.0, 10.0), &StyleDecl::default());
                assert_eq!(inner.current_transform(), Transform::translate(10.0, 10.0));
                assert_eq!(inner.depth(), (2, 2));
            }
            assert_eq!(outer.depth(), (1, 1));
        }
        assert_eq!(ctx.depth(), (0, 0));
        assert!(ctx.current_transform().is_identity());
    }

    #[test]
    fn guard_unwinds_on_early_return() {
        fn failing(ctx: &mut GraphicsContext<'_>) -> Result<()> {
            let _scope = ctx.scope(Transform::scale(2.0, 2.0), &StyleDecl::default());
            anyhow::bail!("device gave up");
        }

        let mut dev = RecordingDevice::new();
        let mut ctx = GraphicsContext::new(&mut dev, SurfaceSize::new(4, 4)).unwrap();
        assert!(failing(&mut ctx).is_err());
        assert_eq!(ctx.depth(), (0, 0));
    }

    #[test]
    fn style_is_cascaded_from_the_parent() {
        let mut dev = RecordingDevice::new();
        let mut ctx = GraphicsContext::new(&mut dev, SurfaceSize::new(4, 4)).unwrap();

        let red = StyleDecl { fill: Some(Paint::Color(Color::rgb(255, 0, 0))), ..Default::default() };
        ctx.push_style(&red);
        ctx.push_style(&StyleDecl::default());
        assert_eq!(ctx.current_style().fill_color(), Some(Color::rgb(255, 0, 0)));
        ctx.pop_style();
        ctx.pop_style();
        assert_eq!(ctx.current_style(), &Style::base());
    }

    #[test]
    #[should_panic(expected = "transform stack underflow")]
    fn popping_base_transform_panics() {
        let mut dev = RecordingDevice::new();
        let mut ctx = GraphicsContext::new(&mut dev, SurfaceSize::new(4, 4)).unwrap();
        ctx.pop_transform();
    }

    #[test]
    #[should_panic(expected = "style stack underflow")]
    fn popping_base_style_panics() {
        let mut dev = RecordingDevice::new();
        let mut ctx = GraphicsContext::new(&mut dev, SurfaceSize::new(4, 4)).unwrap();
        ctx.pop_style();
    }

    #[test]
    fn draw_calls_carry_the_composed_transform() {
        let mut dev = RecordingDevice::new();
        {
            let mut ctx = GraphicsContext::new(&mut dev, SurfaceSize::new(20, 20)).unwrap();
            ctx.set_clear_color(Color::WHITE);
            ctx.clear().unwrap();
            ctx.push_transform(Transform::translate(3.0, 4.0));
            let fill = FillStyle { color: Color::BLACK, rule: FillRule::NonZero };
            ctx.fill_path(&square(), &fill).unwrap();
            ctx.pop_transform();
            let buf = ctx.finalize().unwrap();
            assert_eq!(buf.pixel(0, 0), Some(Color::WHITE));
        }

        let items = &dev.render_list().items;
        assert_eq!(items[0], DisplayItem::Allocate { size: SurfaceSize::new(20, 20) });
        assert_eq!(items[1], DisplayItem::Clear { color: Color::WHITE });
        match &items[2] {
            DisplayItem::Fill { transform, .. } => assert_eq!(*transform, Transform::translate(3.0, 4.0)),
            other => panic!("expected fill, got {other:?}"),
        }
    }
}
