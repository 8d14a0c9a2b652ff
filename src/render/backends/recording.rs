use std::any::Any;
use anyhow::Result;
use crate::geometry::{PathData, Transform};
use crate::render::backend::{Device, PixelBuffer, SurfaceSize};
use crate::render::{DisplayItem, RenderList};
use crate::style::{Color, FillStyle, StrokeStyle};

/// Device that rasterizes nothing but records every call it receives.
///
/// Each [`allocate_buffer`](Device::allocate_buffer) starts a fresh [`RenderList`], so after a
/// render pass the list holds exactly the calls of that pass. `present` returns a buffer filled
/// with the last clear color.
pub struct RecordingDevice {
    list: RenderList,
    size: SurfaceSize,
    clear_color: Color,
    /// Number of passes started on this device.
    passes: u64,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            list: RenderList::new(),
            size: SurfaceSize::new(0, 0),
            clear_color: Color::TRANSPARENT,
            passes: 0,
        }
    }

    /// Calls recorded during the current (or last) pass.
    pub fn render_list(&self) -> &RenderList {
        &self.list
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for RecordingDevice {
    fn name(&self) -> &str {
        "RecordingDevice"
    }

    fn allocate_buffer(&mut self, size: SurfaceSize) -> Result<()> {
        self.list.clear();
        self.size = size;
        self.passes = self.passes.wrapping_add(1);
        self.list.add_command(DisplayItem::Allocate { size });
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.clear_color = color;
        self.list.add_command(DisplayItem::Clear { color });
        Ok(())
    }

    fn fill(&mut self, path: &PathData, fill: &FillStyle, transform: &Transform) -> Result<()> {
        log::trace!("record fill {} segments with {}", path.segments().len(), fill.color);
        self.list.add_command(DisplayItem::Fill {
            path: path.clone(),
            fill: *fill,
            transform: *transform,
        });
        Ok(())
    }

    fn stroke(&mut self, path: &PathData, stroke: &StrokeStyle, transform: &Transform) -> Result<()> {
        log::trace!("record stroke {} segments with {}", path.segments().len(), stroke.color);
        self.list.add_command(DisplayItem::Stroke {
            path: path.clone(),
            stroke: *stroke,
            transform: *transform,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<PixelBuffer> {
        Ok(PixelBuffer::filled(self.size, self.clear_color))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
