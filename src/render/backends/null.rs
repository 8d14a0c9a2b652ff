use std::any::Any;
use anyhow::Result;
use crate::geometry::{PathData, Transform};
use crate::render::backend::{Device, PixelBuffer, SurfaceSize};
use crate::style::{Color, FillStyle, StrokeStyle};

/// Null device that does not perform any rendering.
///
/// Useful for hosts that only want to validate markup or collect diagnostics. `present`
/// returns a fully transparent buffer of the allocated size.
pub struct NullDevice {
    /// Size of the target in pixels.
    size: SurfaceSize,
}

impl NullDevice {
    /// Creates a new instance of the null device.
    pub fn new() -> Self {
        Self {
            size: SurfaceSize::new(0, 0),
        }
    }
}

impl Default for NullDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for NullDevice {
    fn name(&self) -> &str {
        "NullDevice"
    }

    fn allocate_buffer(&mut self, size: SurfaceSize) -> Result<()> {
        self.size = size;
        Ok(())
    }

    fn clear(&mut self, _color: Color) -> Result<()> {
        Ok(())
    }

    fn fill(&mut self, _path: &PathData, _fill: &FillStyle, _transform: &Transform) -> Result<()> {
        Ok(())
    }

    fn stroke(&mut self, _path: &PathData, _stroke: &StrokeStyle, _transform: &Transform) -> Result<()> {
        Ok(())
    }

    fn present(&mut self) -> Result<PixelBuffer> {
        Ok(PixelBuffer::filled(self.size, Color::TRANSPARENT))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
