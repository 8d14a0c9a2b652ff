//! Viewport definition for rendering.
//!
//! A [`Viewport`] is the pixel size of the rendering target together with the optional
//! `viewBox` of the root element. The viewport decides how big the allocated buffer is and
//! which transform maps user space onto it.
//!
//! The `viewBox` is fitted with `xMidYMid meet`: uniformly scaled to fit entirely inside the
//! viewport and centered along the axis that has room to spare.
//!
//! # Examples
//!
//! ```
//! use gosub_svg::geometry::{Point, Rect};
//! use gosub_svg::render::Viewport;
//!
//! // 200x100 pixels showing a 0 0 100 100 user space
//! let vp = Viewport::new(200, 100).with_view_box(Rect::new(0.0, 0.0, 100.0, 100.0));
//! let p = vp.transform().apply(Point::new(100.0, 100.0));
//! assert_eq!((p.x, p.y), (150.0, 100.0));
//! ```

use crate::geometry::{Rect, Transform};
use crate::render::backend::SurfaceSize;

/// Represents the viewport for rendering.
#[derive(Clone, PartialEq, Copy)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// User space rectangle that is mapped onto the viewport, if any.
    pub view_box: Option<Rect>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            view_box: None,
        }
    }
}

impl std::fmt::Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.view_box {
            Some(vb) => write!(
                f,
                "Viewport {{ width: {}, height: {}, viewBox: {} {} {} {} }}",
                self.width, self.height, vb.x, vb.y, vb.width, vb.height
            ),
            None => write!(f, "Viewport {{ width: {}, height: {} }}", self.width, self.height),
        }
    }
}

impl Viewport {
    /// Creates a new [`Viewport`] of the given size without a `viewBox`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            view_box: None,
        }
    }

    pub fn with_view_box(mut self, view_box: Rect) -> Self {
        self.view_box = Some(view_box);
        self
    }

    /// Transform from user space to viewport pixels.
    ///
    /// Identity without a `viewBox` or when the `viewBox` has no area.
    pub fn transform(&self) -> Transform {
        let Some(vb) = self.view_box else {
            return Transform::identity();
        };
        if vb.width <= 0.0 || vb.height <= 0.0 {
            return Transform::identity();
        }

        let width = self.width as f32;
        let height = self.height as f32;
        let scale = (width / vb.width).min(height / vb.height);

        let tx = (width - vb.width * scale) / 2.0 - vb.x * scale;
        let ty = (height - vb.height * scale) / 2.0 - vb.y * scale;
        Transform::new(scale, 0.0, 0.0, scale, tx, ty)
    }

    /// Converts this viewport to a [`SurfaceSize`].
    pub fn as_size(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.width,
            height: self.height,
        }
    }
}
