//! Render list and display items.
//!
//! A [`RenderList`] is the sequence of primitive calls a device received during a render
//! pass, stored as [`DisplayItem`] commands. The
//! [`RecordingDevice`](crate::render::backends::recording::RecordingDevice) fills one, which
//! makes it the tool of choice to check what a document asks a backend to draw.
//!
//! # Example
//!
//! ```rust
//! use gosub_svg::geometry::{PathData, Transform};
//! use gosub_svg::render::{DisplayItem, RenderList};
//! use gosub_svg::style::{Color, FillRule, FillStyle};
//!
//! let mut list = RenderList::new();
//!
//! // Clear background
//! list.add_command(DisplayItem::Clear { color: Color::WHITE });
//!
//! // Fill a red square
//! list.add_command(DisplayItem::Fill {
//!     path: PathData::rect(10.0, 20.0, 100.0, 100.0, 0.0, 0.0),
//!     fill: FillStyle { color: Color::rgb(255, 0, 0), rule: FillRule::NonZero },
//!     transform: Transform::identity(),
//! });
//!
//! assert_eq!(list.fills().count(), 1);
//! ```

use crate::geometry::{PathData, Transform};
use crate::render::backend::SurfaceSize;
use crate::style::{Color, FillStyle, StrokeStyle};

/// A single display item representing a drawing command.
///
/// Variants:
/// - [`Allocate`](DisplayItem::Allocate): a target was (re)allocated for a new pass.
/// - [`Clear`](DisplayItem::Clear): clear the entire surface to a color.
/// - [`Fill`](DisplayItem::Fill): fill a path.
/// - [`Stroke`](DisplayItem::Stroke): stroke a path.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayItem {
    Allocate {
        size: SurfaceSize,
    },

    /// Clear the entire surface with the given color.
    Clear {
        color: Color,
    },

    /// Fill `path`, given in local coordinates, after mapping it through `transform`.
    Fill {
        path: PathData,
        fill: FillStyle,
        transform: Transform,
    },

    /// Stroke `path`, given in local coordinates, after mapping it through `transform`.
    Stroke {
        path: PathData,
        stroke: StrokeStyle,
        transform: Transform,
    },
}

impl DisplayItem {
    /// Path of a fill or stroke mapped into device space.
    pub fn device_path(&self) -> Option<PathData> {
        match self {
            DisplayItem::Fill { path, transform, .. } | DisplayItem::Stroke { path, transform, .. } => {
                Some(path.transformed(transform))
            }
            _ => None,
        }
    }
}

/// A list of display items, in the order they were issued.
#[derive(Clone, Debug, Default)]
pub struct RenderList {
    /// Sequence of drawing commands.
    pub items: Vec<DisplayItem>,
}

impl RenderList {
    /// Creates a new, empty render list.
    pub fn new() -> Self {
        RenderList { items: Vec::new() }
    }

    /// Adds a new display item (drawing command) to the list.
    pub fn add_command(&mut self, command: DisplayItem) {
        self.items.push(command);
    }

    /// Clears all display items from the list.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn fills(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items.iter().filter(|i| matches!(i, DisplayItem::Fill { .. }))
    }

    pub fn strokes(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items.iter().filter(|i| matches!(i, DisplayItem::Stroke { .. }))
    }

    /// Only the fill and stroke commands, in paint order.
    pub fn draws(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items
            .iter()
            .filter(|i| matches!(i, DisplayItem::Fill { .. } | DisplayItem::Stroke { .. }))
    }
}
