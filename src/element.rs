//! Element model.
//!
//! A parsed document is a tree of [`Element`]s. Each element keeps its raw attributes next to
//! the typed values resolved from them at parse time: a local [`Transform`], a [`StyleDecl`]
//! with the properties it sets itself, and either child elements (containers) or a [`Shape`]
//! (leaves). Elements are never mutated after parsing; rendering only reads them.

use std::collections::{BTreeMap, HashMap, HashSet};
use anyhow::Result;
use lazy_static::lazy_static;
use crate::geometry::{PathData, Point, Transform};
use crate::render::context::GraphicsContext;
use crate::style::{StyleDecl, STYLE_PROPERTIES};

/// Namespace of SVG elements. Elements in no namespace are treated the same.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Viewport container. Always the root of a document.
    Svg,
    Group,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    Path,
}

/// Attributes every element kind understands.
const COMMON_ATTRIBUTES: &[&str] = &["id", "class", "transform", "style", "display"];

lazy_static! {
    static ref KIND_REGISTRY: HashMap<&'static str, ElementKind> = {
        let mut m = HashMap::new();
        m.insert("svg", ElementKind::Svg);
        m.insert("g", ElementKind::Group);
        m.insert("rect", ElementKind::Rect);
        m.insert("circle", ElementKind::Circle);
        m.insert("ellipse", ElementKind::Ellipse);
        m.insert("line", ElementKind::Line);
        m.insert("polyline", ElementKind::Polyline);
        m.insert("polygon", ElementKind::Polygon);
        m.insert("path", ElementKind::Path);
        m
    };

    static ref KIND_ATTRIBUTES: HashMap<ElementKind, HashSet<&'static str>> = {
        let specific: &[(ElementKind, &[&'static str])] = &[
            (ElementKind::Svg, &["width", "height", "viewBox", "preserveAspectRatio", "version", "baseProfile", "x", "y"]),
            (ElementKind::Group, &[]),
            (ElementKind::Rect, &["x", "y", "width", "height", "rx", "ry"]),
            (ElementKind::Circle, &["cx", "cy", "r"]),
            (ElementKind::Ellipse, &["cx", "cy", "rx", "ry"]),
            (ElementKind::Line, &["x1", "y1", "x2", "y2"]),
            (ElementKind::Polyline, &["points"]),
            (ElementKind::Polygon, &["points"]),
            (ElementKind::Path, &["d"]),
        ];

        specific
            .iter()
            .map(|(kind, attrs)| {
                let set: HashSet<&'static str> = COMMON_ATTRIBUTES
                    .iter()
                    .chain(STYLE_PROPERTIES.iter())
                    .chain(attrs.iter())
                    .copied()
                    .collect();
                (*kind, set)
            })
            .collect()
    };
}

impl ElementKind {
    /// Looks up the kind for a tag name. `None` for tags outside the supported subset.
    pub fn from_tag(tag: &str) -> Option<ElementKind> {
        KIND_REGISTRY.get(tag).copied()
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Svg => "svg",
            ElementKind::Group => "g",
            ElementKind::Rect => "rect",
            ElementKind::Circle => "circle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Line => "line",
            ElementKind::Polyline => "polyline",
            ElementKind::Polygon => "polygon",
            ElementKind::Path => "path",
        }
    }

    /// Containers may have children; every other kind is a leaf shape.
    pub fn is_container(&self) -> bool {
        matches!(self, ElementKind::Svg | ElementKind::Group)
    }

    pub fn accepts_attribute(&self, name: &str) -> bool {
        KIND_ATTRIBUTES.get(self).is_some_and(|set| set.contains(name))
    }
}

/// Geometry of a leaf element in its local coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { x: f32, y: f32, width: f32, height: f32, rx: f32, ry: f32 },
    Circle { cx: f32, cy: f32, r: f32 },
    Ellipse { cx: f32, cy: f32, rx: f32, ry: f32 },
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
    Polyline(Vec<Point>),
    Polygon(Vec<Point>),
    Path(PathData),
}

impl Shape {
    /// Outline of the shape, or `None` when the geometry is degenerate and nothing is drawn.
    pub fn to_path(&self) -> Option<PathData> {
        match self {
            Shape::Rect { x, y, width, height, rx, ry } => {
                (*width > 0.0 && *height > 0.0).then(|| PathData::rect(*x, *y, *width, *height, *rx, *ry))
            }
            Shape::Circle { cx, cy, r } => (*r > 0.0).then(|| PathData::ellipse(*cx, *cy, *r, *r)),
            Shape::Ellipse { cx, cy, rx, ry } => {
                (*rx > 0.0 && *ry > 0.0).then(|| PathData::ellipse(*cx, *cy, *rx, *ry))
            }
            Shape::Line { x1, y1, x2, y2 } => {
                let ends = [Point::new(*x1, *y1), Point::new(*x2, *y2)];
                has_extent(&ends).then(|| PathData::polyline(&ends, false))
            }
            Shape::Polyline(points) => has_extent(points).then(|| PathData::polyline(points, false)),
            Shape::Polygon(points) => has_extent(points).then(|| PathData::polyline(points, true)),
            Shape::Path(path) => (!path.is_empty()).then(|| path.clone()),
        }
    }

    /// Lines have no interior and are only ever stroked.
    pub fn is_fillable(&self) -> bool {
        !matches!(self, Shape::Line { .. })
    }

    /// Issues at most one fill and then at most one stroke with the context's current style.
    fn paint(&self, ctx: &mut GraphicsContext<'_>) -> Result<()> {
        let Some(path) = self.to_path() else {
            log::trace!("skipping degenerate {self:?}");
            return Ok(());
        };

        let style = ctx.current_style();
        let fill = if self.is_fillable() { style.fill_style() } else { None };
        let stroke = style.stroke_style();

        if let Some(fill) = fill {
            ctx.fill_path(&path, &fill)?;
        }
        if let Some(stroke) = stroke {
            ctx.stroke_path(&path, &stroke)?;
        }
        Ok(())
    }
}

/// At least two distinct points.
fn has_extent(points: &[Point]) -> bool {
    points.split_first().is_some_and(|(first, rest)| rest.iter().any(|p| p != first))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Children(Vec<Element>),
    Shape(Shape),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    /// Raw attribute values as found in the markup.
    pub attributes: BTreeMap<String, String>,
    /// Local transform, identity when absent or unparseable.
    pub transform: Transform,
    /// Style properties this element sets itself.
    pub style: StyleDecl,
    /// `display="none"`: the element and its subtree are not rendered.
    pub hidden: bool,
    pub content: Content,
}

impl Element {
    pub fn new(kind: ElementKind, content: Content) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            transform: Transform::identity(),
            style: StyleDecl::default(),
            hidden: false,
            content,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Child elements in document order. Empty for shapes.
    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Children(children) => children,
            Content::Shape(_) => &[],
        }
    }

    pub fn shape(&self) -> Option<&Shape> {
        match &self.content {
            Content::Shape(shape) => Some(shape),
            Content::Children(_) => None,
        }
    }

    /// Number of elements in this subtree, this element included.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Element::count).sum::<usize>()
    }

    /// Depth first search for an element with the given `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find_by_id(id))
    }

    /// Renders this element and its subtree.
    ///
    /// The transform and style inherited from the ancestors are the ones on top of the
    /// context's stacks. This element's own transform and style are pushed for the duration
    /// of the call and popped again on return, including early returns on device errors.
    pub fn render(&self, ctx: &mut GraphicsContext<'_>) -> Result<()> {
        if self.hidden {
            return Ok(());
        }

        let mut scope = ctx.scope(self.transform, &self.style);
        match &self.content {
            Content::Children(children) => {
                for child in children {
                    child.render(&mut scope)?;
                }
            }
            Content::Shape(shape) => shape.paint(&mut scope)?,
        }
        Ok(())
    }
}
