//! Geometry primitives shared by the document model, the graphics context and the devices.
//!
//! All path geometry is normalized to absolute move/line/quad/cubic/close segments, so a
//! [`Device`](crate::render::backend::Device) never has to deal with relative commands,
//! arcs or shorthand curves.

use std::f32::consts::PI;

/// Magic constant to approximate a quarter circle with a single cubic bezier.
const KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// 2D affine transform, laid out as the SVG matrix `[a c e; b d f; 0 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `degrees` around the origin, clockwise in a y-down coordinate system.
    pub fn rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn rotate_about(degrees: f32, cx: f32, cy: f32) -> Self {
        Self::translate(cx, cy)
            .multiply(&Self::rotate(degrees))
            .multiply(&Self::translate(-cx, -cy))
    }

    pub fn skew_x(degrees: f32) -> Self {
        Self::new(1.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(degrees: f32) -> Self {
        Self::new(1.0, degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Returns `self × other`: `other` is applied to a point first, then `self`.
    pub fn multiply(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { ctrl: Point, to: Point },
    CubicTo { ctrl1: Point, ctrl2: Point, to: Point },
    Close,
}

impl PathSegment {
    fn map(&self, t: &Transform) -> PathSegment {
        match *self {
            PathSegment::MoveTo(p) => PathSegment::MoveTo(t.apply(p)),
            PathSegment::LineTo(p) => PathSegment::LineTo(t.apply(p)),
            PathSegment::QuadTo { ctrl, to } => PathSegment::QuadTo { ctrl: t.apply(ctrl), to: t.apply(to) },
            PathSegment::CubicTo { ctrl1, ctrl2, to } => PathSegment::CubicTo {
                ctrl1: t.apply(ctrl1),
                ctrl2: t.apply(ctrl2),
                to: t.apply(to),
            },
            PathSegment::Close => PathSegment::Close,
        }
    }
}

/// Absolute path geometry in a single coordinate space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    segments: Vec<PathSegment>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// A path without any drawing segment (only moves, or nothing at all) is empty.
    pub fn is_empty(&self) -> bool {
        !self
            .segments
            .iter()
            .any(|s| !matches!(s, PathSegment::MoveTo(_) | PathSegment::Close))
    }

    /// Returns the same path with every point mapped through `t`.
    pub fn transformed(&self, t: &Transform) -> PathData {
        PathData {
            segments: self.segments.iter().map(|s| s.map(t)).collect(),
        }
    }

    /// Bounding box of all points, control points included.
    pub fn bounds(&self) -> Option<Rect> {
        let mut points = self.segments.iter().flat_map(|s| match *s {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vec![p],
            PathSegment::QuadTo { ctrl, to } => vec![ctrl, to],
            PathSegment::CubicTo { ctrl1, ctrl2, to } => vec![ctrl1, ctrl2, to],
            PathSegment::Close => vec![],
        });

        let first = points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Rectangle with optional rounded corners. Radii are clamped to half the size.
    pub fn rect(x: f32, y: f32, width: f32, height: f32, rx: f32, ry: f32) -> PathData {
        let rx = rx.max(0.0).min(width / 2.0);
        let ry = ry.max(0.0).min(height / 2.0);

        let mut pb = PathBuilder::new();
        if rx <= 0.0 || ry <= 0.0 {
            pb.move_to(x, y);
            pb.line_to(x + width, y);
            pb.line_to(x + width, y + height);
            pb.line_to(x, y + height);
            pb.close();
            return pb.finish();
        }

        pb.move_to(x + rx, y);
        pb.line_to(x + width - rx, y);
        pb.arc_to(rx, ry, 0.0, false, true, x + width, y + ry);
        pb.line_to(x + width, y + height - ry);
        pb.arc_to(rx, ry, 0.0, false, true, x + width - rx, y + height);
        pb.line_to(x + rx, y + height);
        pb.arc_to(rx, ry, 0.0, false, true, x, y + height - ry);
        pb.line_to(x, y + ry);
        pb.arc_to(rx, ry, 0.0, false, true, x + rx, y);
        pb.close();
        pb.finish()
    }

    /// Ellipse built from four cubic quarter arcs, starting at the rightmost point.
    pub fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32) -> PathData {
        let kx = rx * KAPPA;
        let ky = ry * KAPPA;

        let mut pb = PathBuilder::new();
        pb.move_to(cx + rx, cy);
        pb.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
        pb.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
        pb.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
        pb.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
        pb.close();
        pb.finish()
    }

    /// Open or closed polyline through `points`.
    pub fn polyline(points: &[Point], closed: bool) -> PathData {
        let mut pb = PathBuilder::new();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            pb.move_to(first.x, first.y);
            for p in iter {
                pb.line_to(p.x, p.y);
            }
            if closed {
                pb.close();
            }
        }
        pb.finish()
    }
}

/// Incremental path construction that keeps track of the current point.
#[derive(Debug, Default)]
pub struct PathBuilder {
    segments: Vec<PathSegment>,
    start: Point,
    current: Point,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_point(&self) -> Point {
        self.current
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        let p = Point::new(x, y);
        self.segments.push(PathSegment::MoveTo(p));
        self.start = p;
        self.current = p;
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.ensure_started();
        let p = Point::new(x, y);
        self.segments.push(PathSegment::LineTo(p));
        self.current = p;
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.ensure_started();
        let to = Point::new(x, y);
        self.segments.push(PathSegment::QuadTo { ctrl: Point::new(cx, cy), to });
        self.current = to;
    }

    pub fn cubic_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.ensure_started();
        let to = Point::new(x, y);
        self.segments.push(PathSegment::CubicTo {
            ctrl1: Point::new(c1x, c1y),
            ctrl2: Point::new(c2x, c2y),
            to,
        });
        self.current = to;
    }

    pub fn close(&mut self) {
        if self.segments.is_empty() {
            return;
        }
        self.segments.push(PathSegment::Close);
        self.current = self.start;
    }

    /// Elliptical arc from the current point to `(x, y)` with the endpoint parameterization
    /// of SVG, approximated with at most one cubic per quarter turn.
    pub fn arc_to(&mut self, rx: f32, ry: f32, x_axis_rotation: f32, large_arc: bool, sweep: bool, x: f32, y: f32) {
        self.ensure_started();
        let p0 = self.current;
        if p0 == Point::new(x, y) {
            return;
        }

        let mut rx = rx.abs();
        let mut ry = ry.abs();
        if rx == 0.0 || ry == 0.0 {
            self.line_to(x, y);
            return;
        }

        let (sin_phi, cos_phi) = x_axis_rotation.to_radians().sin_cos();
        let dx2 = (p0.x - x) / 2.0;
        let dy2 = (p0.y - y) / 2.0;
        let x1p = cos_phi * dx2 + sin_phi * dy2;
        let y1p = -sin_phi * dx2 + cos_phi * dy2;

        let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
        let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
        let mut coef = if den == 0.0 { 0.0 } else { (num / den).max(0.0).sqrt() };
        if large_arc == sweep {
            coef = -coef;
        }
        let cxp = coef * rx * y1p / ry;
        let cyp = -coef * ry * x1p / rx;

        let cx = cos_phi * cxp - sin_phi * cyp + (p0.x + x) / 2.0;
        let cy = sin_phi * cxp + cos_phi * cyp + (p0.y + y) / 2.0;

        let ux = (x1p - cxp) / rx;
        let uy = (y1p - cyp) / ry;
        let vx = (-x1p - cxp) / rx;
        let vy = (-y1p - cyp) / ry;

        let theta1 = vector_angle(1.0, 0.0, ux, uy);
        let mut delta = vector_angle(ux, uy, vx, vy);
        if !sweep && delta > 0.0 {
            delta -= 2.0 * PI;
        } else if sweep && delta < 0.0 {
            delta += 2.0 * PI;
        }

        let count = (delta.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
        let step = delta / count as f32;
        let t = 4.0 / 3.0 * (step / 4.0).tan();

        let map = |ux: f32, uy: f32| -> (f32, f32) {
            (
                cx + rx * ux * cos_phi - ry * uy * sin_phi,
                cy + rx * ux * sin_phi + ry * uy * cos_phi,
            )
        };

        for i in 0..count {
            let a1 = theta1 + step * i as f32;
            let a2 = a1 + step;
            let (s1, c1) = a1.sin_cos();
            let (s2, c2) = a2.sin_cos();

            let (c1x, c1y) = map(c1 - t * s1, s1 + t * c1);
            let (c2x, c2y) = map(c2 + t * s2, s2 - t * c2);
            let (ex, ey) = if i + 1 == count { (x, y) } else { map(c2, s2) };
            self.cubic_to(c1x, c1y, c2x, c2y, ex, ey);
        }
    }

    pub fn finish(self) -> PathData {
        PathData { segments: self.segments }
    }

    fn ensure_started(&mut self) {
        if self.segments.is_empty() {
            self.segments.push(PathSegment::MoveTo(self.current));
            self.start = self.current;
        }
    }
}

fn vector_angle(ux: f32, uy: f32, vx: f32, vy: f32) -> f32 {
    (ux * vy - uy * vx).atan2(ux * vx + uy * vy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_to(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn nested_translations_compose() {
        let parent = Transform::translate(10.0, 0.0);
        let child = Transform::translate(0.0, 10.0);
        let p = parent.multiply(&child).apply(Point::new(1.0, 2.0));
        assert_eq!(p, Point::new(11.0, 12.0));
    }

    #[test]
    fn multiply_applies_right_operand_first() {
        let t = Transform::translate(5.0, 0.0).multiply(&Transform::scale(2.0, 2.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(7.0, 2.0));

        let t = Transform::scale(2.0, 2.0).multiply(&Transform::translate(5.0, 0.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
    }

    #[test]
    fn rotate_about_keeps_center_fixed() {
        let t = Transform::rotate_about(90.0, 10.0, 10.0);
        assert!(close_to(t.apply(Point::new(10.0, 10.0)), Point::new(10.0, 10.0)));
        assert!(close_to(t.apply(Point::new(20.0, 10.0)), Point::new(10.0, 20.0)));
    }

    #[test]
    fn plain_rect_is_four_lines_and_close() {
        let path = PathData::rect(1.0, 2.0, 3.0, 4.0, 0.0, 0.0);
        assert_eq!(path.segments().len(), 5);
        assert_eq!(path.bounds(), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn rounded_rect_stays_inside_its_box() {
        let path = PathData::rect(0.0, 0.0, 100.0, 50.0, 80.0, 10.0);
        let b = path.bounds().unwrap();
        assert!(b.x >= -1e-3 && b.y >= -1e-3);
        assert!(b.right() <= 100.0 + 1e-3 && b.bottom() <= 50.0 + 1e-3);
        assert!(path.segments().iter().any(|s| matches!(s, PathSegment::CubicTo { .. })));
    }

    #[test]
    fn ellipse_bounds_match_radii() {
        let b = PathData::ellipse(50.0, 50.0, 20.0, 10.0).bounds().unwrap();
        assert!(close_to(Point::new(b.x, b.y), Point::new(30.0, 40.0)));
        assert!(close_to(Point::new(b.width, b.height), Point::new(40.0, 20.0)));
    }

    #[test]
    fn half_circle_arc_ends_exactly_on_target() {
        let mut pb = PathBuilder::new();
        pb.move_to(0.0, 0.0);
        pb.arc_to(10.0, 10.0, 0.0, false, true, 20.0, 0.0);
        let path = pb.finish();

        let cubics: Vec<_> = path
            .segments()
            .iter()
            .filter(|s| matches!(s, PathSegment::CubicTo { .. }))
            .collect();
        assert_eq!(cubics.len(), 2);
        assert_eq!(pb_last(&path), Point::new(20.0, 0.0));

        // Sweep flag set means the arc bulges towards negative y in y-down space.
        let b = path.bounds().unwrap();
        assert!(b.y < -9.0);
    }

    #[test]
    fn zero_radius_arc_degrades_to_line() {
        let mut pb = PathBuilder::new();
        pb.move_to(0.0, 0.0);
        pb.arc_to(0.0, 5.0, 0.0, false, false, 10.0, 0.0);
        assert_eq!(pb.finish().segments()[1], PathSegment::LineTo(Point::new(10.0, 0.0)));
    }

    #[test]
    fn only_moves_is_empty() {
        let mut pb = PathBuilder::new();
        pb.move_to(1.0, 1.0);
        pb.move_to(2.0, 2.0);
        assert!(pb.finish().is_empty());
        assert!(PathData::polyline(&[Point::new(0.0, 0.0)], false).is_empty());
    }

    #[test]
    fn transformed_maps_every_point() {
        let path = PathData::polyline(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0)], false);
        let moved = path.transformed(&Transform::translate(10.0, 10.0));
        assert_eq!(
            moved.segments(),
            &[
                PathSegment::MoveTo(Point::new(10.0, 10.0)),
                PathSegment::LineTo(Point::new(11.0, 10.0)),
            ]
        );
    }

    fn pb_last(path: &PathData) -> Point {
        match path.segments().last() {
            Some(PathSegment::CubicTo { to, .. }) => *to,
            other => panic!("unexpected last segment: {other:?}"),
        }
    }
}
