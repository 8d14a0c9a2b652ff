//! Path data (`d` attribute) parser.
//!
//! Segments come from `svgtypes::PathParser` and are normalised into absolute [`PathData`]:
//! relative commands are resolved against the current point, `H`/`V` become lines, `S`/`T`
//! get their reflected control point spelled out and arcs are converted to cubics. On a syntax
//! error everything up to the last complete segment is kept.

use svgtypes::{PathParser, PathSegment as Segment};
use crate::geometry::{PathBuilder, PathData, Point};

/// Result of parsing path data: the usable geometry plus the first error, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPath {
    pub path: PathData,
    pub error: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum LastCurve {
    None,
    Cubic(Point),
    Quad(Point),
}

pub fn parse_path_data(d: &str) -> ParsedPath {
    let mut pb = PathBuilder::new();
    let mut last = LastCurve::None;

    for segment in PathParser::from(d) {
        match segment {
            Ok(segment) => last = apply_segment(&mut pb, segment, last),
            Err(e) => {
                return ParsedPath {
                    path: pb.finish(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    ParsedPath { path: pb.finish(), error: None }
}

/// Appends one segment and returns the control point a following smooth curve reflects.
fn apply_segment(pb: &mut PathBuilder, segment: Segment, last: LastCurve) -> LastCurve {
    let current = pb.current_point();
    let resolve = |abs: bool, x: f64, y: f64| -> Point {
        if abs {
            Point::new(x as f32, y as f32)
        } else {
            Point::new(current.x + x as f32, current.y + y as f32)
        }
    };

    match segment {
        Segment::MoveTo { abs, x, y } => {
            let p = resolve(abs, x, y);
            pb.move_to(p.x, p.y);
        }
        Segment::LineTo { abs, x, y } => {
            let p = resolve(abs, x, y);
            pb.line_to(p.x, p.y);
        }
        Segment::HorizontalLineTo { abs, x } => {
            let p = resolve(abs, x, 0.0);
            pb.line_to(p.x, current.y);
        }
        Segment::VerticalLineTo { abs, y } => {
            let p = resolve(abs, 0.0, y);
            pb.line_to(current.x, p.y);
        }
        Segment::CurveTo { abs, x1, y1, x2, y2, x, y } => {
            let (c1, c2, to) = (resolve(abs, x1, y1), resolve(abs, x2, y2), resolve(abs, x, y));
            pb.cubic_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
            return LastCurve::Cubic(c2);
        }
        Segment::SmoothCurveTo { abs, x2, y2, x, y } => {
            let c1 = match last {
                LastCurve::Cubic(c) => reflect(c, current),
                _ => current,
            };
            let (c2, to) = (resolve(abs, x2, y2), resolve(abs, x, y));
            pb.cubic_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
            return LastCurve::Cubic(c2);
        }
        Segment::Quadratic { abs, x1, y1, x, y } => {
            let (ctrl, to) = (resolve(abs, x1, y1), resolve(abs, x, y));
            pb.quad_to(ctrl.x, ctrl.y, to.x, to.y);
            return LastCurve::Quad(ctrl);
        }
        Segment::SmoothQuadratic { abs, x, y } => {
            let ctrl = match last {
                LastCurve::Quad(c) => reflect(c, current),
                _ => current,
            };
            let to = resolve(abs, x, y);
            pb.quad_to(ctrl.x, ctrl.y, to.x, to.y);
            return LastCurve::Quad(ctrl);
        }
        Segment::EllipticalArc { abs, rx, ry, x_axis_rotation, large_arc, sweep, x, y } => {
            let to = resolve(abs, x, y);
            pb.arc_to(rx as f32, ry as f32, x_axis_rotation as f32, large_arc, sweep, to.x, to.y);
        }
        Segment::ClosePath { .. } => pb.close(),
    }

    LastCurve::None
}

fn reflect(ctrl: Point, around: Point) -> Point {
    Point::new(2.0 * around.x - ctrl.x, 2.0 * around.y - ctrl.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PathSegment;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn absolute_and_relative_lines() {
        let parsed = parse_path_data("M10 10 L20 10 l0 10 h-10 V10 z");
        assert!(parsed.error.is_none());
        assert_eq!(
            parsed.path.segments(),
            &[
                PathSegment::MoveTo(p(10.0, 10.0)),
                PathSegment::LineTo(p(20.0, 10.0)),
                PathSegment::LineTo(p(20.0, 20.0)),
                PathSegment::LineTo(p(10.0, 20.0)),
                PathSegment::LineTo(p(10.0, 10.0)),
                PathSegment::Close,
            ]
        );
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        let parsed = parse_path_data("m1 1 2 0 0 2");
        assert_eq!(
            parsed.path.segments(),
            &[
                PathSegment::MoveTo(p(1.0, 1.0)),
                PathSegment::LineTo(p(3.0, 1.0)),
                PathSegment::LineTo(p(3.0, 3.0)),
            ]
        );
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
        let parsed = parse_path_data("M0 0 C0 10 10 10 10 0 S20 -10 20 0");
        let segs = parsed.path.segments();
        assert_eq!(
            segs[2],
            PathSegment::CubicTo { ctrl1: p(10.0, -10.0), ctrl2: p(20.0, -10.0), to: p(20.0, 0.0) }
        );
    }

    #[test]
    fn smooth_quad_without_previous_quad_uses_current_point() {
        let parsed = parse_path_data("M5 5 T10 10");
        assert_eq!(parsed.path.segments()[1], PathSegment::QuadTo { ctrl: p(5.0, 5.0), to: p(10.0, 10.0) });
    }

    #[test]
    fn smooth_quad_reflects_and_relative_moves_start_at_the_subpath() {
        let parsed = parse_path_data("M0 0 Q5 5 10 0 t10 0 Z m2 2 h1");
        assert!(parsed.error.is_none(), "{:?}", parsed.error);
        let segs = parsed.path.segments();
        assert_eq!(segs[2], PathSegment::QuadTo { ctrl: p(15.0, -5.0), to: p(20.0, 0.0) });
        assert_eq!(segs[4], PathSegment::MoveTo(p(2.0, 2.0)));
        assert_eq!(segs[5], PathSegment::LineTo(p(3.0, 2.0)));
    }

    #[test]
    fn packed_arc_flags_parse() {
        let parsed = parse_path_data("M0 0a10 10 0 0110 10");
        assert!(parsed.error.is_none(), "{:?}", parsed.error);
        match parsed.path.segments().last() {
            Some(PathSegment::CubicTo { to, .. }) => assert_eq!(*to, p(10.0, 10.0)),
            other => panic!("expected cubic, got {other:?}"),
        }
    }

    #[test]
    fn error_keeps_segments_before_it() {
        let parsed = parse_path_data("M0 0 L10 0 L20 # L30 0");
        assert!(parsed.error.is_some());
        assert_eq!(parsed.path.segments().len(), 2);
    }

    #[test]
    fn must_start_with_moveto() {
        let parsed = parse_path_data("L10 10");
        assert!(parsed.error.is_some());
        assert!(parsed.path.is_empty());
    }

    #[test]
    fn numbers_after_closepath_are_an_error() {
        let parsed = parse_path_data("M0 0 L1 0 L1 1 Z 5 5");
        assert!(parsed.error.is_some());
        assert_eq!(parsed.path.segments().len(), 4);
    }

    #[test]
    fn empty_data_is_empty_path() {
        let parsed = parse_path_data("   ");
        assert!(parsed.error.is_none());
        assert!(parsed.path.is_empty());
    }
}
