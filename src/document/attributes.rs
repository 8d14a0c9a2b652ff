//! Parsers for raw attribute values.
//!
//! Attributes are stored as plain strings on each element and only turned into typed values
//! when an element kind needs them. The micro-syntaxes themselves (numbers, lengths, point
//! lists, `viewBox`, transform lists) are read with `svgtypes`; this module narrows the results
//! to what the engine supports. Every parser here either returns the typed value or a failure
//! the caller records as an `InvalidGeometry` diagnostic before falling back to a default.

use std::str::FromStr;
use svgtypes::{LengthUnit, NumberListParser, PointsParser};
use crate::geometry::{Point, Rect, Transform};

/// A bare number, nothing else around it but whitespace.
pub fn parse_number(value: &str) -> Option<f32> {
    let n = svgtypes::Number::from_str(value.trim()).ok()?;
    Some(n.0 as f32).filter(|v| v.is_finite())
}

/// A length in user units. Only unitless and `px` values are supported.
pub fn parse_length(value: &str) -> Option<f32> {
    let length = svgtypes::Length::from_str(value.trim()).ok()?;
    match length.unit {
        LengthUnit::None | LengthUnit::Px => Some(length.number as f32).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Parses a whitespace or comma separated list of coordinate pairs.
///
/// On a syntax error or a dangling odd coordinate, the pairs read so far are returned as the
/// `Err` value so that the caller can still render them.
pub fn parse_points(value: &str) -> Result<Vec<Point>, Vec<Point>> {
    let points: Vec<Point> = PointsParser::from(value)
        .map(|(x, y)| Point::new(x as f32, y as f32))
        .collect();

    // PointsParser stops silently at the first bad token; count the numbers to tell a
    // clean end from a truncated one.
    let mut numbers = 0;
    for n in NumberListParser::from(value) {
        match n {
            Ok(_) => numbers += 1,
            Err(_) => return Err(points),
        }
    }
    if numbers == points.len() * 2 {
        Ok(points)
    } else {
        Err(points)
    }
}

/// `min-x min-y width height`, with a strictly positive size.
pub fn parse_view_box(value: &str) -> Option<Rect> {
    let vb = svgtypes::ViewBox::from_str(value).ok()?;
    let rect = Rect::new(vb.x as f32, vb.y as f32, vb.w as f32, vb.h as f32);
    (rect.width > 0.0 && rect.height > 0.0).then_some(rect)
}

/// Parses a transform list such as `translate(10 20) rotate(45, 5, 5) scale(2)`.
///
/// The functions are multiplied left to right, so the rightmost one is applied to the
/// geometry first.
pub fn parse_transform(value: &str) -> Result<Transform, svgtypes::Error> {
    let ts = svgtypes::Transform::from_str(value)?;
    Ok(Transform::new(ts.a as f32, ts.b as f32, ts.c as f32, ts.d as f32, ts.e as f32, ts.f as f32))
}

/// Splits a `style` attribute into `(property, value)` pairs. Empty declarations are dropped.
pub fn parse_inline_style(value: &str) -> Vec<(&str, &str)> {
    value
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then_some((name, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Transform, b: Transform) -> bool {
        [(a.a, b.a), (a.b, b.b), (a.c, b.c), (a.d, b.d), (a.e, b.e), (a.f, b.f)]
            .iter()
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn numbers_and_lengths() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("-.5e1"), Some(-5.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("1 2"), None);

        assert_eq!(parse_length("20px"), Some(20.0));
        assert_eq!(parse_length(" 20 "), Some(20.0));
        assert_eq!(parse_length("20%"), None);
        assert_eq!(parse_length("2em"), None);
        assert_eq!(parse_length("1in"), None);
        assert_eq!(parse_length("px"), None);
    }

    #[test]
    fn points_keep_good_prefix_on_error() {
        assert_eq!(parse_points("0,0 10,0 10 10").unwrap().len(), 3);
        assert_eq!(parse_points("1-2.5.5,3").unwrap(), vec![Point::new(1.0, -2.5), Point::new(0.5, 3.0)]);
        assert_eq!(parse_points("0,0 10,0 10").unwrap_err().len(), 2);
        assert_eq!(parse_points("0,0 1,1 x 2,2").unwrap_err().len(), 2);
        assert!(parse_points("").unwrap().is_empty());
    }

    #[test]
    fn view_box_requires_positive_size() {
        assert_eq!(parse_view_box("0 0 100 50"), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert_eq!(parse_view_box("0,0,100,50"), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert_eq!(parse_view_box("0 0 0 50"), None);
        assert_eq!(parse_view_box("0 0 100"), None);
    }

    #[test]
    fn transform_functions() {
        let cases = [
            ("translate(10)", Transform::translate(10.0, 0.0)),
            ("translate(10 -4)", Transform::translate(10.0, -4.0)),
            ("scale(3)", Transform::scale(3.0, 3.0)),
            ("scale(2, 0.5)", Transform::scale(2.0, 0.5)),
            ("rotate(90)", Transform::rotate(90.0)),
            ("rotate(45 5 5)", Transform::rotate_about(45.0, 5.0, 5.0)),
            ("skewX(30)", Transform::skew_x(30.0)),
            ("skewY(-15)", Transform::skew_y(-15.0)),
            ("matrix(1 0 0 1 5 6)", Transform::translate(5.0, 6.0)),
            ("", Transform::identity()),
        ];
        for (text, expected) in cases {
            let parsed = parse_transform(text).unwrap();
            assert!(close(parsed, expected), "{text}: {parsed:?} != {expected:?}");
        }
    }

    #[test]
    fn rotation_maps_points_clockwise() {
        let p = parse_transform("rotate(90)").unwrap().apply(Point::new(1.0, 0.0));
        assert!(p.x.abs() < 1e-5 && (p.y - 1.0).abs() < 1e-5, "{p:?}");

        let p = parse_transform("rotate(180, 5, 5)").unwrap().apply(Point::new(0.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-4 && (p.y - 10.0).abs() < 1e-4, "{p:?}");

        let p = parse_transform("skewX(45)").unwrap().apply(Point::new(0.0, 2.0));
        assert!((p.x - 2.0).abs() < 1e-5 && (p.y - 2.0).abs() < 1e-5, "{p:?}");
    }

    #[test]
    fn transform_lists_compose_left_to_right() {
        let t = parse_transform("translate(10) scale(2, 3)").unwrap();
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(12.0, 3.0));

        assert!(parse_transform("translate(10").is_err());
        assert!(parse_transform("wobble(1)").is_err());
        assert!(parse_transform("scale(1,2,3)").is_err());
    }

    #[test]
    fn inline_style_declarations() {
        let decls = parse_inline_style("fill: red; stroke:blue;;  ; opacity :0.5");
        assert_eq!(decls, vec![("fill", "red"), ("stroke", "blue"), ("opacity", "0.5")]);
    }
}
