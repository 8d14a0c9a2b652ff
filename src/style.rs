//! Colors, paints and the inheritable style model.
//!
//! Every element carries a [`StyleDecl`] with the properties it specifies itself. A
//! [`Style`] is the fully resolved counterpart: it is computed while rendering by cascading
//! an element's declaration over the style of its parent, starting from [`Style::base`].

use std::fmt::Display;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::document::attributes::{parse_length, parse_number};

/// Straight (non premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Returns the color with its alpha multiplied by `factor` (clamped to `0.0..=1.0`).
    pub fn scale_alpha(self, factor: f32) -> Self {
        let a = (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Channels as `f64` in the range `0.0 ..= 1.0`, in r, g, b, a order.
    pub fn to_f64(&self) -> (f64, f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64 / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid color '{0}'")]
pub struct ColorParseError(pub String);

impl From<svgtypes::Color> for Color {
    fn from(c: svgtypes::Color) -> Self {
        Color::rgba(c.red, c.green, c.blue, c.alpha)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Named keywords, hex notations and the `rgb()`/`rgba()`/`hsl()` functions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        svgtypes::Color::from_str(&s.to_ascii_lowercase())
            .map(Color::from)
            .map_err(|_| ColorParseError(s.to_string()))
    }
}

/// Specified paint of a fill or stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    None,
    Color(Color),
    /// Resolves to the element's `color` property at draw time.
    CurrentColor,
}

impl FromStr for Paint {
    type Err = ColorParseError;

    /// Paint servers are not supported; `url(#id) <color>` paints with its fallback color.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ColorParseError(s.to_string());
        if s.eq_ignore_ascii_case("currentcolor") {
            return Ok(Paint::CurrentColor);
        }
        match svgtypes::Paint::from_str(s) {
            Ok(svgtypes::Paint::None) => Ok(Paint::None),
            Ok(svgtypes::Paint::CurrentColor) => Ok(Paint::CurrentColor),
            Ok(svgtypes::Paint::Color(c)) => Ok(Paint::Color(c.into())),
            Ok(svgtypes::Paint::FuncIRI(_, Some(fallback))) => Ok(match fallback {
                svgtypes::PaintFallback::None => Paint::None,
                svgtypes::PaintFallback::CurrentColor => Paint::CurrentColor,
                svgtypes::PaintFallback::Color(c) => Paint::Color(c.into()),
            }),
            Ok(_) => Err(err()),
            Err(_) => s.parse().map(Paint::Color),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Resolved paint for a single fill call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub color: Color,
    pub rule: FillRule,
}

/// Resolved paint for a single stroke call. `width` is in the path's local units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
}

/// Style properties understood by the engine, both as presentation attribute and inside `style=""`.
pub const STYLE_PROPERTIES: &[&str] = &[
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "opacity",
    "color",
];

/// Outcome of applying a single property to a [`StyleDecl`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyResult {
    Applied,
    Unknown,
    Invalid(String),
}

/// Properties an element specifies itself. `None` means "inherit from the parent".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDecl {
    pub fill: Option<Paint>,
    pub fill_opacity: Option<f32>,
    pub fill_rule: Option<FillRule>,
    pub stroke: Option<Paint>,
    pub stroke_width: Option<f32>,
    pub stroke_opacity: Option<f32>,
    pub line_cap: Option<LineCap>,
    pub line_join: Option<LineJoin>,
    pub miter_limit: Option<f32>,
    pub opacity: Option<f32>,
    pub color: Option<Color>,
}

impl StyleDecl {
    /// Parses `value` for the property `name` and stores it, overriding any earlier value.
    pub fn apply(&mut self, name: &str, value: &str) -> PropertyResult {
        let value = value.trim();
        if value == "inherit" {
            return match STYLE_PROPERTIES.contains(&name) {
                true => {
                    self.clear(name);
                    PropertyResult::Applied
                }
                false => PropertyResult::Unknown,
            };
        }

        let invalid = || PropertyResult::Invalid(format!("cannot parse {name} value '{value}'"));
        let opacity = |v: &str| parse_number(v).map(|n| n.clamp(0.0, 1.0));

        match name {
            "fill" => match value.parse() {
                Ok(p) => self.fill = Some(p),
                Err(_) => return invalid(),
            },
            "stroke" => match value.parse() {
                Ok(p) => self.stroke = Some(p),
                Err(_) => return invalid(),
            },
            "color" => match value.parse() {
                Ok(c) => self.color = Some(c),
                Err(_) => return invalid(),
            },
            "fill-opacity" => match opacity(value) {
                Some(v) => self.fill_opacity = Some(v),
                None => return invalid(),
            },
            "stroke-opacity" => match opacity(value) {
                Some(v) => self.stroke_opacity = Some(v),
                None => return invalid(),
            },
            "opacity" => match opacity(value) {
                Some(v) => self.opacity = Some(v),
                None => return invalid(),
            },
            "stroke-width" => match parse_length(value) {
                Some(v) if v >= 0.0 => self.stroke_width = Some(v),
                _ => return invalid(),
            },
            "stroke-miterlimit" => match parse_number(value) {
                Some(v) if v >= 1.0 => self.miter_limit = Some(v),
                _ => return invalid(),
            },
            "fill-rule" => match value {
                "nonzero" => self.fill_rule = Some(FillRule::NonZero),
                "evenodd" => self.fill_rule = Some(FillRule::EvenOdd),
                _ => return invalid(),
            },
            "stroke-linecap" => match value {
                "butt" => self.line_cap = Some(LineCap::Butt),
                "round" => self.line_cap = Some(LineCap::Round),
                "square" => self.line_cap = Some(LineCap::Square),
                _ => return invalid(),
            },
            "stroke-linejoin" => match value {
                "miter" => self.line_join = Some(LineJoin::Miter),
                "round" => self.line_join = Some(LineJoin::Round),
                "bevel" => self.line_join = Some(LineJoin::Bevel),
                _ => return invalid(),
            },
            _ => return PropertyResult::Unknown,
        }

        PropertyResult::Applied
    }

    fn clear(&mut self, name: &str) {
        match name {
            "fill" => self.fill = None,
            "fill-opacity" => self.fill_opacity = None,
            "fill-rule" => self.fill_rule = None,
            "stroke" => self.stroke = None,
            "stroke-width" => self.stroke_width = None,
            "stroke-opacity" => self.stroke_opacity = None,
            "stroke-linecap" => self.line_cap = None,
            "stroke-linejoin" => self.line_join = None,
            "stroke-miterlimit" => self.miter_limit = None,
            "opacity" => self.opacity = None,
            "color" => self.color = None,
            _ => {}
        }
    }
}

/// Fully resolved style of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: Paint,
    pub fill_opacity: f32,
    pub fill_rule: FillRule,
    pub stroke: Paint,
    pub stroke_width: f32,
    pub stroke_opacity: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    /// Product of the `opacity` of the element and all its ancestors.
    pub opacity: f32,
    pub color: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self::base()
    }
}

impl Style {
    /// Style every document root inherits from: black fill, no stroke.
    pub const fn base() -> Self {
        Self {
            fill: Paint::Color(Color::BLACK),
            fill_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            stroke: Paint::None,
            stroke_width: 1.0,
            stroke_opacity: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 4.0,
            opacity: 1.0,
            color: Color::BLACK,
        }
    }

    /// Resolves `decl` against this (parent) style.
    pub fn cascade(&self, decl: &StyleDecl) -> Style {
        Style {
            fill: decl.fill.unwrap_or(self.fill),
            fill_opacity: decl.fill_opacity.unwrap_or(self.fill_opacity),
            fill_rule: decl.fill_rule.unwrap_or(self.fill_rule),
            stroke: decl.stroke.unwrap_or(self.stroke),
            stroke_width: decl.stroke_width.unwrap_or(self.stroke_width),
            stroke_opacity: decl.stroke_opacity.unwrap_or(self.stroke_opacity),
            line_cap: decl.line_cap.unwrap_or(self.line_cap),
            line_join: decl.line_join.unwrap_or(self.line_join),
            miter_limit: decl.miter_limit.unwrap_or(self.miter_limit),
            opacity: self.opacity * decl.opacity.unwrap_or(1.0),
            color: decl.color.unwrap_or(self.color),
        }
    }

    fn resolve_paint(&self, paint: Paint, opacity: f32) -> Option<Color> {
        let color = match paint {
            Paint::None => return None,
            Paint::Color(c) => c,
            Paint::CurrentColor => self.color,
        };
        let color = color.scale_alpha(opacity * self.opacity);
        (!color.is_transparent()).then_some(color)
    }

    /// Color to fill with, or `None` when there is nothing visible to fill.
    pub fn fill_color(&self) -> Option<Color> {
        self.resolve_paint(self.fill, self.fill_opacity)
    }

    /// Color to stroke with, or `None` when there is nothing visible to stroke.
    pub fn stroke_color(&self) -> Option<Color> {
        if self.stroke_width <= 0.0 {
            return None;
        }
        self.resolve_paint(self.stroke, self.stroke_opacity)
    }

    pub fn fill_style(&self) -> Option<FillStyle> {
        self.fill_color().map(|color| FillStyle { color, rule: self.fill_rule })
    }

    pub fn stroke_style(&self) -> Option<StrokeStyle> {
        self.stroke_color().map(|color| StrokeStyle {
            color,
            width: self.stroke_width,
            line_cap: self.line_cap,
            line_join: self.line_join,
            miter_limit: self.miter_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_rgb_and_named_colors() {
        let cases = [
            ("#f00", Color::rgb(255, 0, 0)),
            ("#00FF0033", Color::rgba(0, 255, 0, 51)),
            ("rgb(10, 20, 30)", Color::rgb(10, 20, 30)),
            ("rgba(0,0,0,0.2)", Color::rgba(0, 0, 0, 51)),
            ("rgba(0,0,0,40%)", Color::rgba(0, 0, 0, 102)),
            ("rgb(100%, 0%, 20%)", Color::rgb(255, 0, 51)),
            (" Blue ", Color::rgb(0, 0, 255)),
            ("cornflowerblue", Color::rgb(100, 149, 237)),
            ("transparent", Color::TRANSPARENT),
        ];
        for (text, expected) in cases {
            assert_eq!(text.parse::<Color>(), Ok(expected), "{text}");
        }
        assert!("#12".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
        assert!("blurple".parse::<Color>().is_err());
    }

    #[test]
    fn paints_and_fallbacks() {
        assert_eq!("none".parse::<Paint>(), Ok(Paint::None));
        assert_eq!("currentColor".parse::<Paint>(), Ok(Paint::CurrentColor));
        assert_eq!("Red".parse::<Paint>(), Ok(Paint::Color(Color::rgb(255, 0, 0))));
        assert_eq!("url(#grad) blue".parse::<Paint>(), Ok(Paint::Color(Color::rgb(0, 0, 255))));
        assert!("url(#grad)".parse::<Paint>().is_err());
        assert!("context-fill".parse::<Paint>().is_err());
    }

    #[test]
    fn unset_properties_inherit_and_set_ones_override() {
        let mut parent_decl = StyleDecl::default();
        parent_decl.apply("fill", "red");
        parent_decl.apply("stroke-width", "3");
        let parent = Style::base().cascade(&parent_decl);

        let child = parent.cascade(&StyleDecl::default());
        assert_eq!(child.fill, Paint::Color(Color::rgb(255, 0, 0)));
        assert_eq!(child.stroke_width, 3.0);

        let mut blue = StyleDecl::default();
        blue.apply("fill", "blue");
        let overridden = parent.cascade(&blue);
        assert_eq!(overridden.fill_color(), Some(Color::rgb(0, 0, 255)));
        // the parent itself is untouched
        assert_eq!(parent.fill_color(), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn none_and_zero_width_disable_painting() {
        let mut decl = StyleDecl::default();
        decl.apply("fill", "none");
        decl.apply("stroke", "black");
        decl.apply("stroke-width", "0");
        let style = Style::base().cascade(&decl);

        assert_eq!(style.fill_color(), None);
        assert_eq!(style.stroke_color(), None);
    }

    #[test]
    fn opacity_multiplies_through_ancestors() {
        let mut half = StyleDecl::default();
        half.apply("opacity", "0.5");
        let style = Style::base().cascade(&half).cascade(&half);

        assert_eq!(style.opacity, 0.25);
        assert_eq!(style.fill_color(), Some(Color::rgba(0, 0, 0, 64)));
    }

    #[test]
    fn current_color_follows_the_color_property() {
        let mut decl = StyleDecl::default();
        decl.apply("fill", "currentColor");
        decl.apply("color", "lime");
        let style = Style::base().cascade(&decl);
        assert_eq!(style.fill_color(), Some(Color::rgb(0, 255, 0)));

        let mut child = StyleDecl::default();
        child.apply("color", "navy");
        assert_eq!(style.cascade(&child).fill_color(), Some(Color::rgb(0, 0, 128)));
    }

    #[test]
    fn apply_reports_unknown_and_invalid() {
        let mut decl = StyleDecl::default();
        assert_eq!(decl.apply("filter", "url(#f)"), PropertyResult::Unknown);
        assert!(matches!(decl.apply("fill", "nope"), PropertyResult::Invalid(_)));
        assert!(matches!(decl.apply("stroke-width", "-1"), PropertyResult::Invalid(_)));
        assert_eq!(decl.apply("fill-rule", "evenodd"), PropertyResult::Applied);
        assert_eq!(decl.fill_rule, Some(FillRule::EvenOdd));

        assert_eq!(decl.apply("fill-rule", "inherit"), PropertyResult::Applied);
        assert_eq!(decl.fill_rule, None);
    }
}
