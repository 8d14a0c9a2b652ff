//! Markup tree to [`Element`] tree.
//!
//! `roxmltree` checks well-formedness; this module walks its tree once and resolves every
//! attribute it understands into typed values. Anything it cannot use becomes a
//! [`Diagnostic`] and is skipped.

use std::collections::BTreeMap;
use roxmltree::{Node, ParsingOptions};
use crate::config::{EngineConfig, MAX_DIMENSION};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::document::attributes::{parse_inline_style, parse_length, parse_points, parse_transform, parse_view_box};
use crate::document::path_data::parse_path_data;
use crate::element::{Content, Element, ElementKind, Shape, SVG_NAMESPACE};
use crate::errors::ParseError;
use crate::geometry::{PathData, Point, Transform};
use crate::render::Viewport;
use crate::style::{PropertyResult, StyleDecl, STYLE_PROPERTIES};

type Attributes = BTreeMap<String, String>;

pub(super) fn build(text: &str, config: &EngineConfig) -> Result<(Element, Viewport, Vec<Diagnostic>), ParseError> {
    if text.contains('\0') {
        return Err(ParseError::malformed("input contains NUL bytes"));
    }
    if text.trim().is_empty() {
        return Err(ParseError::malformed("document is empty"));
    }

    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    options.nodes_limit = config.max_nodes;
    let xml = roxmltree::Document::parse_with_options(text, options)?;

    let root = xml.root_element();
    if element_kind(root) != Some(ElementKind::Svg) {
        let pos = xml.text_pos_at(root.range().start);
        return Err(
            ParseError::malformed(format!("root element is <{}>, expected <svg>", root.tag_name().name()))
                .at(pos.row, pos.col),
        );
    }

    let mut builder = TreeBuilder {
        config,
        diagnostics: Vec::new(),
    };
    let element = builder.element(root, ElementKind::Svg, 1);
    let viewport = builder.viewport(&element);
    Ok((element, viewport, builder.diagnostics))
}

/// Kind of a markup node, `None` for tags outside the supported subset or in a foreign namespace.
fn element_kind(node: Node<'_, '_>) -> Option<ElementKind> {
    match node.tag_name().namespace() {
        None | Some(SVG_NAMESPACE) => ElementKind::from_tag(node.tag_name().name()),
        Some(_) => None,
    }
}

struct TreeBuilder<'c> {
    config: &'c EngineConfig,
    diagnostics: Vec<Diagnostic>,
}

impl TreeBuilder<'_> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn invalid(&mut self, tag: &str, attribute: &str, message: String) {
        self.report(Diagnostic::for_attribute(DiagnosticKind::InvalidGeometry, tag, attribute, message));
    }

    fn element(&mut self, node: Node<'_, '_>, kind: ElementKind, depth: usize) -> Element {
        let tag = kind.tag();

        let mut attributes = Attributes::new();
        for attr in node.attributes() {
            if attr.namespace().is_some() {
                self.report(Diagnostic::for_attribute(
                    DiagnosticKind::UnsupportedAttribute,
                    tag,
                    attr.name(),
                    "namespaced attribute ignored",
                ));
                continue;
            }
            if !kind.accepts_attribute(attr.name()) {
                self.report(Diagnostic::for_attribute(
                    DiagnosticKind::UnsupportedAttribute,
                    tag,
                    attr.name(),
                    "ignored",
                ));
            }
            attributes.insert(attr.name().to_string(), attr.value().to_string());
        }

        let (style, hidden) = self.style(tag, &attributes);
        let mut transform = self.transform(tag, &attributes);
        if kind == ElementKind::Svg && depth > 1 {
            let x = self.length(tag, &attributes, "x", 0.0);
            let y = self.length(tag, &attributes, "y", 0.0);
            transform = transform.multiply(&Transform::translate(x, y));
        }
        let content = self.content(node, kind, &attributes, depth);

        Element {
            kind,
            attributes,
            transform,
            style,
            hidden,
            content,
        }
    }

    /// Presentation attributes first, then `style=""` on top of them.
    fn style(&mut self, tag: &str, attributes: &Attributes) -> (StyleDecl, bool) {
        let mut decl = StyleDecl::default();
        let mut hidden = attributes.get("display").is_some_and(|v| v.trim() == "none");

        for name in STYLE_PROPERTIES {
            let Some(value) = attributes.get(*name) else { continue };
            if let PropertyResult::Invalid(msg) = decl.apply(name, value) {
                self.invalid(tag, name, msg);
            }
        }

        if let Some(inline) = attributes.get("style") {
            for (name, value) in parse_inline_style(inline) {
                if name == "display" {
                    hidden = value == "none";
                    continue;
                }
                match decl.apply(name, value) {
                    PropertyResult::Applied => {}
                    PropertyResult::Unknown => self.report(Diagnostic::for_attribute(
                        DiagnosticKind::UnsupportedAttribute,
                        tag,
                        "style",
                        format!("property '{name}' ignored"),
                    )),
                    PropertyResult::Invalid(msg) => self.invalid(tag, "style", msg),
                }
            }
        }

        (decl, hidden)
    }

    fn transform(&mut self, tag: &str, attributes: &Attributes) -> Transform {
        let Some(value) = attributes.get("transform") else {
            return Transform::identity();
        };
        match parse_transform(value) {
            Ok(t) => t,
            Err(err) => {
                self.invalid(tag, "transform", format!("{err}; using identity"));
                Transform::identity()
            }
        }
    }

    fn content(&mut self, node: Node<'_, '_>, kind: ElementKind, attributes: &Attributes, depth: usize) -> Content {
        let tag = kind.tag();
        if !kind.is_container() {
            for child in node.children().filter(|n| n.is_element()) {
                self.report(Diagnostic::new(
                    DiagnosticKind::UnsupportedElement,
                    child.tag_name().name(),
                    format!("<{tag}> cannot have children; skipped"),
                ));
            }
        }

        let shape = match kind {
            ElementKind::Svg | ElementKind::Group => return Content::Children(self.children(node, depth)),
            ElementKind::Rect => {
                let (rx, ry) = self.radii(tag, attributes);
                Shape::Rect {
                    x: self.length(tag, attributes, "x", 0.0),
                    y: self.length(tag, attributes, "y", 0.0),
                    width: self.size(tag, attributes, "width").unwrap_or(0.0),
                    height: self.size(tag, attributes, "height").unwrap_or(0.0),
                    rx,
                    ry,
                }
            }
            ElementKind::Circle => Shape::Circle {
                cx: self.length(tag, attributes, "cx", 0.0),
                cy: self.length(tag, attributes, "cy", 0.0),
                r: self.size(tag, attributes, "r").unwrap_or(0.0),
            },
            ElementKind::Ellipse => {
                let (rx, ry) = self.radii(tag, attributes);
                Shape::Ellipse {
                    cx: self.length(tag, attributes, "cx", 0.0),
                    cy: self.length(tag, attributes, "cy", 0.0),
                    rx,
                    ry,
                }
            }
            ElementKind::Line => Shape::Line {
                x1: self.length(tag, attributes, "x1", 0.0),
                y1: self.length(tag, attributes, "y1", 0.0),
                x2: self.length(tag, attributes, "x2", 0.0),
                y2: self.length(tag, attributes, "y2", 0.0),
            },
            ElementKind::Polyline => Shape::Polyline(self.points(tag, attributes)),
            ElementKind::Polygon => Shape::Polygon(self.points(tag, attributes)),
            ElementKind::Path => Shape::Path(self.path(tag, attributes)),
        };
        Content::Shape(shape)
    }

    fn children(&mut self, node: Node<'_, '_>, depth: usize) -> Vec<Element> {
        let mut children = Vec::new();
        for child in node.children().filter(|n| n.is_element()) {
            let name = child.tag_name().name();
            let Some(kind) = element_kind(child) else {
                self.report(Diagnostic::new(
                    DiagnosticKind::UnsupportedElement,
                    name,
                    "element and its children skipped",
                ));
                continue;
            };
            if depth + 1 > self.config.max_depth {
                self.report(Diagnostic::new(
                    DiagnosticKind::DepthLimitExceeded,
                    name,
                    format!("nested deeper than {} levels; skipped", self.config.max_depth),
                ));
                continue;
            }
            children.push(self.element(child, kind, depth + 1));
        }
        children
    }

    /// Value of a length attribute. `None` when absent or unparseable; the latter is reported.
    fn optional_length(&mut self, tag: &str, attributes: &Attributes, name: &str) -> Option<f32> {
        let value = attributes.get(name)?;
        match parse_length(value) {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                self.invalid(tag, name, format!("cannot parse length '{value}'"));
                None
            }
        }
    }

    fn length(&mut self, tag: &str, attributes: &Attributes, name: &str, default: f32) -> f32 {
        self.optional_length(tag, attributes, name).unwrap_or(default)
    }

    /// Like [`Self::optional_length`], with negative values rejected.
    fn size(&mut self, tag: &str, attributes: &Attributes, name: &str) -> Option<f32> {
        let n = self.optional_length(tag, attributes, name)?;
        if n < 0.0 {
            self.invalid(tag, name, format!("negative value {n}"));
            return None;
        }
        Some(n)
    }

    /// `rx`/`ry` pair; a missing radius takes the value of the other one.
    fn radii(&mut self, tag: &str, attributes: &Attributes) -> (f32, f32) {
        let rx = self.size(tag, attributes, "rx");
        let ry = self.size(tag, attributes, "ry");
        match (rx, ry) {
            (Some(rx), Some(ry)) => (rx, ry),
            (Some(r), None) | (None, Some(r)) => (r, r),
            (None, None) => (0.0, 0.0),
        }
    }

    fn points(&mut self, tag: &str, attributes: &Attributes) -> Vec<Point> {
        let Some(value) = attributes.get("points") else {
            return Vec::new();
        };
        match parse_points(value) {
            Ok(points) => points,
            Err(prefix) => {
                self.invalid(tag, "points", format!("bad point list; keeping the first {} points", prefix.len()));
                prefix
            }
        }
    }

    fn path(&mut self, tag: &str, attributes: &Attributes) -> PathData {
        let Some(d) = attributes.get("d") else {
            return PathData::new();
        };
        let parsed = parse_path_data(d);
        if let Some(err) = parsed.error {
            self.invalid(tag, "d", err);
        }
        parsed.path
    }

    /// Resolves the pixel size and `viewBox` of the root element.
    fn viewport(&mut self, root: &Element) -> Viewport {
        let tag = root.kind.tag();
        let attributes = &root.attributes;

        let view_box = match attributes.get("viewBox") {
            None => None,
            Some(value) => {
                let vb = parse_view_box(value);
                if vb.is_none() {
                    self.invalid(tag, "viewBox", format!("cannot parse '{value}'; ignored"));
                }
                vb
            }
        };

        if let Some(par) = attributes.get("preserveAspectRatio") {
            if !matches!(par.trim(), "xMidYMid" | "xMidYMid meet") {
                self.report(Diagnostic::for_attribute(
                    DiagnosticKind::UnsupportedAttribute,
                    tag,
                    "preserveAspectRatio",
                    "only xMidYMid meet is supported",
                ));
            }
        }

        let fallback = self.config.default_viewport;
        let width = self.dimension(attributes, "width", view_box.map(|vb| vb.width), fallback.width);
        let height = self.dimension(attributes, "height", view_box.map(|vb| vb.height), fallback.height);

        let viewport = Viewport::new(width, height);
        match view_box {
            Some(vb) => viewport.with_view_box(vb),
            None => viewport,
        }
    }

    /// Root `width` or `height`, falling back to the `viewBox` and then to the configured default.
    fn dimension(&mut self, attributes: &Attributes, name: &str, from_view_box: Option<f32>, fallback: u32) -> u32 {
        let given = match attributes.get(name) {
            None => None,
            Some(value) => match parse_length(value) {
                Some(n) if n > 0.0 && n.is_finite() => Some(n),
                _ => {
                    self.invalid("svg", name, format!("cannot use '{value}' as viewport size; falling back"));
                    None
                }
            },
        };

        match given.or(from_view_box) {
            Some(n) if n > MAX_DIMENSION as f32 => {
                self.invalid("svg", name, format!("{n} exceeds {MAX_DIMENSION}; clamped"));
                MAX_DIMENSION
            }
            Some(n) => (n.ceil() as u32).max(1),
            None => fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseErrorKind;
    use crate::style::{Color, Paint};

    fn parse(text: &str) -> (Element, Viewport, Vec<Diagnostic>) {
        build(text, &EngineConfig::default()).unwrap()
    }

    fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
        diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn rejects_structurally_broken_input() {
        for text in ["", "   ", "</svg>", "<svg><g></svg>", "<svg/><svg/>", "svg\0"] {
            let err = build(text, &EngineConfig::default()).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::MalformedMarkup, "input {text:?}");
        }
    }

    #[test]
    fn rejects_non_svg_root_with_position() {
        let err = build("\n  <html/>", &EngineConfig::default()).unwrap_err();
        assert!(err.message.contains("<html>"));
        assert_eq!(err.position, Some((2, 3)));
    }

    #[test]
    fn node_limit_is_malformed_markup() {
        let config = EngineConfig::builder().max_nodes(3).build().unwrap();
        let err = build("<svg><g/><g/><g/><g/></svg>", &config).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedMarkup);
    }

    #[test]
    fn accepts_svg_namespace_and_doctype() {
        let text = r#"<?xml version="1.0"?>
            <!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
            <svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><!-- hi --><rect width="1" height="1"/>text</svg>"#;
        let (root, _, diagnostics) = parse(text);
        assert_eq!(root.children().len(), 1);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn viewport_falls_back_to_view_box_then_default() {
        let (_, vp, _) = parse(r#"<svg viewBox="0 0 64 32"/>"#);
        assert_eq!((vp.width, vp.height), (64, 32));

        let (_, vp, diagnostics) = parse(r#"<svg width="100%" height="abc"/>"#);
        assert_eq!((vp.width, vp.height), (300, 150));
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::InvalidGeometry; 2]);

        let config = EngineConfig::builder().default_viewport(8, 4).build().unwrap();
        let (_, vp, _) = build("<svg/>", &config).unwrap();
        assert_eq!((vp.width, vp.height), (8, 4));
    }

    #[test]
    fn viewport_accepts_px_and_rounds_up() {
        let (_, vp, diagnostics) = parse(r#"<svg width="10.2px" height="7"/>"#);
        assert_eq!((vp.width, vp.height), (11, 7));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unknown_elements_skip_their_subtree() {
        let (root, _, diagnostics) = parse(r#"<svg><text><rect width="1" height="1"/></text><circle r="2"/></svg>"#);
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].kind, ElementKind::Circle);
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnsupportedElement]);
        assert_eq!(diagnostics[0].element, "text");
    }

    #[test]
    fn foreign_namespace_is_unsupported() {
        let (root, _, diagnostics) =
            parse(r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:x="urn:x"><x:rect/></svg>"#);
        assert!(root.children().is_empty());
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnsupportedElement]);
    }

    #[test]
    fn unknown_attributes_are_kept_raw_but_reported() {
        let (root, _, diagnostics) = parse(r#"<svg><rect width="1" height="1" filter="url(#f)"/></svg>"#);
        let rect = &root.children()[0];
        assert_eq!(rect.attribute("filter"), Some("url(#f)"));
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnsupportedAttribute]);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("filter"));
    }

    #[test]
    fn inline_style_wins_over_attributes() {
        let (root, _, _) = parse(r#"<svg><rect fill="red" style="fill: blue; stroke:green"/></svg>"#);
        let style = &root.children()[0].style;
        assert_eq!(style.fill, Some(Paint::Color(Color::rgb(0, 0, 255))));
        assert_eq!(style.stroke, Some(Paint::Color(Color::rgb(0, 128, 0))));
    }

    #[test]
    fn unknown_inline_property_is_reported() {
        let (_, _, diagnostics) = parse(r#"<svg><rect style="filter: blur(2px)"/></svg>"#);
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnsupportedAttribute]);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("style"));
    }

    #[test]
    fn display_none_hides() {
        let (root, _, _) = parse(r#"<svg><g display="none"/><rect style="display:none"/><circle/></svg>"#);
        let hidden: Vec<bool> = root.children().iter().map(|c| c.hidden).collect();
        assert_eq!(hidden, vec![true, true, false]);
    }

    #[test]
    fn bad_values_fall_back() {
        let (root, _, diagnostics) =
            parse(r#"<svg><rect width="1em" height="2" transform="spin(3)" fill="nope"/></svg>"#);
        let rect = &root.children()[0];
        assert!(rect.transform.is_identity());
        assert_eq!(rect.style.fill, None);
        assert!(matches!(rect.shape(), Some(Shape::Rect { width, .. }) if *width == 0.0));
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::InvalidGeometry; 3]);
    }

    #[test]
    fn single_radius_is_copied() {
        let (root, _, _) = parse(r#"<svg><rect width="10" height="10" ry="3"/><ellipse rx="4"/></svg>"#);
        assert!(matches!(root.children()[0].shape(), Some(Shape::Rect { rx, ry, .. }) if *rx == 3.0 && *ry == 3.0));
        assert!(matches!(root.children()[1].shape(), Some(Shape::Ellipse { rx, ry, .. }) if *rx == 4.0 && *ry == 4.0));
    }

    #[test]
    fn broken_geometry_keeps_the_good_prefix() {
        let (root, _, diagnostics) = parse(r#"<svg><polyline points="0,0 10,10 5"/><path d="M0 0 L10 10 L"/></svg>"#);
        assert!(matches!(root.children()[0].shape(), Some(Shape::Polyline(p)) if p.len() == 2));
        assert!(matches!(root.children()[1].shape(), Some(Shape::Path(p)) if p.segments().len() == 2));
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::InvalidGeometry; 2]);
    }

    #[test]
    fn shapes_cannot_have_children() {
        let (root, _, diagnostics) = parse(r#"<svg><rect><circle/></rect></svg>"#);
        assert!(root.children()[0].children().is_empty());
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnsupportedElement]);
    }

    #[test]
    fn depth_limit_skips_deep_elements() {
        let config = EngineConfig::builder().max_depth(2).build().unwrap();
        let (root, _, diagnostics) = build("<svg><g><g><rect/></g></g></svg>", &config).unwrap();
        assert_eq!(root.children().len(), 1);
        assert!(root.children()[0].children().is_empty());
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::DepthLimitExceeded]);
    }

    #[test]
    fn nested_svg_is_offset() {
        let (root, _, _) = parse(r#"<svg><svg x="5" y="6"/></svg>"#);
        assert_eq!(root.children()[0].transform, Transform::translate(5.0, 6.0));
        assert!(root.transform.is_identity());
    }
}
