//! Parsed markup documents.
//!
//! [`Document::parse`] turns markup text into an immutable [`Element`] tree rooted at the
//! viewport element. Only structural problems abort the parse (see
//! [`ParseErrorKind::MalformedMarkup`](crate::errors::ParseErrorKind)); everything else that
//! cannot be used is skipped and reported in [`Document::diagnostics`].
//!
//! ```
//! use gosub_svg::document::Document;
//!
//! let doc = Document::parse(r#"<svg width="40" height="20"><rect width="10" height="10"/></svg>"#).unwrap();
//! assert_eq!(doc.viewport_size(), (40, 20));
//! assert_eq!(doc.root_element().children().len(), 1);
//! assert!(doc.diagnostics().is_empty());
//! ```

pub mod attributes;
pub mod path_data;
mod builder;

use crate::config::EngineConfig;
use crate::diagnostics::Diagnostic;
use crate::element::Element;
use crate::errors::ParseError;
use crate::render::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
    viewport: Viewport,
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Parses `text` with the default configuration.
    pub fn parse(text: &str) -> Result<Document, ParseError> {
        Self::parse_with_config(text, &EngineConfig::default())
    }

    /// Parses `text`, honouring the size fallback and limits in `config`.
    pub fn parse_with_config(text: &str, config: &EngineConfig) -> Result<Document, ParseError> {
        let (root, viewport, diagnostics) = builder::build(text, config)?;
        log::debug!(
            "parsed document: {} elements, {:?}, {} diagnostics",
            root.count(),
            viewport,
            diagnostics.len()
        );

        Ok(Document {
            root,
            viewport,
            diagnostics,
        })
    }

    /// The root viewport element.
    pub fn root_element(&self) -> &Element {
        &self.root
    }

    /// Viewport size in pixels as `(width, height)`.
    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport.width, self.viewport.height)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Non-fatal problems found while parsing, in document order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
