//! Non-fatal warnings collected while building a document.
//!
//! Anything the parser cannot use (an unknown tag, an attribute it does not understand, a
//! number that does not parse) is recorded as a [`Diagnostic`] and skipped. Diagnostics are
//! kept on the [`Document`](crate::document::Document) and can additionally be forwarded to a
//! host supplied [`DiagnosticSink`].

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Element tag that is not part of the supported subset. The element and its subtree are skipped.
    UnsupportedElement,
    /// Attribute that the element kind does not understand. The attribute is ignored.
    UnsupportedAttribute,
    /// Numeric, length, color, transform or path value that does not parse. A default is used instead.
    InvalidGeometry,
    /// Element nested deeper than the configured limit. The element and its subtree are skipped.
    DepthLimitExceeded,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::UnsupportedElement => write!(f, "unsupported element"),
            DiagnosticKind::UnsupportedAttribute => write!(f, "unsupported attribute"),
            DiagnosticKind::InvalidGeometry => write!(f, "invalid geometry"),
            DiagnosticKind::DepthLimitExceeded => write!(f, "depth limit exceeded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Tag of the element the diagnostic was raised for.
    pub element: String,
    /// Offending attribute, if any.
    pub attribute: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(kind: DiagnosticKind, element: &str, message: S) -> Self {
        Self {
            kind,
            element: element.to_string(),
            attribute: None,
            message: message.into(),
        }
    }

    pub fn for_attribute<S: Into<String>>(kind: DiagnosticKind, element: &str, attribute: &str, message: S) -> Self {
        Self {
            kind,
            element: element.to_string(),
            attribute: Some(attribute.to_string()),
            message: message.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{} <{} {}>: {}", self.kind, self.element, attr, self.message),
            None => write!(f, "{} <{}>: {}", self.kind, self.element, self.message),
        }
    }
}

/// Receiver for diagnostics as they are produced.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Sink that forwards every diagnostic to the `log` facade at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        log::warn!("{diagnostic}");
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}
