use std::fmt::Display;
use crate::config::EngineConfigError;

/// Category of a fatal parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unbalanced or unterminated tags, missing or multiple roots, a root that is
    /// not the viewport element, or input that is not text.
    MalformedMarkup,
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorKind::MalformedMarkup => write!(f, "malformed markup"),
        }
    }
}

/// Error returned when a markup source cannot be turned into a document at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Row and column (1-based) where the parser gave up, when known.
    pub position: Option<(u32, u32)>,
}

impl ParseError {
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self {
            kind: ParseErrorKind::MalformedMarkup,
            message: message.into(),
            position: None,
        }
    }

    pub fn at(mut self, row: u32, col: u32) -> Self {
        self.position = Some((row, col));
        self
    }
}

impl From<roxmltree::Error> for ParseError {
    fn from(e: roxmltree::Error) -> Self {
        let pos = e.pos();
        ParseError::malformed(e.to_string()).at(pos.row, pos.col)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Parse failed: {0}")]
    ParseFailed(#[from] ParseError),

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] EngineConfigError),
}
