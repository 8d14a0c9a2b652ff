pub mod engine;
pub mod document;
pub mod element;
pub mod render;
pub mod geometry;
pub mod style;
pub mod config;
pub mod diagnostics;
pub mod errors;

pub use engine::*;
pub use errors::{EngineError, ParseError, ParseErrorKind};
