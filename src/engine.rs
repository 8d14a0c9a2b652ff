//! Render orchestration.
//!
//! A [`RenderEngine`] owns the markup source, the document built from it, the active
//! [`Device`] and the last finished buffer. It drives one render pass at a time:
//!
//! 1. `set_source()` records new markup and drops the current document. Nothing is parsed yet.
//! 2. `render()` parses the source when no document is built, clears the canvas, renders the
//!    root element and returns the finished buffer.
//! 3. `current_buffer()` returns that buffer again without rendering.
//!
//! ```
//! use gosub_svg::engine::{RenderEngine, RenderStatus};
//! use gosub_svg::render::backends::recording::RecordingDevice;
//!
//! let mut engine = RenderEngine::new(None, Box::new(RecordingDevice::new())).unwrap();
//! engine.set_source(r#"<svg width="10" height="10"><circle cx="5" cy="5" r="4" fill="red"/></svg>"#);
//! assert_eq!(engine.status(), RenderStatus::Idle);
//!
//! let buffer = engine.render().unwrap();
//! assert_eq!((buffer.width, buffer.height), (10, 10));
//! assert_eq!(engine.status(), RenderStatus::Rendered);
//! ```

mod status;

pub use status::RenderStatus;

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink};
use crate::document::Document;
use crate::errors::EngineError;
use crate::render::backend::{Device, PixelBuffer};
use crate::render::context::GraphicsContext;
use crate::style::StyleDecl;

pub struct RenderEngine {
    /// Configuration for parsing and rendering.
    config: EngineConfig,
    /// Active drawing device.
    device: Box<dyn Device>,
    /// Markup text the next document is built from.
    source: String,
    /// Document built from `source`, if any.
    document: Option<Document>,
    status: RenderStatus,
    /// Last finished buffer.
    buffer: Option<PixelBuffer>,
    /// Receives the diagnostics of every newly built document.
    sink: Box<dyn DiagnosticSink>,
}

impl RenderEngine {
    /// Create a new engine drawing onto `device`.
    ///
    /// If `config` is `None`, [`EngineConfig::default`] is used. A config that does not
    /// validate is rejected with [`EngineError::Config`]. The device is switched to the
    /// configured anti-aliasing mode.
    pub fn new(config: Option<EngineConfig>, mut device: Box<dyn Device>) -> Result<Self, EngineError> {
        let config = config.unwrap_or_default();
        config.validate()?;
        device.set_anti_alias(config.anti_alias);

        Ok(Self {
            config,
            device,
            source: String::new(),
            document: None,
            status: RenderStatus::Idle,
            buffer: None,
            sink: Box::new(LogSink),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> RenderStatus {
        self.status
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Document built from the current source, once `render()` has parsed it.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Diagnostics of the current document. Empty while no document is built.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.document.as_ref().map(Document::diagnostics).unwrap_or(&[])
    }

    /// Replaces the sink that receives diagnostics of newly built documents.
    ///
    /// The default sink logs every diagnostic at warn level.
    pub fn set_diagnostic_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    pub fn device(&self) -> &dyn Device {
        &*self.device
    }

    /// The active device as its concrete type, if it is a `T`.
    pub fn device_as<T: Device>(&self) -> Option<&T> {
        self.device.as_any().downcast_ref::<T>()
    }

    /// Swaps the active device and returns the previous one.
    ///
    /// The built document is kept; the next `render()` draws it onto the new device.
    pub fn set_device(&mut self, mut device: Box<dyn Device>) -> Box<dyn Device> {
        log::debug!("switching device from {} to {}", self.device.name(), device.name());
        device.set_anti_alias(self.config.anti_alias);
        if self.status == RenderStatus::Rendered {
            self.transition(RenderStatus::DocumentBuilt);
        }
        std::mem::replace(&mut self.device, device)
    }

    /// Records new markup text. The current document is discarded and the source is parsed
    /// on the next `render()`.
    pub fn set_source<S: Into<String>>(&mut self, source: S) {
        self.source = source.into();
        self.document = None;
        self.transition(RenderStatus::Idle);
    }

    /// Runs a render pass and returns the finished buffer.
    ///
    /// Parse failures are returned as [`EngineError::ParseFailed`] and leave the engine
    /// `Idle`; device failures are returned as [`EngineError::Backend`]. In both cases the
    /// previously finished buffer stays available through [`current_buffer`](Self::current_buffer).
    pub fn render(&mut self) -> Result<PixelBuffer, EngineError> {
        let document = match self.document.take() {
            Some(document) => document,
            None => self.build_document()?,
        };

        let result = Self::draw(&mut *self.device, &self.config, &document);
        self.document = Some(document);
        let buffer = result?;

        self.buffer = Some(buffer.clone());
        self.transition(RenderStatus::Rendered);
        Ok(buffer)
    }

    /// Last finished buffer, or `None` if nothing was rendered yet.
    pub fn current_buffer(&self) -> Option<&PixelBuffer> {
        self.buffer.as_ref()
    }

    /// Like [`current_buffer`](Self::current_buffer), with a zero sized buffer standing in for
    /// "nothing rendered yet".
    pub fn current_buffer_or_empty(&self) -> PixelBuffer {
        self.buffer.clone().unwrap_or_else(PixelBuffer::empty)
    }

    fn build_document(&mut self) -> Result<Document, EngineError> {
        let document = Document::parse_with_config(&self.source, &self.config).inspect_err(|e| {
            log::debug!("parse failed: {e}");
        })?;

        for diagnostic in document.diagnostics() {
            self.sink.report(diagnostic);
        }
        self.transition(RenderStatus::DocumentBuilt);
        Ok(document)
    }

    fn draw(device: &mut dyn Device, config: &EngineConfig, document: &Document) -> anyhow::Result<PixelBuffer> {
        let viewport = document.viewport();
        let mut ctx = GraphicsContext::new(device, viewport.as_size())?;
        ctx.set_clear_color(config.clear_color);
        ctx.clear()?;

        {
            let mut scope = ctx.scope(viewport.transform(), &StyleDecl::default());
            document.root_element().render(&mut scope)?;
        }
        debug_assert_eq!(ctx.depth(), (0, 0), "unbalanced graphics context after render");

        ctx.finalize()
    }

    fn transition(&mut self, next: RenderStatus) {
        if self.status != next {
            log::debug!("render status {:?} -> {:?}", self.status, next);
            self.status = next;
        }
    }
}
