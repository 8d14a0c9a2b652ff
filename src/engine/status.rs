/// Current state of the [`RenderEngine`](crate::engine::RenderEngine). This is a state
/// machine that defines what the engine has done with its current source.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    /// No document is built for the current source. The next `render()` parses it.
    #[default]
    Idle,

    /// The source was parsed into a document, but nothing was rendered from it yet (or the
    /// last render pass failed on the device).
    DocumentBuilt,

    /// A buffer was rendered from the current document and is available through
    /// `current_buffer()`.
    Rendered,
}

