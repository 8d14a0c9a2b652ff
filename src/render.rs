pub mod backend;
pub mod backends;
pub mod context;

mod render_list;
pub use render_list::*;

mod viewport;

pub use viewport::Viewport;
