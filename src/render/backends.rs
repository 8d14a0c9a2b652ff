pub mod null;
pub mod recording;

#[cfg(feature = "backend_software")]
pub mod software;

#[cfg(feature = "backend_cairo")]
pub mod cairo;
