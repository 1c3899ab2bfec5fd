pub mod config;
pub mod error;
#[cfg(feature = "gstreamer")]
pub mod gist;
pub mod pipeline;
