//! Prism engine crate.
//!
//! Renders a single full-screen shader pass (a compute filter over an input
//! image, or a vertex+fragment "toy") onto a window surface, driven by a
//! per-frame clock and the viewport resolution.

pub mod device;
pub mod error;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;

pub use error::RendererError;
