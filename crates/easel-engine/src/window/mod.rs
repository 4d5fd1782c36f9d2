//! Window + event loop.
//!
//! Owns the `winit` EventLoop and a single Window, wires it to the GPU layer
//! and shows the canvas drawn when the window was created.

mod runtime;

pub use runtime::{CanvasApp, Runtime, RuntimeConfig};
