//! Easel engine crate.
//!
//! Draws the triangle and random-rectangles scenarios through a WebGL-style
//! graphics context. The draw sequence (`frame`) only sees the `gl` seam; the
//! wgpu backend, device setup, presentation and the window runtime live
//! beside it.

pub mod coords;
pub mod device;
pub mod frame;
pub mod gl;
pub mod logging;
pub mod present;
pub mod shader;
pub mod window;

#[cfg(test)]
mod testing;
