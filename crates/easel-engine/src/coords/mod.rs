//! Coordinate and color types used by the draw scenarios.
//!
//! Pixel space:
//! - origin top-left
//! - +X right, +Y down
//!
//! The rectangle vertex shader converts pixels to clip space using the
//! resolution uniform.

mod color;
mod rect;
mod vec2;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec2::Vec2;
