//! One-shot draw sequence.
//!
//! `FrameRenderer` acquires a context from a `CanvasSurface`, builds the
//! program, configures the drawing buffer and issues the draw calls of a
//! `Scenario`. Nothing here loops; a scenario is drawn once per call.

mod renderer;
mod scenario;
mod surface;

pub use renderer::{FrameAbort, FrameRenderer, FrameReport, FrameState};
pub use scenario::{
    random_color, random_int, random_rect, ParseScenarioError, RectanglesConfig, Scenario,
    ScenarioKind, TRIANGLE_POSITIONS,
};
pub use surface::{resize_canvas_to_display_size, CanvasSurface, GpuCanvas, DEFAULT_CANVAS_SIZE};
