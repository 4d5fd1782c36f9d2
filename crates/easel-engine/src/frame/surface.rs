use crate::gl::{GraphicsContext, WgpuContext};

/// Drawing buffer size of a freshly created canvas, before any resize.
pub const DEFAULT_CANVAS_SIZE: (u32, u32) = (300, 150);

/// Something that hands out a graphics context and knows its displayed size.
///
/// This is the "canvas" of the draw sequence. `context` returns `None` when
/// no context can be created for it.
pub trait CanvasSurface {
    type Context: GraphicsContext;

    fn context(&mut self) -> Option<&mut Self::Context>;

    /// Size the surface is displayed at, in physical pixels.
    fn display_size(&self) -> (u32, u32);
}

/// A `WgpuContext` shown at a fixed display size: a window's inner size, or
/// the requested size of a headless snapshot.
pub struct GpuCanvas {
    context: WgpuContext,
    display: (u32, u32),
}

impl GpuCanvas {
    pub fn new(context: WgpuContext, display: (u32, u32)) -> Self {
        Self { context, display }
    }

    pub fn gl(&self) -> &WgpuContext {
        &self.context
    }
}

impl CanvasSurface for GpuCanvas {
    type Context = WgpuContext;

    fn context(&mut self) -> Option<&mut WgpuContext> {
        Some(&mut self.context)
    }

    fn display_size(&self) -> (u32, u32) {
        self.display
    }
}

/// Resizes the drawing buffer to `display` if it differs.
///
/// Returns whether a resize happened.
pub fn resize_canvas_to_display_size<G>(gl: &mut G, display: (u32, u32)) -> bool
where
    G: GraphicsContext + ?Sized,
{
    if gl.drawing_buffer_size() == display {
        return false;
    }
    gl.set_drawing_buffer_size(display.0, display.1);
    true
}
