use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::device::{has_area, Gpu, GpuInit, SurfaceErrorAction};
use crate::frame::{GpuCanvas, DEFAULT_CANVAS_SIZE};
use crate::present::CanvasPresenter;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "easel".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
        }
    }
}

/// Application hook of the viewer.
///
/// `on_canvas_created` runs once per window, as soon as the window has a
/// non-zero size. The canvas starts at
/// [`DEFAULT_CANVAS_SIZE`] and reports the window's inner size as its display
/// size. Whatever it draws is shown until the window closes.
pub trait CanvasApp {
    fn on_canvas_created(&mut self, canvas: &mut GpuCanvas);
}

/// Entry point for the windowed viewer.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CanvasApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.failure.map_or(Ok(()), Err)
    }
}

#[self_referencing]
struct WindowEntry {
    // Keeps the drawn context alive for as long as the window shows it.
    canvas: Option<GpuCanvas>,
    presenter: Option<CanvasPresenter>,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl WindowEntry {
    /// Creates the canvas and lets `app` draw it, once the window has a
    /// non-zero size. Does nothing once the canvas exists.
    fn draw_canvas<A: CanvasApp>(&mut self, app: &mut A) {
        self.with_mut(|fields| {
            if fields.canvas.is_some() {
                return;
            }
            let size = fields.gpu.size();
            if !has_area(size) {
                log::debug!("window has zero size; canvas deferred");
                return;
            }

            let (w, h) = DEFAULT_CANVAS_SIZE;
            let mut canvas = GpuCanvas::new(fields.gpu.create_context(w, h), (size.width, size.height));

            app.on_canvas_created(&mut canvas);

            *fields.presenter = Some(CanvasPresenter::new(
                fields.gpu.device(),
                fields.gpu.surface_format(),
                canvas.gl().canvas_view(),
            ));
            *fields.canvas = Some(canvas);
        })
    }

    /// Blits the canvas onto the next swapchain texture.
    fn redraw(&mut self) -> Result<(), SurfaceErrorAction> {
        self.with_mut(|fields| {
            let mut frame = match fields.gpu.begin_frame() {
                Ok(f) => f,
                Err(e) => {
                    log::debug!("surface error: {e}");
                    return Err(fields.gpu.handle_surface_error(e));
                }
            };
            if let Some(presenter) = fields.presenter.as_ref() {
                presenter.draw(&mut frame.encoder, &frame.view);
            }
            fields.gpu.submit(frame);
            Ok(())
        })
    }
}

struct AppState<A>
where
    A: CanvasApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CanvasApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            failure: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let mut entry = WindowEntryTryBuilder {
            canvas: None,
            presenter: None,
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        entry.draw_canvas(&mut self.app);
        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(id)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        log::error!("{e:#}");
        self.failure = Some(e);
        self.entry = None;
        event_loop.exit();
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CanvasApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.entry = None;
                event_loop.exit();
            }

            // The canvas is a static snapshot; only the swapchain follows the window.
            // A window created at zero size gets its canvas on the first real size.
            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.draw_canvas(&mut self.app);
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => match entry.redraw() {
                Ok(()) => {}
                Err(SurfaceErrorAction::Fatal) => {
                    self.fail(event_loop, anyhow::anyhow!("surface is out of memory"));
                }
                Err(SurfaceErrorAction::Reconfigured) => {
                    entry.with_window(|w| w.request_redraw());
                }
                Err(SurfaceErrorAction::SkipFrame) => {}
            },

            _ => {}
        }
    }
}
