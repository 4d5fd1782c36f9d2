use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use easel_engine::device::{GpuDevice, GpuInit};
use easel_engine::frame::{
    resize_canvas_to_display_size, FrameAbort, FrameRenderer, FrameReport, GpuCanvas, Scenario,
    DEFAULT_CANVAS_SIZE,
};
use easel_engine::gl::GraphicsContext;
use easel_engine::logging::{init_logging, LoggingConfig};
use easel_engine::shader::{BundledSources, ShaderDirectory, ShaderSourceLookup};
use easel_engine::window::{CanvasApp, Runtime, RuntimeConfig};

mod config;

use config::StudioConfig;

/// One scenario with its shader sources and random source.
struct Sketch {
    scenario: Scenario,
    sources: Box<dyn ShaderSourceLookup>,
    rng: StdRng,
    renderer: FrameRenderer,
}

impl Sketch {
    fn new(config: &StudioConfig) -> Self {
        let sources: Box<dyn ShaderSourceLookup> = match &config.shader_dir {
            Some(dir) => {
                log::info!("loading shaders from {}", dir.display());
                Box::new(ShaderDirectory::new(dir))
            }
            None => Box::new(BundledSources::for_scenario(config.scenario)),
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        Self {
            scenario: config.scenario(),
            sources,
            rng,
            renderer: FrameRenderer::new(),
        }
    }

    fn draw(&mut self, canvas: &mut GpuCanvas) -> Result<FrameReport, FrameAbort> {
        self.renderer.render(
            canvas,
            self.sources.as_ref(),
            &self.scenario,
            &mut self.rng,
            resize_canvas_to_display_size,
        )
    }
}

impl CanvasApp for Sketch {
    fn on_canvas_created(&mut self, canvas: &mut GpuCanvas) {
        if let Err(e) = self.draw(canvas) {
            log::error!("{} scenario aborted: {e}", self.scenario.kind());
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::from_env_and_args()?;
    log::info!("scenario: {}", config.scenario);

    let gpu_init = GpuInit {
        force_fallback_adapter: config.fallback_adapter,
        ..GpuInit::default()
    };

    match config.snapshot.clone() {
        Some(path) => snapshot(&config, gpu_init, &path),
        None => {
            let runtime = RuntimeConfig {
                title: format!("easel · {}", config.scenario),
                ..RuntimeConfig::default()
            };
            Runtime::run(runtime, gpu_init, Sketch::new(&config))
        }
    }
}

/// Renders once without a window and writes the canvas to `path` as PNG.
fn snapshot(config: &StudioConfig, gpu_init: GpuInit, path: &Path) -> Result<()> {
    let gpu = pollster::block_on(GpuDevice::headless(gpu_init))?;

    let (w, h) = DEFAULT_CANVAS_SIZE;
    let mut canvas = GpuCanvas::new(gpu.create_context(w, h), config.size);

    let mut sketch = Sketch::new(config);
    let report = sketch
        .draw(&mut canvas)
        .with_context(|| format!("{} scenario aborted", config.scenario))?;

    let gl = canvas.gl();
    let (width, height) = gl.drawing_buffer_size();
    let pixels = gl.read_pixels()?;
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .context("canvas readback does not match the drawing buffer size")?;
    image
        .save(path)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))?;

    log::info!(
        "wrote {}x{} snapshot with {} draw call(s) to {}",
        width,
        height,
        report.draw_calls,
        path.display()
    );
    Ok(())
}
