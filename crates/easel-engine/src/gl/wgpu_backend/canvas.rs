use anyhow::{Context, Result};

/// Color format of the canvas drawing buffer.
pub(crate) const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Offscreen drawing buffer.
///
/// wgpu rejects zero-sized textures, so an empty canvas keeps a 1x1 texture
/// and reports itself as empty; draws against it are skipped.
pub(crate) struct Canvas {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Canvas {
    pub(crate) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel canvas"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CANVAS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Viewport rect for draws on this canvas. See [`flip_viewport`].
    pub(crate) fn viewport_rect(&self, viewport: [i32; 4]) -> Option<[f32; 4]> {
        flip_viewport(viewport, self.size())
    }

    /// Copies the drawing buffer back to the CPU.
    ///
    /// Returns tightly packed RGBA8 rows, top row first.
    pub(crate) fn read_pixels(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let unpadded = self.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("easel canvas readback"),
            size: u64::from(padded) * u64::from(self.height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("easel readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed to wait for canvas readback")?;
        rx.recv()
            .context("canvas readback callback was dropped")?
            .context("failed to map canvas readback buffer")?;

        let mut pixels = Vec::with_capacity((unpadded * self.height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks_exact(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        readback.unmap();

        Ok(pixels)
    }
}

/// Converts a GL viewport (bottom-left origin) into a wgpu viewport rect
/// (top-left origin), clipped to a target of `size`.
///
/// Returns `None` when nothing of the viewport lies on the target.
///
/// wgpu only accepts viewports inside the render target, so a partly
/// off-target viewport is shrunk rather than scissored: clip space maps onto
/// the clipped rect. GL keeps the full transform and discards what falls
/// outside. Full-canvas viewports are unaffected.
pub(crate) fn flip_viewport(viewport: [i32; 4], size: (u32, u32)) -> Option<[f32; 4]> {
    let [x, y, w, h] = viewport.map(i64::from);
    let (cw, ch) = (i64::from(size.0), i64::from(size.1));

    let top = ch - (y + h);
    let x0 = x.clamp(0, cw);
    let y0 = top.clamp(0, ch);
    let x1 = (x + w).clamp(0, cw);
    let y1 = (top + h).clamp(0, ch);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some([x0 as f32, y0 as f32, (x1 - x0) as f32, (y1 - y0) as f32])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_viewport_is_unchanged() {
        assert_eq!(flip_viewport([0, 0, 640, 480], (640, 480)), Some([0.0, 0.0, 640.0, 480.0]));
    }

    #[test]
    fn bottom_left_origin_is_flipped() {
        // Lower-left quarter in GL is the lower-left quarter counted from the top.
        assert_eq!(flip_viewport([0, 0, 320, 240], (640, 480)), Some([0.0, 240.0, 320.0, 240.0]));
    }

    #[test]
    fn viewport_is_clipped_to_target() {
        assert_eq!(flip_viewport([-10, 0, 100, 480], (50, 480)), Some([0.0, 0.0, 50.0, 480.0]));
    }

    #[test]
    fn clipped_viewport_maps_onto_the_visible_part() {
        // Half of a 100px viewport hangs off the right edge; clip space then
        // spans only the 50 visible pixels.
        let [x, _, w, _] = flip_viewport([50, 0, 100, 10], (100, 10)).unwrap();
        assert_eq!((x, w), (50.0, 50.0));
    }

    #[test]
    fn offscreen_or_empty_viewport_is_none() {
        assert_eq!(flip_viewport([700, 0, 10, 10], (640, 480)), None);
        assert_eq!(flip_viewport([0, 0, 0, 10], (640, 480)), None);
        assert_eq!(flip_viewport([0, 0, 10, 10], (0, 0)), None);
    }
}
