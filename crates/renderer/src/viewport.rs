//! Canvas sizing: css size, device pixel ratio and aspect correction.

use crate::gpu::ParallaxUniforms;
use crate::page::{Page, WindowExtent};

/// Geometry produced by one sizer run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub css_width: f32,
    pub css_height: f32,
    pub device_pixel_ratio: f32,
    pub aspect_correction_x: f32,
    pub aspect_correction_y: f32,
    /// Window inner size captured together with the rest of the state.
    pub window: WindowExtent,
}

impl ViewportState {
    pub fn compute(
        container_width: f32,
        image_aspect: f32,
        device_pixel_ratio: f32,
        window: WindowExtent,
    ) -> Self {
        let css_width = container_width.max(1.0);
        let css_height = (css_width * image_aspect).max(1.0);
        let (aspect_correction_x, aspect_correction_y) =
            aspect_correction(css_width, css_height, image_aspect);
        Self {
            css_width,
            css_height,
            device_pixel_ratio,
            aspect_correction_x,
            aspect_correction_y,
            window,
        }
    }

    /// Lowers the pixel ratio so neither backing dimension exceeds `max`.
    ///
    /// Both axes shrink by the same factor, keeping the canvas aspect.
    pub fn limit_backing(mut self, max: u32) -> Self {
        let ceiling = max.max(1) as f32 / self.css_width.max(self.css_height);
        if self.device_pixel_ratio > ceiling {
            self.device_pixel_ratio = ceiling;
        }
        self
    }

    /// Canvas backing-store size in physical pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        let scale = |css: f32| (css * self.device_pixel_ratio).round().max(1.0) as u32;
        (scale(self.css_width), scale(self.css_height))
    }

    pub fn resolution(&self) -> [f32; 4] {
        [
            self.css_width,
            self.css_height,
            self.aspect_correction_x,
            self.aspect_correction_y,
        ]
    }
}

/// Scale factors that keep the image's aspect inside a `width × height` canvas.
pub fn aspect_correction(width: f32, height: f32, image_aspect: f32) -> (f32, f32) {
    if height / width < image_aspect {
        (1.0, (height / width) / image_aspect)
    } else {
        ((width / height) * image_aspect, 1.0)
    }
}

/// Recomputes the viewport and pushes the size dependent uniforms.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ViewportSizer {
    image_aspect: f32,
    threshold: [f32; 2],
    max_backing: u32,
}

impl ViewportSizer {
    /// `threshold` is `(horizontal, vertical)`; `max_backing` is the largest
    /// texture dimension the device accepts.
    pub fn new(image_aspect: f32, threshold: [f32; 2], max_backing: u32) -> Self {
        Self {
            image_aspect,
            threshold,
            max_backing,
        }
    }

    pub fn run(
        &self,
        page: &Page,
        window: WindowExtent,
        device_pixel_ratio: f32,
        uniforms: &mut ParallaxUniforms,
    ) -> ViewportState {
        let state = ViewportState::compute(
            page.container_width(window, self.image_aspect),
            self.image_aspect,
            device_pixel_ratio,
            window,
        )
        .limit_backing(self.max_backing);
        uniforms.resolution.set(&mut uniforms.block, state.resolution());
        uniforms
            .pixel_ratio
            .set(&mut uniforms.block, [1.0 / state.device_pixel_ratio]);
        uniforms.threshold.set(&mut uniforms.block, self.threshold);
        tracing::debug!(
            css_width = state.css_width,
            css_height = state.css_height,
            device_pixel_ratio = state.device_pixel_ratio,
            correction_x = state.aspect_correction_x,
            correction_y = state.aspect_correction_y,
            "viewport sized"
        );
        state
    }
}
