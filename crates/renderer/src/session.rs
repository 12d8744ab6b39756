//! Engine state that does not need a window or a GPU: lifecycle, input,
//! motion, timers, image tracking and page geometry.

use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::error::EngineError;
use crate::gpu::ParallaxUniforms;
use crate::input::{InputEvent, InputNormalizer, InputSource};
use crate::lifecycle::{EngineState, Lifecycle};
use crate::loader::{LoadEvent, LoadProgress, LoadTracker};
use crate::motion::{Displacement, MotionState};
use crate::page::{composite_rect, BoundingRect, ClipRect, Page, WindowExtent};
use crate::runtime::{Debouncer, LoopToken, TimeSource};
use crate::types::{EngineConfig, TEXTURE_UNIT_COUNT};
use crate::viewport::{ViewportSizer, ViewportState};

/// Pushes `time` and the smoothed `mouse` for one frame.
pub(crate) fn advance_frame<T: TimeSource>(
    clock: &T,
    motion: &mut MotionState,
    uniforms: &mut ParallaxUniforms,
) -> Displacement {
    uniforms.time.set(&mut uniforms.block, [clock.seconds()]);
    let current = motion.step();
    uniforms.mouse.set(&mut uniforms.block, current.as_array());
    current
}

/// Result of a sizer run, to be applied to the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placement {
    pub viewport: ViewportState,
    pub rect: ClipRect,
}

/// What polling the timers produced.
#[derive(Debug, Default)]
pub(crate) struct Timers {
    /// Set when the debounced resize reran the sizer.
    pub resized: Option<Placement>,
    /// Earliest instant a timer is due.
    pub wake_at: Option<Instant>,
}

#[derive(Debug)]
pub(crate) struct Session {
    lifecycle: Lifecycle,
    page: Page,
    input: InputSource,
    reverse_motion: bool,
    normalizer: Option<InputNormalizer>,
    motion: MotionState,
    token: LoopToken,
    resize: Debouncer,
    tracker: LoadTracker,
    load_timeout: Duration,
    load_deadline: Option<Instant>,
    threshold: [f32; 2],
    sizer: Option<ViewportSizer>,
    viewport: Option<ViewportState>,
    /// Window extent captured at the last sizer run; all input is measured against it.
    sized_extent: WindowExtent,
    live_extent: WindowExtent,
    scale_factor: f64,
}

impl Session {
    pub fn new(config: &EngineConfig, extent: WindowExtent, scale_factor: f64) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            page: Page::new(config.container, config.respond_to, extent),
            input: InputSource::select(config.respond_to, config.pointer_device),
            reverse_motion: config.reverse_motion,
            normalizer: None,
            motion: MotionState::default(),
            token: LoopToken::new(),
            resize: Debouncer::new(config.resize_debounce),
            tracker: LoadTracker::new(&config.image_locators()),
            load_timeout: config.load_timeout,
            load_deadline: None,
            threshold: [config.horizontal_threshold, config.vertical_threshold],
            sizer: None,
            viewport: None,
            sized_extent: extent,
            live_extent: extent,
            scale_factor,
        }
    }

    pub fn state(&self) -> EngineState {
        self.lifecycle.state()
    }

    pub fn accepts_events(&self) -> bool {
        self.lifecycle.accepts_events()
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Marks the program built and attaches the input listener.
    pub fn program_ready(&mut self) -> Result<(), EngineError> {
        self.lifecycle.advance(EngineState::ProgramReady)?;
        tracing::info!(
            source = ?self.input,
            reverse = self.reverse_motion,
            "input listener attached"
        );
        self.normalizer = Some(InputNormalizer::new(self.input, self.reverse_motion));
        Ok(())
    }

    /// Starts the load timeout.
    pub fn loading_started(&mut self, now: Instant) -> Result<(), EngineError> {
        self.lifecycle.advance(EngineState::TexturesLoading)?;
        self.load_deadline = Some(now + self.load_timeout);
        Ok(())
    }

    /// Returns both images once the last one arrives.
    pub fn record_load(
        &mut self,
        event: LoadEvent,
    ) -> Result<Option<[RgbaImage; TEXTURE_UNIT_COUNT]>, EngineError> {
        if self.lifecycle.is_disposed() {
            return Ok(None);
        }
        match self.tracker.record(event) {
            LoadProgress::Pending | LoadProgress::Ignored => Ok(None),
            LoadProgress::Failed(err) => Err(err),
            LoadProgress::Complete(images) => {
                self.load_deadline = None;
                Ok(Some(images))
            }
        }
    }

    /// Sizes the canvas for the first time and starts the frame chain.
    pub fn activate(
        &mut self,
        image_aspect: f32,
        max_backing: u32,
        uniforms: &mut ParallaxUniforms,
    ) -> Result<Placement, EngineError> {
        let sizer = ViewportSizer::new(image_aspect, self.threshold, max_backing);
        self.sizer = Some(sizer);
        let placement = self.size_with(sizer, uniforms);
        self.lifecycle.advance(EngineState::Active)?;
        Ok(placement)
    }

    pub fn resized(&mut self, extent: WindowExtent, now: Instant) {
        self.live_extent = extent;
        self.resize.trigger(now);
    }

    pub fn scale_changed(&mut self, scale_factor: f64, now: Instant) {
        self.scale_factor = scale_factor;
        self.resize.trigger(now);
    }

    /// Cursor position in logical window coordinates.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.apply_input(InputEvent::PointerMoved { x, y });
    }

    /// Touch position in logical window coordinates.
    pub fn touch_moved(&mut self, x: f32, y: f32) {
        let container = self.container_rect();
        self.apply_input(InputEvent::TouchMoved {
            x: x - container.left,
            y: y - container.top,
        });
    }

    /// Scrolls the page by `pixels`; returns true if the canvas moved.
    pub fn scrolled(&mut self, pixels: f32) -> bool {
        if self.normalizer.is_none() {
            return false;
        }
        let height = self.viewport.map_or(0.0, |viewport| viewport.css_height);
        if !self.page.scroll_by(pixels, height, self.sized_extent) {
            return false;
        }
        let container = self.container_rect();
        self.apply_input(InputEvent::Scrolled { container });
        true
    }

    /// Runs the debounced sizer and the load timeout.
    pub fn poll_timers(
        &mut self,
        now: Instant,
        uniforms: &mut ParallaxUniforms,
    ) -> Result<Timers, EngineError> {
        if self.lifecycle.is_disposed() {
            return Ok(Timers::default());
        }
        let due = self.resize.poll(now);
        let resized = match self.sizer {
            Some(sizer) if due => Some(self.size_with(sizer, uniforms)),
            _ => None,
        };
        if let Some(deadline) = self.load_deadline {
            if now >= deadline {
                self.load_deadline = None;
                if let Some(err) = self.tracker.expire(self.load_timeout) {
                    return Err(err);
                }
            }
        }
        Ok(Timers {
            resized,
            wake_at: [self.resize.deadline(), self.load_deadline]
                .into_iter()
                .flatten()
                .min(),
        })
    }

    /// Advances motion for one frame; `None` once the frame chain has stopped.
    pub fn frame<T: TimeSource>(
        &mut self,
        clock: &T,
        uniforms: &mut ParallaxUniforms,
    ) -> Option<Displacement> {
        if self.token.is_cancelled() || !self.lifecycle.is_active() {
            return None;
        }
        Some(advance_frame(clock, &mut self.motion, uniforms))
    }

    /// Where the canvas currently lands in the window.
    pub fn placement(&self) -> ClipRect {
        composite_rect(self.container_rect(), self.live_extent)
    }

    fn container_rect(&self) -> BoundingRect {
        let (width, height) = self
            .viewport
            .map_or((0.0, 0.0), |viewport| (viewport.css_width, viewport.css_height));
        self.page.bounding_rect(width, height)
    }

    fn size_with(&mut self, sizer: ViewportSizer, uniforms: &mut ParallaxUniforms) -> Placement {
        let extent = self.live_extent;
        let viewport = sizer.run(&self.page, extent, self.scale_factor as f32, uniforms);
        self.page.clamp_scroll(viewport.css_height, extent);
        self.sized_extent = extent;
        self.viewport = Some(viewport);
        Placement {
            viewport,
            rect: self.placement(),
        }
    }

    fn apply_input(&mut self, event: InputEvent) {
        let Some(normalizer) = self.normalizer else {
            return;
        };
        if normalizer.handle(event, self.sized_extent, self.motion.target_mut()) {
            tracing::trace!(target = ?self.motion.target(), "displacement target updated");
        }
    }

    /// Stops the frame chain, detaches input and drops pending timers.
    ///
    /// Returns false when already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.lifecycle.is_disposed() {
            return false;
        }
        self.token.cancel();
        self.normalizer = None;
        self.resize.clear();
        self.load_deadline = None;
        if let Err(err) = self.lifecycle.advance(EngineState::Disposed) {
            tracing::error!(error = %err, "failed to dispose engine");
        }
        true
    }
}
