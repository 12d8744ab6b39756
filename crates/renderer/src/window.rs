use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use anyhow::{anyhow, Result};
use winit::dpi::{LogicalPosition, LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{Event, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::{Window, WindowBuilder};

use crate::compile::ProgramSource;
use crate::error::EngineError;
use crate::gpu::RenderContext;
use crate::lifecycle::EngineState;
use crate::loader::{image_aspect, spawn_loaders, LoadEvent};
use crate::page::{wheel_pixels, WindowExtent};
use crate::runtime::{FrameStats, SystemTimeSource};
use crate::session::Session;
use crate::types::EngineConfig;

/// Messages delivered to the event loop from other threads.
#[derive(Debug)]
pub(crate) enum EngineEvent {
    Image(LoadEvent),
}

/// One mounted parallax view.
///
/// `render` is declared before `window` so the surface is released first.
pub(crate) struct Engine {
    render: Option<RenderContext>,
    window: Arc<Window>,
    session: Session,
    clock: SystemTimeSource,
    stats: FrameStats,
    _loaders: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Builds the program, attaches input and starts loading both images.
    pub(crate) fn mount(
        window: Arc<Window>,
        config: EngineConfig,
        proxy: EventLoopProxy<EngineEvent>,
    ) -> Result<Self> {
        let clock = SystemTimeSource::new();
        let scale_factor = window.scale_factor();
        let extent = logical_extent(window.inner_size(), scale_factor);
        let mut session = Session::new(&config, extent, scale_factor);

        let source = ProgramSource::load(&config.shaders)?;
        let render = RenderContext::new(
            window.as_ref(),
            window.inner_size(),
            config.gpu_power,
            &source,
        )?;
        session.program_ready()?;

        let loaders = spawn_loaders(config.image_locators(), move |event| {
            if proxy.send_event(EngineEvent::Image(event)).is_err() {
                tracing::debug!("event loop closed before image finished loading");
            }
        })?;
        let now = Instant::now();
        session.loading_started(now)?;

        Ok(Self {
            render: Some(render),
            window,
            session,
            clock,
            stats: FrameStats::new(now),
            _loaders: loaders,
        })
    }

    pub(crate) fn state(&self) -> EngineState {
        self.session.state()
    }

    pub(crate) fn handle_user_event(&mut self, event: EngineEvent) -> Result<()> {
        let EngineEvent::Image(event) = event;
        let Some(images) = self.session.record_load(event)? else {
            return Ok(());
        };
        let Some(render) = self.render.as_mut() else {
            return Ok(());
        };
        render.install_textures(&images)?;
        let placement = self.session.activate(
            image_aspect(&images[0]),
            render.max_backing(),
            render.uniforms_mut(),
        )?;
        render.apply_viewport(&placement.viewport, placement.rect);
        self.window.request_redraw();
        Ok(())
    }

    pub(crate) fn handle_window_event(&mut self, event: WindowEvent) -> Result<()> {
        if !self.session.accepts_events() {
            return Ok(());
        }
        match event {
            WindowEvent::Resized(size) => {
                if let Some(render) = self.render.as_mut() {
                    render.resize_surface(size);
                }
                let extent = logical_extent(size, self.session.scale_factor());
                self.session.resized(extent, Instant::now());
                self.place_canvas();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.session.scale_changed(scale_factor, Instant::now());
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = self.logical(position);
                self.session.pointer_moved(position.x, position.y);
            }
            WindowEvent::Touch(Touch {
                phase: TouchPhase::Moved,
                location,
                ..
            }) => {
                let position = self.logical(location);
                self.session.touch_moved(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let pixels = wheel_pixels(delta, self.session.scale_factor());
                if self.session.scrolled(pixels) {
                    self.place_canvas();
                }
            }
            WindowEvent::RedrawRequested => self.tick()?,
            _ => {}
        }
        Ok(())
    }

    /// Runs timers; returns the next instant the loop must wake for.
    pub(crate) fn about_to_wait(&mut self, now: Instant) -> Result<Option<Instant>> {
        let Some(render) = self.render.as_mut() else {
            return Ok(None);
        };
        let timers = self.session.poll_timers(now, render.uniforms_mut())?;
        if let Some(placement) = timers.resized {
            render.apply_viewport(&placement.viewport, placement.rect);
        }
        if self.session.is_active() {
            self.window.request_redraw();
        }
        Ok(timers.wake_at)
    }

    fn tick(&mut self) -> Result<()> {
        let Some(render) = self.render.as_mut() else {
            return Ok(());
        };
        if self.session.frame(&self.clock, render.uniforms_mut()).is_none() {
            return Ok(());
        }

        match render.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!("surface lost or outdated; reconfiguring and skipping frame");
                render.reconfigure_surface();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout; skipping frame");
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(EngineError::Gpu("surface out of memory".into()).into());
            }
            Err(other) => {
                tracing::warn!(error = %other, "surface error; skipping frame");
            }
        }

        if let Some(fps) = self.stats.record(Instant::now()) {
            tracing::debug!(fps, "frame stats");
        }
        Ok(())
    }

    fn place_canvas(&mut self) {
        if let Some(render) = self.render.as_mut() {
            render.place_canvas(self.session.placement());
        }
    }

    fn logical(&self, position: PhysicalPosition<f64>) -> LogicalPosition<f32> {
        position.to_logical(self.session.scale_factor())
    }

    /// Tears everything down; safe to call more than once.
    pub(crate) fn dispose(&mut self) {
        if self.session.dispose() {
            self.render = None;
        }
    }
}

fn logical_extent(size: PhysicalSize<u32>, scale_factor: f64) -> WindowExtent {
    let logical = size.to_logical::<f32>(scale_factor);
    WindowExtent::new(logical.width, logical.height)
}

/// Opens the window and drives the engine until it closes or fails.
pub(crate) fn run_window(config: EngineConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::<EngineEvent>::with_user_event()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let (width, height) = config.window_size;
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut engine = Engine::mount(window, config, proxy)?;
    let mut failure: Option<anyhow::Error> = None;

    let run_result = event_loop.run(|event, elwt| {
        let outcome = match event {
            Event::UserEvent(event) => engine.handle_user_event(event),
            Event::WindowEvent {
                event: WindowEvent::CloseRequested | WindowEvent::Destroyed,
                ..
            } => {
                engine.dispose();
                elwt.exit();
                Ok(())
            }
            Event::WindowEvent { event, .. } => engine.handle_window_event(event),
            Event::AboutToWait => match engine.about_to_wait(Instant::now()) {
                Ok(Some(deadline)) => {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                    Ok(())
                }
                Ok(None) => {
                    elwt.set_control_flow(ControlFlow::Wait);
                    Ok(())
                }
                Err(err) => Err(err),
            },
            Event::LoopExiting => {
                engine.dispose();
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(err) = outcome {
            tracing::error!(state = ?engine.state(), "engine failed: {err:#}");
            engine.dispose();
            failure.get_or_insert(err);
            elwt.exit();
        }
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
