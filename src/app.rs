//! Window host
//!
//! [`App`] opens a winit window, creates a [`WgpuDevice`] for it and drives an
//! [`EngineContext`] from the event loop. Callers hook in through a setup closure,
//! run once the engine exists, and an update closure, run before every frame with
//! the elapsed time in seconds.
//!
//! Escape or closing the window requests a stop through the context's
//! [`RunFlag`](crate::context::RunFlag); the loop exits at the next frame boundary.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::EngineConfig;
use crate::context::EngineContext;
use crate::wgpu_utils::WgpuDevice;

pub type SetupCallback = Box<dyn FnOnce(&mut EngineContext<WgpuDevice>) -> anyhow::Result<()>>;
pub type UpdateCallback = Box<dyn FnMut(&mut EngineContext<WgpuDevice>, f32)>;

/// Installs `env_logger` with `umbra=info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("umbra=info"))
        .try_init();
}

pub struct App {
    config: EngineConfig,
    setup: Option<SetupCallback>,
    update: Option<UpdateCallback>,
}

impl App {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            setup: None,
            update: None,
        }
    }

    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut EngineContext<WgpuDevice>) -> anyhow::Result<()> + 'static,
    {
        self.setup = Some(Box::new(setup));
        self
    }

    pub fn with_update<F>(mut self, update: F) -> Self
    where
        F: FnMut(&mut EngineContext<WgpuDevice>, f32) + 'static,
    {
        self.update = Some(Box::new(update));
        self
    }

    /// Runs until the window closes. Startup failures and setup errors are
    /// returned once the loop has exited.
    pub fn run(self) -> anyhow::Result<()> {
        init_logging();

        let event_loop = EventLoop::new().context("failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState {
            config: self.config,
            setup: self.setup,
            update: self.update,
            window: None,
            context: None,
            last_frame: Instant::now(),
            error: None,
        };
        event_loop
            .run_app(&mut state)
            .context("event loop terminated abnormally")?;

        match state.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct AppState {
    config: EngineConfig,
    setup: Option<SetupCallback>,
    update: Option<UpdateCallback>,
    window: Option<Arc<Window>>,
    context: Option<EngineContext<WgpuDevice>>,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl AppState {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (width, height) = self.config.window_size;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.config.window_title.clone())
                    .with_inner_size(LogicalSize::new(width, height)),
            )
            .context("failed to create window")?;
        let window = Arc::new(window);

        let size = window.inner_size();
        let device = WgpuDevice::new(window.clone(), size.width, size.height)
            .context("failed to initialise the GPU")?;
        let mut context = EngineContext::new(device, self.config.clone())
            .context("failed to create the render pipeline")?;

        if let Some(setup) = self.setup.take() {
            setup(&mut context).context("setup callback failed")?;
        }

        info!("window '{}' open", self.config.window_title);
        self.window = Some(window);
        self.context = Some(context);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(context) = self.context.as_ref() {
            context.run_flag().request_stop();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            error!("{err:#}");
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => self.stop(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(context) = self.context.as_mut() {
                    context.device_mut().resize(width, height);
                    context.resize_viewport(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(context) = self.context.as_mut() else {
                    return;
                };

                let now = Instant::now();
                let delta = now.duration_since(self.last_frame).as_secs_f32();
                self.last_frame = now;

                if let Some(update) = self.update.as_mut() {
                    update(context, delta);
                }
                if context.frame().is_none() {
                    event_loop.exit();
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        match self.context.as_ref() {
            Some(context) if !context.is_running() => event_loop.exit(),
            _ => {
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(context) = self.context.take() {
            context.shutdown();
        }
    }
}
