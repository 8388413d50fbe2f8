use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit};
use crate::render::{FrameStatus, Renderer, RendererConfig};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, builds the renderer for it and redraws continuously
    /// until the window is closed, Escape is pressed or a frame fails fatally.
    ///
    /// A renderer construction failure ends the loop and is returned here.
    pub fn run(initial: RuntimeConfig, gpu_init: GpuInit, renderer: RendererConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, gpu_init, renderer);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct Active {
    id: WindowId,
    entry: WindowEntry,
    renderer: Renderer,
}

struct AppState {
    initial: RuntimeConfig,
    gpu_init: GpuInit,
    renderer_config: RendererConfig,

    active: Option<Active>,
    paused: bool,
    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl AppState {
    fn new(initial: RuntimeConfig, gpu_init: GpuInit, renderer_config: RendererConfig) -> Self {
        Self {
            initial,
            gpu_init,
            renderer_config,
            active: None,
            paused: false,
            exit_requested: false,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_active(&self, event_loop: &ActiveEventLoop) -> Result<Active> {
        let attrs = Window::default_attributes()
            .with_title(self.initial.title.clone())
            .with_inner_size(self.initial.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let renderer = entry
            .with_gpu(|gpu| Renderer::new(gpu, &self.renderer_config))
            .context("failed to build renderer")?;

        Ok(Active {
            id,
            entry,
            renderer,
        })
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.paused = false;

        if self.active.is_some() {
            log::debug!("resumed");
            return;
        }

        match self.create_active(event_loop) {
            Ok(active) => {
                active.entry.with_window(|w| w.request_redraw());
                self.active = Some(active);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::debug!("suspended; frame delivery paused");
        self.paused = true;
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: one frame per display refresh.
        if !self.paused {
            if let Some(active) = &self.active {
                active.entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(active) = self.active.as_mut().filter(|a| a.id == window_id) else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested => {
                self.active = None;
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.active = None;
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                let Active { entry, renderer, .. } = active;
                entry.with_gpu_mut(|gpu| {
                    gpu.resize(*new_size);
                    renderer.on_resize(gpu.device(), new_size.width, new_size.height);
                });
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let Active { entry, renderer, .. } = active;
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| {
                    gpu.resize(new_size);
                    renderer.on_resize(gpu.device(), new_size.width, new_size.height);
                });
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                if self.paused {
                    return;
                }

                let Active { entry, renderer, .. } = active;
                entry.with_window(|w| w.pre_present_notify());
                let status = entry.with_gpu_mut(|gpu| renderer.render(gpu));

                if status == FrameStatus::Fatal {
                    self.fail(event_loop, anyhow::anyhow!("surface lost beyond recovery"));
                }
            }

            _ => {}
        }
    }
}
