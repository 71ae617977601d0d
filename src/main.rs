use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

// Import from the library crate
use cubeyard::config::AppConfig;
use cubeyard::controller::input::{native, InputEvent, KeyMatch};
use cubeyard::controller::{FrameDriver, InputState};
use cubeyard::logging;
use cubeyard::view::{GpuContext, WgpuRenderer};

#[derive(Parser, Debug)]
#[command(name = "cubeyard", about = "Spinning cubes, a steerable player cube and a follow/orbit camera")]
struct Cli {
    /// Show the world axes and the stats overlay
    #[arg(long)]
    debug: bool,

    /// Match key bindings regardless of case
    #[arg(long)]
    case_insensitive_keys: bool,

    /// Initial window width
    #[arg(long, env = "CUBEYARD_WIDTH")]
    width: Option<u32>,

    /// Initial window height
    #[arg(long, env = "CUBEYARD_HEIGHT")]
    height: Option<u32>,
}

impl Cli {
    /// Layer the flags over the environment-derived configuration.
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        config.debug |= self.debug;
        if self.case_insensitive_keys {
            config.key_match = KeyMatch::CaseInsensitive;
        }
        if let Some(width) = self.width {
            config.width = width.max(1);
        }
        if let Some(height) = self.height {
            config.height = height.max(1);
        }
        config
    }
}

/// Everything that exists once the window and GPU are up.
struct Running {
    window: Arc<Window>,
    renderer: WgpuRenderer,
    driver: FrameDriver,
}

struct App {
    config: AppConfig,
    input: InputState,
    running: Option<Running>,
    started: Instant,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            input: InputState::new(config.key_match),
            config,
            running: None,
            started: Instant::now(),
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let attrs = Window::default_attributes()
            .with_title("cubeyard")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let gpu = pollster::block_on(GpuContext::for_window(window.clone())).context("initialize GPU")?;
        let mut renderer = WgpuRenderer::new(gpu);
        renderer.set_pixels_per_point(window.scale_factor() as f32);

        let size = window.inner_size();
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        let driver = FrameDriver::with_playground(&self.config, &mut renderer);

        info!(width = size.width, height = size.height, debug = self.config.debug, "window ready");
        Ok(Running { window, renderer, driver })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                error!("startup failed: {e:#}");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.input.process_event(&InputEvent::Resize { width: size.width, height: size.height });
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                running.renderer.set_pixels_per_point(scale_factor as f32);
            }
            WindowEvent::Focused(false) => self.input.process_event(&InputEvent::FocusLost),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return;
                }
                if let Some(input_event) = native::key_event_to_input(&event) {
                    self.input.process_event(&input_event);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.process_event(&native::mouse_button_to_input(button, state));
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.process_event(&InputEvent::PointerMove { x: position.x as f32, y: position.y as f32 });
            }
            WindowEvent::RedrawRequested => {
                let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
                running.driver.frame(&mut self.input, now_ms, &mut running.renderer);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.apply(AppConfig::from_env());
    logging::init(config.debug);

    info!("cubeyard starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
