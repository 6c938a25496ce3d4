//! Window, event loop and configuration.
//!
//! [`run_with_config`] opens one window and drives a [`CubeRenderer`] from
//! winit events. A session (window, GPU pass, renderer) is built on resume
//! and torn down on suspend or close; the selected view outlives sessions and
//! is saved to a [`ViewerState`] file for the next run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::cube_pass::CubePass;
use crate::error::Result;
use crate::gesture::GestureInterpreter;
use crate::images::{DirectoryImages, ImageProvider, ProceduralImages};
use crate::input::{PointerAction, PointerInput};
use crate::renderer::{CubeRenderer, SurfaceRenderer};
use crate::shader::ShaderSources;
use crate::state::ViewerState;

/// Window and viewer settings, loadable from TOML.
///
/// ```toml
/// title = "Cube"
/// width = 1024
/// height = 768
/// initial_view = 3
/// image_dir = "assets/cubes"
/// tap_tolerance = 2.0
/// state_file = "cubeview-state.toml"
/// persist_view = true
/// ```
///
/// Every key is optional. Without `initial_view` the viewer reopens on the
/// image it showed when it last closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Initial window width in logical pixels.
    pub width: u32,
    /// Initial window height in logical pixels.
    pub height: u32,
    /// Catalog index shown on startup. Overrides the saved view.
    pub initial_view: Option<usize>,
    /// Directory holding `<name>.png` for each image. Without it the viewer
    /// paints placeholder images.
    pub image_dir: Option<PathBuf>,
    /// Tap radius in pixels; `0` means the up position must match exactly.
    pub tap_tolerance: f32,
    /// Where the last view is saved. Defaults to
    /// [`ViewerState::default_path`].
    pub state_file: Option<PathBuf>,
    /// Save the view on exit and restore it on the next start.
    pub persist_view: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Cube Viewer".to_string(),
            width: 800,
            height: 600,
            initial_view: None,
            image_dir: None,
            tap_tolerance: 0.0,
            state_file: None,
            persist_view: true,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse TOML config text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn initial_view(mut self, index: usize) -> Self {
        self.initial_view = Some(index);
        self
    }

    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    pub fn tap_tolerance(mut self, radius: f32) -> Self {
        self.tap_tolerance = radius;
        self
    }

    pub fn state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    pub fn persist_view(mut self, persist: bool) -> Self {
        self.persist_view = persist;
        self
    }

    /// The state file in use, or `None` when persistence is off or no
    /// location can be found.
    pub fn state_path(&self) -> Option<PathBuf> {
        if !self.persist_view {
            return None;
        }
        self.state_file.clone().or_else(ViewerState::default_path)
    }

    /// The catalog index to open on: the explicit `initial_view`, else the
    /// saved view, else 0. Unreadable or stale state is logged and skipped.
    pub fn starting_view(&self) -> usize {
        if let Some(index) = self.initial_view {
            return index;
        }
        let Some(path) = self.state_path() else {
            return 0;
        };

        match ViewerState::load(&path) {
            Ok(Some(state)) => state.valid_view().unwrap_or_else(|| {
                log::warn!("ignoring saved view {} from {}", state.last_view, path.display());
                0
            }),
            Ok(None) => 0,
            Err(err) => {
                log::warn!("could not read {}: {err}", path.display());
                0
            }
        }
    }

    /// Save `view` for the next run. Failures are logged, not returned:
    /// losing the saved view never stops the viewer.
    pub fn save_view(&self, view: usize) {
        let Some(path) = self.state_path() else {
            return;
        };
        match ViewerState::new(view).save(&path) {
            Ok(()) => log::info!("saved view {view} to {}", path.display()),
            Err(err) => log::warn!("could not save view to {}: {err}", path.display()),
        }
    }

    fn image_provider(&self) -> Box<dyn ImageProvider> {
        match &self.image_dir {
            Some(dir) => Box::new(DirectoryImages::new(dir)),
            None => Box::new(ProceduralImages::default()),
        }
    }
}

/// Open a window with the default configuration and run until it closes.
pub fn run() -> Result<()> {
    run_with_config(AppConfig::default())
}

/// Open a window with `config` and run until it closes.
///
/// Fatal errors while building the surface or drawing are logged, close the
/// window and are returned here.
pub fn run_with_config(config: AppConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let view = config.starting_view();
    log::info!("starting on view {view}");
    let mut app = CubeApp {
        view,
        config,
        session: None,
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Session {
    window: Arc<Window>,
    renderer: CubeRenderer<CubePass>,
    gestures: GestureInterpreter,
    input: PointerInput,
}

struct CubeApp {
    config: AppConfig,
    /// Last selected catalog index, carried across surfaces.
    view: usize,
    session: Option<Session>,
    failure: Option<crate::error::CubeError>,
}

impl CubeApp {
    fn start_session(&mut self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let window_attrs = WindowAttributes::default()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let pass = CubePass::new(window.clone())?;
        let mut renderer = CubeRenderer::new(pass, self.config.image_provider());
        renderer.on_surface_created(&ShaderSources::builtin(), self.view)?;

        let size = window.inner_size();
        renderer.on_surface_resized(size.width, size.height);

        let gestures = GestureInterpreter::new(window.scale_factor() as f32)
            .with_tap_tolerance(self.config.tap_tolerance);

        window.request_redraw();
        Ok(Session {
            window,
            renderer,
            gestures,
            input: PointerInput::new(),
        })
    }

    fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            self.view = session.renderer.current_index();
            session.renderer.teardown();
            self.config.save_view(self.view);
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: crate::error::CubeError) {
        log::error!("{err}");
        self.end_session();
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for CubeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match self.start_session(event_loop) {
            Ok(session) => self.session = Some(session),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.end_session();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(session) = &mut self.session else {
            return;
        };

        let outcome = match session.input.handle_event(&event) {
            Some(PointerAction::Touch(touch)) => match session.gestures.handle(touch) {
                Some(signal) => session.renderer.apply_gesture(signal).map(|_| ()),
                None => Ok(()),
            },
            Some(PointerAction::Cancel) => {
                session.gestures.cancel();
                Ok(())
            }
            Some(PointerAction::Advance) => session.renderer.advance_item().map(|_| ()),
            None => Ok(()),
        };
        if let Err(err) = outcome {
            self.fail(event_loop, err);
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.end_session();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                session.renderer.on_surface_resized(size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                session.gestures.set_density(scale_factor as f32);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = session.renderer.draw_frame() {
                    self.fail(event_loop, err);
                    return;
                }
                session.window.request_redraw();
            }
            _ => {}
        }
    }
}
