//! The cube renderer and its surface lifecycle.
//!
//! ```text
//! Uninitialized --on_surface_created--> SurfaceReady --teardown--> TornDown
//!                                        |        ^
//!                                        +--draw--+   (integrate, then draw)
//! ```
//!
//! A new surface may be created again while `SurfaceReady` (the host lost and
//! rebuilt its drawable); nothing runs after `TornDown`.

use glam::Mat4;

use crate::camera::{Camera, compute_mvp};
use crate::catalog::{ViewCatalog, ViewItem};
use crate::device::CubeDevice;
use crate::error::{CubeError, Result};
use crate::geometry::GeometryBuffer;
use crate::gesture::GestureSignal;
use crate::images::{ImageData, ImageProvider};
use crate::rotation::{RotationState, ScaleTransition};
use crate::shader::{ShaderProgram, ShaderSources};
use crate::texture::TextureUnit;

/// The frame lifecycle a host drives.
pub trait SurfaceRenderer {
    /// Build everything that depends on the drawable. Errors are fatal for
    /// this surface.
    fn on_surface_created(&mut self, sources: &ShaderSources, initial_view: usize) -> Result<()>;

    /// The drawable changed size. Must run before the next frame.
    fn on_surface_resized(&mut self, width: u32, height: u32);

    /// Integrate the rotation if its rate changed, then draw once.
    fn draw_frame(&mut self) -> Result<()>;
}

/// Where a [`CubeRenderer`] is in its surface lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    SurfaceReady,
    TornDown,
}

impl RendererState {
    fn name(self) -> &'static str {
        match self {
            RendererState::Uninitialized => "uninitialized",
            RendererState::SurfaceReady => "ready",
            RendererState::TornDown => "torn down",
        }
    }
}

/// Draws the textured cube through a [`CubeDevice`] and owns the selection,
/// rotation and texture state behind it.
pub struct CubeRenderer<D: CubeDevice> {
    device: D,
    images: Box<dyn ImageProvider>,
    catalog: ViewCatalog,
    geometry: GeometryBuffer,
    program: Option<ShaderProgram>,
    texture: TextureUnit,
    rotation: RotationState,
    camera: Camera,
    view: Mat4,
    projection: Mat4,
    current: usize,
    state: RendererState,
}

impl<D: CubeDevice> CubeRenderer<D> {
    /// A renderer with no surface yet. `images` supplies the pixels for
    /// every catalog item.
    pub fn new(device: D, images: Box<dyn ImageProvider>) -> Self {
        Self {
            device,
            images,
            catalog: ViewCatalog::new(),
            geometry: GeometryBuffer::cube(),
            program: None,
            texture: TextureUnit::new(),
            rotation: RotationState::new(),
            camera: Camera::new(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            current: 0,
            state: RendererState::Uninitialized,
        }
    }

    /// Show catalog item `index`, applying a scale transition if its scale
    /// flag differs from the current one.
    ///
    /// The image is fetched and uploaded before any state changes, so a
    /// failed load leaves the previous item on screen with its index and
    /// scale intact.
    ///
    /// Returns the new current index for the host to persist.
    pub fn select_item(&mut self, index: usize) -> Result<usize> {
        self.require_ready("select an item")?;
        let item = self.catalog.item_at(index)?;
        let data = self.fetch_image(item)?;
        self.texture.load(&mut self.device, item.image, &data)?;

        self.current = item.index;
        match self.rotation.apply_scale_flag(item.requires_scale) {
            ScaleTransition::Up => log::debug!("scaling cube up for '{}'", item.image),
            ScaleTransition::Down => log::debug!("scaling cube down for '{}'", item.image),
            ScaleTransition::Unchanged => {}
        }
        Ok(self.current)
    }

    /// Show the next catalog item, wrapping around.
    pub fn advance_item(&mut self) -> Result<usize> {
        let next = self.catalog.advance(self.current);
        self.select_item(next)
    }

    /// Route a gesture: drags set the rotation rate, taps advance.
    ///
    /// Returns the new index when the selection changed.
    pub fn apply_gesture(&mut self, signal: GestureSignal) -> Result<Option<usize>> {
        match signal {
            GestureSignal::Rotate { delta_y, .. } => {
                self.rotation.set_target_delta(delta_y);
                Ok(None)
            }
            GestureSignal::Advance => self.advance_item().map(Some),
        }
    }

    /// Release GPU resources. Safe to call more than once.
    pub fn teardown(&mut self) {
        self.texture.release(&mut self.device);
        self.program = None;
        if self.state != RendererState::TornDown {
            log::debug!("renderer torn down on view {}", self.current);
        }
        self.state = RendererState::TornDown;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Index of the item on screen.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The catalog entry for [`current_index`](Self::current_index).
    pub fn current_item(&self) -> Result<ViewItem> {
        self.catalog.item_at(self.current)
    }

    /// Rotation and scale state behind the model matrix.
    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    /// The texture the cube samples from.
    pub fn texture(&self) -> &TextureUnit {
        &self.texture
    }

    /// The linked program, while a surface exists.
    pub fn program(&self) -> Option<&ShaderProgram> {
        self.program.as_ref()
    }

    /// View matrix computed at surface creation.
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Projection for the last non-empty surface size; identity before the
    /// first resize.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// The device draws go to.
    pub fn device(&self) -> &D {
        &self.device
    }

    fn fetch_image(&mut self, item: ViewItem) -> Result<ImageData> {
        let data = self.images.load(item.image)?;
        data.validate(item.image)?;
        Ok(data)
    }

    fn require_ready(&self, operation: &'static str) -> Result<()> {
        if self.state == RendererState::SurfaceReady {
            Ok(())
        } else {
            Err(CubeError::InvalidState {
                state: self.state.name(),
                operation,
            })
        }
    }
}

impl<D: CubeDevice> SurfaceRenderer for CubeRenderer<D> {
    fn on_surface_created(&mut self, sources: &ShaderSources, initial_view: usize) -> Result<()> {
        if self.state == RendererState::TornDown {
            return Err(CubeError::InvalidState {
                state: self.state.name(),
                operation: "create a surface",
            });
        }

        // Everything fallible runs first; rotation and selection are only
        // touched once the new surface is fully built.
        let program = ShaderProgram::link(sources)?;
        let item = self.catalog.item_at(initial_view)?;
        let data = self.fetch_image(item)?;

        self.device.prepare(&program, &self.geometry)?;
        self.texture.ensure_allocated(&mut self.device)?;
        self.texture.load(&mut self.device, item.image, &data)?;
        self.program = Some(program);

        self.view = self.camera.view_matrix();
        self.rotation.initialize();
        self.current = item.index;
        self.rotation.restore_scale(item.requires_scale);

        self.state = RendererState::SurfaceReady;
        log::debug!("surface created on view {} ('{}')", item.index, item.image);
        Ok(())
    }

    fn on_surface_resized(&mut self, width: u32, height: u32) {
        self.device.set_viewport(width, height);
        match Camera::projection_for(width, height) {
            Some(projection) => {
                self.projection = projection;
                log::debug!("surface resized to {width}x{height}");
            }
            None => log::debug!("ignoring zero-sized surface {width}x{height}"),
        }
    }

    fn draw_frame(&mut self) -> Result<()> {
        self.require_ready("draw a frame")?;
        self.rotation.integrate_if_changed();
        let mvp = compute_mvp(self.projection, self.view, self.rotation.model());
        self.device.draw(mvp, self.geometry.index_count())
    }
}
