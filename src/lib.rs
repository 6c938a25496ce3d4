//! # Cubeview
//!
//! **A textured cube you spin with a finger.**
//!
//! The viewer draws a cube whose six faces come from one cross-layout image,
//! seen from a camera inside the cube. Dragging vertically sets the spin rate
//! around the vertical axis; tapping shows the next image in a fixed,
//! cyclic catalog. One catalog item is displayed magnified.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cubeview::*;
//!
//! fn main() -> Result<()> {
//!     run_with_config(AppConfig::new().title("Cubes").initial_view(3))
//! }
//! ```
//!
//! ## Layers
//!
//! - [`CubeRenderer`] is the GPU-agnostic core: rotation, selection, texture
//!   lifetime and the surface lifecycle ([`SurfaceRenderer`]).
//! - [`CubeDevice`] is the seam to the GPU. [`CubePass`] implements it on
//!   wgpu; anything else that records or replays draws can too.
//! - [`GestureInterpreter`] turns touch samples into [`GestureSignal`]s, and
//!   [`run`] wires a winit window to all of the above.

mod app;
mod camera;
mod catalog;
mod cube_pass;
mod device;
mod error;
mod geometry;
mod gesture;
mod gpu;
mod images;
mod input;
mod renderer;
mod rotation;
mod shader;
mod state;
mod texture;

pub use app::{AppConfig, run, run_with_config};
pub use camera::{Camera, FAR, NEAR, compute_mvp, frustum};
pub use catalog::{ImageId, ViewCatalog, ViewItem};
pub use cube_pass::CubePass;
pub use device::{CubeDevice, TextureHandle};
pub use error::{CubeError, Result};
pub use geometry::{GeometryBuffer, POSITION_COMPONENTS, TEXEL_COMPONENTS};
pub use gesture::{GestureInterpreter, GestureSignal, TouchEvent, TouchPhase};
pub use gpu::GpuContext;
pub use images::{
    DirectoryImages, ImageData, ImageProvider, MAX_PROCEDURAL_SIZE, ProceduralImages,
};
pub use input::{PointerAction, PointerInput};
pub use renderer::{CubeRenderer, RendererState, SurfaceRenderer};
pub use rotation::{RotationState, SCALE_DOWN, SCALE_UP, ScaleTransition};
pub use shader::{
    MVP_UNIFORM, POSITION_ATTRIBUTE, SAMPLER_UNIFORM, ShaderProgram, ShaderSources,
    TEX_COORD_ATTRIBUTE, TEXTURE_UNIFORM, UniformBinding,
};
pub use state::ViewerState;
pub use texture::{TextureUnit, mip_chain};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3};
