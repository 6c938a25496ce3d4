use thiserror::Error;

/// Everything that can go wrong between the host and the cube renderer.
///
/// Setup failures (shader, GPU, texture allocation) are fatal for the surface
/// that raised them. Contract violations signal a caller bug and are never
/// corrected silently.
#[derive(Debug, Error)]
pub enum CubeError {
    /// A shader module failed to parse.
    #[error("{stage} shader failed to compile: {message}")]
    ShaderCompile {
        stage: &'static str,
        message: String,
    },

    /// The two shader modules failed validation or do not fit together.
    #[error("shader program failed to link: {0}")]
    Link(String),

    /// A required attribute or uniform is not declared by the program.
    #[error("shader program has no location for `{0}`")]
    MissingLocation(&'static str),

    /// A catalog index outside the fixed item range.
    #[error("view index {index} is out of range (catalog has {len} items)")]
    InvalidIndex { index: usize, len: usize },

    /// `load` was called with no texture allocated.
    #[error("texture used before it was allocated")]
    ResourceNotAllocated,

    /// The device could not hand out a texture name.
    #[error("failed to allocate a texture")]
    TextureAllocationFailed,

    /// Pixel data was missing or did not match its dimensions.
    #[error("image '{image}' could not be loaded: {reason}")]
    ImageLoadFailed { image: String, reason: String },

    /// A renderer operation was called in the wrong lifecycle state.
    #[error("renderer is {state}, cannot {operation}")]
    InvalidState {
        state: &'static str,
        operation: &'static str,
    },

    /// GPU adapter, device or surface setup failed.
    #[error("GPU setup failed: {0}")]
    Gpu(String),

    /// The window or event loop could not be created or run.
    #[error("windowing error: {0}")]
    Window(String),

    /// A config or saved-state file is not valid TOML for its type.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Saved state could not be written as TOML.
    #[error("state serialization error: {0}")]
    StateWrite(#[from] toml::ser::Error),

    /// An image file exists but could not be decoded.
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<wgpu::CreateSurfaceError> for CubeError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        CubeError::Gpu(format!("surface creation failed: {e}"))
    }
}

impl From<wgpu::RequestAdapterError> for CubeError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        CubeError::Gpu(format!("no suitable adapter: {e}"))
    }
}

impl From<wgpu::RequestDeviceError> for CubeError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        CubeError::Gpu(format!("device request failed: {e}"))
    }
}

impl From<winit::error::EventLoopError> for CubeError {
    fn from(e: winit::error::EventLoopError) -> Self {
        CubeError::Window(e.to_string())
    }
}

impl From<winit::error::OsError> for CubeError {
    fn from(e: winit::error::OsError) -> Self {
        CubeError::Window(format!("window creation failed: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, CubeError>;
