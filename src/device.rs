//! The GPU operations the cube renderer needs, behind one trait.
//!
//! [`CubePass`](crate::CubePass) implements this on wgpu. Everything above the
//! trait (rotation, selection, texture lifetime) stays GPU-agnostic.

use std::num::NonZeroU32;

use glam::Mat4;

use crate::error::Result;
use crate::geometry::GeometryBuffer;
use crate::images::ImageData;
use crate::shader::ShaderProgram;

/// Name of one device-side texture. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(NonZeroU32);

impl TextureHandle {
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

pub trait CubeDevice {
    /// Build the draw pipeline for `program` and upload the cube buffers,
    /// wiring positions and texels to the program's attribute locations.
    fn prepare(&mut self, program: &ShaderProgram, geometry: &GeometryBuffer) -> Result<()>;

    /// Hand out a new texture name, or `None` if the device cannot.
    fn create_texture(&mut self) -> Option<TextureHandle>;

    /// Replace the contents of `handle` with `image`, sampled nearest-neighbor,
    /// regenerate its mipmaps and leave it bound to texture unit 0.
    fn upload_texture(&mut self, handle: TextureHandle, image: &ImageData) -> Result<()>;

    fn delete_texture(&mut self, handle: TextureHandle);

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Draw `index_count` cube indices with `mvp` as the transform uniform.
    fn draw(&mut self, mvp: Mat4, index_count: u32) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod recording {
    use std::collections::HashSet;

    use super::*;
    use crate::error::CubeError;

    #[derive(Clone, Debug, PartialEq)]
    pub enum DeviceCall {
        Prepare {
            position_location: u32,
            tex_coord_location: u32,
            vertex_count: usize,
        },
        CreateTexture(TextureHandle),
        Upload {
            handle: TextureHandle,
            width: u32,
            height: u32,
        },
        Delete(TextureHandle),
        Viewport(u32, u32),
        Draw {
            mvp: Mat4,
            index_count: u32,
        },
    }

    /// In-memory device that records every call.
    #[derive(Debug, Default)]
    pub struct RecordingDevice {
        pub calls: Vec<DeviceCall>,
        pub fail_allocation: bool,
        live: HashSet<TextureHandle>,
        next: u32,
    }

    impl RecordingDevice {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn live_textures(&self) -> usize {
            self.live.len()
        }

        pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(c)).count()
        }

        pub fn last_draw(&self) -> Option<Mat4> {
            self.calls.iter().rev().find_map(|c| match c {
                DeviceCall::Draw { mvp, .. } => Some(*mvp),
                _ => None,
            })
        }
    }

    impl CubeDevice for RecordingDevice {
        fn prepare(&mut self, program: &ShaderProgram, geometry: &GeometryBuffer) -> Result<()> {
            self.calls.push(DeviceCall::Prepare {
                position_location: program.position_location(),
                tex_coord_location: program.tex_coord_location(),
                vertex_count: geometry.vertex_count(),
            });
            Ok(())
        }

        fn create_texture(&mut self) -> Option<TextureHandle> {
            if self.fail_allocation {
                return None;
            }
            self.next += 1;
            let handle = TextureHandle::new(self.next)?;
            self.live.insert(handle);
            self.calls.push(DeviceCall::CreateTexture(handle));
            Some(handle)
        }

        fn upload_texture(&mut self, handle: TextureHandle, image: &ImageData) -> Result<()> {
            if !self.live.contains(&handle) {
                return Err(CubeError::ResourceNotAllocated);
            }
            self.calls.push(DeviceCall::Upload {
                handle,
                width: image.width,
                height: image.height,
            });
            Ok(())
        }

        fn delete_texture(&mut self, handle: TextureHandle) {
            self.live.remove(&handle);
            self.calls.push(DeviceCall::Delete(handle));
        }

        fn set_viewport(&mut self, width: u32, height: u32) {
            self.calls.push(DeviceCall::Viewport(width, height));
        }

        fn draw(&mut self, mvp: Mat4, index_count: u32) -> Result<()> {
            self.calls.push(DeviceCall::Draw { mvp, index_count });
            Ok(())
        }
    }
}
