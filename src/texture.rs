//! The single GPU texture behind the cube faces.

use image::imageops::{self, FilterType};

use crate::catalog::ImageId;
use crate::device::{CubeDevice, TextureHandle};
use crate::error::{CubeError, Result};
use crate::images::ImageData;

/// Owner of the single texture the cube samples from.
///
/// The handle is allocated once, rebound for every image that follows, and
/// released once at teardown.
#[derive(Debug, Default)]
pub struct TextureUnit {
    handle: Option<TextureHandle>,
    current: Option<ImageId>,
}

impl TextureUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the texture if it does not exist yet. Idempotent.
    pub fn ensure_allocated<D: CubeDevice + ?Sized>(&mut self, device: &mut D) -> Result<TextureHandle> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }

        let handle = device
            .create_texture()
            .ok_or(CubeError::TextureAllocationFailed)?;
        log::debug!("allocated texture {}", handle.get());
        self.handle = Some(handle);
        Ok(handle)
    }

    /// Upload `data` into the allocated texture and remember which image it is.
    pub fn load<D: CubeDevice + ?Sized>(&mut self, device: &mut D, image: ImageId, data: &ImageData) -> Result<()> {
        let handle = self.handle.ok_or(CubeError::ResourceNotAllocated)?;
        data.validate(image)?;

        device.upload_texture(handle, data)?;
        log::debug!(
            "loaded '{}' ({}x{}) into texture {}",
            image,
            data.width,
            data.height,
            handle.get()
        );
        self.current = Some(image);
        Ok(())
    }

    /// Free the texture if one is allocated. Safe to call repeatedly.
    pub fn release<D: CubeDevice + ?Sized>(&mut self, device: &mut D) {
        if let Some(handle) = self.handle.take() {
            device.delete_texture(handle);
            log::debug!("released texture {}", handle.get());
        }
        self.current = None;
    }

    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    pub fn is_allocated(&self) -> bool {
        self.handle.is_some()
    }

    /// The image last loaded into the texture.
    pub fn current_image(&self) -> Option<ImageId> {
        self.current
    }
}

/// The full mip chain for `base`, from the base level down to 1×1.
///
/// Each level halves the previous one (rounding down, never below 1) with a
/// box-like triangle filter.
pub fn mip_chain(base: &ImageData) -> Vec<ImageData> {
    let mut levels = vec![base.clone()];
    let Some(mut current) = image::RgbaImage::from_raw(base.width, base.height, base.pixels.clone()) else {
        return levels;
    };

    while current.width() > 1 || current.height() > 1 {
        let width = (current.width() / 2).max(1);
        let height = (current.height() / 2).max(1);
        current = imageops::resize(&current, width, height, FilterType::Triangle);
        levels.push(ImageData::new(width, height, current.as_raw().clone()));
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::recording::{DeviceCall, RecordingDevice};

    fn solid(width: u32, height: u32) -> ImageData {
        ImageData::new(width, height, vec![200; (width * height * 4) as usize])
    }

    #[test]
    fn ensure_allocated_is_idempotent() {
        let mut device = RecordingDevice::new();
        let mut unit = TextureUnit::new();

        let first = unit.ensure_allocated(&mut device).unwrap();
        let second = unit.ensure_allocated(&mut device).unwrap();
        assert_eq!(first, second);
        assert_eq!(device.live_textures(), 1);
        assert_eq!(device.count(|c| matches!(c, DeviceCall::CreateTexture(_))), 1);
    }

    #[test]
    fn loads_reuse_the_same_handle() {
        let mut device = RecordingDevice::new();
        let mut unit = TextureUnit::new();
        let handle = unit.ensure_allocated(&mut device).unwrap();

        unit.load(&mut device, ImageId::Islands, &solid(8, 8)).unwrap();
        unit.load(&mut device, ImageId::Gallery, &solid(16, 16)).unwrap();

        let uploads: Vec<_> = device
            .calls
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Upload { handle, .. } => Some(*handle),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, vec![handle, handle]);
        assert_eq!(unit.current_image(), Some(ImageId::Gallery));
    }

    #[test]
    fn release_is_idempotent() {
        let mut device = RecordingDevice::new();
        let mut unit = TextureUnit::new();
        unit.ensure_allocated(&mut device).unwrap();

        unit.release(&mut device);
        assert!(!unit.is_allocated());
        assert_eq!(device.live_textures(), 0);

        unit.release(&mut device);
        assert_eq!(device.count(|c| matches!(c, DeviceCall::Delete(_))), 1);
    }

    #[test]
    fn load_after_release_is_an_error() {
        let mut device = RecordingDevice::new();
        let mut unit = TextureUnit::new();
        unit.ensure_allocated(&mut device).unwrap();
        unit.release(&mut device);

        let result = unit.load(&mut device, ImageId::River, &solid(4, 4));
        assert!(matches!(result, Err(CubeError::ResourceNotAllocated)));
    }

    #[test]
    fn empty_image_is_not_uploaded() {
        let mut device = RecordingDevice::new();
        let mut unit = TextureUnit::new();
        unit.ensure_allocated(&mut device).unwrap();

        let result = unit.load(&mut device, ImageId::River, &ImageData::new(0, 0, Vec::new()));
        assert!(matches!(result, Err(CubeError::ImageLoadFailed { .. })));
        assert_eq!(device.count(|c| matches!(c, DeviceCall::Upload { .. })), 0);
        assert_eq!(unit.current_image(), None);
    }

    #[test]
    fn failed_allocation_is_reported() {
        let mut device = RecordingDevice::new();
        device.fail_allocation = true;
        let mut unit = TextureUnit::new();
        assert!(matches!(
            unit.ensure_allocated(&mut device),
            Err(CubeError::TextureAllocationFailed)
        ));
        assert!(!unit.is_allocated());
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let levels = mip_chain(&solid(8, 2));
        let sizes: Vec<_> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        for level in &levels {
            assert_eq!(level.pixels.len(), level.expected_len());
        }
    }
}
