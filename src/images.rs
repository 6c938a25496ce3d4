//! Pixel sources for the cube texture.
//!
//! The renderer never reads storage itself; it asks an [`ImageProvider`] for
//! the decoded RGBA pixels of an [`ImageId`]. Two providers ship with the
//! crate: [`DirectoryImages`] decodes `<dir>/<name>.png` files, and
//! [`ProceduralImages`] paints placeholder cross layouts so the viewer runs
//! without any assets.

use std::path::{Path, PathBuf};

use crate::catalog::ImageId;
use crate::error::{CubeError, Result};

/// Decoded, tightly packed RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes, top row first.
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgba(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }

    /// Bytes a `width × height` RGBA8 image must hold.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Reject empty or truncated pixel data before it reaches the GPU.
    pub fn validate(&self, image: ImageId) -> Result<()> {
        let fail = |reason: String| CubeError::ImageLoadFailed {
            image: image.name().to_owned(),
            reason,
        };

        if self.width == 0 || self.height == 0 || self.pixels.is_empty() {
            return Err(fail(format!(
                "no pixel data ({}x{}, {} bytes)",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        if self.pixels.len() != self.expected_len() {
            return Err(fail(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                self.expected_len(),
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

/// Resolves an image identifier to decoded pixels.
pub trait ImageProvider {
    fn load(&mut self, image: ImageId) -> Result<ImageData>;
}

/// Loads `<dir>/<name>.png` for each image.
#[derive(Clone, Debug)]
pub struct DirectoryImages {
    dir: PathBuf,
}

impl DirectoryImages {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, image: ImageId) -> PathBuf {
        self.dir.join(format!("{}.png", image.name()))
    }
}

impl ImageProvider for DirectoryImages {
    fn load(&mut self, image: ImageId) -> Result<ImageData> {
        let path = self.path_for(image);
        log::debug!("decoding {}", path.display());
        let decoded = image::open(&path)?.to_rgba8();
        Ok(ImageData::from_rgba(decoded))
    }
}

/// Cells of the 4×4 layout grid that carry a face, as (column, row).
const FACE_CELLS: [(u32, u32); 6] = [(1, 0), (0, 1), (1, 1), (2, 1), (3, 1), (1, 2)];

/// Largest edge [`ProceduralImages`] will paint.
pub const MAX_PROCEDURAL_SIZE: u32 = 4096;

/// Paints a blocky cross layout per image: each face cell gets its own tint
/// from the image's palette, unused cells stay black.
#[derive(Clone, Copy, Debug)]
pub struct ProceduralImages {
    size: u32,
}

impl Default for ProceduralImages {
    fn default() -> Self {
        Self { size: 256 }
    }
}

impl ProceduralImages {
    /// `size` is the edge of the square image. It is clamped to
    /// `4..=MAX_PROCEDURAL_SIZE` and rounded up to a multiple of 4 so each
    /// grid cell is whole.
    pub fn new(size: u32) -> Self {
        Self {
            size: size.clamp(4, MAX_PROCEDURAL_SIZE).div_ceil(4) * 4,
        }
    }

    /// Edge length of every painted image.
    pub fn size(&self) -> u32 {
        self.size
    }

    fn palette(image: ImageId) -> &'static [[u8; 3]; 6] {
        match image {
            ImageId::Islands => &[
                [40, 120, 200],
                [60, 150, 210],
                [230, 210, 150],
                [70, 160, 90],
                [30, 100, 180],
                [200, 230, 250],
            ],
            ImageId::Lighthouse => &[
                [200, 60, 50],
                [240, 240, 235],
                [90, 110, 130],
                [60, 80, 110],
                [250, 220, 120],
                [140, 160, 180],
            ],
            ImageId::River => &[
                [50, 110, 70],
                [80, 140, 90],
                [60, 120, 160],
                [110, 90, 60],
                [90, 160, 110],
                [170, 200, 220],
            ],
            ImageId::Gallery => &[
                [180, 150, 110],
                [220, 210, 190],
                [120, 40, 40],
                [40, 60, 110],
                [200, 170, 80],
                [90, 80, 70],
            ],
            ImageId::Grid => &[
                [128, 128, 128],
                [100, 100, 100],
                [150, 150, 150],
                [90, 90, 90],
                [140, 140, 140],
                [110, 110, 110],
            ],
        }
    }

    fn render(&self, image: ImageId) -> ImageData {
        let size = self.size;
        let cell = size / 4;
        let palette = Self::palette(image);
        let seed = u32::from(image.id()) * 7919 + 1;
        let mut pixels = vec![0u8; size as usize * size as usize * 4];

        for y in 0..size {
            for x in 0..size {
                let idx = (y as usize * size as usize + x as usize) * 4;
                let Some(face) = FACE_CELLS
                    .iter()
                    .position(|&(cx, cy)| cx == x / cell && cy == y / cell)
                else {
                    pixels[idx + 3] = 255;
                    continue;
                };

                let base = palette[face];
                // Blocky 4-pixel variation, plus a darker grid line for the
                // grid image.
                let variation = (hash(x / 4, y / 4, seed) % 24) as i32 - 12;
                let line = if image == ImageId::Grid && (x % 16 == 0 || y % 16 == 0) {
                    -60
                } else {
                    0
                };

                for channel in 0..3 {
                    pixels[idx + channel] =
                        (i32::from(base[channel]) + variation + line).clamp(0, 255) as u8;
                }
                pixels[idx + 3] = 255;
            }
        }

        ImageData::new(size, size, pixels)
    }
}

impl ImageProvider for ProceduralImages {
    fn load(&mut self, image: ImageId) -> Result<ImageData> {
        Ok(self.render(image))
    }
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_data() {
        let empty = ImageData::new(0, 0, Vec::new());
        assert!(matches!(
            empty.validate(ImageId::River),
            Err(CubeError::ImageLoadFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_truncated_data() {
        let short = ImageData::new(2, 2, vec![0; 15]);
        let err = short.validate(ImageId::Grid).unwrap_err();
        assert!(err.to_string().contains("expected 16 bytes"));
    }

    #[test]
    fn procedural_images_are_valid_and_distinct() {
        let mut provider = ProceduralImages::new(64);
        let islands = provider.load(ImageId::Islands).unwrap();
        let gallery = provider.load(ImageId::Gallery).unwrap();

        islands.validate(ImageId::Islands).unwrap();
        assert_eq!((islands.width, islands.height), (64, 64));
        assert_ne!(islands.pixels, gallery.pixels);
    }

    #[test]
    fn procedural_size_rounds_to_whole_cells() {
        let data = ProceduralImages::new(30).load(ImageId::Grid).unwrap();
        assert_eq!(data.width, 32);
        data.validate(ImageId::Grid).unwrap();
    }

    #[test]
    fn procedural_size_is_clamped() {
        assert_eq!(ProceduralImages::new(u32::MAX).size(), MAX_PROCEDURAL_SIZE);
        assert_eq!(ProceduralImages::new(0).size(), 4);
        assert_eq!(ProceduralImages::default().size(), 256);
    }

    #[test]
    fn unused_cells_are_black() {
        let data = ProceduralImages::new(16).load(ImageId::Islands).unwrap();
        // Cell (0, 0) carries no face.
        assert_eq!(&data.pixels[0..4], &[0, 0, 0, 255]);
        // Cell (1, 0) is the first face.
        let idx = (4 + 1) * 4;
        assert_ne!(&data.pixels[idx..idx + 3], &[0, 0, 0]);
    }

    #[test]
    fn directory_images_decode_png() {
        let dir = std::env::temp_dir().join(format!("cubeview-images-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut provider = DirectoryImages::new(&dir);

        let png = image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]));
        png.save(provider.path_for(ImageId::Lighthouse)).unwrap();

        let data = provider.load(ImageId::Lighthouse).unwrap();
        assert_eq!((data.width, data.height), (8, 4));
        assert_eq!(&data.pixels[0..4], &[10, 20, 30, 255]);

        assert!(provider.load(ImageId::River).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
