use std::path::Path;

use crate::errors::TextureError;

/// Tightly packed RGBA8 pixels waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        if pixels.len() != width as usize * height as usize * 4 {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A 1x1 texture of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// A two-color checkerboard with `cell`-pixel squares.
    pub fn checker(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let color = if (x / cell + y / cell) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&color);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }
}

/// Turns a texture file into RGBA8 pixels.
pub trait TextureDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, TextureError>;
}

/// Decoder backed by the `image` crate (PNG and JPEG).
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileDecoder;

impl TextureDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, TextureError> {
        let img = image::open(path).map_err(|source| TextureError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("decoded texture {} ({width}x{height})", path.display());
        DecodedImage::new(width, height, rgba.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_is_validated() {
        assert!(DecodedImage::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            DecodedImage::new(2, 2, vec![0; 15]),
            Err(TextureError::SizeMismatch { len: 15, .. })
        ));
    }

    #[test]
    fn test_checker_alternates() {
        let image = DecodedImage::checker(4, 2, [255; 4], [0, 0, 0, 255]);
        assert_eq!(image.pixels.len(), 64);
        assert_eq!(&image.pixels[0..4], &[255; 4]);
        // pixel (2, 0) starts the second cell
        assert_eq!(&image.pixels[8..12], &[0, 0, 0, 255]);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ImageFileDecoder
            .decode(Path::new("does/not/exist.png"))
            .unwrap_err();
        assert!(err.to_string().contains("does/not/exist.png"));
    }
}
