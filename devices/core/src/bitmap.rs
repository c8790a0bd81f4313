//! Bitmap source abstraction.

use crate::{DisplayError, Result};

/// A rectangular RGBA8 image, row-major, 4 bytes per pixel.
///
/// The alpha byte is carried along but never interpreted by the encoders.
pub trait Bitmap {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Raw pixel bytes, `width * height * 4` long
    fn pixels(&self) -> &[u8];
}

/// Owned bitmap backed by a plain byte vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RawBitmap {
    /// Wrap an RGBA buffer, checking that its length matches the dimensions
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() % 4 != 0 {
            return Err(DisplayError::MalformedBitmap { len: data.len() });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(DisplayError::BitmapLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Bitmap filled with a single color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a bitmap by evaluating `f` at every coordinate
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Bitmap for RawBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixels(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_partial_pixels() {
        let err = RawBitmap::new(1, 1, vec![0; 5]).unwrap_err();
        assert!(matches!(err, DisplayError::MalformedBitmap { len: 5 }));
    }

    #[test]
    fn rejects_wrong_dimensions() {
        let err = RawBitmap::new(2, 2, vec![0; 12]).unwrap_err();
        assert!(matches!(
            err,
            DisplayError::BitmapLength {
                expected: 16,
                actual: 12
            }
        ));
    }

    #[test]
    fn from_fn_is_row_major() {
        let bmp = RawBitmap::from_fn(2, 2, |x, y| [x as u8, y as u8, 0, 0]);
        assert_eq!(
            bmp.pixels(),
            &[0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0]
        );
    }

    #[test]
    fn filled_has_expected_length() {
        let bmp = RawBitmap::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(bmp.pixels().len(), 24);
        assert_eq!(&bmp.pixels()[20..], &[1, 2, 3, 4]);
    }
}
