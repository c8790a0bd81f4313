//! Pixel color reduction to the device's 16-bit color word.
//!
//! The display firmware expects each channel divided down and packed as
//! `r / 7 | (g / 3) * 64 | (b / 7) * 2048`, truncated to 16 bits. The
//! divisors are not a conventional 5-6-5 split and must not be changed.

/// A packed 16-bit device color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedColor(pub u16);

impl PackedColor {
    pub const BLACK: Self = Self(0);

    /// Reduce an 8-bit RGB triple
    #[inline(always)]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(quantize(r, g, b))
    }

    /// Reduce an RGBA pixel, dropping the alpha byte
    #[inline(always)]
    pub const fn from_rgba([r, g, b, _]: [u8; 4]) -> Self {
        Self::from_rgb(r, g, b)
    }

    #[inline(always)]
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<PackedColor> for u16 {
    fn from(color: PackedColor) -> Self {
        color.0
    }
}

/// Quantize one pixel
#[inline(always)]
pub const fn quantize(r: u8, g: u8, b: u8) -> u16 {
    let r = r as u32 / 7;
    let g = (g as u32 / 3) * 64;
    let b = (b as u32 / 7) * 2048;
    (r | g | b) as u16
}
