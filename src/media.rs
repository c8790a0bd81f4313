use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use image::imageops::FilterType;
use image::DynamicImage;
use kontrol_display_core::{DisplayError, RawBitmap};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("invalid hex length for {code}: {len}")]
    HexLength { code: String, len: usize },
    #[error("invalid hex color: {0}")]
    InvalidHex(String),
    #[error("failed to read image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Utility for easily parsing hex colors from bpaf and the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.0;
        f.write_str(&format!("#{r:02x}{g:02x}{b:02x}"))
    }
}

impl FromStr for Color {
    type Err = MediaError;
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        // parse hex string into rgb
        let mut hex = code.trim_start_matches('#').to_string();
        match hex.len() {
            3 => {
                // Extend 3 character hex colors
                hex = hex.chars().flat_map(|a| [a, a]).collect();
            },
            6 => {},
            len => {
                return Err(MediaError::HexLength {
                    code: code.into(),
                    len,
                })
            },
        }
        // from_str_radix alone would accept a sign
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MediaError::InvalidHex(code.into()));
        }
        let channel_bytes =
            u32::from_str_radix(&hex, 16).map_err(|_| MediaError::InvalidHex(code.into()))?;
        let r = ((channel_bytes >> 16) & 0xFF) as u8;
        let g = ((channel_bytes >> 8) & 0xFF) as u8;
        let b = (channel_bytes & 0xFF) as u8;
        Ok(Self([r, g, b]))
    }
}

/// Load an image from disk and fit it to the surface
pub fn load_bitmap(
    path: &Path,
    background: Color,
    nearest: bool,
    width: u32,
    height: u32,
) -> Result<RawBitmap, MediaError> {
    let image = image::open(path)?;
    encode_bitmap(image, background, nearest, width, height)
}

/// Resize to fill the surface and flatten transparency against `background`
pub fn encode_bitmap(
    image: DynamicImage,
    background: Color,
    nearest: bool,
    width: u32,
    height: u32,
) -> Result<RawBitmap, MediaError> {
    let [br, bg, bb] = background.0;

    let buf = image
        .resize_to_fill(
            width,
            height,
            if nearest {
                FilterType::Nearest
            } else {
                FilterType::Gaussian
            },
        )
        .to_rgba8()
        .pixels()
        .flat_map(|p| {
            let [mut r, mut g, mut b, a] = p.0;

            // Mix alpha values against the background
            let a = a as f64 / 255.0;
            let ba = 1. - a;
            r = ((br as f64 * ba) + (r as f64 * a)) as u8;
            g = ((bg as f64 * ba) + (g as f64 * a)) as u8;
            b = ((bb as f64 * ba) + (b as f64 * a)) as u8;

            [r, g, b, 0xff]
        })
        .collect::<Vec<_>>();

    Ok(RawBitmap::new(width, height, buf)?)
}
