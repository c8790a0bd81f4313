//! Virtual surface layout and bitmap regions.
//!
//! The mk2 keyboards have two physical screens side by side. The host renders one
//! virtual surface covering both, and the driver cuts it into one region per screen.

use kontrol_display_core::{Bitmap, DisplayError, Result};

use crate::abi::PIXELS_PER_RUN_UNIT;
use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::sizing::transfer_capacity;

/// How pixel data is laid out in a transfer buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Opcode stream: header, transmit run, blit, footer
    #[default]
    Opcode,
    /// Raw colors interleaved with fixed block headers
    Blocks,
}

/// One physical screen and where it sits on the virtual surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub display: u8,
    /// Horizontal offset of this screen on the virtual surface
    pub offset: u32,
}

/// Geometry of the virtual surface and how it maps onto the screens
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayLayout {
    width: u32,
    height: u32,
    split: bool,
    displays: [u8; 2],
    encoding: Encoding,
}

impl DisplayLayout {
    /// Both 480x360 screens of a mk2 keyboard side by side
    pub const fn kontrol_mk2() -> Self {
        Self {
            width: 2 * SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            split: true,
            displays: [0, 1],
            encoding: Encoding::Opcode,
        }
    }

    /// A surface split into a left and a right half, addressed as displays 0 and 1
    pub fn split(width: u32, height: u32) -> Result<Self> {
        Self::new(width, height, true)
    }

    /// A surface sent as a single frame to display 0
    pub fn single(width: u32, height: u32) -> Result<Self> {
        Self::new(width, height, false)
    }

    fn new(width: u32, height: u32, split: bool) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidRegion("surface must not be empty"));
        }
        if split && width % 2 != 0 {
            return Err(DisplayError::InvalidRegion("split surface width must be even"));
        }
        let this = Self {
            width,
            height,
            split,
            displays: [0, 1],
            encoding: Encoding::Opcode,
        };
        let (w, h) = this.target_size();
        if w > u16::MAX as u32 || h > u16::MAX as u32 {
            return Err(DisplayError::InvalidRegion("screen exceeds 16-bit dimensions"));
        }
        // the transmit record counts pixels in units of four in a 16-bit field
        if w as usize * h as usize / PIXELS_PER_RUN_UNIT > u16::MAX as usize {
            return Err(DisplayError::InvalidRegion("screen exceeds one transmit run"));
        }
        Ok(this)
    }

    /// Override the display selectors used for the left and right screen
    pub fn with_displays(mut self, left: u8, right: u8) -> Self {
        self.displays = [left, right];
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[inline(always)]
    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline(always)]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline(always)]
    pub fn is_split(&self) -> bool {
        self.split
    }

    /// Size of the region sent to each screen
    pub fn target_size(&self) -> (u32, u32) {
        if self.split {
            (self.width / 2, self.height)
        } else {
            (self.width, self.height)
        }
    }

    /// Screens in transmission order, left first
    pub fn targets(&self) -> impl Iterator<Item = Target> {
        let (half, _) = self.target_size();
        let [left, right] = self.displays;
        let count = if self.split { 2 } else { 1 };
        [
            Target {
                display: left,
                offset: 0,
            },
            Target {
                display: right,
                offset: half,
            },
        ]
        .into_iter()
        .take(count)
    }

    /// Capacity each transfer buffer needs for one screen
    pub fn buffer_capacity(&self) -> usize {
        let (w, h) = self.target_size();
        transfer_capacity(w, h)
    }

    /// Check that a bitmap covers exactly the virtual surface
    pub fn check_bitmap(&self, bitmap: &dyn Bitmap) -> Result<()> {
        let actual = (bitmap.width(), bitmap.height());
        if actual != self.surface_size() {
            return Err(DisplayError::BitmapSize {
                expected: self.surface_size(),
                actual,
            });
        }
        Ok(())
    }
}

/// A rectangular window onto an RGBA bitmap
#[derive(Clone, Copy, Debug)]
pub struct Region<'a> {
    pixels: &'a [u8],
    stride: usize,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl<'a> Region<'a> {
    /// The whole bitmap
    pub fn full(bitmap: &'a dyn Bitmap) -> Result<Self> {
        Self::new(bitmap, 0, 0, bitmap.width(), bitmap.height())
    }

    /// A sub-rectangle of the bitmap
    pub fn new(bitmap: &'a dyn Bitmap, x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        let pixels = bitmap.pixels();
        if pixels.len() % 4 != 0 {
            return Err(DisplayError::MalformedBitmap { len: pixels.len() });
        }
        let expected = bitmap.width() as usize * bitmap.height() as usize * 4;
        if pixels.len() != expected {
            return Err(DisplayError::BitmapLength {
                expected,
                actual: pixels.len(),
            });
        }
        let fits_x = x.checked_add(width).is_some_and(|r| r <= bitmap.width());
        let fits_y = y.checked_add(height).is_some_and(|b| b <= bitmap.height());
        if !fits_x || !fits_y {
            return Err(DisplayError::InvalidRegion("region exceeds bitmap bounds"));
        }
        Ok(Self {
            pixels,
            stride: bitmap.width() as usize * 4,
            x,
            y,
            width,
            height,
        })
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline(always)]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Rows of RGBA bytes, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        let start = self.x as usize * 4;
        let end = start + self.width as usize * 4;
        let (stride, first, count) = (self.stride, self.y as usize, self.height as usize);
        let pixels = self.pixels;
        (first..first + count).map(move |row| &pixels[row * stride + start..row * stride + end])
    }

    /// Pixels left to right, top to bottom
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + 'a {
        let rows = self.rows();
        rows.flat_map(|row| {
            row.chunks_exact(4)
                .map(|px| [px[0], px[1], px[2], px[3]])
        })
    }
}

#[cfg(test)]
mod tests {
    use kontrol_display_core::RawBitmap;

    use super::*;

    #[test]
    fn split_targets_in_order() {
        let layout = DisplayLayout::split(960, 360).unwrap();
        assert_eq!(layout.target_size(), (480, 360));
        let targets: Vec<_> = layout.targets().collect();
        assert_eq!(
            targets,
            [
                Target {
                    display: 0,
                    offset: 0
                },
                Target {
                    display: 1,
                    offset: 480
                }
            ]
        );
    }

    #[test]
    fn kontrol_mk2_is_a_valid_split() {
        assert_eq!(DisplayLayout::kontrol_mk2(), DisplayLayout::split(960, 360).unwrap());
    }

    #[test]
    fn single_target() {
        let layout = DisplayLayout::single(10, 10).unwrap().with_displays(1, 0);
        let targets: Vec<_> = layout.targets().collect();
        assert_eq!(
            targets,
            [Target {
                display: 1,
                offset: 0
            }]
        );
    }

    #[test]
    fn rejects_bad_layouts() {
        assert!(DisplayLayout::split(0, 10).is_err());
        assert!(DisplayLayout::split(11, 10).is_err());
        assert!(DisplayLayout::single(70_000, 1).is_err());
        assert!(DisplayLayout::split(140_000, 1).is_err());
        // 86400 run units, more than the run-length field holds
        assert!(matches!(
            DisplayLayout::single(960, 360),
            Err(DisplayError::InvalidRegion(_))
        ));
        assert!(DisplayLayout::single(600, 500).is_err());
    }

    #[test]
    fn largest_single_run_is_accepted() {
        // 65535 units of four pixels
        assert!(DisplayLayout::single(65_535, 4).is_ok());
        assert!(DisplayLayout::single(512, 512).is_err());
    }

    #[test]
    fn region_rows_follow_offset() {
        let bmp = RawBitmap::from_fn(4, 2, |x, y| [(y * 4 + x) as u8, 0, 0, 0]);
        let region = Region::new(&bmp, 2, 0, 2, 2).unwrap();
        let reds: Vec<u8> = region.pixels().map(|[r, ..]| r).collect();
        assert_eq!(reds, [2, 3, 6, 7]);
        assert_eq!(region.rows().count(), 2);
    }

    #[test]
    fn region_out_of_bounds() {
        let bmp = RawBitmap::filled(4, 2, [0; 4]);
        assert!(Region::new(&bmp, 3, 0, 2, 2).is_err());
        assert!(Region::new(&bmp, 0, 1, 4, 2).is_err());
        assert!(Region::new(&bmp, u32::MAX, 0, 2, 1).is_err());
    }
}
