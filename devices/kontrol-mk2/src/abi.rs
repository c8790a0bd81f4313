//! Opcode records of the mk2 display protocol.
//!
//! Record layout (all multi-byte fields big-endian):
//! - start of data: opcode, display, mode `0x60`, 3x u16 zero, x, y, width, height
//! - transmit pixels: opcode, run length, then one u16 color per pixel
//! - repeat pixel: opcode, count, color, u16 zero
//! - skip pixels: opcode, count
//! - blit: opcode, u16 zero
//! - end of data: opcode, display

use kontrol_display_core::{Result, TransferBuffer};

use crate::color::PackedColor;

/// Command opcodes
pub mod cmd {
    pub const TRANSMIT_PIXEL: u16 = 0x0000;
    pub const REPEAT_PIXEL: u16 = 0x0100;
    pub const SKIP_PIXEL: u16 = 0x0200;
    pub const BLIT: u16 = 0x0300;
    pub const START_OF_DATA: u16 = 0x8400;
    pub const END_OF_DATA: u16 = 0x4000;
}

/// Mode byte following the display selector in the start header
pub const START_MODE: u8 = 0x60;

pub const START_OF_DATA_LEN: usize = 16;
pub const TRANSMIT_HEADER_LEN: usize = 4;
pub const REPEAT_PIXEL_LEN: usize = 8;
pub const SKIP_PIXELS_LEN: usize = 4;
pub const BLIT_LEN: usize = 4;
pub const END_OF_DATA_LEN: usize = 3;

/// Pixels covered by one unit of the transmit run-length field
pub const PIXELS_PER_RUN_UNIT: usize = 4;

/// Construct the start-of-data header
pub const fn start_of_data(
    display: u8,
    x: u8,
    y: u8,
    width: u16,
    height: u16,
) -> [u8; START_OF_DATA_LEN] {
    let [op0, op1] = cmd::START_OF_DATA.to_be_bytes();
    let [w0, w1] = width.to_be_bytes();
    let [h0, h1] = height.to_be_bytes();
    [
        op0, op1, display, START_MODE, 0, 0, 0, 0, 0, 0, x, y, w0, w1, h0, h1,
    ]
}

/// Construct the header of a transmit-pixel run
pub const fn transmit_pixels(run_length: u16) -> [u8; TRANSMIT_HEADER_LEN] {
    let [op0, op1] = cmd::TRANSMIT_PIXEL.to_be_bytes();
    let [l0, l1] = run_length.to_be_bytes();
    [op0, op1, l0, l1]
}

/// Construct a repeat-pixel command filling `count` pixels with one color
pub const fn repeat_pixel(count: u16, color: PackedColor) -> [u8; REPEAT_PIXEL_LEN] {
    let [op0, op1] = cmd::REPEAT_PIXEL.to_be_bytes();
    let [n0, n1] = count.to_be_bytes();
    let [c0, c1] = color.to_be_bytes();
    [op0, op1, n0, n1, c0, c1, 0, 0]
}

/// Construct a skip-pixel command leaving `count` pixels untouched
pub const fn skip_pixels(count: u16) -> [u8; SKIP_PIXELS_LEN] {
    let [op0, op1] = cmd::SKIP_PIXEL.to_be_bytes();
    let [n0, n1] = count.to_be_bytes();
    [op0, op1, n0, n1]
}

/// Construct the blit trigger
pub const fn blit() -> [u8; BLIT_LEN] {
    let [op0, op1] = cmd::BLIT.to_be_bytes();
    [op0, op1, 0, 0]
}

/// Construct the end-of-data footer
pub const fn end_of_data(display: u8) -> [u8; END_OF_DATA_LEN] {
    let [op0, op1] = cmd::END_OF_DATA.to_be_bytes();
    [op0, op1, display]
}

/// One typed record of an encoded frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    StartOfData {
        display: u8,
        x: u8,
        y: u8,
        width: u16,
        height: u16,
    },
    TransmitPixels {
        run_length: u16,
        colors: Vec<PackedColor>,
    },
    RepeatPixel {
        count: u16,
        color: PackedColor,
    },
    SkipPixels {
        count: u16,
    },
    Blit,
    EndOfData {
        display: u8,
    },
}

impl Record {
    /// Number of bytes this record occupies on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            Record::StartOfData { .. } => START_OF_DATA_LEN,
            Record::TransmitPixels { colors, .. } => TRANSMIT_HEADER_LEN + 2 * colors.len(),
            Record::RepeatPixel { .. } => REPEAT_PIXEL_LEN,
            Record::SkipPixels { .. } => SKIP_PIXELS_LEN,
            Record::Blit => BLIT_LEN,
            Record::EndOfData { .. } => END_OF_DATA_LEN,
        }
    }

    /// Serialize into `buf`. Nothing is written unless the whole record fits.
    pub fn write_to(&self, buf: &mut TransferBuffer) -> Result<()> {
        buf.reserve(self.encoded_len())?;
        match self {
            Record::StartOfData {
                display,
                x,
                y,
                width,
                height,
            } => buf.put_slice(&start_of_data(*display, *x, *y, *width, *height)),
            Record::TransmitPixels { run_length, colors } => {
                buf.put_slice(&transmit_pixels(*run_length))?;
                for color in colors {
                    buf.put_u16(color.0)?;
                }
                Ok(())
            },
            Record::RepeatPixel { count, color } => buf.put_slice(&repeat_pixel(*count, *color)),
            Record::SkipPixels { count } => buf.put_slice(&skip_pixels(*count)),
            Record::Blit => buf.put_slice(&blit()),
            Record::EndOfData { display } => buf.put_slice(&end_of_data(*display)),
        }
    }
}
