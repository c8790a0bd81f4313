//! Frame builder for the opcode stream.
//!
//! A frame must be `start_of_data`, one or more pixel records, `blit`, then
//! `end_of_data`. The device does not reject a stream in the wrong order, it just
//! draws garbage, so the builder encodes the order in its type: each stage only
//! offers the calls that may follow it, and the finished [`Frame`] is immutable.
//!
//! ```
//! use kontrol_mk2::frame::FrameEncoder;
//!
//! let white = [0xff; 4 * 4];
//! let frame = FrameEncoder::new()
//!     .start_of_data(0, 0, 0, 2, 2)
//!     .write_image(&white)?
//!     .blit()
//!     .end_of_data();
//! assert_eq!(frame.encoded_len(), 16 + 4 + 8 + 4 + 3 + 1);
//! # Ok::<(), kontrol_display_core::DisplayError>(())
//! ```

use std::marker::PhantomData;

use kontrol_display_core::{DisplayError, Result, TransferBuffer};

use crate::abi::{Record, PIXELS_PER_RUN_UNIT};
use crate::color::PackedColor;
use crate::sizing::FRAME_PAD_LEN;
use crate::surface::Region;

/// Nothing written yet
#[derive(Debug)]
pub struct Idle;
/// Start-of-data header recorded
#[derive(Debug)]
pub struct HeaderWritten;
/// At least one pixel record recorded
#[derive(Debug)]
pub struct PixelsWritten;
/// Blit recorded, only the footer may follow
#[derive(Debug)]
pub struct BlitIssued;

/// Stages that accept pixel records
pub trait PixelStage {}
impl PixelStage for HeaderWritten {}
impl PixelStage for PixelsWritten {}

/// Accumulates the records of one frame addressed to one display
#[derive(Debug)]
pub struct FrameEncoder<S> {
    records: Vec<Record>,
    display: u8,
    _stage: PhantomData<S>,
}

impl Default for FrameEncoder<Idle> {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameEncoder<Idle> {
    pub fn new() -> Self {
        Self {
            records: Vec::with_capacity(4),
            display: 0,
            _stage: PhantomData,
        }
    }

    /// Address the frame to `display` and describe the updated rectangle
    pub fn start_of_data(
        mut self,
        display: u8,
        x: u8,
        y: u8,
        width: u16,
        height: u16,
    ) -> FrameEncoder<HeaderWritten> {
        self.records.push(Record::StartOfData {
            display,
            x,
            y,
            width,
            height,
        });
        FrameEncoder {
            records: self.records,
            display,
            _stage: PhantomData,
        }
    }
}

impl<S: PixelStage> FrameEncoder<S> {
    fn advance(mut self, record: Record) -> FrameEncoder<PixelsWritten> {
        self.records.push(record);
        FrameEncoder {
            records: self.records,
            display: self.display,
            _stage: PhantomData,
        }
    }

    /// Quantize and transmit a packed RGBA buffer.
    ///
    /// Fails with [`DisplayError::MalformedBitmap`] when the length is not a
    /// multiple of 4, in which case nothing is recorded.
    pub fn write_image(self, rgba: &[u8]) -> Result<FrameEncoder<PixelsWritten>> {
        if rgba.len() % 4 != 0 {
            return Err(DisplayError::MalformedBitmap { len: rgba.len() });
        }
        let colors = rgba
            .chunks_exact(4)
            .map(|px| PackedColor::from_rgb(px[0], px[1], px[2]))
            .collect();
        self.transmit(colors)
    }

    /// Quantize and transmit every pixel of a region
    pub fn write_region(self, region: &Region<'_>) -> Result<FrameEncoder<PixelsWritten>> {
        let colors = region.pixels().map(PackedColor::from_rgba).collect();
        self.transmit(colors)
    }

    fn transmit(self, colors: Vec<PackedColor>) -> Result<FrameEncoder<PixelsWritten>> {
        let run_length = u16::try_from(colors.len() / PIXELS_PER_RUN_UNIT)
            .map_err(|_| DisplayError::InvalidRegion("pixel run exceeds 16-bit length"))?;
        Ok(self.advance(Record::TransmitPixels { run_length, colors }))
    }

    /// Fill the next `count` pixels with a single color
    pub fn repeat_pixel(self, color: PackedColor, count: u16) -> FrameEncoder<PixelsWritten> {
        self.advance(Record::RepeatPixel { count, color })
    }

    /// Leave the next `count` pixels as they are on the device
    pub fn skip_pixels(self, count: u16) -> FrameEncoder<PixelsWritten> {
        self.advance(Record::SkipPixels { count })
    }
}

impl FrameEncoder<PixelsWritten> {
    /// Tell the device to present what was transmitted
    pub fn blit(mut self) -> FrameEncoder<BlitIssued> {
        self.records.push(Record::Blit);
        FrameEncoder {
            records: self.records,
            display: self.display,
            _stage: PhantomData,
        }
    }
}

impl FrameEncoder<BlitIssued> {
    /// Close the frame. The footer carries the same display as the header.
    pub fn end_of_data(mut self) -> Frame {
        self.records.push(Record::EndOfData {
            display: self.display,
        });
        Frame {
            records: self.records,
        }
    }
}

/// A closed, ready-to-serialize frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    records: Vec<Record>,
}

impl Frame {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Total bytes on the wire, including the trailing pad byte
    pub fn encoded_len(&self) -> usize {
        self.records.iter().map(Record::encoded_len).sum::<usize>() + FRAME_PAD_LEN
    }

    /// Serialize the frame into `buf`, returning the number of bytes written.
    ///
    /// The whole length is checked up front, so on overflow the buffer is left
    /// untouched.
    pub fn write_to(&self, buf: &mut TransferBuffer) -> Result<usize> {
        let len = self.encoded_len();
        buf.reserve(len)?;
        for record in &self.records {
            record.write_to(buf)?;
        }
        buf.put_u8(0)?;
        Ok(len)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = TransferBuffer::with_capacity(self.encoded_len());
        self.write_to(&mut buf)?;
        Ok(buf.as_bytes().to_vec())
    }
}

/// Encode a full frame for `display` from a packed RGBA buffer
pub fn encode_frame(display: u8, width: u16, height: u16, rgba: &[u8]) -> Result<Frame> {
    Ok(FrameEncoder::new()
        .start_of_data(display, 0, 0, width, height)
        .write_image(rgba)?
        .blit()
        .end_of_data())
}

/// Encode a full frame for `display` from a bitmap region
pub fn encode_region(display: u8, region: &Region<'_>) -> Result<Frame> {
    let width = u16::try_from(region.width())
        .map_err(|_| DisplayError::InvalidRegion("region wider than 16 bits"))?;
    let height = u16::try_from(region.height())
        .map_err(|_| DisplayError::InvalidRegion("region taller than 16 bits"))?;
    Ok(FrameEncoder::new()
        .start_of_data(display, 0, 0, width, height)
        .write_region(region)?
        .blit()
        .end_of_data())
}

#[cfg(test)]
mod tests {
    use kontrol_display_core::RawBitmap;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn single_white_pixel() {
        let frame = encode_frame(1, 1, 1, &[255, 255, 255, 255]).unwrap();
        assert_eq!(
            frame.to_bytes().unwrap(),
            [
                0x84, 0x00, 0x01, 0x60, 0, 0, 0, 0, 0, 0, 0, 0, 0x00, 0x01, 0x00, 0x01, // start
                0x00, 0x00, 0x00, 0x00, // transmit, 1 / 4 = 0 units
                0x35, 0x64, // white
                0x03, 0x00, 0x00, 0x00, // blit
                0x40, 0x00, 0x01, // end
                0x00, // pad
            ]
        );
    }

    #[test]
    fn run_length_counts_units_of_four() {
        let frame = encode_frame(0, 4, 2, &[0; 8 * 4]).unwrap();
        match &frame.records()[1] {
            Record::TransmitPixels { run_length, colors } => {
                assert_eq!(*run_length, 2);
                assert_eq!(colors.len(), 8);
            },
            other => panic!("expected pixel run, got {other:?}"),
        }
    }

    #[test]
    fn malformed_image_records_nothing() {
        let encoder = FrameEncoder::new().start_of_data(0, 0, 0, 1, 1);
        let err = encoder.write_image(&[1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, DisplayError::MalformedBitmap { len: 5 }));
    }

    #[test]
    fn mixed_pixel_records() {
        let frame = FrameEncoder::new()
            .start_of_data(0, 0, 0, 8, 1)
            .skip_pixels(2)
            .repeat_pixel(PackedColor(0x0001), 2)
            .write_image(&[255; 16])
            .unwrap()
            .blit()
            .end_of_data();
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(bytes.len(), 16 + 4 + 8 + (4 + 8) + 4 + 3 + 1);
        assert_eq!(&bytes[16..20], &[0x02, 0x00, 0x00, 0x02]);
        assert_eq!(&bytes[20..28], &[0x01, 0x00, 0x00, 0x02, 0x00, 0x01, 0, 0]);
        assert_eq!(&bytes[28..32], &[0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn region_matches_flat_buffer() {
        let bmp = RawBitmap::from_fn(6, 3, |x, y| [x as u8 * 40, y as u8 * 80, 7, 0]);
        let region = Region::new(&bmp, 3, 0, 3, 3).unwrap();
        let flat: Vec<u8> = region.pixels().flatten().collect();
        assert_eq!(
            encode_region(1, &region).unwrap(),
            encode_frame(1, 3, 3, &flat).unwrap()
        );
    }

    #[test]
    fn overflow_is_detected_before_writing() {
        let frame = encode_frame(0, 2, 2, &[9; 16]).unwrap();
        let mut buf = TransferBuffer::with_capacity(frame.encoded_len() - 1);
        let err = frame.write_to(&mut buf).unwrap_err();
        assert!(matches!(err, DisplayError::BufferOverflow { .. }));
        assert!(buf.is_empty());

        let mut buf = TransferBuffer::with_capacity(frame.encoded_len());
        assert_eq!(frame.write_to(&mut buf).unwrap(), buf.len());
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn overlong_run_is_rejected() {
        let pixels = vec![0u8; (u16::MAX as usize + 1) * PIXELS_PER_RUN_UNIT * 4];
        let encoder = FrameEncoder::new().start_of_data(0, 0, 0, 1, 1);
        assert!(matches!(
            encoder.write_image(&pixels),
            Err(DisplayError::InvalidRegion(_))
        ));
    }

    proptest! {
        #[test]
        fn encoding_is_idempotent(pixels in proptest::collection::vec(any::<[u8; 4]>(), 0..64)) {
            let rgba: Vec<u8> = pixels.concat();
            let a = encode_frame(1, 8, 8, &rgba).unwrap().to_bytes().unwrap();
            let b = encode_frame(1, 8, 8, &rgba).unwrap().to_bytes().unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn fixed_records_do_not_depend_on_image(n in 0usize..200, display in 0u8..2) {
            let frame = encode_frame(display, 1, 1, &vec![0x80; n * 4]).unwrap();
            let bytes = frame.to_bytes().unwrap();
            prop_assert_eq!(bytes.len(), 16 + 4 + 2 * n + 4 + 3 + 1);
            let tail = &bytes[bytes.len() - 8..];
            prop_assert_eq!(tail, &[0x03, 0x00, 0x00, 0x00, 0x40, 0x00, display, 0x00]);
        }
    }
}
