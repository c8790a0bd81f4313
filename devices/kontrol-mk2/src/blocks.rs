//! Block-interleaved pixel layout.
//!
//! Instead of opcodes, this layout streams raw colors in blocks of 12 pixels,
//! each preceded by [`BLOCK_HEADER`] and [`BLOCK_MODE`], and closes with [`FOOTER`].

use kontrol_display_core::{Result, TransferBuffer};

use crate::color::PackedColor;
use crate::sizing::{block_stream_len, BLOCK_HEADER, BLOCK_MODE, BLOCK_PIXELS, FOOTER};
use crate::surface::Region;

/// Write the block stream for `region` into `buf`, returning the bytes written
pub fn write_blocks(region: &Region<'_>, buf: &mut TransferBuffer) -> Result<usize> {
    let len = block_stream_len(region.pixel_count());
    buf.reserve(len)?;
    for (i, px) in region.pixels().enumerate() {
        if i % BLOCK_PIXELS == 0 {
            buf.put_slice(&BLOCK_HEADER)?;
            buf.put_u8(BLOCK_MODE)?;
        }
        buf.put_u16(PackedColor::from_rgba(px).0)?;
    }
    buf.put_slice(&FOOTER)?;
    Ok(len)
}

#[cfg(test)]
mod tests {
    use kontrol_display_core::{DisplayError, RawBitmap};

    use super::*;

    #[test]
    fn blocks_of_twelve() {
        let bmp = RawBitmap::filled(13, 1, [255, 255, 255, 0]);
        let region = Region::full(&bmp).unwrap();
        let mut buf = TransferBuffer::with_capacity(64);
        let len = write_blocks(&region, &mut buf).unwrap();
        assert_eq!(len, buf.len());

        let bytes = buf.as_bytes();
        assert_eq!(&bytes[..8], &[0x02, 0, 0, 0, 0, 0, 0, 0x06]);
        assert_eq!(&bytes[8..10], &[0x35, 0x64]);
        // second block starts after 12 colors
        assert_eq!(&bytes[32..40], &[0x02, 0, 0, 0, 0, 0, 0, 0x06]);
        assert_eq!(&bytes[40..42], &[0x35, 0x64]);
        assert_eq!(&bytes[42..], &FOOTER);
    }

    #[test]
    fn too_small_buffer_is_untouched() {
        let bmp = RawBitmap::filled(12, 1, [0; 4]);
        let region = Region::full(&bmp).unwrap();
        let mut buf = TransferBuffer::with_capacity(block_stream_len(12) - 1);
        assert!(matches!(
            write_blocks(&region, &mut buf),
            Err(DisplayError::BufferOverflow { .. })
        ));
        assert!(buf.is_empty());
    }
}
