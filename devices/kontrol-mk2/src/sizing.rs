//! Transfer buffer sizing.
//!
//! A buffer has to hold either layout for one screen. The block layout puts an
//! 8 byte block header in front of every 24 bytes of pixel payload and ends with a
//! 4 byte footer, which is the larger of the two for any real screen size.

use crate::abi::{BLIT_LEN, END_OF_DATA_LEN, START_OF_DATA_LEN, TRANSMIT_HEADER_LEN};

/// Bytes per pixel after quantization
pub const BYTES_PER_PIXEL: usize = 2;

/// Header placed before every block of pixel payload
pub const BLOCK_HEADER: [u8; 7] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
/// Mode byte following each block header
pub const BLOCK_MODE: u8 = 0x06;
/// Pixel payload bytes per block
pub const BLOCK_PAYLOAD: usize = 24;
pub const BLOCK_PIXELS: usize = BLOCK_PAYLOAD / BYTES_PER_PIXEL;
pub const BLOCK_OVERHEAD: usize = BLOCK_HEADER.len() + 1;
/// Trailer closing a block stream
pub const FOOTER: [u8; 4] = [0x40, 0x00, 0x00, 0x00];

/// Zero byte closing an opcode frame after the end-of-data record
pub const FRAME_PAD_LEN: usize = 1;

/// Encoded length of a block stream carrying `pixels` pixels
pub const fn block_stream_len(pixels: usize) -> usize {
    let payload = pixels * BYTES_PER_PIXEL;
    FOOTER.len() + payload + payload.div_ceil(BLOCK_PAYLOAD) * BLOCK_OVERHEAD
}

/// Encoded length of a full opcode frame with a single transmit run
pub const fn opcode_frame_len(pixels: usize) -> usize {
    START_OF_DATA_LEN
        + TRANSMIT_HEADER_LEN
        + pixels * BYTES_PER_PIXEL
        + BLIT_LEN
        + END_OF_DATA_LEN
        + FRAME_PAD_LEN
}

/// Capacity of one transfer buffer for a `width` x `height` screen
pub const fn transfer_capacity(width: u32, height: u32) -> usize {
    let pixels = width as usize * height as usize;
    let blocks = block_stream_len(pixels);
    let frame = opcode_frame_len(pixels);
    if blocks > frame {
        blocks
    } else {
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_screen_capacity() {
        // 345600 pixel bytes, 14400 blocks of 24 bytes
        assert_eq!(block_stream_len(480 * 360), 4 + 345_600 + 14_400 * 8);
        assert_eq!(transfer_capacity(480, 360), 460_804);
    }

    #[test]
    fn partial_block_is_counted() {
        assert_eq!(block_stream_len(12), 4 + 24 + 8);
        assert_eq!(block_stream_len(13), 4 + 26 + 16);
    }

    #[test]
    fn tiny_screens_fit_an_opcode_frame() {
        assert_eq!(opcode_frame_len(1), 30);
        assert_eq!(transfer_capacity(1, 1), 30);
        assert!(transfer_capacity(10, 10) >= opcode_frame_len(100));
        assert!(transfer_capacity(10, 10) >= block_stream_len(100));
    }
}
