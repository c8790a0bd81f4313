//! Fixed-capacity staging buffers for outbound transfers.

use crate::{DisplayError, Result};

/// Fixed-capacity, bound-checked byte buffer.
///
/// Every `put_*` checks the remaining space before touching memory, so a write
/// that would not fit fails with [`DisplayError::BufferOverflow`] and leaves the
/// buffer exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl TransferBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len
    }

    /// Reset to empty. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Fail unless `needed` more bytes fit
    pub fn reserve(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(DisplayError::BufferOverflow {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put_slice(&[value])
    }

    /// Write a big-endian 16-bit value
    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    pub fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        let end = self.len + bytes.len();
        self.data[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// The bytes written since the last clear
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl AsRef<[u8]> for TransferBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Source of transfer buffers
pub trait BufferAllocator {
    fn allocate(&self, capacity: usize) -> TransferBuffer;
}

/// Allocates buffers on the heap
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    fn allocate(&self, capacity: usize) -> TransferBuffer {
        TransferBuffer::with_capacity(capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_big_endian() {
        let mut buf = TransferBuffer::with_capacity(8);
        buf.put_u16(0x8400).unwrap();
        buf.put_u8(1).unwrap();
        assert_eq!(buf.as_bytes(), &[0x84, 0x00, 0x01]);
        assert_eq!(buf.remaining(), 5);
    }

    #[test]
    fn overflow_leaves_buffer_untouched() {
        let mut buf = TransferBuffer::with_capacity(3);
        buf.put_u16(0xabcd).unwrap();
        let err = buf.put_slice(&[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            DisplayError::BufferOverflow {
                needed: 2,
                remaining: 1
            }
        ));
        assert_eq!(buf.as_bytes(), &[0xab, 0xcd]);

        // one byte left, a short must not fit
        assert!(buf.put_u16(0).is_err());
        buf.put_u8(0xef).unwrap();
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn clear_resets_length_only() {
        let mut buf = HeapAllocator.allocate(4);
        buf.put_slice(&[1, 2, 3, 4]).unwrap();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 4);
        buf.put_slice(&[9]).unwrap();
        assert_eq!(buf.as_bytes(), &[9]);
    }
}
