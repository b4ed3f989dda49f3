//! Byte region cursors converters read from and write to

use std::sync::atomic::{AtomicU8, Ordering};

/// A positioned view onto a byte region.
///
/// Offsets passed to the accessors are relative to the cursor position.
/// Multi-byte values are little-endian. Writes take `&self` because the
/// backing bytes are atomics; callers are responsible for excluding
/// concurrent writers.
pub trait ByteCursor {
    /// Bit selected within the byte at offset 0, used by sub-byte converters
    fn bit(&self) -> u8;

    fn get_byte(&self, at: usize) -> u8;

    fn set_byte(&self, at: usize, value: u8);

    fn get_u16(&self, at: usize) -> u16 {
        u16::from_le_bytes([self.get_byte(at), self.get_byte(at + 1)])
    }

    fn set_u16(&self, at: usize, value: u16) {
        for (i, b) in value.to_le_bytes().into_iter().enumerate() {
            self.set_byte(at + i, b);
        }
    }

    fn get_u32(&self, at: usize) -> u32 {
        let mut bytes = [0u8; 4];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.get_byte(at + i);
        }
        u32::from_le_bytes(bytes)
    }

    fn set_u32(&self, at: usize, value: u32) {
        for (i, b) in value.to_le_bytes().into_iter().enumerate() {
            self.set_byte(at + i, b);
        }
    }

    fn get_u64(&self, at: usize) -> u64 {
        let mut bytes = [0u8; 8];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.get_byte(at + i);
        }
        u64::from_le_bytes(bytes)
    }

    fn set_u64(&self, at: usize, value: u64) {
        for (i, b) in value.to_le_bytes().into_iter().enumerate() {
            self.set_byte(at + i, b);
        }
    }
}

/// Cursor over a slice of atomic bytes
#[derive(Debug, Clone, Copy)]
pub struct SliceCursor<'a> {
    bytes: &'a [AtomicU8],
    bit: u8,
}

impl<'a> SliceCursor<'a> {
    /// `bytes` starts at the cursor position
    pub fn new(bytes: &'a [AtomicU8], bit: u8) -> Self {
        debug_assert!(bit < 8);
        Self { bytes, bit }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl ByteCursor for SliceCursor<'_> {
    fn bit(&self) -> u8 {
        self.bit
    }

    #[inline]
    fn get_byte(&self, at: usize) -> u8 {
        self.bytes[at].load(Ordering::Relaxed)
    }

    #[inline]
    fn set_byte(&self, at: usize, value: u8) {
        self.bytes[at].store(value, Ordering::Relaxed);
    }
}

/// Owned, zero-initialised byte region; handy for converters used outside
/// a packed arena
#[derive(Debug)]
pub struct ByteBuffer {
    bytes: Box<[AtomicU8]>,
}

impl ByteBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            bytes: zeroed(len),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Cursor positioned at `offset`, selecting `bit` of that byte
    pub fn cursor(&self, offset: usize, bit: u8) -> SliceCursor<'_> {
        SliceCursor::new(&self.bytes[offset..], bit)
    }

    /// Snapshot of the raw bytes
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.iter().map(|b| b.load(Ordering::Relaxed)).collect()
    }
}

/// Allocate `len` zeroed atomic bytes
pub(crate) fn zeroed(len: usize) -> Box<[AtomicU8]> {
    (0..len).map(|_| AtomicU8::new(0)).collect()
}
