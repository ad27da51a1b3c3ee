extern crate alloc;
use alloc::vec::Vec;

const DEFAULT_CAPACITY: usize = 4096;

/// Growable output byte stream backing the GIF assembler.
///
/// All multi-byte GIF fields are little-endian, so only a LE 16-bit write
/// is provided.
#[derive(Debug, Clone)]
pub struct Stream {
    buf: Vec<u8>,
}

impl Stream {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Copy of the bytes written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.buf.clone()
    }

    /// View into the bytes written so far.
    pub fn bytes_view(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop all written bytes, keeping the allocation for reuse.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}
