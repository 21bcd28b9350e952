//! Binary writing utilities for the Culture protocol.
//!
//! All values are big-endian. Strings are an `i32` byte length followed by
//! UTF-16BE code units, with no terminator.

use bytes::{BufMut, Bytes, BytesMut};

use crate::Color;

/// A writer for building binary protocol messages.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: BytesMut,
}

impl BinaryWriter {
    /// Create a new writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a new writer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the current length.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    #[inline]
    pub fn put_bool(&mut self, v: bool) {
        self.buf.put_u8(v as u8);
    }

    #[inline]
    pub fn put_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    #[inline]
    pub fn put_i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    /// Write three raw bytes: r, g, b.
    pub fn put_color(&mut self, color: Color) {
        self.buf.put_u8(color.r);
        self.buf.put_u8(color.g);
        self.buf.put_u8(color.b);
    }

    /// Write a length-prefixed UTF-16BE string.
    pub fn put_string(&mut self, s: &str) {
        let units: Vec<u16> = s.encode_utf16().collect();
        self.buf.put_i32((units.len() * 2) as i32);
        for unit in units {
            self.buf.put_u16(unit);
        }
    }

    /// Write raw bytes.
    pub fn put_slice(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Consume the writer and return the built buffer.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Get current buffer as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
