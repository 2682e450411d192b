//! [Binary stream reader](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=101)
//!
//! A bounds-checked cursor over an immutable byte slice. Every read is
//! big-endian, per the class file format, and every read that would run
//! past the end of the slice fails with [`DecodeError::Truncated`] instead
//! of panicking.

use crate::error::DecodeError;
use byteorder::{BigEndian, ByteOrder};

#[derive(Clone, Copy)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> ByteCursor<'a> {
        ByteCursor { bytes, pos: 0 }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn seek(&mut self, pos: usize) -> Result<(), DecodeError> {
        if pos > self.bytes.len() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: pos - self.bytes.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.seek(self.pos + n)
    }

    fn require(&self, n: usize) -> Result<(), DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.require(1)?;
        let b = self.bytes[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.require(2)?;
        let v = BigEndian::read_u16(&self.bytes[self.pos..self.pos + 2]);
        self.pos += 2;
        Ok(v)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.require(4)?;
        let v = BigEndian::read_u32(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.require(8)?;
        let v = BigEndian::read_u64(&self.bytes[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(v)
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.require(4)?;
        let v = BigEndian::read_f32(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.require(8)?;
        let v = BigEndian::read_f64(&self.bytes[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(v)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.require(n)?;
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Bounds a child cursor to exactly `len` bytes starting at the current
    /// position, and advances `self` past them. Used for attribute payloads
    /// and other length-prefixed substructures so an attribute can never
    /// read past its own declared length.
    pub fn child(&mut self, len: usize) -> Result<ByteCursor<'a>, DecodeError> {
        let bytes = self.read_bytes(len)?;
        Ok(ByteCursor { bytes, pos: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_primitives() {
        let data = [0x00, 0x01, 0xCA, 0xFE, 0xBA, 0xBE];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u16().unwrap(), 0x0001);
        assert_eq!(c.read_u32().unwrap(), 0xCAFEBABE);
        assert!(c.is_empty());
    }

    #[test]
    fn truncated_on_underflow() {
        let data = [0x00];
        let mut c = ByteCursor::new(&data);
        let err = c.read_u16().unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                offset: 0,
                needed: 1
            }
        );
    }

    #[test]
    fn child_cursor_bounds_its_own_reads() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut c = ByteCursor::new(&data);
        let mut inner = c.child(2).unwrap();
        assert_eq!(inner.read_u16().unwrap(), 0x0102);
        assert!(inner.read_u8().is_err());
        assert_eq!(c.read_u16().unwrap(), 0x0304);
    }

    #[test]
    fn seek_and_skip_respect_bounds() {
        let data = [0u8; 4];
        let mut c = ByteCursor::new(&data);
        c.skip(2).unwrap();
        assert_eq!(c.tell(), 2);
        c.seek(4).unwrap();
        assert!(c.is_empty());
        assert!(c.seek(5).is_err());
    }
}
