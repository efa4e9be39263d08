//! Record stream tokenizer.
//!
//! Every record is `(size: u32 words, function: u16, parameters...)`. The
//! declared size is authoritative: the reader always advances by it,
//! whatever a handler actually consumed.

use crate::common::binary::{BinaryResult, read_i16_le, read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};

use super::constants::{FUNCTION_TABLE_LEN, RECORD_HEADER_WORDS};
use super::geometry::{Point, Rect};

/// Map a record function to its index in the dispatch table.
///
/// Only the low byte matters; values above 0x5F are folded down by 0x90 so
/// that the object-creation range 0xF0..=0xFF follows 0x00..=0x5F.
pub fn function_index(function: u16) -> Option<usize> {
    let low = function & 0xFF;
    let index = if low > 0x5F { low.checked_sub(0x90)? } else { low };
    let index = usize::from(index);
    (index < FUNCTION_TABLE_LEN).then_some(index)
}

/// One record borrowed from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Byte offset of the size field
    pub offset: usize,
    /// Size in 16-bit words, header included
    pub size: u32,
    pub function: u16,
    /// Parameters as declared by `size`, clipped to the end of the buffer
    pub payload: &'a [u8],
}

impl<'a> Record<'a> {
    pub fn params(&self) -> ParamReader<'a> {
        ParamReader::new(self.payload)
    }

    /// Parameter byte count implied by the declared size.
    pub fn declared_payload_len(&self) -> usize {
        (self.size.saturating_sub(RECORD_HEADER_WORDS) as usize) * 2
    }
}

/// Sequential reader over the records of a metafile body.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    /// Offset of the next record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read the next record and advance past its declared size.
    ///
    /// A zero or undersized `size` field, or a header running past the
    /// buffer, is a corrupt stream.
    pub fn next_record(&mut self) -> Result<Record<'a>> {
        let offset = self.offset;
        let corrupt = || Error::CorruptStream { offset };

        let size = read_u32_le(self.data, offset).map_err(|_| corrupt())?;
        let function = read_u16_le(self.data, offset + 4).map_err(|_| corrupt())?;
        if size < RECORD_HEADER_WORDS {
            return Err(corrupt());
        }

        let byte_len = (size as usize).checked_mul(2).ok_or_else(corrupt)?;
        let end = offset.checked_add(byte_len).ok_or_else(corrupt)?;
        let payload_start = offset + 6;
        let payload_end = end.min(self.data.len()).max(payload_start);
        let payload = self.data.get(payload_start..payload_end).unwrap_or(&[]);

        self.offset = end;
        Ok(Record {
            offset,
            size,
            function,
            payload,
        })
    }
}

/// Little-endian cursor over a record's parameters.
#[derive(Debug, Clone)]
pub struct ParamReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ParamReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or(&[])
    }

    fn advance<T>(&mut self, len: usize, value: BinaryResult<T>) -> BinaryResult<T> {
        let value = value?;
        self.pos += len;
        Ok(value)
    }

    pub fn u16(&mut self) -> BinaryResult<u16> {
        let v = read_u16_le(self.data, self.pos);
        self.advance(2, v)
    }

    pub fn i16(&mut self) -> BinaryResult<i16> {
        let v = read_i16_le(self.data, self.pos);
        self.advance(2, v)
    }

    pub fn u32(&mut self) -> BinaryResult<u32> {
        let v = read_u32_le(self.data, self.pos);
        self.advance(4, v)
    }

    /// Signed 16-bit parameter widened to `i32`.
    pub fn coord(&mut self) -> BinaryResult<i32> {
        self.i16().map(i32::from)
    }

    /// A point stored as `(x, y)`, the order used by point arrays.
    pub fn point_xy(&mut self) -> BinaryResult<Point> {
        let x = self.coord()?;
        let y = self.coord()?;
        Ok(Point::new(x, y))
    }

    /// A point stored as `(y, x)`, the order used by single-point records.
    pub fn point_yx(&mut self) -> BinaryResult<Point> {
        let y = self.coord()?;
        let x = self.coord()?;
        Ok(Point::new(x, y))
    }

    /// A rectangle stored as `(bottom, right, top, left)`.
    pub fn rect_brtl(&mut self) -> BinaryResult<Rect> {
        let bottom = self.coord()?;
        let right = self.coord()?;
        let top = self.coord()?;
        let left = self.coord()?;
        Ok(Rect::from_ltrb(left, top, right, bottom))
    }

    /// A rectangle stored as `(left, top, right, bottom)`, as in ExtTextOut.
    pub fn rect_ltrb(&mut self) -> BinaryResult<Rect> {
        let left = self.coord()?;
        let top = self.coord()?;
        let right = self.coord()?;
        let bottom = self.coord()?;
        Ok(Rect::from_ltrb(left, top, right, bottom))
    }

    pub fn points(&mut self, count: usize) -> BinaryResult<Vec<Point>> {
        (0..count).map(|_| self.point_xy()).collect()
    }

    pub fn bytes(&mut self, len: usize) -> BinaryResult<&'a [u8]> {
        let end = self.pos.saturating_add(len);
        let out = self
            .data
            .get(self.pos..end)
            .ok_or(crate::common::binary::BinaryError::InsufficientData {
                expected: end,
                available: self.data.len(),
            })?;
        self.pos = end;
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> BinaryResult<()> {
        self.bytes(len).map(|_| ())
    }
}
