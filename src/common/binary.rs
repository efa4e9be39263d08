//! Binary data utilities shared by the metafile reader and writer.
//!
//! This module provides functions for reading and writing little-endian
//! integers and for converting Windows-1252 ("ANSI") strings, which is how
//! WMF stores text and font face names.

use encoding_rs::WINDOWS_1252;
use thiserror::Error;
use zerocopy::{FromBytes, I16, IntoBytes, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone, Error)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    #[error("Insufficient data: expected {expected}, got {available}")]
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn slice_at(data: &[u8], offset: usize, len: usize) -> BinaryResult<&[u8]> {
    let end = offset.checked_add(len).ok_or(BinaryError::InsufficientData {
        expected: usize::MAX,
        available: data.len(),
    })?;
    data.get(offset..end).ok_or(BinaryError::InsufficientData {
        expected: end,
        available: data.len(),
    })
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use wmfkit::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    U16::<LE>::read_from_bytes(slice_at(data, offset, 2)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u16".to_string()))
}

/// Read a little-endian i16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use wmfkit::common::binary::read_i16_le;
/// let data = [0xFF, 0xFF];
/// assert_eq!(read_i16_le(&data, 0).unwrap(), -1i16);
/// ```
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> BinaryResult<i16> {
    I16::<LE>::read_from_bytes(slice_at(data, offset, 2)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read i16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use wmfkit::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    U32::<LE>::read_from_bytes(slice_at(data, offset, 4)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u32".to_string()))
}

/// Append a little-endian u16.
#[inline]
pub fn put_u16_le(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(U16::<LE>::new(value).as_bytes());
}

/// Append a little-endian i16.
#[inline]
pub fn put_i16_le(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(I16::<LE>::new(value).as_bytes());
}

/// Append a little-endian u32.
#[inline]
pub fn put_u32_le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(U32::<LE>::new(value).as_bytes());
}

/// Overwrite a little-endian u16 in place. Out-of-range offsets are ignored.
#[inline]
pub fn patch_u16_le(out: &mut [u8], offset: usize, value: u16) {
    if let Some(dst) = out.get_mut(offset..offset + 2) {
        dst.copy_from_slice(U16::<LE>::new(value).as_bytes());
    }
}

/// Overwrite a little-endian u32 in place. Out-of-range offsets are ignored.
#[inline]
pub fn patch_u32_le(out: &mut [u8], offset: usize, value: u32) {
    if let Some(dst) = out.get_mut(offset..offset + 4) {
        dst.copy_from_slice(U32::<LE>::new(value).as_bytes());
    }
}

/// Decode a Windows-1252 string, stopping at the first NUL byte.
///
/// # Examples
///
/// ```
/// use wmfkit::common::binary::parse_windows1252_string;
/// assert_eq!(parse_windows1252_string(b"Arial\0\0junk"), "Arial");
/// assert_eq!(parse_windows1252_string(b"caf\xE9"), "café");
/// ```
pub fn parse_windows1252_string(data: &[u8]) -> String {
    let end = memchr::memchr(0, data).unwrap_or(data.len());
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(&data[..end]);
    text.into_owned()
}

/// Encode a string as Windows-1252. Unmappable characters become `?`.
///
/// # Examples
///
/// ```
/// use wmfkit::common::binary::encode_windows1252_string;
/// assert_eq!(encode_windows1252_string("café"), b"caf\xE9".to_vec());
/// ```
pub fn encode_windows1252_string(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
    if !had_errors {
        return bytes.into_owned();
    }
    text.chars()
        .map(|ch| {
            let mut buf = [0u8; 4];
            let (enc, _, bad) = WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
            if bad || enc.len() != 1 { b'?' } else { enc[0] }
        })
        .collect()
}
