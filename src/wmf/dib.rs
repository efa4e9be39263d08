// Device-independent bitmap helpers
//
// Blit and pattern-brush records embed a packed DIB (BITMAPINFO + bits)
// without the 14-byte BITMAPFILEHEADER. Decoding prepends that header and
// hands the result to the `image` crate's BMP decoder; encoding does the
// reverse for the writer.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::common::binary::{put_u16_le, put_u32_le, read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};

const FILE_HEADER_SIZE: usize = 14;
const CORE_HEADER_SIZE: u32 = 12;
const INFO_HEADER_SIZE: u32 = 40;
const BI_BITFIELDS: u32 = 3;

/// Byte offset of the pixel array inside a packed DIB.
pub fn pixel_offset(dib: &[u8]) -> Result<usize> {
    let header_size = read_u32_le(dib, 0)
        .map_err(|_| Error::InvalidBitmap("missing BITMAPINFOHEADER".into()))?;

    if header_size == CORE_HEADER_SIZE {
        let bit_count = read_u16_le(dib, 10)?;
        let colors = if bit_count <= 8 { 1usize << bit_count } else { 0 };
        return Ok(CORE_HEADER_SIZE as usize + colors * 3);
    }
    if header_size < INFO_HEADER_SIZE {
        return Err(Error::InvalidBitmap(format!(
            "unsupported DIB header size {header_size}"
        )));
    }

    let bit_count = read_u16_le(dib, 14)?;
    let compression = read_u32_le(dib, 16)?;
    let clr_used = read_u32_le(dib, 32)? as usize;
    let colors = match (clr_used, bit_count) {
        (0, 1..=8) => 1usize << bit_count,
        (n, _) => n,
    };
    let masks = if header_size == INFO_HEADER_SIZE && compression == BI_BITFIELDS {
        12
    } else {
        0
    };
    Ok(header_size as usize + masks + colors * 4)
}

/// Decode a packed DIB into an RGBA image.
pub fn decode_dib(dib: &[u8]) -> Result<RgbaImage> {
    let offset = pixel_offset(dib)?;
    if offset > dib.len() {
        return Err(Error::InvalidBitmap(format!(
            "pixel data offset {offset} beyond {} bytes",
            dib.len()
        )));
    }

    let total = FILE_HEADER_SIZE + dib.len();
    let mut bmp = Vec::with_capacity(total);
    bmp.extend_from_slice(b"BM");
    put_u32_le(&mut bmp, u32::try_from(total).map_err(|_| Error::InvalidBitmap("DIB too large".into()))?);
    put_u16_le(&mut bmp, 0);
    put_u16_le(&mut bmp, 0);
    put_u32_le(&mut bmp, (FILE_HEADER_SIZE + offset) as u32);
    bmp.extend_from_slice(dib);

    let image = image::load_from_memory_with_format(&bmp, ImageFormat::Bmp)?;
    Ok(image.to_rgba8())
}

/// Encode an image as a packed 24-bit DIB.
pub fn encode_dib(image: &RgbaImage) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut bmp = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb).write_to(&mut bmp, ImageFormat::Bmp)?;
    let mut bytes = bmp.into_inner();
    if bytes.len() < FILE_HEADER_SIZE {
        return Err(Error::Image("BMP encoder produced no header".into()));
    }
    bytes.drain(..FILE_HEADER_SIZE);
    Ok(bytes)
}

/// Encode an image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 2x1 24-bit DIB: blue then red, bottom-up, rows padded to 4 bytes.
    fn tiny_dib() -> Vec<u8> {
        let mut dib = Vec::new();
        put_u32_le(&mut dib, 40);
        put_u32_le(&mut dib, 2); // width
        put_u32_le(&mut dib, 1); // height
        put_u16_le(&mut dib, 1); // planes
        put_u16_le(&mut dib, 24); // bit count
        put_u32_le(&mut dib, 0); // BI_RGB
        put_u32_le(&mut dib, 8); // image size
        put_u32_le(&mut dib, 0);
        put_u32_le(&mut dib, 0);
        put_u32_le(&mut dib, 0); // colors used
        put_u32_le(&mut dib, 0);
        dib.extend_from_slice(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00]);
        dib
    }

    #[test]
    fn test_pixel_offset_palette() {
        let mut dib = tiny_dib();
        dib[14] = 8; // 8 bpp, 256-entry palette
        assert_eq!(pixel_offset(&dib).unwrap(), 40 + 1024);
        dib[32] = 16; // 16 colors used
        assert_eq!(pixel_offset(&dib).unwrap(), 40 + 64);
    }

    #[test]
    fn test_decode_dib() {
        let img = decode_dib(&tiny_dib()).unwrap();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_encode_then_decode() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(2, 1, Rgba([10, 20, 30, 255]));
        let dib = encode_dib(&img).unwrap();
        assert_eq!(read_u32_le(&dib, 4).unwrap(), 3);
        let back = decode_dib(&dib).unwrap();
        assert_eq!(*back.get_pixel(2, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(decode_dib(&[1, 2, 3]).is_err());
        let mut dib = tiny_dib();
        dib.truncate(20);
        assert!(decode_dib(&dib).is_err());
    }
}
