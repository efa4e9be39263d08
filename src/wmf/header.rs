// Metafile header parsing
//
// A WMF file starts with an optional 22-byte Aldus placeable header followed
// by the 18-byte META_HEADER. Enhanced metafiles are recognised by the " EMF"
// signature of their first record so that callers get a clear answer instead
// of a garbage parse.

use std::mem::size_of;

use zerocopy::{FromBytes, I16, I32, IntoBytes, LE, U16, U32};
use zerocopy_derive::{
    FromBytes as DeriveFromBytes, Immutable, IntoBytes as DeriveIntoBytes, KnownLayout,
};

use super::constants::{
    DEFAULT_DPI, ENHMETA_SIGNATURE, ENHMETA_SIGNATURE_OFFSET, PLACEABLE_HEADER_SIZE,
    PLACEABLE_KEY, STANDARD_HEADER_SIZE, STANDARD_HEADER_WORDS,
};
use super::geometry::Rect;
use crate::common::binary::{read_i16_le, read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};

/// On-disk placeable header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, DeriveFromBytes, DeriveIntoBytes, Immutable, KnownLayout,
)]
#[repr(C)]
pub(crate) struct RawPlaceableHeader {
    pub key: U32<LE>,
    pub handle: U16<LE>,
    pub left: I16<LE>,
    pub top: I16<LE>,
    pub right: I16<LE>,
    pub bottom: I16<LE>,
    pub inch: U16<LE>,
    pub reserved: U32<LE>,
    pub checksum: U16<LE>,
}

impl RawPlaceableHeader {
    /// Header for `bounds` with a freshly computed checksum.
    pub fn new(bounds: Rect, inch: u16) -> Self {
        let mut raw = Self {
            key: U32::new(PLACEABLE_KEY),
            handle: U16::new(0),
            left: I16::new(clamp_i16(bounds.left)),
            top: I16::new(clamp_i16(bounds.top)),
            right: I16::new(clamp_i16(bounds.right())),
            bottom: I16::new(clamp_i16(bounds.bottom())),
            inch: U16::new(inch),
            reserved: U32::new(0),
            checksum: U16::new(0),
        };
        raw.checksum = U16::new(raw.compute_checksum());
        raw
    }

    /// XOR-fold of the ten words preceding the checksum field.
    pub fn compute_checksum(&self) -> u16 {
        let bytes = self.as_bytes();
        checksum(&bytes[..PLACEABLE_HEADER_SIZE - 2])
    }
}

/// On-disk META_HEADER.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, DeriveFromBytes, DeriveIntoBytes, Immutable, KnownLayout,
)]
#[repr(C)]
pub(crate) struct RawStandardHeader {
    pub file_type: U16<LE>,
    pub header_size: U16<LE>,
    pub version: U16<LE>,
    pub file_size: U32<LE>,
    pub num_objects: U16<LE>,
    pub max_record: U32<LE>,
    pub num_params: U16<LE>,
}

/// Leading fields of an EMR_HEADER record.
#[derive(Debug, Clone, Copy, DeriveFromBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawEnhancedHeader {
    record_type: U32<LE>,
    record_size: U32<LE>,
    bounds: [I32<LE>; 4],
    frame: [I32<LE>; 4],
    signature: U32<LE>,
    version: U32<LE>,
    size: U32<LE>,
    num_records: U32<LE>,
    num_handles: U16<LE>,
    reserved: U16<LE>,
}

/// XOR of the little-endian 16-bit words in `data`.
///
/// Applied to the first 20 bytes of a placeable header this yields the value
/// stored in its checksum field.
pub fn checksum(data: &[u8]) -> u16 {
    data.chunks_exact(2)
        .map(|w| u16::from_le_bytes([w[0], w[1]]))
        .fold(0, |acc, w| acc ^ w)
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Placeable (Aldus) header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceableHeader {
    pub handle: u16,
    pub bounds: Rect,
    /// Logical units per inch.
    pub inch: u16,
    pub checksum: u16,
}

/// META_HEADER fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardHeader {
    /// 1 = memory, 2 = disk
    pub file_type: u16,
    /// Header size in words (9 for every valid file)
    pub header_size: u16,
    pub version: u16,
    /// File size in words
    pub file_size: u32,
    pub num_objects: u16,
    /// Size of the largest record in words
    pub max_record: u32,
    pub num_params: u16,
}

impl From<&RawStandardHeader> for StandardHeader {
    fn from(raw: &RawStandardHeader) -> Self {
        Self {
            file_type: raw.file_type.get(),
            header_size: raw.header_size.get(),
            version: raw.version.get(),
            file_size: raw.file_size.get(),
            num_objects: raw.num_objects.get(),
            max_record: raw.max_record.get(),
            num_params: raw.num_params.get(),
        }
    }
}

/// Fields of an enhanced metafile's first record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnhancedHeader {
    /// Device-unit bounds
    pub bounds: Rect,
    /// Picture frame in 0.01 mm
    pub frame: Rect,
    pub version: u32,
    pub size: u32,
    pub num_records: u32,
    pub num_handles: u16,
}

/// Which header variant introduced the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Placeable(PlaceableHeader),
    Enhanced(EnhancedHeader),
    Standard,
}

/// Why a recognised header cannot be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDefect {
    ChecksumMismatch { stored: u16, computed: u16 },
    BadStandardHeader { header_size: u16, num_params: u16 },
    /// Zero-size record met while scanning for the window extent.
    ZeroSizeRecord { offset: usize },
    EnhancedNotSupported,
}

impl std::fmt::Display for HeaderDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderDefect::ChecksumMismatch { stored, computed } => write!(
                f,
                "placeable checksum mismatch: stored 0x{stored:04X}, computed 0x{computed:04X}"
            ),
            HeaderDefect::BadStandardHeader {
                header_size,
                num_params,
            } => write!(
                f,
                "bad standard header: size {header_size} words, {num_params} parameters"
            ),
            HeaderDefect::ZeroSizeRecord { offset } => {
                write!(f, "zero-size record at offset {offset}")
            },
            HeaderDefect::EnhancedNotSupported => write!(f, "enhanced metafiles are not playable"),
        }
    }
}

/// Parsed and validated metafile header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetafileHeader {
    pub kind: HeaderKind,
    /// META_HEADER, absent for enhanced files
    pub standard: Option<StandardHeader>,
    /// Placeable bounds, or the window scanned from a standard file
    pub bounding_rect: Rect,
    pub dpi: u16,
    pub num_objects: u16,
    /// Byte offset of the first record
    pub first_record_offset: usize,
    pub defect: Option<HeaderDefect>,
}

impl MetafileHeader {
    /// Parse the header at the start of `data`.
    ///
    /// Fails only when the buffer cannot hold any header at all; a header
    /// that is recognised but unusable is returned with `defect` set.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let key = read_u32_le(data, 0)
            .map_err(|_| Error::CorruptHeader("buffer too short for a metafile header".into()))?;
        if key == PLACEABLE_KEY {
            return Self::parse_placeable(data);
        }
        if let Some(header) = Self::parse_enhanced(data) {
            return Ok(header);
        }
        Self::parse_standard(data)
    }

    fn parse_placeable(data: &[u8]) -> Result<Self> {
        let (raw, rest) = RawPlaceableHeader::read_from_prefix(data)
            .map_err(|_| Error::CorruptHeader("placeable header truncated".into()))?;
        let (std_raw, _) = RawStandardHeader::read_from_prefix(rest)
            .map_err(|_| Error::CorruptHeader("standard header truncated".into()))?;

        let stored = raw.checksum.get();
        let computed = raw.compute_checksum();
        let defect = (stored != computed).then(|| {
            log::warn!("placeable header checksum 0x{stored:04X} != 0x{computed:04X}");
            HeaderDefect::ChecksumMismatch { stored, computed }
        });

        let bounds = Rect::from_ltrb(
            i32::from(raw.left.get()),
            i32::from(raw.top.get()),
            i32::from(raw.right.get()),
            i32::from(raw.bottom.get()),
        );
        let standard = StandardHeader::from(&std_raw);
        Ok(Self {
            kind: HeaderKind::Placeable(PlaceableHeader {
                handle: raw.handle.get(),
                bounds,
                inch: raw.inch.get(),
                checksum: stored,
            }),
            standard: Some(standard),
            bounding_rect: bounds,
            dpi: raw.inch.get(),
            num_objects: standard.num_objects,
            first_record_offset: PLACEABLE_HEADER_SIZE + STANDARD_HEADER_SIZE,
            defect,
        })
    }

    fn parse_enhanced(data: &[u8]) -> Option<Self> {
        let signature = read_u32_le(data, ENHMETA_SIGNATURE_OFFSET).ok()?;
        if signature != ENHMETA_SIGNATURE || data.len() < size_of::<RawEnhancedHeader>() {
            return None;
        }
        let (raw, _) = RawEnhancedHeader::read_from_prefix(data).ok()?;
        let rect = |r: &[I32<LE>; 4]| Rect::from_ltrb(r[0].get(), r[1].get(), r[2].get(), r[3].get());
        let enhanced = EnhancedHeader {
            bounds: rect(&raw.bounds),
            frame: rect(&raw.frame),
            version: raw.version.get(),
            size: raw.size.get(),
            num_records: raw.num_records.get(),
            num_handles: raw.num_handles.get(),
        };
        log::debug!("enhanced metafile detected, {} records", enhanced.num_records);
        Some(Self {
            kind: HeaderKind::Enhanced(enhanced),
            standard: None,
            bounding_rect: enhanced.bounds,
            dpi: DEFAULT_DPI,
            num_objects: enhanced.num_handles,
            first_record_offset: raw.record_size.get() as usize,
            defect: Some(HeaderDefect::EnhancedNotSupported),
        })
    }

    fn parse_standard(data: &[u8]) -> Result<Self> {
        let (std_raw, _) = RawStandardHeader::read_from_prefix(data)
            .map_err(|_| Error::CorruptHeader("standard header truncated".into()))?;
        let standard = StandardHeader::from(&std_raw);

        let mut header = Self {
            kind: HeaderKind::Standard,
            standard: Some(standard),
            bounding_rect: Rect::default(),
            dpi: DEFAULT_DPI,
            num_objects: standard.num_objects,
            first_record_offset: STANDARD_HEADER_SIZE,
            defect: None,
        };

        if standard.header_size != STANDARD_HEADER_WORDS || standard.num_params != 0 {
            log::warn!(
                "incorrect standard header: size {}, params {}",
                standard.header_size,
                standard.num_params
            );
            header.defect = Some(HeaderDefect::BadStandardHeader {
                header_size: standard.header_size,
                num_params: standard.num_params,
            });
            return Ok(header);
        }

        match scan_window(data, STANDARD_HEADER_SIZE) {
            Ok(rect) => header.bounding_rect = rect,
            Err(offset) => {
                log::warn!("zero-size record at offset {offset} while scanning the window");
                header.defect = Some(HeaderDefect::ZeroSizeRecord { offset });
            },
        }
        Ok(header)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.defect.is_none()
    }

    #[inline]
    pub fn is_placeable(&self) -> bool {
        matches!(self.kind, HeaderKind::Placeable(_))
    }

    #[inline]
    pub fn is_enhanced(&self) -> bool {
        matches!(self.kind, HeaderKind::Enhanced(_))
    }

    #[inline]
    pub fn is_standard(&self) -> bool {
        matches!(self.kind, HeaderKind::Standard)
    }
}

/// Derive the window of a standard file from its SetWindowOrg/SetWindowExt
/// records: the smallest origin and the largest extent seen anywhere.
///
/// Returns the offset of a zero-size record if one stops the scan.
fn scan_window(data: &[u8], start: usize) -> std::result::Result<Rect, usize> {
    const SET_WINDOW_ORG: u16 = 11;
    const SET_WINDOW_EXT: u16 = 12;

    let mut rect = Rect::default();
    let (mut first_org, mut first_ext) = (true, true);
    let mut offset = start;

    loop {
        let (Ok(size), Ok(function)) = (read_u32_le(data, offset), read_u16_le(data, offset + 4))
        else {
            log::debug!("window scan ran off the end at offset {offset}");
            break;
        };
        if size == 0 {
            return Err(offset);
        }
        let function = function & 0xFF;
        let param = |i: usize| read_i16_le(data, offset + 6 + i * 2).ok().map(i32::from);

        match function {
            SET_WINDOW_ORG => {
                if let (Some(top), Some(left)) = (param(0), param(1)) {
                    if first_org {
                        first_org = false;
                        rect.left = left;
                        rect.top = top;
                    } else {
                        rect.left = rect.left.min(left);
                        rect.top = rect.top.min(top);
                    }
                }
            },
            SET_WINDOW_EXT => {
                if let (Some(height), Some(width)) = (param(0), param(1)) {
                    let (width, height) = (width.abs(), height.abs());
                    if first_ext {
                        first_ext = false;
                        rect.width = width;
                        rect.height = height;
                    } else {
                        rect.width = rect.width.max(width);
                        rect.height = rect.height.max(height);
                    }
                }
            },
            0 => break,
            _ => {},
        }

        match (size as usize)
            .checked_mul(2)
            .and_then(|n| offset.checked_add(n))
        {
            Some(next) => offset = next,
            None => break,
        }
    }
    Ok(rect)
}
