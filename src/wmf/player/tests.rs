use proptest::prelude::*;
use zerocopy::IntoBytes;
use zerocopy::byteorder::little_endian::{U16, U32};

use super::*;
use crate::common::binary::{put_i16_le, put_u16_le, put_u32_le};
use crate::wmf::constants::{STANDARD_HEADER_WORDS, record as fun};
use crate::wmf::geometry::{Point, Rect};
use crate::wmf::header::{RawPlaceableHeader, RawStandardHeader};
use crate::wmf::objects::{Color, ExtTextOutOptions, Pen, PenStyle};
use crate::wmf::target::{Call, Recorder};
use crate::wmf::transform::Matrix;

const BOUNDS: Rect = Rect::new(0, 0, 100, 100);

/// Placeable metafile assembled record by record.
struct Stream {
    data: Vec<u8>,
}

impl Stream {
    fn new(num_objects: u16) -> Self {
        let mut data = RawPlaceableHeader::new(BOUNDS, 96).as_bytes().to_vec();
        let standard = RawStandardHeader {
            file_type: U16::new(1),
            header_size: U16::new(STANDARD_HEADER_WORDS),
            version: U16::new(0x0300),
            file_size: U32::new(0),
            num_objects: U16::new(num_objects),
            max_record: U32::new(0),
            num_params: U16::new(0),
        };
        data.extend_from_slice(standard.as_bytes());
        Self { data }
    }

    /// Record whose size field is taken verbatim.
    fn raw(mut self, size: u32, function: u16, payload: &[u8]) -> Self {
        put_u32_le(&mut self.data, size);
        put_u16_le(&mut self.data, function);
        self.data.extend_from_slice(payload);
        self
    }

    fn record(self, function: u16, params: &[i16]) -> Self {
        let mut payload = Vec::new();
        for p in params {
            put_i16_le(&mut payload, *p);
        }
        self.bytes(function, &payload)
    }

    fn bytes(self, function: u16, payload: &[u8]) -> Self {
        let size = 3 + payload.len().div_ceil(2) as u32;
        let mut payload = payload.to_vec();
        if payload.len() % 2 == 1 {
            payload.push(0);
        }
        self.raw(size, function, &payload)
    }

    fn end(self) -> Vec<u8> {
        self.record(fun::EOF, &[]).data
    }
}

/// Split a COLORREF into the two words a record stores.
fn colorref(value: u32) -> [i16; 2] {
    [(value & 0xFFFF) as u16 as i16, (value >> 16) as u16 as i16]
}

fn pen_record(style: i16, width: i16, color: u32) -> Vec<i16> {
    let [lo, hi] = colorref(color);
    vec![style, width, 0, lo, hi]
}

fn run(data: &[u8], options: PlayOptions) -> (PlayReport, Vec<Call>) {
    let header = MetafileHeader::parse(data).unwrap();
    let mut rec = Recorder::new();
    let report = play(&header, data, &mut rec, &options);
    (report, rec.into_calls())
}

fn play_default(data: &[u8]) -> (PlayReport, Vec<Call>) {
    run(data, PlayOptions::default())
}

/// 1x1 24-bit DIB with a single pixel.
fn pixel_dib(b: u8, g: u8, r: u8) -> Vec<u8> {
    let mut dib = Vec::new();
    put_u32_le(&mut dib, 40);
    put_u32_le(&mut dib, 1);
    put_u32_le(&mut dib, 1);
    put_u16_le(&mut dib, 1);
    put_u16_le(&mut dib, 24);
    for _ in 0..6 {
        put_u32_le(&mut dib, 0);
    }
    dib.extend_from_slice(&[b, g, r, 0]);
    dib
}

#[test]
fn test_zero_size_record_aborts_after_window_org() {
    let mut payload = Vec::new();
    put_i16_le(&mut payload, 10); // top
    put_i16_le(&mut payload, 20); // left
    let data = Stream::new(0)
        .raw(5, fun::SET_WINDOW_ORG, &payload)
        .raw(0, 0x0063, &[])
        .data;

    let (report, calls) = play_default(&data);
    assert_eq!(
        report.state,
        PlayState::Aborted(AbortReason::CorruptStream { offset: 50 })
    );
    assert_eq!(
        calls,
        vec![
            Call::Begin(BOUNDS),
            Call::SetWindowOrg(Point::new(20, 10)),
            Call::End
        ]
    );
}

#[test]
fn test_unsupported_opcode_aborts() {
    let data = Stream::new(0)
        .record(fun::MOVE_TO, &[1, 2])
        .record(0x0044, &[])
        .record(fun::LINE_TO, &[3, 4])
        .end();
    let (report, calls) = play_default(&data);
    assert_eq!(
        report.state,
        PlayState::Aborted(AbortReason::UnsupportedOpcode {
            function: 0x0044,
            offset: 50
        })
    );
    assert!(!calls.iter().any(|c| matches!(c, Call::LineTo(_))));
    assert_eq!(calls.last(), Some(&Call::End));
}

#[test]
fn test_missing_end_record_is_corrupt() {
    let data = Stream::new(0).record(fun::MOVE_TO, &[1, 2]).data;
    let (report, _) = play_default(&data);
    assert!(matches!(
        report.state,
        PlayState::Aborted(AbortReason::CorruptStream { .. })
    ));
}

#[test]
fn test_complete_stream_is_done() {
    let data = Stream::new(0)
        .record(fun::MOVE_TO, &[10, 5])
        .record(fun::LINE_TO, &[20, 15])
        .end();
    let (report, calls) = play_default(&data);
    assert!(report.is_complete());
    assert_eq!(report.records, 3);
    assert_eq!(
        calls,
        vec![
            Call::Begin(BOUNDS),
            Call::MoveTo(Point::new(5, 10)),
            Call::LineTo(Point::new(15, 20)),
            Call::End
        ]
    );
}

#[test]
fn test_handle_overflow_keeps_playing() {
    let data = Stream::new(1)
        .record(fun::CREATE_PEN_INDIRECT, &pen_record(0, 1, 0x0000FF))
        .record(fun::CREATE_PEN_INDIRECT, &pen_record(0, 2, 0x00FF00))
        .record(fun::SELECT_OBJECT, &[0])
        .record(fun::LINE_TO, &[7, 8])
        .end();
    let (report, calls) = play_default(&data);
    assert!(report.stack_overflow);
    assert!(report.is_complete());
    assert!(calls.contains(&Call::SetPen(Pen::new(
        PenStyle::Solid,
        1,
        Color::rgb(255, 0, 0)
    ))));
    assert!(calls.contains(&Call::LineTo(Point::new(8, 7))));
}

#[test]
fn test_dangling_select_is_skipped() {
    let data = Stream::new(2)
        .record(fun::SELECT_OBJECT, &[1])
        .record(fun::DELETE_OBJECT, &[0])
        .record(fun::RECTANGLE, &[40, 30, 20, 10])
        .end();
    let (report, calls) = play_default(&data);
    assert_eq!(report.dangling_handles, 2);
    assert!(report.is_complete());
    assert!(!calls.iter().any(|c| matches!(c, Call::SetPen(_))));
    assert!(calls.contains(&Call::DrawRect(Rect::from_ltrb(10, 20, 30, 40))));
}

#[test]
fn test_deleted_slot_is_reused() {
    let data = Stream::new(1)
        .record(fun::CREATE_PEN_INDIRECT, &pen_record(0, 1, 0))
        .record(fun::DELETE_OBJECT, &[0])
        .record(fun::CREATE_BRUSH_INDIRECT, &[0, 0xFF, 0, 0])
        .record(fun::SELECT_OBJECT, &[0])
        .end();
    let (report, calls) = play_default(&data);
    assert!(!report.stack_overflow);
    assert!(calls.iter().any(|c| matches!(c, Call::SetBrush(b) if b.color == Color::rgb(255, 0, 0))));
}

#[test]
fn test_placeholder_objects_take_slots() {
    let data = Stream::new(2)
        .record(fun::CREATE_PALETTE, &[0x0300, 0])
        .record(fun::CREATE_PEN_INDIRECT, &pen_record(5, 0, 0))
        .record(fun::SELECT_OBJECT, &[1])
        .record(fun::SELECT_OBJECT, &[0])
        .end();
    let (_, calls) = play_default(&data);
    let pens: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::SetPen(p) => Some(p.style),
            _ => None,
        })
        .collect();
    assert_eq!(pens, vec![PenStyle::Null, PenStyle::Solid]);
}

#[test]
fn test_absolute_window_records() {
    let data = Stream::new(0)
        .record(fun::SET_WINDOW_ORG, &[-10, -20])
        .record(fun::SET_WINDOW_EXT, &[200, 400])
        .record(fun::OFFSET_WINDOW_ORG, &[5, 5])
        .record(fun::SCALE_WINDOW_EXT, &[2, 1, 2, 1])
        .end();
    let (_, calls) = play_default(&data);
    assert_eq!(
        &calls[1..5],
        &[
            Call::SetWindowOrg(Point::new(-20, -10)),
            Call::SetWindowExt {
                width: 400,
                height: 200
            },
            Call::SetWindowOrg(Point::new(-15, -5)),
            Call::SetWindowExt {
                width: 200,
                height: 100
            },
        ]
    );
}

#[test]
fn test_relative_window_records_become_matrices() {
    let data = Stream::new(0)
        .record(fun::SET_WINDOW_ORG, &[50, 50])
        .record(fun::SET_WINDOW_EXT, &[200, 200])
        .end();
    let options = PlayOptions {
        coordinate_mode: CoordinateMode::Relative,
        ..PlayOptions::default()
    };
    let (_, calls) = run(&data, options);
    assert!(!calls.iter().any(|c| matches!(c, Call::SetWindowOrg(_) | Call::SetWindowExt { .. })));

    // replaying the combined matrices reproduces the window mapping
    let world = calls.iter().fold(Matrix::IDENTITY, |world, c| match c {
        Call::SetMatrix {
            matrix,
            combine: true,
        } => matrix.then(&world),
        _ => world,
    });
    let (x, y) = world.map(50.0, 50.0);
    assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
    let (x, y) = world.map(250.0, 250.0);
    assert!((x - 100.0).abs() < 1e-9 && (y - 100.0).abs() < 1e-9);
}

#[test]
fn test_refused_begin_skips_everything() {
    let data = Stream::new(0).record(fun::LINE_TO, &[1, 1]).end();
    let header = MetafileHeader::parse(&data).unwrap();
    let mut rec = Recorder::refusing();
    let report = play(&header, &data, &mut rec, &PlayOptions::default());
    assert_eq!(report.state, PlayState::Aborted(AbortReason::TargetRefused));
    assert!(rec.calls().is_empty());
}

#[test]
fn test_invalid_header_never_begins() {
    let mut data = Stream::new(0).end();
    data[20] ^= 0xFF;
    let header = MetafileHeader::parse(&data).unwrap();
    let mut rec = Recorder::new();
    let report = play(&header, &data, &mut rec, &PlayOptions::default());
    assert_eq!(report.state, PlayState::Aborted(AbortReason::InvalidHeader));
    assert!(rec.calls().is_empty());
}

#[test]
fn test_step_limit() {
    let data = Stream::new(0)
        .record(fun::MOVE_TO, &[0, 0])
        .record(fun::LINE_TO, &[1, 1])
        .record(fun::LINE_TO, &[2, 2])
        .end();
    let options = PlayOptions {
        max_records: Some(2),
        ..PlayOptions::default()
    };
    let (report, calls) = run(&data, options);
    assert_eq!(report.state, PlayState::Aborted(AbortReason::StepLimit));
    assert_eq!(report.records, 2);
    assert_eq!(calls.iter().filter(|c| c.is_drawing()).count(), 1);
    assert_eq!(calls.last(), Some(&Call::End));
}

#[test]
fn test_truncated_record_is_skipped() {
    let data = Stream::new(0)
        .record(fun::LINE_TO, &[1])
        .record(fun::MOVE_TO, &[4, 3])
        .end();
    let (report, calls) = play_default(&data);
    assert_eq!(report.skipped_records, 1);
    assert!(report.is_complete());
    assert!(calls.contains(&Call::MoveTo(Point::new(3, 4))));
}

#[test]
fn test_replay_is_deterministic() {
    let data = Stream::new(2)
        .record(fun::CREATE_PEN_INDIRECT, &pen_record(1, 3, 0x123456))
        .record(fun::SELECT_OBJECT, &[0])
        .record(fun::SELECT_OBJECT, &[1])
        .record(fun::ELLIPSE, &[90, 90, 10, 10])
        .end();
    assert_eq!(play_default(&data), play_default(&data));
}

#[test]
fn test_set_pixel_restores_pen_and_position() {
    let [lo, hi] = colorref(0x0000FF);
    let data = Stream::new(0)
        .record(fun::MOVE_TO, &[1, 1])
        .record(fun::SET_PIXEL, &[lo, hi, 30, 40])
        .end();
    let (_, calls) = play_default(&data);
    let red = Pen::new(PenStyle::Solid, 0, Color::rgb(255, 0, 0));
    assert_eq!(
        &calls[2..],
        &[
            Call::SetPen(red),
            Call::MoveTo(Point::new(40, 30)),
            Call::LineTo(Point::new(40, 30)),
            Call::SetPen(Pen::default()),
            Call::MoveTo(Point::new(1, 1)),
            Call::End
        ]
    );
}

#[test]
fn test_restore_dc_levels() {
    let data = Stream::new(0)
        .record(fun::SAVE_DC, &[])
        .record(fun::SAVE_DC, &[])
        .record(fun::SAVE_DC, &[])
        .record(fun::RESTORE_DC, &[-1])
        .record(fun::RESTORE_DC, &[1])
        .record(fun::RESTORE_DC, &[-5])
        .end();
    let (_, calls) = play_default(&data);
    assert_eq!(calls.iter().filter(|c| **c == Call::Save).count(), 3);
    assert_eq!(calls.iter().filter(|c| **c == Call::Restore).count(), 3);
}

#[test]
fn test_clip_records() {
    let data = Stream::new(0)
        .record(fun::INTERSECT_CLIP_RECT, &[50, 50, 0, 0])
        .record(fun::EXCLUDE_CLIP_RECT, &[50, 50, 25, 25])
        .end();
    let (_, calls) = play_default(&data);
    let regions: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::SetClipRegion(Some(r)) => Some(r.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(regions.len(), 2);
    assert!(regions[0].contains(Point::new(30, 30)));
    assert!(!regions[1].contains(Point::new(30, 30)));
    assert!(regions[1].contains(Point::new(10, 10)));
}

#[test]
fn test_exclude_without_clip_uses_window() {
    let data = Stream::new(0)
        .record(fun::EXCLUDE_CLIP_RECT, &[60, 60, 40, 40])
        .end();
    let (_, calls) = play_default(&data);
    let Some(Call::SetClipRegion(Some(region))) = calls.get(1) else {
        panic!("expected a clip region, got {calls:?}");
    };
    assert!(region.contains(Point::new(5, 5)));
    assert!(!region.contains(Point::new(50, 50)));
    assert_eq!(region.bounding_rect(), Some(BOUNDS));
}

#[test]
fn test_arc_angles() {
    // bounds (0,0)-(100,100); start at 3 o'clock, end at 12 o'clock
    let data = Stream::new(0)
        .record(fun::ARC, &[0, 50, 50, 100, 100, 100, 0, 0])
        .end();
    let (_, calls) = play_default(&data);
    assert_eq!(
        calls[1],
        Call::DrawArc {
            rect: Rect::new(0, 0, 100, 100),
            start: 0,
            sweep: 1440
        }
    );
}

#[test]
fn test_round_rect_corner_percentages() {
    let data = Stream::new(0)
        .record(fun::ROUND_RECT, &[20, 50, 100, 200, 0, 0])
        .end();
    let (_, calls) = play_default(&data);
    assert_eq!(
        calls[1],
        Call::DrawRoundRect {
            rect: Rect::new(0, 0, 200, 100),
            x_round: 25,
            y_round: 20
        }
    );
}

#[test]
fn test_poly_polygon_and_fill_mode() {
    let data = Stream::new(0)
        .record(fun::SET_POLY_FILL_MODE, &[2])
        .record(
            fun::POLY_POLYGON,
            &[2, 3, 3, 0, 0, 10, 0, 0, 10, 20, 20, 30, 20, 20, 30],
        )
        .end();
    let (_, calls) = play_default(&data);
    let Call::DrawPolyPolygon { polygons, winding } = &calls[1] else {
        panic!("expected a poly-polygon, got {:?}", calls[1]);
    };
    assert!(*winding);
    assert_eq!(polygons.len(), 2);
    assert_eq!(polygons[1][2], Point::new(20, 30));
}

#[test]
fn test_text_out_decodes_windows_1252() {
    let mut payload = Vec::new();
    put_u16_le(&mut payload, 3);
    payload.extend_from_slice(&[b'c', 0xE9, b'!', 0]);
    put_i16_le(&mut payload, 40); // y
    put_i16_le(&mut payload, 30); // x
    let data = Stream::new(0)
        .record(fun::SET_TEXT_COLOR, &colorref(0x00FF00))
        .bytes(fun::TEXT_OUT, &payload)
        .end();
    let (_, calls) = play_default(&data);
    let Call::DrawText(run) = &calls[1] else {
        panic!("expected text, got {:?}", calls[1]);
    };
    assert_eq!(run.text, "c\u{e9}!");
    assert_eq!(run.position, Point::new(30, 40));
    assert_eq!(run.color, Color::rgb(0, 255, 0));
}

#[test]
fn test_ext_text_out_rect_and_dx() {
    let mut payload = Vec::new();
    for v in [5i16, 6, 2, 0x0004, 0, 0, 50, 20] {
        put_i16_le(&mut payload, v);
    }
    payload.extend_from_slice(b"hi");
    put_i16_le(&mut payload, 7);
    put_i16_le(&mut payload, 8);
    let data = Stream::new(0)
        .record(fun::SET_TEXT_ALIGN, &[0x0001])
        .record(fun::MOVE_TO, &[100, 200])
        .bytes(fun::EXT_TEXT_OUT, &payload)
        .record(fun::LINE_TO, &[0, 0])
        .end();
    let (_, calls) = play_default(&data);
    let Call::DrawText(run) = &calls[2] else {
        panic!("expected text, got {:?}", calls[2]);
    };
    assert_eq!(run.text, "hi");
    assert_eq!(run.options, ExtTextOutOptions::CLIPPED);
    assert_eq!(run.rect, Some(Rect::from_ltrb(0, 0, 50, 20)));
    assert_eq!(run.dx, vec![7, 8]);
    // current position is used instead of the record's point
    assert_eq!(run.position, Point::new(200, 100));
}

#[test]
fn test_font_rotation_follows_selected_font() {
    let mut payload = Vec::new();
    for v in [-12i16, 0, 900, 900, 700] {
        put_i16_le(&mut payload, v);
    }
    payload.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 1]);
    payload.extend_from_slice(b"Courier New\0");
    let mut text = Vec::new();
    put_u16_le(&mut text, 1);
    text.extend_from_slice(b"A\0");
    put_i16_le(&mut text, 0);
    put_i16_le(&mut text, 0);
    let data = Stream::new(1)
        .bytes(fun::CREATE_FONT_INDIRECT, &payload)
        .record(fun::SELECT_OBJECT, &[0])
        .bytes(fun::TEXT_OUT, &text)
        .end();
    let (_, calls) = play_default(&data);
    let Call::SetFont(font) = &calls[1] else {
        panic!("expected a font, got {:?}", calls[1]);
    };
    assert_eq!(font.family, "Courier New");
    assert!(font.italic && font.is_bold() && font.fixed_pitch);
    let Call::DrawText(run) = &calls[2] else {
        panic!("expected text, got {:?}", calls[2]);
    };
    assert_eq!(run.rotation, -90.0);
}

#[test]
fn test_stretch_dib_with_flip() {
    let mut payload = Vec::new();
    put_u32_le(&mut payload, crate::wmf::constants::rop3::SRCCOPY);
    for v in [0i16, 1, 1, 0, 0, 20, -10, 5, 30] {
        put_i16_le(&mut payload, v);
    }
    payload.extend(pixel_dib(0, 0, 255));
    let data = Stream::new(0).bytes(fun::STRETCH_DIB, &payload).end();
    let (report, calls) = play_default(&data);
    assert_eq!(report.skipped_records, 0);
    assert_eq!(
        &calls[1..7],
        &[
            Call::Save,
            Call::SetCompositionMode(crate::wmf::objects::CompositionMode::Source),
            Call::SetMatrix {
                matrix: Matrix::new(-1.0, 0.0, 0.0, 1.0, 50.0, 0.0),
                combine: true
            },
            Call::DrawImage {
                dest: Rect::new(20, 5, 10, 20),
                source: Rect::new(0, 0, 1, 1),
                width: 1,
                height: 1
            },
            Call::Restore,
            Call::End,
        ]
    );
}

#[test]
fn test_stretch_dib_flip_composes_mirror_and_shift() {
    let mut payload = Vec::new();
    put_u32_le(&mut payload, crate::wmf::constants::rop3::SRCCOPY);
    for v in [0i16, 1, 1, 0, 0, -20, 10, 25, 30] {
        put_i16_le(&mut payload, v);
    }
    payload.extend(pixel_dib(0, 0, 255));
    let data = Stream::new(0).bytes(fun::STRETCH_DIB, &payload).end();
    let (_, calls) = play_default(&data);
    let Call::SetMatrix { matrix, combine } = &calls[3] else {
        panic!("expected a mirror, got {:?}", calls[3]);
    };
    assert!(*combine);
    let expected = Matrix::FLIP_VERTICAL.then(&Matrix::translation(0.0, 30.0));
    assert_eq!(*matrix, expected);
    // the mirror maps the destination onto itself, edges swapped
    assert_eq!(matrix.map(30.0, 5.0), (30.0, 25.0));
}

#[test]
fn test_bad_bitmap_is_skipped() {
    let mut payload = Vec::new();
    put_u32_le(&mut payload, crate::wmf::constants::rop3::SRCCOPY);
    for v in [1i16, 1, 0, 0, 0, 10, 10, 0, 0, 0] {
        put_i16_le(&mut payload, v);
    }
    payload.extend_from_slice(&[9, 9, 9, 9]);
    let data = Stream::new(0)
        .bytes(fun::DIB_STRETCH_BLT, &payload)
        .record(fun::MOVE_TO, &[1, 1])
        .end();
    let (report, calls) = play_default(&data);
    assert_eq!(report.skipped_records, 1);
    assert!(report.is_complete());
    assert!(!calls.iter().any(|c| matches!(c, Call::DrawImage { .. })));
}

#[test]
fn test_bit_blt_without_bitmap_fills_with_brush() {
    let mut payload = Vec::new();
    put_u32_le(&mut payload, crate::wmf::constants::rop3::PATCOPY);
    for v in [0i16, 0, 0, 10, 10, 2, 3] {
        put_i16_le(&mut payload, v);
    }
    let data = Stream::new(0).bytes(fun::DIB_BIT_BLT, &payload).end();
    let (_, calls) = play_default(&data);
    assert!(calls.contains(&Call::DrawRect(Rect::new(3, 2, 10, 10))));
}

#[test]
fn test_pat_blt_fills_with_brush() {
    let mut payload = Vec::new();
    put_u32_le(&mut payload, crate::wmf::constants::rop3::PATCOPY);
    for v in [10i16, 20, 2, 3] {
        put_i16_le(&mut payload, v);
    }
    let data = Stream::new(0).bytes(fun::PAT_BLT, &payload).end();
    let (report, calls) = play_default(&data);
    assert_eq!(report.skipped_records, 0);
    assert_eq!(calls[1], Call::Save);
    assert!(calls.contains(&Call::DrawRect(Rect::new(3, 2, 20, 10))));
    assert_eq!(calls[calls.len() - 2], Call::Restore);
}

#[test]
fn test_pat_blt_negative_extent_is_normalized() {
    let mut payload = Vec::new();
    put_u32_le(&mut payload, crate::wmf::constants::rop3::PATCOPY);
    for v in [-10i16, -20, 30, 40] {
        put_i16_le(&mut payload, v);
    }
    let data = Stream::new(0).bytes(fun::PAT_BLT, &payload).end();
    let (_, calls) = play_default(&data);
    assert!(calls.contains(&Call::DrawRect(Rect::new(20, 20, 20, 10))));
}

#[test]
fn test_viewport_records() {
    let data = Stream::new(0)
        .record(fun::SET_VIEWPORT_ORG, &[10, 20])
        .record(fun::SET_VIEWPORT_EXT, &[300, 400])
        .record(fun::OFFSET_VIEWPORT_ORG, &[-5, 5])
        .record(fun::SCALE_VIEWPORT_EXT, &[2, 1, 1, 2])
        .end();
    let (report, calls) = play_default(&data);
    assert_eq!(report.skipped_records, 0);
    assert_eq!(
        &calls[1..5],
        &[
            Call::SetViewportOrg(Point::new(20, 10)),
            Call::SetViewportExt {
                width: 400,
                height: 300
            },
            Call::SetViewportOrg(Point::new(25, 5)),
            Call::SetViewportExt {
                width: 800,
                height: 150
            },
        ]
    );
}

#[test]
fn test_scale_viewport_ext_starts_from_window() {
    let data = Stream::new(0)
        .record(fun::SCALE_VIEWPORT_EXT, &[2, 1, 2, 1])
        .record(fun::SCALE_VIEWPORT_EXT, &[0, 1, 1, 1])
        .end();
    let (_, calls) = play_default(&data);
    let extents: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, Call::SetViewportExt { .. }))
        .collect();
    // zero denominators leave the viewport alone
    assert_eq!(
        extents,
        [&Call::SetViewportExt {
            width: 50,
            height: 50
        }]
    );
}

/// ExtTextOut payload at (0, 0) whose glyphs all advance by `advance`.
fn wide_text(count: u16, advance: i16) -> Vec<u8> {
    let mut payload = Vec::new();
    put_i16_le(&mut payload, 0);
    put_i16_le(&mut payload, 0);
    put_u16_le(&mut payload, count);
    put_u16_le(&mut payload, 0);
    payload.resize(payload.len() + usize::from(count), b'x');
    if count % 2 == 1 {
        payload.push(0);
    }
    for _ in 0..count {
        put_i16_le(&mut payload, advance);
    }
    payload
}

#[test]
fn test_update_cp_advance_saturates() {
    let text = wide_text(u16::MAX, i16::MAX);
    let data = Stream::new(0)
        .record(fun::SET_TEXT_ALIGN, &[0x0001])
        .bytes(fun::EXT_TEXT_OUT, &text)
        .bytes(fun::EXT_TEXT_OUT, &text)
        .bytes(fun::EXT_TEXT_OUT, &wide_text(1, 1))
        .end();
    let (report, calls) = play_default(&data);
    assert!(report.is_complete());
    let positions: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::DrawText(run) => Some(run.position.x),
            _ => None,
        })
        .collect();
    assert_eq!(positions, [0, 2_147_385_345, i32::MAX]);
}

#[cfg(feature = "paint")]
#[test]
fn test_winding_poly_polygon_paints_even_odd() {
    use crate::wmf::target::PaintTarget;

    let [lo, hi] = colorref(0x0000FF);
    let data = Stream::new(2)
        .record(fun::CREATE_BRUSH_INDIRECT, &[0, lo, hi, 0])
        .record(fun::SELECT_OBJECT, &[0])
        .record(fun::CREATE_PEN_INDIRECT, &pen_record(5, 0, 0))
        .record(fun::SELECT_OBJECT, &[1])
        .record(fun::SET_POLY_FILL_MODE, &[2])
        .record(
            fun::POLY_POLYGON,
            &[
                2, 4, 4, 0, 0, 100, 0, 100, 100, 0, 100, 0, 0, 100, 0, 100, 100, 0, 100,
            ],
        )
        .record(fun::RECTANGLE, &[100, 10, 90, 0])
        .end();
    let header = MetafileHeader::parse(&data).unwrap();
    let mut target = PaintTarget::new(100, 100).with_background(Some(Color::WHITE));
    let report = play(&header, &data, &mut target, &PlayOptions::default());
    assert!(report.is_complete());
    let image = target.to_image().unwrap();
    // overlapping contours cancel out
    assert_eq!(image.get_pixel(50, 50).0, [255, 255, 255, 255]);
    // the brush itself is live
    assert_eq!(image.get_pixel(5, 95).0, [255, 0, 0, 255]);
}

proptest! {
    #[test]
    fn prop_arbitrary_records_never_panic(body in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut data = Stream::new(4).data;
        data.extend_from_slice(&body);
        let header = MetafileHeader::parse(&data).unwrap();
        let mut rec = Recorder::new();
        let report = play(&header, &data, &mut rec, &PlayOptions::default());
        prop_assert!(report.state != PlayState::Running);
        prop_assert_eq!(rec.calls().first(), Some(&Call::Begin(BOUNDS)));
        prop_assert_eq!(rec.calls().last(), Some(&Call::End));
    }
}
