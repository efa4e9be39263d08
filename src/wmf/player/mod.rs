//! Record dispatcher.
//!
//! [`play`] walks the record stream of a parsed metafile and turns each
//! record into [`RenderTarget`] calls. Per-playback state (handle table,
//! window transform, current position, text attributes) lives in an
//! [`InterpreterContext`] that is created fresh for every run, so playing
//! the same metafile twice always produces the same calls.
//!
//! Malformed individual records are skipped; a broken record stream or an
//! opcode outside the dispatch table ends the run with
//! [`PlayState::Aborted`]. Either way the target sees a balanced
//! `begin`/`end` pair.

mod handlers;
mod table;

#[cfg(test)]
mod tests;

pub use table::{FUNCTIONS, FunctionEntry, Handler};

use std::collections::VecDeque;

use crate::common::error::Error;

use super::geometry::Point;
use super::handles::HandleTable;
use super::header::MetafileHeader;
use super::objects::{Color, Font, TextAlign};
use super::record::{RecordReader, function_index};
use super::target::RenderTarget;
use super::transform::{
    CoordinateMode, TransformCall, TransformCalls, Viewport, WindowTransform,
};

/// Records traced before a step limit is reached.
const TRACE_DEPTH: usize = 12;

/// Playback options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayOptions {
    pub coordinate_mode: CoordinateMode,
    /// Stop after this many records; the last few are traced at debug level.
    pub max_records: Option<usize>,
}

/// Why a playback stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// A record header was undersized or ran past the buffer.
    CorruptStream { offset: usize },
    /// The function has no entry in the dispatch table.
    UnsupportedOpcode { function: u16, offset: usize },
    /// `max_records` was reached.
    StepLimit,
    /// The target's `begin` returned false.
    TargetRefused,
    /// The header was not usable.
    InvalidHeader,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CorruptStream { offset } => write!(f, "corrupt record stream at offset {offset}"),
            Self::UnsupportedOpcode { function, offset } => {
                write!(f, "unsupported function 0x{function:04X} at offset {offset}")
            },
            Self::StepLimit => write!(f, "record limit reached"),
            Self::TargetRefused => write!(f, "render target refused to begin"),
            Self::InvalidHeader => write!(f, "metafile header is not valid"),
        }
    }
}

/// How a playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    NotStarted,
    Running,
    /// The end-of-file record was reached.
    Done,
    Aborted(AbortReason),
}

/// Summary of one playback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayReport {
    pub state: PlayState,
    /// Records dispatched, end record included
    pub records: usize,
    /// Records whose parameters could not be decoded
    pub skipped_records: usize,
    /// Select/delete requests naming an empty slot
    pub dangling_handles: usize,
    /// Set once the handle table overflowed; later creations are dropped
    pub stack_overflow: bool,
}

impl PlayReport {
    /// Whether the end-of-file record was reached.
    pub fn is_complete(&self) -> bool {
        self.state == PlayState::Done
    }
}

/// Mutable state of one playback.
#[derive(Debug)]
pub struct InterpreterContext<'h> {
    pub header: &'h MetafileHeader,
    pub handles: HandleTable,
    pub transform: WindowTransform,
    pub viewport: Viewport,
    /// Non-zero winding fill for polygons
    pub winding: bool,
    pub position: Point,
    pub text_color: Color,
    pub text_align: TextAlign,
    /// Most recently selected font
    pub font: Font,
    /// SaveDC depth, for absolute RestoreDC
    pub save_depth: usize,
    pub report: PlayReport,
}

impl<'h> InterpreterContext<'h> {
    pub fn new(header: &'h MetafileHeader, mode: CoordinateMode) -> Self {
        Self {
            header,
            handles: HandleTable::with_capacity(usize::from(header.num_objects)),
            transform: WindowTransform::new(mode, header.bounding_rect),
            viewport: Viewport::default(),
            winding: false,
            position: Point::default(),
            text_color: Color::BLACK,
            text_align: TextAlign::empty(),
            font: Font::default(),
            save_depth: 0,
            report: PlayReport::default(),
        }
    }

    /// Forward window bookkeeping to the target.
    pub fn apply(target: &mut dyn RenderTarget, calls: TransformCalls) {
        for call in calls {
            match call {
                TransformCall::SetWindowOrg(origin) => target.set_window_org(origin),
                TransformCall::SetWindowExt { width, height } => {
                    target.set_window_ext(width, height)
                },
                TransformCall::CombineMatrix(matrix) => target.set_matrix(&matrix, true),
            }
        }
    }
}

/// Play the records of `data` into `target`.
///
/// `header` must have been parsed from the same buffer. An invalid header
/// aborts before `begin`.
pub fn play(
    header: &MetafileHeader,
    data: &[u8],
    target: &mut dyn RenderTarget,
    options: &PlayOptions,
) -> PlayReport {
    if !header.is_valid() {
        return PlayReport {
            state: PlayState::Aborted(AbortReason::InvalidHeader),
            ..PlayReport::default()
        };
    }
    if !target.begin(header.bounding_rect) {
        log::debug!("render target refused playback");
        return PlayReport {
            state: PlayState::Aborted(AbortReason::TargetRefused),
            ..PlayReport::default()
        };
    }

    let mut ctx = InterpreterContext::new(header, options.coordinate_mode);
    ctx.report.state = PlayState::Running;
    let mut reader = RecordReader::new(data, header.first_record_offset);
    let mut trace: VecDeque<String> = VecDeque::with_capacity(TRACE_DEPTH);

    while ctx.report.state == PlayState::Running {
        if options.max_records.is_some_and(|max| ctx.report.records >= max) {
            log::debug!("record limit reached, last records:");
            for line in &trace {
                log::trace!("  {line}");
            }
            ctx.report.state = PlayState::Aborted(AbortReason::StepLimit);
            break;
        }

        let record = match reader.next_record() {
            Ok(record) => record,
            Err(Error::CorruptStream { offset }) => {
                log::warn!("corrupt record stream at offset {offset}");
                ctx.report.state = PlayState::Aborted(AbortReason::CorruptStream { offset });
                break;
            },
            Err(e) => {
                log::warn!("failed to read record: {e}");
                let offset = reader.offset();
                ctx.report.state = PlayState::Aborted(AbortReason::CorruptStream { offset });
                break;
            },
        };

        let entry = function_index(record.function).and_then(|index| {
            let entry = &FUNCTIONS[index];
            entry.handler.map(|handler| (index, entry.name, handler))
        });
        let Some((index, name, handler)) = entry else {
            log::warn!(
                "unsupported function 0x{:04X} at offset {}",
                record.function,
                record.offset
            );
            ctx.report.state = PlayState::Aborted(AbortReason::UnsupportedOpcode {
                function: record.function,
                offset: record.offset,
            });
            break;
        };

        if options.max_records.is_some() {
            if trace.len() == TRACE_DEPTH {
                trace.pop_front();
            }
            trace.push_back(format!(
                "#{} {name} size={} offset={}",
                ctx.report.records, record.size, record.offset
            ));
        }
        log::trace!("{name} (size {}) at offset {}", record.size, record.offset);

        ctx.report.records += 1;
        if let Err(e) = handler(&mut ctx, target, &record) {
            log::debug!("{name} at offset {} skipped: {e}", record.offset);
            ctx.report.skipped_records += 1;
        }

        if index == 0 {
            ctx.report.state = PlayState::Done;
        }
    }

    target.end();
    ctx.report
}
