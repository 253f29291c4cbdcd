//! Temporal motion fields at 8x8 granularity.
//!
//! [`TemporalMotionField`] is the current frame's grid of projected vectors,
//! filled by the projector and sampled by the temporal scan.
//! [`SavedMotionField`] is what a decoded frame leaves behind for later
//! frames to project from.

use enum_map::EnumMap;
use rayon::prelude::*;

use crate::constants::{INVALID_MV_VALUE, MAX_FRAME_DISTANCE, REF_MVS_LIMIT};
use crate::frame::FrameContext;
use crate::neighbors::NeighborStore;
use crate::types::{MotionVector, ReferenceFrame};

/// Rows of 8x8 cells a projected vector can never leave (64 luma rows).
pub const SLAB_ROWS8X8: usize = 8;

const INVALID_MV: MotionVector = MotionVector {
    row: INVALID_MV_VALUE,
    col: 0,
};

// -------------------------
// Current frame field
// -------------------------

#[derive(Debug, Clone)]
pub struct TemporalMotionField {
    rows: usize,
    columns: usize,
    mv: Vec<MotionVector>,
    /// Distance from the projected source to its own reference, in 1..=31.
    reference_offset: Vec<i8>,
}

impl TemporalMotionField {
    /// A field with every cell invalid.
    pub fn new(rows8x8: usize, columns8x8: usize) -> Self {
        TemporalMotionField {
            rows: rows8x8,
            columns: columns8x8,
            mv: vec![INVALID_MV; rows8x8 * columns8x8],
            reference_offset: vec![0; rows8x8 * columns8x8],
        }
    }

    pub fn for_frame(frame: &FrameContext) -> Self {
        Self::new(frame.rows8x8(), frame.columns8x8())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Invalidates every cell before a new frame is projected.
    pub fn reset(&mut self) {
        self.mv.fill(INVALID_MV);
        self.reference_offset.fill(0);
    }

    /// The stored vector and reference distance, if the cell received a projection.
    #[inline]
    pub fn get(&self, y8: usize, x8: usize) -> Option<(MotionVector, i32)> {
        debug_assert!(y8 < self.rows && x8 < self.columns);
        let idx = y8 * self.columns + x8;
        let mv = self.mv[idx];
        if mv.row == INVALID_MV_VALUE {
            None
        } else {
            Some((mv, self.reference_offset[idx] as i32))
        }
    }

    /// Writes one cell directly.
    pub fn set(&mut self, y8: usize, x8: usize, mv: MotionVector, reference_offset: i32) {
        debug_assert!(mv.row != INVALID_MV_VALUE);
        debug_assert!((1..=MAX_FRAME_DISTANCE).contains(&reference_offset));
        let idx = y8 * self.columns + x8;
        self.mv[idx] = mv;
        self.reference_offset[idx] = reference_offset as i8;
    }

    pub(crate) fn slabs_mut(&mut self) -> impl Iterator<Item = FieldSlab<'_>> {
        let stride = self.columns.max(1);
        let chunk = stride * SLAB_ROWS8X8;
        self.mv
            .chunks_mut(chunk)
            .zip(self.reference_offset.chunks_mut(chunk))
            .enumerate()
            .map(move |(i, (mv, reference_offset))| FieldSlab {
                y8_start: i * SLAB_ROWS8X8,
                stride,
                mv,
                reference_offset,
            })
    }

    pub(crate) fn par_slabs_mut(&mut self) -> impl IndexedParallelIterator<Item = FieldSlab<'_>> {
        let stride = self.columns.max(1);
        let chunk = stride * SLAB_ROWS8X8;
        self.mv
            .par_chunks_mut(chunk)
            .zip(self.reference_offset.par_chunks_mut(chunk))
            .enumerate()
            .map(move |(i, (mv, reference_offset))| FieldSlab {
                y8_start: i * SLAB_ROWS8X8,
                stride,
                mv,
                reference_offset,
            })
    }
}

/// Mutable view of up to [`SLAB_ROWS8X8`] consecutive rows of a field.
pub(crate) struct FieldSlab<'a> {
    pub y8_start: usize,
    pub stride: usize,
    pub mv: &'a mut [MotionVector],
    pub reference_offset: &'a mut [i8],
}

impl FieldSlab<'_> {
    pub fn y8_end(&self) -> usize {
        self.y8_start + self.mv.len() / self.stride
    }

    #[inline]
    pub fn write(&mut self, y8: usize, x8: usize, mv: MotionVector, reference_offset: i8) {
        let idx = (y8 - self.y8_start) * self.stride + x8;
        self.mv[idx] = mv;
        self.reference_offset[idx] = reference_offset;
    }
}

// -------------------------
// Saved field of a decoded frame
// -------------------------

/// Per-8x8 motion a finished frame keeps for projection into later frames.
#[derive(Debug, Clone)]
pub struct SavedMotionField {
    pub rows4x4: i32,
    pub columns4x4: i32,
    pub is_intra_frame: bool,
    pub order_hint: u32,
    /// Order hints of the frames this frame itself referenced.
    pub reference_order_hint: EnumMap<ReferenceFrame, u32>,
    rows: usize,
    columns: usize,
    reference_frame: Vec<ReferenceFrame>,
    mv: Vec<MotionVector>,
}

impl SavedMotionField {
    /// Samples a decoded frame's blocks at the centre 4x4 of every 8x8 cell.
    ///
    /// A cell keeps the last of its two vectors that points to a past frame
    /// and stays within the storage limit; cells without one hold `None`.
    pub fn capture(frame: &FrameContext, blocks: &NeighborStore, is_intra_frame: bool) -> Self {
        let rows = frame.rows8x8();
        let columns = frame.columns8x8();
        let mut reference_frame = vec![ReferenceFrame::None; rows * columns];
        let mut mv = vec![MotionVector::ZERO; rows * columns];

        if !is_intra_frame {
            for y8 in 0..rows {
                let row4x4 = ((y8 * 2 + 1) as i32).min(frame.rows4x4 - 1);
                for x8 in 0..columns {
                    let column4x4 = ((x8 * 2 + 1) as i32).min(frame.columns4x4 - 1);
                    let Some(bp) = blocks.get(row4x4, column4x4) else {
                        continue;
                    };
                    let idx = y8 * columns + x8;
                    for list in 0..2 {
                        let r = bp.reference_frame[list];
                        if !r.is_inter() {
                            continue;
                        }
                        let hint = frame.reference_order_hint[r];
                        if frame.relative_distance(hint, frame.order_hint) >= 0 {
                            continue;
                        }
                        let candidate = bp.mv.mv[list];
                        if (candidate.row as i32).abs() > REF_MVS_LIMIT
                            || (candidate.col as i32).abs() > REF_MVS_LIMIT
                        {
                            continue;
                        }
                        reference_frame[idx] = r;
                        mv[idx] = candidate;
                    }
                }
            }
        }

        SavedMotionField {
            rows4x4: frame.rows4x4,
            columns4x4: frame.columns4x4,
            is_intra_frame,
            order_hint: frame.order_hint,
            reference_order_hint: frame.reference_order_hint,
            rows,
            columns,
            reference_frame,
            mv,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn get(&self, y8: usize, x8: usize) -> (ReferenceFrame, MotionVector) {
        let idx = y8 * self.columns + x8;
        (self.reference_frame[idx], self.mv[idx])
    }

    /// Overrides one cell.
    pub fn set(&mut self, y8: usize, x8: usize, reference: ReferenceFrame, mv: MotionVector) {
        let idx = y8 * self.columns + x8;
        self.reference_frame[idx] = reference;
        self.mv[idx] = mv;
    }
}
