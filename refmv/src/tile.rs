//! Per-invocation views: the tile a block lives in and the block itself.

use std::ops::Range;

use crate::error::{MvPredError, Result};
use crate::frame::FrameContext;
use crate::motion_field::TemporalMotionField;
use crate::neighbors::NeighborStore;
use crate::types::{
    BlockParameters, BlockSize, CompoundMotionVector, MotionVector, ReferenceFrame, UNDECODED_BLOCK,
};

/// Tile extent in 4x4 units, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBounds {
    pub row4x4_start: i32,
    pub row4x4_end: i32,
    pub column4x4_start: i32,
    pub column4x4_end: i32,
}

impl TileBounds {
    pub fn new(rows4x4: Range<i32>, columns4x4: Range<i32>) -> Self {
        TileBounds {
            row4x4_start: rows4x4.start,
            row4x4_end: rows4x4.end,
            column4x4_start: columns4x4.start,
            column4x4_end: columns4x4.end,
        }
    }

    pub fn whole_frame(frame: &FrameContext) -> Self {
        Self::new(0..frame.rows4x4, 0..frame.columns4x4)
    }

    #[inline]
    pub fn is_inside(&self, row4x4: i32, column4x4: i32) -> bool {
        (self.row4x4_start..self.row4x4_end).contains(&row4x4)
            && (self.column4x4_start..self.column4x4_end).contains(&column4x4)
    }

    /// Whether the row above `row4x4` belongs to the tile.
    #[inline]
    pub fn is_top_inside(&self, row4x4: i32) -> bool {
        row4x4 > self.row4x4_start
    }

    /// Whether the column left of `column4x4` belongs to the tile.
    #[inline]
    pub fn is_left_inside(&self, column4x4: i32) -> bool {
        column4x4 > self.column4x4_start
    }

    #[inline]
    pub fn is_top_left_inside(&self, row4x4: i32, column4x4: i32) -> bool {
        self.is_top_inside(row4x4) && self.is_left_inside(column4x4)
    }

    /// Bottom/right check for positions already known to be past the top-left edge.
    #[inline]
    pub fn is_bottom_right_inside(&self, row4x4: i32, column4x4: i32) -> bool {
        debug_assert!(row4x4 >= self.row4x4_start && column4x4 >= self.column4x4_start);
        row4x4 < self.row4x4_end && column4x4 < self.column4x4_end
    }
}

/// Read-only decode state shared by all blocks of one tile.
#[derive(Clone, Copy)]
pub struct Tile<'a> {
    pub frame: &'a FrameContext,
    pub bounds: TileBounds,
    pub blocks: &'a NeighborStore,
    pub motion_field: Option<&'a TemporalMotionField>,
}

impl<'a> Tile<'a> {
    pub fn new(
        frame: &'a FrameContext,
        blocks: &'a NeighborStore,
        bounds: TileBounds,
    ) -> Result<Self> {
        let fits = bounds.row4x4_start >= 0
            && bounds.column4x4_start >= 0
            && bounds.row4x4_start < bounds.row4x4_end
            && bounds.column4x4_start < bounds.column4x4_end
            && bounds.row4x4_end <= frame.rows4x4
            && bounds.column4x4_end <= frame.columns4x4;
        if !fits {
            return Err(MvPredError::InvalidTileBounds {
                row_start: bounds.row4x4_start,
                row_end: bounds.row4x4_end,
                column_start: bounds.column4x4_start,
                column_end: bounds.column4x4_end,
            });
        }
        if blocks.rows4x4() != frame.rows4x4 || blocks.columns4x4() != frame.columns4x4 {
            return Err(MvPredError::InvalidDimensions {
                rows4x4: blocks.rows4x4(),
                columns4x4: blocks.columns4x4(),
            });
        }
        Ok(Tile {
            frame,
            bounds,
            blocks,
            motion_field: None,
        })
    }

    /// Attaches the temporal field the current frame was projected into.
    pub fn with_motion_field(mut self, motion_field: &'a TemporalMotionField) -> Self {
        debug_assert!(
            motion_field.rows() == self.frame.rows8x8()
                && motion_field.columns() == self.frame.columns8x8(),
            "motion field is {}x{} (8x8), frame needs {}x{}",
            motion_field.rows(),
            motion_field.columns(),
            self.frame.rows8x8(),
            self.frame.columns8x8()
        );
        self.motion_field = Some(motion_field);
        self
    }

    #[inline]
    pub fn parameters(&self, row4x4: i32, column4x4: i32) -> &'a BlockParameters {
        self.blocks.parameters(row4x4, column4x4)
    }

    #[inline]
    pub fn has_parameters(&self, row4x4: i32, column4x4: i32) -> bool {
        self.blocks.has_parameters(row4x4, column4x4)
    }

    /// Like [`parameters`](Self::parameters), for scans that may step past
    /// the frame edge; such cells read as an undecoded 4x4 block.
    #[inline]
    pub(crate) fn scan_parameters(&self, row4x4: i32, column4x4: i32) -> &'a BlockParameters {
        self.blocks
            .get(row4x4, column4x4)
            .unwrap_or(&UNDECODED_BLOCK)
    }
}

/// The block whose candidates are being derived.
#[derive(Clone, Copy)]
pub struct Block<'a> {
    pub tile: &'a Tile<'a>,
    pub size: BlockSize,
    pub row4x4: i32,
    pub column4x4: i32,
    pub reference_frame: [ReferenceFrame; 2],
    /// The block's own decoded vectors; only warp sample collection reads them.
    pub mv: CompoundMotionVector,
}

impl<'a> Block<'a> {
    pub fn new(
        tile: &'a Tile<'a>,
        size: BlockSize,
        row4x4: i32,
        column4x4: i32,
        reference_frame: [ReferenceFrame; 2],
    ) -> Self {
        debug_assert!(tile.bounds.is_inside(row4x4, column4x4));
        Block {
            tile,
            size,
            row4x4,
            column4x4,
            reference_frame,
            mv: CompoundMotionVector::ZERO,
        }
    }

    pub fn with_mv(mut self, mv: MotionVector) -> Self {
        self.mv.mv[0] = mv;
        self
    }

    #[inline]
    pub fn width4x4(&self) -> i32 {
        self.size.width4x4()
    }

    #[inline]
    pub fn height4x4(&self) -> i32 {
        self.size.height4x4()
    }

    #[inline]
    pub fn frame(&self) -> &'a FrameContext {
        self.tile.frame
    }

    pub fn top_available(&self) -> bool {
        self.tile.bounds.is_top_inside(self.row4x4)
    }

    pub fn left_available(&self) -> bool {
        self.tile.bounds.is_left_inside(self.column4x4)
    }

    /// Clips a candidate so the prediction stays within the frame border.
    pub fn clamp_mv(&self, mv: MotionVector) -> MotionVector {
        let frame = self.frame();
        let (bh4, bw4) = (self.height4x4(), self.width4x4());
        let row_border = crate::constants::MV_BORDER + bh4 * 4 * 8;
        let column_border = crate::constants::MV_BORDER + bw4 * 4 * 8;
        let to_top = -(self.row4x4 * 4 * 8);
        let to_bottom = (frame.rows4x4 - bh4 - self.row4x4) * 4 * 8;
        let to_left = -(self.column4x4 * 4 * 8);
        let to_right = (frame.columns4x4 - bw4 - self.column4x4) * 4 * 8;
        MotionVector::from_i32(
            (mv.row as i32).clamp(to_top - row_border, to_bottom + row_border),
            (mv.col as i32).clamp(to_left - column_border, to_right + column_border),
        )
    }
}
