//! Storage of decoded block metadata, addressed in 4x4 units.
//!
//! Every decoded block is written once into an arena; each 4x4 cell it covers
//! records the arena index. Lookups are bounds checked and return `None` for
//! cells outside the frame or not yet decoded in the current frame.

use crate::error::{MvPredError, Result};
use crate::frame::FrameContext;
use crate::types::{BlockParameters, UNDECODED_BLOCK};

#[derive(Debug, Clone)]
pub struct NeighborStore {
    rows4x4: i32,
    columns4x4: i32,
    blocks: Vec<BlockParameters>,
    cells: Vec<Option<u32>>,
}

impl NeighborStore {
    pub fn new(rows4x4: i32, columns4x4: i32) -> Result<Self> {
        if rows4x4 <= 0 || columns4x4 <= 0 {
            return Err(MvPredError::InvalidDimensions {
                rows4x4,
                columns4x4,
            });
        }
        Ok(NeighborStore {
            rows4x4,
            columns4x4,
            blocks: Vec::new(),
            cells: vec![None; rows4x4 as usize * columns4x4 as usize],
        })
    }

    pub fn for_frame(frame: &FrameContext) -> Result<Self> {
        Self::new(frame.rows4x4, frame.columns4x4)
    }

    pub fn rows4x4(&self) -> i32 {
        self.rows4x4
    }

    pub fn columns4x4(&self) -> i32 {
        self.columns4x4
    }

    /// Number of blocks written since the last [`clear`](Self::clear).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Forgets every block, ready for the next frame.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.cells.fill(None);
    }

    #[inline]
    fn cell_index(&self, row4x4: i32, column4x4: i32) -> Option<usize> {
        if row4x4 < 0 || column4x4 < 0 || row4x4 >= self.rows4x4 || column4x4 >= self.columns4x4 {
            return None;
        }
        Some(row4x4 as usize * self.columns4x4 as usize + column4x4 as usize)
    }

    /// Records a finished block whose top-left cell is `(row4x4, column4x4)`.
    ///
    /// The footprint is clipped to the frame.
    pub fn insert(&mut self, row4x4: i32, column4x4: i32, params: BlockParameters) -> Result<()> {
        if self.cell_index(row4x4, column4x4).is_none() {
            return Err(MvPredError::BlockOutOfBounds {
                row4x4,
                column4x4,
                rows4x4: self.rows4x4,
                columns4x4: self.columns4x4,
            });
        }
        let id = self.blocks.len() as u32;
        self.blocks.push(params);

        let row_end = (row4x4 + params.size.height4x4()).min(self.rows4x4);
        let column_end = (column4x4 + params.size.width4x4()).min(self.columns4x4);
        let stride = self.columns4x4 as usize;
        for row in row4x4..row_end {
            let base = row as usize * stride;
            self.cells[base + column4x4 as usize..base + column_end as usize].fill(Some(id));
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, row4x4: i32, column4x4: i32) -> Option<&BlockParameters> {
        let idx = self.cell_index(row4x4, column4x4)?;
        self.cells[idx].map(|id| &self.blocks[id as usize])
    }

    #[inline]
    pub fn has_parameters(&self, row4x4: i32, column4x4: i32) -> bool {
        self.get(row4x4, column4x4).is_some()
    }

    /// Metadata of a cell the decode order guarantees to be populated.
    #[inline]
    pub fn parameters(&self, row4x4: i32, column4x4: i32) -> &BlockParameters {
        let params = self.get(row4x4, column4x4);
        debug_assert!(
            params.is_some(),
            "no block decoded at ({}, {})",
            row4x4,
            column4x4
        );
        params.unwrap_or(&UNDECODED_BLOCK)
    }
}
