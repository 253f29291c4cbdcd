//! Neighbour motion samples for fitting a local warp model.

use crate::constants::MAX_LEAST_SQUARES_SAMPLES;
use crate::tile::Block;
use crate::types::{BlockSize, ReferenceFrame};

/// Point correspondences `[y, x, y + mv.row, x + mv.col]` in 1/8 pel, taken
/// at the centres of neighbouring blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarpSamples {
    pub candidates: [[i32; 4]; MAX_LEAST_SQUARES_SAMPLES],
    pub num_warp_samples: usize,
    pub num_samples_scanned: usize,
}

impl WarpSamples {
    /// The samples a least-squares fit should use.
    pub fn samples(&self) -> &[[i32; 4]] {
        &self.candidates[..self.num_warp_samples]
    }

    fn add_sample(&mut self, block: &Block, delta_row: i32, delta_column: i32) {
        if self.num_samples_scanned >= MAX_LEAST_SQUARES_SAMPLES {
            return;
        }
        let tile = block.tile;
        let mv_row = block.row4x4 + delta_row;
        let mv_column = block.column4x4 + delta_column;
        if !tile.bounds.is_inside(mv_row, mv_column) || !tile.has_parameters(mv_row, mv_column) {
            return;
        }
        let mv_bp = tile.parameters(mv_row, mv_column);
        if mv_bp.reference_frame[0] != block.reference_frame[0]
            || mv_bp.reference_frame[1] != ReferenceFrame::None
        {
            return;
        }
        self.num_samples_scanned += 1;

        let candidate_height4x4 = mv_bp.size.height4x4();
        let candidate_width4x4 = mv_bp.size.width4x4();
        let candidate_row = mv_row & !(candidate_height4x4 - 1);
        let candidate_column = mv_column & !(candidate_width4x4 - 1);
        let candidate_mv = tile.parameters(candidate_row, candidate_column).mv.mv[0];
        let own_mv = block.mv.mv[0];
        let mv_diff_row = (candidate_mv.row as i32 - own_mv.row as i32).abs();
        let mv_diff_column = (candidate_mv.col as i32 - own_mv.col as i32).abs();
        let is_valid = mv_diff_row + mv_diff_column <= block.size.warp_valid_threshold();
        // Only the first scanned sample is kept when out of range, and only
        // until a valid one replaces it.
        if !is_valid && self.num_samples_scanned > 1 {
            return;
        }

        let mid_y = candidate_row * 4 + candidate_height4x4 * 2 - 1;
        let mid_x = candidate_column * 4 + candidate_width4x4 * 2 - 1;
        self.candidates[self.num_warp_samples] = [
            mid_y * 8,
            mid_x * 8,
            mid_y * 8 + candidate_mv.row as i32,
            mid_x * 8 + candidate_mv.col as i32,
        ];
        if is_valid {
            self.num_warp_samples += 1;
        }
    }
}

/// Collects warp samples from the row above, the column to the left and the
/// top corners of `block`, whose own vector must already be set.
pub fn find_warp_samples(block: &Block) -> WarpSamples {
    let tile = block.tile;
    let frame = block.frame();
    let (width4x4, height4x4) = (block.width4x4(), block.height4x4());
    let mut samples = WarpSamples::default();
    let mut top_left = true;
    let mut top_right = true;

    if block.top_available() {
        let above = tile.scan_parameters(block.row4x4 - 1, block.column4x4);
        let source_width4x4 = above.size.width4x4();
        if width4x4 <= source_width4x4 {
            let column_offset = -(block.column4x4 & (source_width4x4 - 1));
            if column_offset < 0 {
                top_left = false;
            }
            if column_offset + source_width4x4 > width4x4 {
                top_right = false;
            }
            samples.add_sample(block, -1, 0);
        } else {
            let end = width4x4.min(frame.columns4x4 - block.column4x4);
            let mut i = 0;
            while i < end {
                let source_width4x4 = tile
                    .scan_parameters(block.row4x4 - 1, block.column4x4 + i)
                    .size
                    .width4x4();
                samples.add_sample(block, -1, i);
                i += width4x4.min(source_width4x4);
            }
        }
    }

    if block.left_available() {
        let left = tile.scan_parameters(block.row4x4, block.column4x4 - 1);
        let source_height4x4 = left.size.height4x4();
        if height4x4 <= source_height4x4 {
            let row_offset = -(block.row4x4 & (source_height4x4 - 1));
            if row_offset < 0 {
                top_left = false;
            }
            samples.add_sample(block, 0, -1);
        } else {
            let end = height4x4.min(frame.rows4x4 - block.row4x4);
            let mut i = 0;
            while i < end {
                let source_height4x4 = tile
                    .scan_parameters(block.row4x4 + i, block.column4x4 - 1)
                    .size
                    .height4x4();
                samples.add_sample(block, i, -1);
                i += height4x4.min(source_height4x4);
            }
        }
    }

    if top_left {
        samples.add_sample(block, -1, -1);
    }
    if top_right && block.size <= BlockSize::Block64x64 {
        samples.add_sample(block, -1, width4x4);
    }
    if samples.num_warp_samples == 0 && samples.num_samples_scanned > 0 {
        samples.num_warp_samples = 1;
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameContext;
    use crate::neighbors::NeighborStore;
    use crate::tile::{Tile, TileBounds};
    use crate::types::{BlockParameters, CompoundMotionVector, MotionVector, PredictionMode};

    const LAST: [ReferenceFrame; 2] = [ReferenceFrame::Last, ReferenceFrame::None];

    fn frame() -> FrameContext {
        FrameContext::builder(32, 32)
            .allow_high_precision_mv(true)
            .build()
            .unwrap()
    }

    fn single(size: BlockSize, mv: MotionVector) -> BlockParameters {
        BlockParameters::single(size, ReferenceFrame::Last, mv, PredictionMode::NewMv)
    }

    #[test]
    fn samples_from_all_sides() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        store
            .insert(6, 8, single(BlockSize::Block8x8, MotionVector::new(8, 0)))
            .unwrap();
        store
            .insert(8, 6, single(BlockSize::Block8x8, MotionVector::new(0, 8)))
            .unwrap();
        store
            .insert(6, 6, single(BlockSize::Block8x8, MotionVector::new(4, 4)))
            .unwrap();
        store
            .insert(6, 10, single(BlockSize::Block8x8, MotionVector::new(-4, 4)))
            .unwrap();
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block8x8, 8, 8, LAST).with_mv(MotionVector::ZERO);
        let samples = find_warp_samples(&block);
        assert_eq!(samples.num_samples_scanned, 4);
        assert_eq!(samples.num_warp_samples, 4);
        // Above: 8x8 at (6, 8), centre y = 27, x = 35.
        assert_eq!(samples.samples()[0], [27 * 8, 35 * 8, 27 * 8 + 8, 35 * 8]);
        // Left, then top-left, then top-right.
        assert_eq!(samples.samples()[1], [35 * 8, 27 * 8, 35 * 8, 27 * 8 + 8]);
        assert_eq!(samples.samples()[2][..2], [27 * 8, 27 * 8]);
        assert_eq!(samples.samples()[3][..2], [27 * 8, 43 * 8]);
    }

    #[test]
    fn far_samples_are_dropped_after_the_first() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        // 8x8 block: threshold 16.
        store
            .insert(6, 8, single(BlockSize::Block8x8, MotionVector::new(40, 0)))
            .unwrap();
        store
            .insert(8, 6, single(BlockSize::Block8x8, MotionVector::new(40, 40)))
            .unwrap();
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block8x8, 8, 8, LAST);
        let samples = find_warp_samples(&block);
        assert_eq!(samples.num_samples_scanned, 2);
        // Nothing valid: the first scanned sample stands in.
        assert_eq!(samples.num_warp_samples, 1);
        assert_eq!(samples.samples()[0], [27 * 8, 35 * 8, 27 * 8 + 40, 35 * 8]);
    }

    #[test]
    fn compound_and_other_reference_neighbours_are_ignored() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        let golden = BlockParameters::single(
            BlockSize::Block8x8,
            ReferenceFrame::Golden,
            MotionVector::ZERO,
            PredictionMode::NewMv,
        );
        store.insert(6, 8, golden).unwrap();
        store
            .insert(
                8,
                6,
                BlockParameters::compound(
                    BlockSize::Block8x8,
                    [ReferenceFrame::Last, ReferenceFrame::Backward],
                    CompoundMotionVector::ZERO,
                    PredictionMode::NewNewMv,
                ),
            )
            .unwrap();
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block8x8, 8, 8, LAST);
        let samples = find_warp_samples(&block);
        assert_eq!(samples.num_samples_scanned, 0);
        assert_eq!(samples.num_warp_samples, 0);
        assert!(samples.samples().is_empty());
    }

    #[test]
    fn wide_block_walks_the_row_above() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        for (i, col) in [8, 10, 12, 14].into_iter().enumerate() {
            let mv = MotionVector::new(i as i16 * 2, 0);
            store
                .insert(6, col, single(BlockSize::Block8x8, mv))
                .unwrap();
        }
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block32x32, 8, 8, LAST);
        let samples = find_warp_samples(&block);
        assert_eq!(samples.num_samples_scanned, 4);
        assert_eq!(samples.num_warp_samples, 4);
        assert_eq!(samples.samples()[3][2] - samples.samples()[3][0], 6);
    }

    #[test]
    fn sample_count_is_capped() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        for col in 0..16 {
            store
                .insert(15, col, single(BlockSize::Block4x4, MotionVector::ZERO))
                .unwrap();
        }
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block64x64, 16, 0, LAST);
        let samples = find_warp_samples(&block);
        assert_eq!(samples.num_samples_scanned, MAX_LEAST_SQUARES_SAMPLES);
        assert_eq!(samples.num_warp_samples, MAX_LEAST_SQUARES_SAMPLES);
    }
}
