//! Candidates from already decoded neighbours in the current frame.

use crate::find::CandidateSearch;
use crate::types::{BlockParameters, GlobalMotionKind, ReferenceFrame};

/// Smallest stride a row or column scan advances by.
fn minimum_step(block_dimension4x4: i32, delta: i32) -> i32 {
    debug_assert!(delta < 0);
    if block_dimension4x4 >= 16 {
        4
    } else if delta < -1 {
        2
    } else {
        0
    }
}

impl CandidateSearch<'_> {
    /// Whether the neighbour's stored vector for direction `index` stands in
    /// for a non-translational global model, and must be re-evaluated here.
    #[inline]
    fn uses_global_mv(&self, mv_bp: &BlockParameters, index: usize) -> bool {
        mv_bp.is_global_mv_block
            && self.block.frame().global_motion[self.block.reference_frame[index]].kind
                > GlobalMotionKind::Translation
    }

    fn search_stack(
        &mut self,
        mv_bp: &BlockParameters,
        index: usize,
        weight: u32,
        found_new_mv: &mut bool,
    ) {
        let candidate = if self.uses_global_mv(mv_bp, 0) {
            self.params.global_mv[0]
        } else {
            mv_bp.mv.mv[index]
        };
        *found_new_mv |= mv_bp.y_mode.has_new_mv();
        self.params.add_single(candidate, weight);
    }

    fn compound_search_stack(
        &mut self,
        mv_bp: &BlockParameters,
        weight: u32,
        found_new_mv: &mut bool,
    ) {
        let mut candidate = mv_bp.mv;
        for i in 0..2 {
            if self.uses_global_mv(mv_bp, i) {
                candidate.mv[i] = self.params.global_mv[i];
            }
        }
        *found_new_mv |= mv_bp.y_mode.has_new_mv();
        self.params.add_compound(candidate, weight);
    }

    /// Offers a neighbour to the stack. Returns whether it referenced the
    /// same frame(s) as the block.
    pub(crate) fn add_reference_mv_candidate(
        &mut self,
        mv_bp: &BlockParameters,
        weight: u32,
        found_new_mv: &mut bool,
    ) -> bool {
        if !mv_bp.is_inter {
            return false;
        }
        let reference = self.block.reference_frame;
        if self.is_compound {
            if mv_bp.reference_frame != reference {
                return false;
            }
            self.compound_search_stack(mv_bp, weight, found_new_mv);
            return true;
        }
        let mut found_match = false;
        for i in 0..2 {
            if mv_bp.reference_frame[i] == reference[0] {
                self.search_stack(mv_bp, i, weight, found_new_mv);
                found_match = true;
            }
        }
        found_match
    }

    /// Walks the 4x4 row `delta_row` rows above the block, from `mv_column`.
    pub(crate) fn scan_row(
        &mut self,
        mv_column: i32,
        delta_row: i32,
        found_new_mv: &mut bool,
    ) -> bool {
        let block = self.block;
        let tile = block.tile;
        let mv_row = block.row4x4 + delta_row;
        if !tile.bounds.is_top_inside(mv_row + 1) {
            return false;
        }
        let width4x4 = block.width4x4();
        let min_step = minimum_step(width4x4, delta_row);
        let end = width4x4
            .min(block.frame().columns4x4 - block.column4x4)
            .min(16);

        let mut found_match = false;
        let mut i = 0;
        loop {
            let mv_bp = tile.scan_parameters(mv_row, mv_column + i);
            let step = width4x4.min(mv_bp.size.width4x4()).max(min_step);
            found_match |= self.add_reference_mv_candidate(mv_bp, 2 * step as u32, found_new_mv);
            i += step;
            if i >= end {
                break;
            }
        }
        found_match
    }

    /// Walks the 4x4 column `delta_column` columns left of the block, from `mv_row`.
    pub(crate) fn scan_column(
        &mut self,
        mv_row: i32,
        delta_column: i32,
        found_new_mv: &mut bool,
    ) -> bool {
        let block = self.block;
        let tile = block.tile;
        let mv_column = block.column4x4 + delta_column;
        if !tile.bounds.is_left_inside(mv_column + 1) {
            return false;
        }
        let height4x4 = block.height4x4();
        let min_step = minimum_step(height4x4, delta_column);
        let end = height4x4.min(block.frame().rows4x4 - block.row4x4).min(16);

        let mut found_match = false;
        let mut i = 0;
        loop {
            let mv_bp = tile.scan_parameters(mv_row + i, mv_column);
            let step = height4x4.min(mv_bp.size.height4x4()).max(min_step);
            found_match |= self.add_reference_mv_candidate(mv_bp, 2 * step as u32, found_new_mv);
            i += step;
            if i >= end {
                break;
            }
        }
        found_match
    }

    /// Checks the single cell at the given offset from the block.
    pub(crate) fn scan_point(
        &mut self,
        delta_row: i32,
        delta_column: i32,
        found_new_mv: &mut bool,
    ) -> bool {
        let block = self.block;
        let tile = block.tile;
        let mv_row = block.row4x4 + delta_row;
        let mv_column = block.column4x4 + delta_column;
        if !tile.bounds.is_inside(mv_row, mv_column) || !tile.has_parameters(mv_row, mv_column) {
            return false;
        }
        let mv_bp = tile.parameters(mv_row, mv_column);
        if mv_bp.reference_frame[0] == ReferenceFrame::None {
            return false;
        }
        self.add_reference_mv_candidate(mv_bp, 4, found_new_mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameContext;
    use crate::neighbors::NeighborStore;
    use crate::stack::PredictionParameters;
    use crate::tile::{Block, Tile, TileBounds};
    use crate::types::{BlockSize, CompoundMotionVector, GlobalMotion, MotionVector, PredictionMode};

    const LAST: [ReferenceFrame; 2] = [ReferenceFrame::Last, ReferenceFrame::None];

    fn frame() -> FrameContext {
        FrameContext::builder(32, 32)
            .allow_high_precision_mv(true)
            .build()
            .unwrap()
    }

    fn single(size: BlockSize, mv: MotionVector) -> BlockParameters {
        BlockParameters::single(size, ReferenceFrame::Last, mv, PredictionMode::NearestMv)
    }

    fn search<'a>(block: Block<'a>, is_compound: bool) -> CandidateSearch<'a> {
        CandidateSearch {
            block,
            is_compound,
            params: PredictionParameters::default(),
        }
    }

    #[test]
    fn minimum_step_rules() {
        assert_eq!(minimum_step(16, -1), 4);
        assert_eq!(minimum_step(8, -1), 0);
        assert_eq!(minimum_step(8, -3), 2);
    }

    #[test]
    fn row_scan_weights_by_overlap() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        let a = MotionVector::new(4, 4);
        let b = MotionVector::new(8, -8);
        store.insert(6, 8, single(BlockSize::Block8x8, a)).unwrap();
        store.insert(6, 10, single(BlockSize::Block4x8, b)).unwrap();
        store.insert(6, 11, single(BlockSize::Block4x8, a)).unwrap();
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block16x16, 8, 8, LAST);
        let mut s = search(block, false);
        let mut found_new_mv = false;
        assert!(s.scan_row(8, -1, &mut found_new_mv));
        assert!(!found_new_mv);
        assert_eq!(s.params.ref_mv_count, 2);
        assert_eq!(s.params.ref_mv_stack[0], a);
        // 2 * 2 from the 8x8, plus 2 * 1 from the last 4x8.
        assert_eq!(s.params.weight_index_stack[0].weight, 6);
        assert_eq!(s.params.weight_index_stack[1].weight, 2);
    }

    #[test]
    fn scans_stop_at_tile_edge() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        store
            .insert(6, 8, single(BlockSize::Block8x8, MotionVector::new(2, 2)))
            .unwrap();
        let tile = Tile::new(&f, &store, TileBounds::new(8..32, 8..32)).unwrap();
        let block = Block::new(&tile, BlockSize::Block8x8, 8, 8, LAST);
        let mut s = search(block, false);
        let mut found_new_mv = false;
        assert!(!s.scan_row(8, -1, &mut found_new_mv));
        assert!(!s.scan_column(8, -1, &mut found_new_mv));
        assert!(!s.scan_point(-1, -1, &mut found_new_mv));
        assert_eq!(s.params.ref_mv_count, 0);
    }

    #[test]
    fn column_scan_reports_new_mv() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        let mv = MotionVector::new(-6, 10);
        let left = BlockParameters::single(
            BlockSize::Block8x16,
            ReferenceFrame::Last,
            mv,
            PredictionMode::NewMv,
        );
        store.insert(4, 2, left).unwrap();
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block8x8, 4, 4, LAST);
        let mut s = search(block, false);
        let mut found_new_mv = false;
        assert!(s.scan_column(4, -1, &mut found_new_mv));
        assert!(found_new_mv);
        assert_eq!(s.params.ref_mv_stack[0], mv);
        assert_eq!(s.params.weight_index_stack[0].weight, 4);
    }

    #[test]
    fn single_matches_either_direction() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        let first = MotionVector::new(2, 0);
        let second = MotionVector::new(0, 2);
        let bp = BlockParameters::compound(
            BlockSize::Block8x8,
            [ReferenceFrame::Golden, ReferenceFrame::Last],
            CompoundMotionVector::new(first, second),
            PredictionMode::NearestNearestMv,
        );
        store.insert(2, 2, bp).unwrap();
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block8x8, 4, 4, LAST);
        let mut s = search(block, false);
        let mut found_new_mv = false;
        assert!(s.scan_point(-1, -1, &mut found_new_mv));
        assert_eq!(s.params.ref_mv_count, 1);
        assert_eq!(s.params.ref_mv_stack[0], second);
        assert_eq!(s.params.weight_index_stack[0].weight, 4);
    }

    #[test]
    fn compound_needs_both_references() {
        let f = frame();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        let refs = [ReferenceFrame::Last, ReferenceFrame::Backward];
        let mv = CompoundMotionVector::new(MotionVector::new(2, 2), MotionVector::new(-2, -2));
        let compound =
            BlockParameters::compound(BlockSize::Block8x8, refs, mv, PredictionMode::NewNewMv);
        store.insert(2, 4, compound).unwrap();
        store
            .insert(2, 6, single(BlockSize::Block8x8, MotionVector::new(6, 6)))
            .unwrap();
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block16x8, 4, 4, refs);
        let mut s = search(block, true);
        let mut found_new_mv = false;
        assert!(s.scan_row(4, -1, &mut found_new_mv));
        assert!(found_new_mv);
        assert_eq!(s.params.ref_mv_count, 1);
        assert_eq!(s.params.compound_ref_mv_stack[0], mv);
    }

    #[test]
    fn global_blocks_take_block_global_mv() {
        let gm = GlobalMotion {
            kind: GlobalMotionKind::RotZoom,
            params: [0, 0, 1 << 16, 0, 0, 1 << 16],
        };
        let f = FrameContext::builder(32, 32)
            .allow_high_precision_mv(true)
            .global_motion(ReferenceFrame::Last, gm)
            .build()
            .unwrap();
        let mut store = NeighborStore::for_frame(&f).unwrap();
        let stored =
            single(BlockSize::Block8x8, MotionVector::new(30, 30)).with_global_mv_block(true);
        store.insert(2, 4, stored).unwrap();
        let tile = Tile::new(&f, &store, TileBounds::whole_frame(&f)).unwrap();
        let block = Block::new(&tile, BlockSize::Block8x8, 4, 4, LAST);
        let mut s = search(block, false);
        s.params.global_mv[0] = MotionVector::new(-2, 4);
        let mut found_new_mv = false;
        s.scan_row(4, -1, &mut found_new_mv);
        assert_eq!(s.params.ref_mv_stack[0], MotionVector::new(-2, 4));
    }
}
