//! Fallback used when the regular scans leave fewer than two candidates.
//!
//! The row above and the column left of the block are walked again, this
//! time accepting neighbours that reference other frames. Their vectors are
//! negated when the two references lie on opposite sides of the current frame.

use crate::find::CandidateSearch;
use crate::types::{BlockParameters, CompoundMotionVector, MotionVector, ReferenceFrame};

/// Per-direction vectors borrowed for compound fallback entries.
#[derive(Debug, Default)]
struct CompoundBorrow {
    same_reference: [[MotionVector; 2]; 2],
    same_reference_count: [usize; 2],
    other_reference: [[MotionVector; 2]; 2],
    other_reference_count: [usize; 2],
}

impl CandidateSearch<'_> {
    fn sign_adjusted(
        &self,
        mv: MotionVector,
        candidate: ReferenceFrame,
        target: ReferenceFrame,
    ) -> MotionVector {
        let sign_bias = &self.block.frame().reference_frame_sign_bias;
        if sign_bias[candidate] != sign_bias[target] {
            mv.negated()
        } else {
            mv
        }
    }

    fn add_extra_single_candidate(&mut self, mv_bp: &BlockParameters) {
        let target = self.block.reference_frame[0];
        for i in 0..2 {
            let reference = mv_bp.reference_frame[i];
            if !reference.is_inter() {
                continue;
            }
            let candidate = self.sign_adjusted(mv_bp.mv.mv[i], reference, target);
            let count = self.params.ref_mv_count;
            debug_assert!(count <= 2);
            let stack = &self.params.ref_mv_stack;
            if (count != 0 && stack[0] == candidate) || (count == 2 && stack[1] == candidate) {
                continue;
            }
            self.params.ref_mv_stack[count] = candidate;
            self.params.set_weight_index_stack_entry(count, 0);
            self.params.ref_mv_count += 1;
        }
    }

    fn add_extra_compound_candidate(&self, mv_bp: &BlockParameters, borrow: &mut CompoundBorrow) {
        for i in 0..2 {
            let reference = mv_bp.reference_frame[i];
            if !reference.is_inter() {
                continue;
            }
            for j in 0..2 {
                let target = self.block.reference_frame[j];
                let mv = mv_bp.mv.mv[i];
                if reference == target && borrow.same_reference_count[j] < 2 {
                    borrow.same_reference[j][borrow.same_reference_count[j]] = mv;
                    borrow.same_reference_count[j] += 1;
                } else if borrow.other_reference_count[j] < 2 {
                    borrow.other_reference[j][borrow.other_reference_count[j]] =
                        self.sign_adjusted(mv, reference, target);
                    borrow.other_reference_count[j] += 1;
                }
            }
        }
    }

    /// Tops the stack up to two entries, all with weight 0.
    ///
    /// Single prediction may end with three entries when one neighbour
    /// contributes two distinct vectors.
    pub(crate) fn extra_search(&mut self) {
        let block = self.block;
        let tile = block.tile;
        let frame = block.frame();
        let num4x4 = block
            .width4x4()
            .min(frame.columns4x4 - block.column4x4)
            .min(block.height4x4())
            .min(frame.rows4x4 - block.row4x4)
            .min(16);
        log::trace!(
            "extra search at ({}, {}) with {} candidate(s)",
            block.row4x4,
            block.column4x4,
            self.params.ref_mv_count
        );

        let mut borrow = CompoundBorrow::default();
        'passes: for pass in 0..2 {
            if self.params.ref_mv_count >= 2 {
                break;
            }
            let mut i = 0;
            while i < num4x4 {
                let (mv_row, mv_column) = if pass == 0 {
                    (block.row4x4 - 1, block.column4x4 + i)
                } else {
                    (block.row4x4 + i, block.column4x4 - 1)
                };
                if !tile.bounds.is_top_left_inside(mv_row + 1, mv_column + 1) {
                    break;
                }
                let mv_bp = tile.scan_parameters(mv_row, mv_column);
                if self.is_compound {
                    self.add_extra_compound_candidate(mv_bp, &mut borrow);
                } else {
                    self.add_extra_single_candidate(mv_bp);
                    if self.params.ref_mv_count >= 2 {
                        continue 'passes;
                    }
                }
                i += if pass == 0 {
                    mv_bp.size.width4x4()
                } else {
                    mv_bp.size.height4x4()
                };
            }
        }

        if self.is_compound {
            self.merge_compound_borrow(&borrow);
        } else {
            let count = self.params.ref_mv_count;
            for i in count..2 {
                self.params.ref_mv_stack[i] = self.params.global_mv[0];
                self.params.set_weight_index_stack_entry(i, 0);
            }
            self.params.ref_mv_count = count.max(2);
        }
    }

    /// Builds two compound vectors from the borrowed ones, filling the gaps
    /// with the global vectors, and merges them so exactly two entries remain.
    fn merge_compound_borrow(&mut self, borrow: &CompoundBorrow) {
        let mut combined = [CompoundMotionVector::ZERO; 2];
        for i in 0..2 {
            let borrowed = borrow.same_reference[i][..borrow.same_reference_count[i]]
                .iter()
                .chain(&borrow.other_reference[i][..borrow.other_reference_count[i]])
                .copied()
                .chain(std::iter::repeat(self.params.global_mv[i]));
            for (entry, mv) in combined.iter_mut().zip(borrowed) {
                entry.mv[i] = mv;
            }
        }

        if self.params.ref_mv_count == 1 {
            let first = self.params.compound_ref_mv_stack[0];
            self.params.compound_ref_mv_stack[1] =
                if combined[0] == first { combined[1] } else { combined[0] };
            self.params.set_weight_index_stack_entry(1, 0);
        } else {
            debug_assert_eq!(self.params.ref_mv_count, 0);
            for (i, mv) in combined.into_iter().enumerate() {
                self.params.compound_ref_mv_stack[i] = mv;
                self.params.set_weight_index_stack_entry(i, 0);
            }
        }
        self.params.ref_mv_count = 2;
    }
}
