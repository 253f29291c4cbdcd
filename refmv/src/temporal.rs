//! Candidates projected from the current frame's temporal motion field.

use arrayvec::ArrayVec;

use crate::constants::{MAX_FRAME_DISTANCE, MAX_TEMPORAL_MV_CANDIDATES};
use crate::context::ZeroMvContext;
use crate::find::CandidateSearch;
use crate::precision::{lower_mv_precision, project_mv};
use crate::types::{CompoundMotionVector, MotionVector};

/// Deviation from the global vector at which the zero-MV context flips to 1.
const ZERO_MV_DEVIATION: i32 = 16;

impl CandidateSearch<'_> {
    fn temporal_sample(&self, row4x4: i32, column4x4: i32) -> Option<(MotionVector, i32)> {
        self.block
            .tile
            .motion_field
            .and_then(|field| field.get((row4x4 >> 1) as usize, (column4x4 >> 1) as usize))
    }

    /// Samples the field inside the block, and just outside it for mid-sized
    /// blocks, then merges the projected vectors with weight 2.
    ///
    /// A tile without an attached field reads as if every cell were empty.
    pub(crate) fn temporal_scan(&mut self, zero_mv: &mut ZeroMvContext) {
        let block = self.block;
        let bounds = block.tile.bounds;
        let (width4x4, height4x4) = (block.width4x4(), block.height4x4());
        let step_w = if width4x4 >= 16 { 4 } else { 2 };
        let step_h = if height4x4 >= 16 { 4 } else { 2 };
        let row_start = block.row4x4 | 1;
        let column_start = block.column4x4 | 1;
        let row_end = row_start + height4x4.min(16);
        let column_end = column_start + width4x4.min(16);

        let mut samples: ArrayVec<(MotionVector, i32), MAX_TEMPORAL_MV_CANDIDATES> =
            ArrayVec::new();
        for mv_row in (row_start..row_end).step_by(step_h) {
            for mv_column in (column_start..column_end).step_by(step_w) {
                if !bounds.is_bottom_right_inside(mv_row, mv_column) {
                    continue;
                }
                match self.temporal_sample(mv_row, mv_column) {
                    Some(sample) => samples.push(sample),
                    None if mv_row == row_start && mv_column == column_start => {
                        *zero_mv = ZeroMvContext::TemporalUnavailable;
                    }
                    None => {}
                }
            }
        }

        if block.size.has_temporal_corner_samples() {
            let corners = [
                (height4x4, -2),
                (height4x4, width4x4),
                (height4x4 - 2, width4x4),
            ];
            for (delta_row, delta_column) in corners {
                // Stay inside the block's 64x64 area.
                let row = (block.row4x4 & 15) + delta_row;
                let column = (block.column4x4 & 15) + delta_column;
                if row >= 16 || !(0..16).contains(&column) {
                    continue;
                }
                let mv_row = row_start + delta_row;
                let mv_column = column_start + delta_column;
                if !bounds.is_inside(mv_row, mv_column) {
                    continue;
                }
                if let Some(sample) = self.temporal_sample(mv_row, mv_column) {
                    samples.push(sample);
                }
            }
        }

        if samples.is_empty() {
            return;
        }
        let frame = block.frame();
        let reference_offsets = [
            frame.distance_to(block.reference_frame[0]),
            if self.is_compound {
                frame.distance_to(block.reference_frame[1])
            } else {
                0
            },
        ];
        let project = |mv: MotionVector, numerator: i32, denominator: i32| {
            if numerator == 0 {
                MotionVector::ZERO
            } else {
                lower_mv_precision(frame, project_mv(mv, numerator, denominator))
            }
        };

        for (mv, offset) in samples {
            debug_assert!(offset > 0 && offset <= MAX_FRAME_DISTANCE);
            if self.is_compound {
                let candidate = CompoundMotionVector::new(
                    project(mv, reference_offsets[0], offset),
                    project(mv, reference_offsets[1], offset),
                );
                if zero_mv.is_unset() {
                    let deviation = candidate.mv[0]
                        .max_abs_diff(self.params.global_mv[0])
                        .max(candidate.mv[1].max_abs_diff(self.params.global_mv[1]));
                    *zero_mv = ZeroMvContext::Measured {
                        large_deviation: deviation >= ZERO_MV_DEVIATION,
                    };
                }
                self.params.add_compound(candidate, 2);
            } else {
                let candidate = project(mv, reference_offsets[0], offset);
                if zero_mv.is_unset() {
                    let deviation = candidate.max_abs_diff(self.params.global_mv[0]);
                    *zero_mv = ZeroMvContext::Measured {
                        large_deviation: deviation >= ZERO_MV_DEVIATION,
                    };
                }
                self.params.add_single(candidate, 2);
            }
        }
    }
}
