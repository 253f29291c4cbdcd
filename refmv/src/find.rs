//! Reference MV stack construction for one block.

use log::trace;

use crate::context::{compute_contexts, MvContexts, ZeroMvContext};
use crate::global_mv::setup_global_mvs;
use crate::stack::PredictionParameters;
use crate::tile::Block;

/// Working state of one derivation: the block, its prediction kind and the
/// stack being filled. The scan passes live in their own modules as `impl`
/// blocks on this type.
pub(crate) struct CandidateSearch<'a> {
    pub block: Block<'a>,
    pub is_compound: bool,
    pub params: PredictionParameters,
}

/// Builds the ranked candidate stack and entropy contexts for `block`.
///
/// Scans run in a fixed order: the adjacent row, column and top-right cell
/// (the "nearest" group), then temporal candidates, the top-left cell and
/// rows/columns further out. Fewer than two candidates fall back to the
/// extra search; otherwise the two groups are ranked separately.
pub fn find_mv_stack(block: &Block, is_compound: bool) -> (PredictionParameters, MvContexts) {
    let mut search = CandidateSearch {
        block: *block,
        is_compound,
        params: PredictionParameters {
            global_mv: setup_global_mvs(block, is_compound),
            ..Default::default()
        },
    };
    let (width4x4, height4x4) = (block.width4x4(), block.height4x4());

    let mut found_new_mv = false;
    let mut found_row_match = search.scan_row(block.column4x4, -1, &mut found_new_mv);
    let mut found_column_match = search.scan_column(block.row4x4, -1, &mut found_new_mv);
    if width4x4.max(height4x4) <= 16 {
        found_row_match |= search.scan_point(-1, width4x4, &mut found_new_mv);
    }
    let nearest_matches = found_row_match as u8 + found_column_match as u8;
    search.params.nearest_mv_count = search.params.ref_mv_count;

    let mut zero_mv = ZeroMvContext::Disabled;
    if block.frame().use_ref_frame_mvs {
        zero_mv = ZeroMvContext::Unset;
        search.temporal_scan(&mut zero_mv);
    }

    // Matches further out count toward the contexts but not toward new-MV.
    let mut outer_new_mv = false;
    found_row_match |= search.scan_point(-1, -1, &mut outer_new_mv);
    for (i, delta) in [-3, -5].into_iter().enumerate() {
        if i == 0 || height4x4 > 1 {
            let delta_row = delta + (block.row4x4 & 1);
            found_row_match |= search.scan_row(block.column4x4 | 1, delta_row, &mut outer_new_mv);
        }
        if i == 0 || width4x4 > 1 {
            let delta_column = delta + (block.column4x4 & 1);
            found_column_match |=
                search.scan_column(block.row4x4 | 1, delta_column, &mut outer_new_mv);
        }
    }

    if search.params.ref_mv_count < 2 {
        search.extra_search();
    } else {
        search.params.sort();
    }

    let total_matches = found_row_match as u8 + found_column_match as u8;
    let (new_mv, reference_mv) = compute_contexts(found_new_mv, nearest_matches, total_matches);
    trace!(
        "mv stack at ({}, {}) {:?}: {} candidate(s), {} nearest, contexts {}/{}/{:?}",
        block.row4x4,
        block.column4x4,
        block.size,
        search.params.ref_mv_count,
        search.params.nearest_mv_count,
        new_mv,
        reference_mv,
        zero_mv
    );
    (
        search.params,
        MvContexts {
            new_mv,
            reference_mv,
            zero_mv,
        },
    )
}
