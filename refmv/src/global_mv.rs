//! Global motion evaluated at a block.

use crate::constants::WARPED_MODEL_PRECISION_BITS;
use crate::precision::{lower_mv_precision, right_shift_with_rounding_signed};
use crate::tile::Block;
use crate::types::{GlobalMotionKind, MotionVector, ReferenceFrame};

fn saturate(value: i64) -> i32 {
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i32
}

/// The vector the frame's global motion model implies for direction `index`
/// of `block`.
///
/// Translation models use their offset directly. Rotation/zoom and affine
/// models are evaluated at the pixel just above and left of the block centre.
/// Intra and identity give the zero vector.
pub fn setup_global_mv(block: &Block, index: usize) -> MotionVector {
    let frame = block.frame();
    let reference = block.reference_frame[index];
    if !reference.is_inter() {
        return MotionVector::ZERO;
    }
    let gm = &frame.global_motion[reference];
    match gm.kind {
        GlobalMotionKind::Identity => MotionVector::ZERO,
        GlobalMotionKind::Translation => {
            let shift = WARPED_MODEL_PRECISION_BITS - 3;
            let mv = MotionVector::from_i32(
                saturate((gm.params[0] >> shift) as i64),
                saturate((gm.params[1] >> shift) as i64),
            );
            lower_mv_precision(frame, mv)
        }
        GlobalMotionKind::RotZoom | GlobalMotionKind::Affine => {
            let unity = 1i64 << WARPED_MODEL_PRECISION_BITS;
            let p = gm.params.map(|v| v as i64);
            let x = (block.column4x4 * 4 + block.size.width() / 2 - 1) as i64;
            let y = (block.row4x4 * 4 + block.size.height() / 2 - 1) as i64;
            let xc = (p[2] - unity) * x + p[3] * y + p[0];
            let yc = p[4] * x + (p[5] - unity) * y + p[1];
            if frame.allow_high_precision_mv {
                let shift = WARPED_MODEL_PRECISION_BITS - 3;
                MotionVector::from_i32(
                    saturate(right_shift_with_rounding_signed(yc, shift)),
                    saturate(right_shift_with_rounding_signed(xc, shift)),
                )
            } else {
                let shift = WARPED_MODEL_PRECISION_BITS - 2;
                let mv = MotionVector::from_i32(
                    saturate(right_shift_with_rounding_signed(yc, shift) * 2),
                    saturate(right_shift_with_rounding_signed(xc, shift) * 2),
                );
                lower_mv_precision(frame, mv)
            }
        }
    }
}

/// Global vectors for both directions; the second stays zero for single prediction.
pub(crate) fn setup_global_mvs(block: &Block, is_compound: bool) -> [MotionVector; 2] {
    let mut global_mv = [MotionVector::ZERO; 2];
    global_mv[0] = setup_global_mv(block, 0);
    if is_compound {
        debug_assert!(block.reference_frame[1] > ReferenceFrame::Intra);
        global_mv[1] = setup_global_mv(block, 1);
    }
    global_mv
}
