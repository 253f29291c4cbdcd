//! Vector arithmetic shared by global motion, temporal scan and projection.

use crate::constants::{MAX_FRAME_DISTANCE, PROJECTION_MV_CLAMP, PROJECTION_MV_DIVISION_LOOKUP};
use crate::frame::FrameContext;
use crate::types::MotionVector;

#[inline]
pub(crate) fn right_shift_with_rounding(value: i64, bits: u32) -> i64 {
    (value + ((1 << bits) >> 1)) >> bits
}

/// Rounds half away from zero.
#[inline]
pub(crate) fn right_shift_with_rounding_signed(value: i64, bits: u32) -> i64 {
    if value >= 0 {
        right_shift_with_rounding(value, bits)
    } else {
        -right_shift_with_rounding(-value, bits)
    }
}

/// Reduces `mv` to the precision the frame allows.
///
/// Integer-only frames round each component to a multiple of 8 (ties of the
/// quarter position go toward zero); otherwise odd components step toward zero.
pub fn lower_mv_precision(frame: &FrameContext, mv: MotionVector) -> MotionVector {
    if frame.allow_high_precision_mv {
        return mv;
    }
    if frame.force_integer_mv {
        mv.map(|v| {
            let value = (v.abs() + 3) & !7;
            if v < 0 {
                -value
            } else {
                value
            }
        })
    } else {
        mv.map(|v| if v & 1 != 0 { v - v.signum() } else { v })
    }
}

/// Scales `mv` by `numerator / denominator` where the division is the
/// precomputed `16384 / denominator` factor.
#[inline]
pub fn project_mv_with_division(mv: MotionVector, numerator: i32, division: i32) -> MotionVector {
    let numerator = numerator.clamp(-MAX_FRAME_DISTANCE, MAX_FRAME_DISTANCE);
    mv.map(|v| {
        let scaled = v as i64 * numerator as i64 * division as i64;
        let clamp = PROJECTION_MV_CLAMP as i64;
        right_shift_with_rounding_signed(scaled, 14).clamp(-clamp, clamp) as i32
    })
}

/// Scales `mv`, stored against a reference `denominator` frames away, to a
/// reference `numerator` frames away.
#[inline]
pub fn project_mv(mv: MotionVector, numerator: i32, denominator: i32) -> MotionVector {
    debug_assert!(denominator > 0 && denominator <= MAX_FRAME_DISTANCE);
    project_mv_with_division(mv, numerator, PROJECTION_MV_DIVISION_LOOKUP[denominator as usize])
}

/// Moves an 8x8 coordinate by a projected vector component, toward or away
/// from the source frame depending on `reverse`.
#[inline]
pub(crate) fn project_position(value: i32, delta: i32, reverse: bool) -> i32 {
    let offset = delta / 64;
    if reverse {
        value - offset
    } else {
        value + offset
    }
}
