//! Frame-scoped state read by every block derivation.
//!
//! A [`FrameContext`] is assembled once per frame header through
//! [`FrameContextBuilder`], which validates the combination of flags and
//! derives the per-reference sign bias from the order hints.

use enum_map::EnumMap;
use strum::IntoEnumIterator;

use crate::error::{MvPredError, Result};
use crate::types::{GlobalMotion, ReferenceFrame};

/// Order hints are stored in at most this many bits.
pub const MAX_ORDER_HINT_BITS: u8 = 8;

/// Sign-extended distance `a - b` between two order hints of `bits` width.
///
/// With order hints disabled (`bits == 0`) every distance is zero.
pub fn relative_distance(a: u32, b: u32, bits: u8) -> i32 {
    if bits == 0 {
        return 0;
    }
    let shift = 32 - bits as u32;
    let diff = a.wrapping_sub(b);
    ((diff << shift) as i32) >> shift
}

#[derive(Debug, Clone)]
pub struct FrameContext {
    /// Frame height in 4x4 units.
    pub rows4x4: i32,
    /// Frame width in 4x4 units.
    pub columns4x4: i32,
    pub allow_high_precision_mv: bool,
    pub force_integer_mv: bool,
    /// Temporal candidates are enabled for this frame.
    pub use_ref_frame_mvs: bool,
    pub order_hint: u32,
    pub order_hint_bits: u8,
    /// Order hint of the frame each reference slot points at.
    pub reference_order_hint: EnumMap<ReferenceFrame, u32>,
    pub reference_frame_sign_bias: EnumMap<ReferenceFrame, bool>,
    pub global_motion: EnumMap<ReferenceFrame, GlobalMotion>,
}

impl FrameContext {
    pub fn builder(rows4x4: i32, columns4x4: i32) -> FrameContextBuilder {
        FrameContextBuilder::new(rows4x4, columns4x4)
    }

    /// Distance from the current frame to the frame behind `reference`.
    #[inline]
    pub fn distance_to(&self, reference: ReferenceFrame) -> i32 {
        relative_distance(
            self.order_hint,
            self.reference_order_hint[reference],
            self.order_hint_bits,
        )
    }

    #[inline]
    pub fn relative_distance(&self, a: u32, b: u32) -> i32 {
        relative_distance(a, b, self.order_hint_bits)
    }

    /// Height of the temporal motion field grid.
    pub fn rows8x8(&self) -> usize {
        ((self.rows4x4 + 1) >> 1) as usize
    }

    /// Width of the temporal motion field grid.
    pub fn columns8x8(&self) -> usize {
        ((self.columns4x4 + 1) >> 1) as usize
    }
}

#[derive(Debug, Clone)]
pub struct FrameContextBuilder {
    rows4x4: i32,
    columns4x4: i32,
    allow_high_precision_mv: bool,
    force_integer_mv: bool,
    use_ref_frame_mvs: bool,
    order_hint: u32,
    order_hint_bits: u8,
    reference_order_hint: EnumMap<ReferenceFrame, u32>,
    global_motion: EnumMap<ReferenceFrame, GlobalMotion>,
}

impl FrameContextBuilder {
    pub fn new(rows4x4: i32, columns4x4: i32) -> Self {
        FrameContextBuilder {
            rows4x4,
            columns4x4,
            allow_high_precision_mv: false,
            force_integer_mv: false,
            use_ref_frame_mvs: false,
            order_hint: 0,
            order_hint_bits: 0,
            reference_order_hint: EnumMap::default(),
            global_motion: EnumMap::default(),
        }
    }

    pub fn allow_high_precision_mv(mut self, allow: bool) -> Self {
        self.allow_high_precision_mv = allow;
        self
    }

    pub fn force_integer_mv(mut self, force: bool) -> Self {
        self.force_integer_mv = force;
        self
    }

    pub fn use_ref_frame_mvs(mut self, enable: bool) -> Self {
        self.use_ref_frame_mvs = enable;
        self
    }

    /// Enables order hints of `bits` width and sets the current frame's hint.
    pub fn order_hint(mut self, order_hint: u32, bits: u8) -> Self {
        self.order_hint = order_hint;
        self.order_hint_bits = bits;
        self
    }

    pub fn reference_order_hint(mut self, reference: ReferenceFrame, order_hint: u32) -> Self {
        self.reference_order_hint[reference] = order_hint;
        self
    }

    pub fn global_motion(mut self, reference: ReferenceFrame, motion: GlobalMotion) -> Self {
        self.global_motion[reference] = motion;
        self
    }

    pub fn build(self) -> Result<FrameContext> {
        if self.rows4x4 <= 0 || self.columns4x4 <= 0 {
            return Err(MvPredError::InvalidDimensions {
                rows4x4: self.rows4x4,
                columns4x4: self.columns4x4,
            });
        }
        if self.order_hint_bits > MAX_ORDER_HINT_BITS {
            return Err(MvPredError::InvalidOrderHintBits(self.order_hint_bits));
        }
        if self.force_integer_mv && self.allow_high_precision_mv {
            return Err(MvPredError::ConflictingMvPrecision);
        }
        let limit = 1u32 << self.order_hint_bits;
        let references = ReferenceFrame::iter().filter(|r| r.is_inter());
        let hints = std::iter::once(self.order_hint)
            .chain(references.map(|r| self.reference_order_hint[r]));
        for hint in hints {
            if hint >= limit {
                return Err(MvPredError::OrderHintOutOfRange {
                    hint,
                    bits: self.order_hint_bits,
                });
            }
        }

        // Sign bias marks references that lie after the current frame.
        let mut sign_bias: EnumMap<ReferenceFrame, bool> = EnumMap::default();
        for reference in ReferenceFrame::iter().filter(|r| r.is_inter()) {
            sign_bias[reference] = relative_distance(
                self.reference_order_hint[reference],
                self.order_hint,
                self.order_hint_bits,
            ) > 0;
        }

        log::trace!(
            "frame context {}x{} (4x4), order hint {} / {} bits, temporal mvs {}",
            self.rows4x4,
            self.columns4x4,
            self.order_hint,
            self.order_hint_bits,
            self.use_ref_frame_mvs
        );

        Ok(FrameContext {
            rows4x4: self.rows4x4,
            columns4x4: self.columns4x4,
            allow_high_precision_mv: self.allow_high_precision_mv,
            force_integer_mv: self.force_integer_mv,
            use_ref_frame_mvs: self.use_ref_frame_mvs,
            order_hint: self.order_hint,
            order_hint_bits: self.order_hint_bits,
            reference_order_hint: self.reference_order_hint,
            reference_frame_sign_bias: sign_bias,
            global_motion: self.global_motion,
        })
    }
}
