//! Block-level data shared between the neighbour store and the derivation passes.

use enum_map::Enum;
use strum::{EnumCount, EnumIter};

// -------------------------
// Motion vectors
// -------------------------

/// A motion vector in 1/8 sample units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MotionVector {
    pub row: i16,
    pub col: i16,
}

impl MotionVector {
    pub const ZERO: MotionVector = MotionVector { row: 0, col: 0 };

    pub const fn new(row: i16, col: i16) -> Self {
        MotionVector { row, col }
    }

    /// Builds a vector from wide intermediates. Callers guarantee the values fit.
    #[inline]
    pub(crate) fn from_i32(row: i32, col: i32) -> Self {
        debug_assert!(i16::try_from(row).is_ok() && i16::try_from(col).is_ok());
        MotionVector {
            row: row as i16,
            col: col as i16,
        }
    }

    #[inline]
    pub(crate) fn map(self, f: impl Fn(i32) -> i32) -> Self {
        Self::from_i32(f(self.row as i32), f(self.col as i32))
    }

    #[inline]
    pub fn negated(self) -> Self {
        self.map(|v| -v)
    }

    /// Largest absolute per-component difference.
    #[inline]
    pub fn max_abs_diff(self, other: MotionVector) -> i32 {
        let dr = (self.row as i32 - other.row as i32).abs();
        let dc = (self.col as i32 - other.col as i32).abs();
        dr.max(dc)
    }
}

/// One vector per reference direction of a (possibly) bi-predicted block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CompoundMotionVector {
    pub mv: [MotionVector; 2],
}

impl CompoundMotionVector {
    pub const ZERO: CompoundMotionVector = CompoundMotionVector {
        mv: [MotionVector::ZERO; 2],
    };

    pub const fn new(first: MotionVector, second: MotionVector) -> Self {
        CompoundMotionVector {
            mv: [first, second],
        }
    }
}

// -------------------------
// Reference frames
// -------------------------

/// Reference frame identifiers in bitstream order.
///
/// `None` marks an unused second reference, `Intra` an intra-coded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, EnumIter, EnumCount)]
pub enum ReferenceFrame {
    None,
    Intra,
    Last,
    Last2,
    Last3,
    Golden,
    Backward,
    Alternate2,
    Alternate,
}

impl ReferenceFrame {
    #[inline]
    pub fn is_inter(self) -> bool {
        self > ReferenceFrame::Intra
    }
}

// -------------------------
// Block sizes
// -------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount)]
pub enum BlockSize {
    Block4x4,
    Block4x8,
    Block4x16,
    Block8x4,
    Block8x8,
    Block8x16,
    Block8x32,
    Block16x4,
    Block16x8,
    Block16x16,
    Block16x32,
    Block16x64,
    Block32x8,
    Block32x16,
    Block32x32,
    Block32x64,
    Block64x16,
    Block64x32,
    Block64x64,
    Block64x128,
    Block128x64,
    Block128x128,
}

impl BlockSize {
    /// Width in 4x4 units.
    pub const fn width4x4(self) -> i32 {
        use BlockSize::*;
        match self {
            Block4x4 | Block4x8 | Block4x16 => 1,
            Block8x4 | Block8x8 | Block8x16 | Block8x32 => 2,
            Block16x4 | Block16x8 | Block16x16 | Block16x32 | Block16x64 => 4,
            Block32x8 | Block32x16 | Block32x32 | Block32x64 => 8,
            Block64x16 | Block64x32 | Block64x64 | Block64x128 => 16,
            Block128x64 | Block128x128 => 32,
        }
    }

    /// Height in 4x4 units.
    pub const fn height4x4(self) -> i32 {
        use BlockSize::*;
        match self {
            Block4x4 | Block8x4 | Block16x4 => 1,
            Block4x8 | Block8x8 | Block16x8 | Block32x8 => 2,
            Block4x16 | Block8x16 | Block16x16 | Block32x16 | Block64x16 => 4,
            Block8x32 | Block16x32 | Block32x32 | Block64x32 => 8,
            Block16x64 | Block32x64 | Block64x64 | Block128x64 => 16,
            Block64x128 | Block128x128 => 32,
        }
    }

    pub const fn width(self) -> i32 {
        self.width4x4() * 4
    }

    pub const fn height(self) -> i32 {
        self.height4x4() * 4
    }

    /// `clamp(max(width, height), 16, 112)`: the largest |Δrow| + |Δcol| a warp
    /// sample may deviate from the block's own vector.
    pub const fn warp_valid_threshold(self) -> i32 {
        let w = self.width();
        let h = self.height();
        let m = if w > h { w } else { h };
        if m < 16 {
            16
        } else if m > 112 {
            112
        } else {
            m
        }
    }

    /// Sizes that sample the temporal field outside their own footprint.
    pub const fn has_temporal_corner_samples(self) -> bool {
        use BlockSize::*;
        matches!(
            self,
            Block8x8
                | Block8x16
                | Block8x32
                | Block16x8
                | Block16x16
                | Block16x32
                | Block32x8
                | Block32x16
                | Block32x32
        )
    }
}

// -------------------------
// Prediction modes
// -------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter)]
pub enum PredictionMode {
    #[default]
    Dc,
    Vertical,
    Horizontal,
    D45,
    D135,
    D113,
    D157,
    D203,
    D67,
    Smooth,
    SmoothVertical,
    SmoothHorizontal,
    Paeth,
    ChromaFromLuma,
    NearestMv,
    NearMv,
    GlobalMv,
    NewMv,
    NearestNearestMv,
    NearNearMv,
    NearestNewMv,
    NewNearestMv,
    NearNewMv,
    NewNearMv,
    GlobalGlobalMv,
    NewNewMv,
}

impl PredictionMode {
    /// Whether either direction of the mode codes an explicit vector residual.
    pub fn has_new_mv(self) -> bool {
        use PredictionMode::*;
        matches!(self, NewMv | NewNewMv | NearNewMv | NewNearMv | NearestNewMv | NewNearestMv)
    }
}

// -------------------------
// Global motion
// -------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlobalMotionKind {
    #[default]
    Identity,
    Translation,
    RotZoom,
    Affine,
}

/// Frame-level warp model for one reference, parameters in 1/65536 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalMotion {
    pub kind: GlobalMotionKind,
    pub params: [i32; 6],
}

impl Default for GlobalMotion {
    fn default() -> Self {
        GlobalMotion {
            kind: GlobalMotionKind::Identity,
            params: [0, 0, 1 << 16, 0, 0, 1 << 16],
        }
    }
}

// -------------------------
// Decoded block metadata
// -------------------------

/// What the neighbour store keeps about every decoded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockParameters {
    pub size: BlockSize,
    pub reference_frame: [ReferenceFrame; 2],
    pub mv: CompoundMotionVector,
    pub is_inter: bool,
    pub is_global_mv_block: bool,
    pub y_mode: PredictionMode,
}

impl BlockParameters {
    /// An intra block of the given size.
    pub fn intra(size: BlockSize) -> Self {
        BlockParameters {
            size,
            reference_frame: [ReferenceFrame::Intra, ReferenceFrame::None],
            mv: CompoundMotionVector::ZERO,
            is_inter: false,
            is_global_mv_block: false,
            y_mode: PredictionMode::Dc,
        }
    }

    /// A single-reference inter block.
    pub fn single(
        size: BlockSize,
        reference: ReferenceFrame,
        mv: MotionVector,
        y_mode: PredictionMode,
    ) -> Self {
        BlockParameters {
            size,
            reference_frame: [reference, ReferenceFrame::None],
            mv: CompoundMotionVector::new(mv, MotionVector::ZERO),
            is_inter: true,
            is_global_mv_block: false,
            y_mode,
        }
    }

    /// A two-reference inter block.
    pub fn compound(
        size: BlockSize,
        references: [ReferenceFrame; 2],
        mv: CompoundMotionVector,
        y_mode: PredictionMode,
    ) -> Self {
        BlockParameters {
            size,
            reference_frame: references,
            mv,
            is_inter: true,
            is_global_mv_block: false,
            y_mode,
        }
    }

    pub fn with_global_mv_block(mut self, is_global_mv_block: bool) -> Self {
        self.is_global_mv_block = is_global_mv_block;
        self
    }
}

/// Stand-in handed out for cells nothing has been written to yet.
pub(crate) const UNDECODED_BLOCK: BlockParameters = BlockParameters {
    size: BlockSize::Block4x4,
    reference_frame: [ReferenceFrame::None, ReferenceFrame::None],
    mv: CompoundMotionVector::ZERO,
    is_inter: false,
    is_global_mv_block: false,
    y_mode: PredictionMode::Dc,
};
