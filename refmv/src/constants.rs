//! Limits and lookup tables shared by the derivation passes.

/// Capacity of the single and compound candidate stacks.
pub const MAX_REF_MV_STACK_SIZE: usize = 8;

/// Capacity of the warp least-squares sample array.
pub const MAX_LEAST_SQUARES_SAMPLES: usize = 8;

/// Upper bound of grid + corner samples a temporal scan can collect.
pub const MAX_TEMPORAL_MV_CANDIDATES: usize = 19;

/// Largest order-hint distance the projection arithmetic accepts.
pub const MAX_FRAME_DISTANCE: i32 = 31;

pub const PROJECTION_MV_CLAMP: i32 = (1 << 14) - 1;

/// Columns (in 8x8 units) a projected vector may travel outside its own 64-wide slab.
pub const PROJECTION_MV_MAX_HORIZONTAL_OFFSET: i32 = 8;

/// Stored vectors with a component beyond this are not kept for projection.
pub const REF_MVS_LIMIT: i32 = (1 << 12) - 1;

pub const WARPED_MODEL_PRECISION_BITS: u32 = 16;

/// Border (1/8 pel) a candidate may point beyond the frame edge, on top of the block extent.
pub const MV_BORDER: i32 = 128;

/// Marker stored in the row component of a temporal field cell with no projection.
pub const INVALID_MV_VALUE: i16 = i16::MIN;

/// `16384 / d`, truncated, for every distance `d` in `0..=MAX_FRAME_DISTANCE`.
pub const PROJECTION_MV_DIVISION_LOOKUP: [i32; MAX_FRAME_DISTANCE as usize + 1] = [
    0, 16384, 8192, 5461, 4096, 3276, 2730, 2340, 2048, 1820, 1638, 1489, 1365, 1260, 1170, 1092,
    1024, 963, 910, 862, 819, 780, 744, 712, 682, 655, 630, 606, 585, 564, 546, 528,
];
