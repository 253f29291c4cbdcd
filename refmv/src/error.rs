use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MvPredError {
    #[error("invalid frame dimensions: {rows4x4}x{columns4x4} (4x4 units)")]
    InvalidDimensions { rows4x4: i32, columns4x4: i32 },

    #[error("order hint width of {0} bits exceeds the 8 bit maximum")]
    InvalidOrderHintBits(u8),

    #[error("force_integer_mv cannot be combined with allow_high_precision_mv")]
    ConflictingMvPrecision,

    #[error("order hint {hint} does not fit in {bits} bits")]
    OrderHintOutOfRange { hint: u32, bits: u8 },

    #[error("block at ({row4x4}, {column4x4}) lies outside the {rows4x4}x{columns4x4} grid")]
    BlockOutOfBounds {
        row4x4: i32,
        column4x4: i32,
        rows4x4: i32,
        columns4x4: i32,
    },

    #[error("tile {row_start}..{row_end} x {column_start}..{column_end} does not fit the frame")]
    InvalidTileBounds {
        row_start: i32,
        row_end: i32,
        column_start: i32,
        column_end: i32,
    },
}

pub type Result<T> = std::result::Result<T, MvPredError>;
