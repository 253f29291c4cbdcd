//! Reference motion vector candidates for AV1 inter blocks.
//!
//! For each block this crate builds the ranked stack of candidate vectors and
//! the entropy contexts that go with it, gathers neighbour samples for local
//! warp fitting, and projects the motion of earlier frames into the temporal
//! field the candidate search samples from.

#![allow(clippy::uninlined_format_args)]

pub mod constants;
pub mod context;
pub mod error;
mod extra;
mod find;
pub mod frame;
mod global_mv;
pub mod motion_field;
pub mod neighbors;
pub mod precision;
pub mod projector;
mod spatial;
pub mod stack;
mod temporal;
pub mod tile;
pub mod types;
pub mod warp;

pub use context::{compute_contexts, MvContexts, ZeroMvContext};
pub use error::{MvPredError, Result};
pub use find::find_mv_stack;
pub use frame::{relative_distance, FrameContext, FrameContextBuilder};
pub use global_mv::setup_global_mv;
pub use motion_field::{SavedMotionField, TemporalMotionField};
pub use neighbors::NeighborStore;
pub use precision::{lower_mv_precision, project_mv};
pub use projector::MotionFieldProjector;
pub use stack::{sort_weight_index_stack, PredictionParameters, WeightIndex};
pub use tile::{Block, Tile, TileBounds};
pub use types::{
    BlockParameters, BlockSize, CompoundMotionVector, GlobalMotion, GlobalMotionKind, MotionVector,
    PredictionMode, ReferenceFrame,
};
pub use warp::{find_warp_samples, WarpSamples};
