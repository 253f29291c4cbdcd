use anyhow::Result;

use refmv::{
    find_mv_stack, find_warp_samples, Block, BlockParameters, BlockSize, FrameContext,
    MotionFieldProjector, MotionVector, NeighborStore, PredictionMode, ReferenceFrame,
    SavedMotionField, TemporalMotionField, Tile, TileBounds, ZeroMvContext,
};

fn single(mv: MotionVector, y_mode: PredictionMode) -> BlockParameters {
    BlockParameters::single(BlockSize::Block16x16, ReferenceFrame::Last, mv, y_mode)
}

fn measured(large_deviation: bool) -> ZeroMvContext {
    ZeroMvContext::Measured { large_deviation }
}

const ROWS4X4: i32 = 48;
const COLUMNS4X4: i32 = 64;
const LAST: [ReferenceFrame; 2] = [ReferenceFrame::Last, ReferenceFrame::None];

/// A decoded frame at order hint 12 where every 16x16 block moved by `mv`
/// relative to LAST at hint 10.
fn decode_previous_frame(mv: MotionVector) -> Result<SavedMotionField> {
    let frame = FrameContext::builder(ROWS4X4, COLUMNS4X4)
        .order_hint(12, 6)
        .reference_order_hint(ReferenceFrame::Last, 10)
        .build()?;
    let mut store = NeighborStore::for_frame(&frame)?;
    for row in (0..ROWS4X4).step_by(4) {
        for col in (0..COLUMNS4X4).step_by(4) {
            store.insert(row, col, single(mv, PredictionMode::NewMv))?;
        }
    }
    Ok(SavedMotionField::capture(&frame, &store, false))
}

/// The current frame at hint 11, between LAST (10) and BACKWARD (12).
fn current_frame() -> Result<FrameContext> {
    Ok(FrameContext::builder(ROWS4X4, COLUMNS4X4)
        .allow_high_precision_mv(true)
        .use_ref_frame_mvs(true)
        .order_hint(11, 6)
        .reference_order_hint(ReferenceFrame::Last, 10)
        .reference_order_hint(ReferenceFrame::Backward, 12)
        .build()?)
}

#[test]
fn projected_motion_reaches_the_stack() -> Result<()> {
    let saved = decode_previous_frame(MotionVector::new(32, -16))?;
    let frame = current_frame()?;
    let projector = MotionFieldProjector::new(&frame).with_source(ReferenceFrame::Backward, &saved);
    let mut field = TemporalMotionField::for_frame(&frame);
    projector.setup(0..ROWS4X4, 0..COLUMNS4X4, &mut field);

    let store = NeighborStore::for_frame(&frame)?;
    let tile =
        Tile::new(&frame, &store, TileBounds::whole_frame(&frame))?.with_motion_field(&field);
    let block = Block::new(&tile, BlockSize::Block16x16, 16, 16, LAST);
    let (params, contexts) = find_mv_stack(&block, false);

    // Stored over 2 frames, LAST is 1 frame back: half the vector.
    assert_eq!(params.ranked_mv(0), Some(MotionVector::new(16, -8)));
    assert_eq!(params.nearest_mv_count, 0);
    assert!(params.ref_mv_count >= 2);
    assert_eq!(contexts.zero_mv, measured(true));
    Ok(())
}

#[test]
fn sequential_and_parallel_projection_agree() -> Result<()> {
    let saved = decode_previous_frame(MotionVector::new(-300, 260))?;
    let frame = current_frame()?;
    let projector = MotionFieldProjector::new(&frame).with_source(ReferenceFrame::Backward, &saved);

    let mut sequential = TemporalMotionField::for_frame(&frame);
    projector.setup(0..ROWS4X4, 0..COLUMNS4X4, &mut sequential);
    let mut parallel = TemporalMotionField::for_frame(&frame);
    projector.setup_parallel(&mut parallel);

    for y8 in 0..sequential.rows() {
        for x8 in 0..sequential.columns() {
            assert_eq!(sequential.get(y8, x8), parallel.get(y8, x8));
        }
    }
    Ok(())
}

#[test]
fn decoded_neighbours_feed_stack_and_warp() -> Result<()> {
    let frame = current_frame()?;
    let mut store = NeighborStore::for_frame(&frame)?;
    let above = MotionVector::new(10, 2);
    let left = MotionVector::new(12, 0);
    store.insert(4, 8, single(above, PredictionMode::NewMv))?;
    store.insert(8, 4, single(left, PredictionMode::NearestMv))?;
    let field = TemporalMotionField::for_frame(&frame);
    let tile =
        Tile::new(&frame, &store, TileBounds::whole_frame(&frame))?.with_motion_field(&field);
    let block = Block::new(&tile, BlockSize::Block16x16, 8, 8, LAST);

    let (params, contexts) = find_mv_stack(&block, false);
    assert_eq!(params.nearest_mv_count, 2);
    let ranked: Vec<_> = params.ranked_mvs().collect();
    // Each neighbour is met again by the scans three rows/columns out.
    assert_eq!(ranked, vec![(above, 16), (left, 16)]);
    assert_eq!((contexts.new_mv, contexts.reference_mv), (4, 5));
    // Empty temporal field at the first sample position.
    assert_eq!(contexts.zero_mv, ZeroMvContext::TemporalUnavailable);

    let best = params.ranked_mv(0).unwrap_or_default();
    let chosen = block.with_mv(block.clamp_mv(best));
    let warp = find_warp_samples(&chosen);
    assert_eq!(warp.num_samples_scanned, 2);
    assert_eq!(warp.num_warp_samples, 2);
    Ok(())
}

#[test]
fn bad_configuration_is_reported() {
    let err = FrameContext::builder(8, 8)
        .order_hint(300, 8)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("300"));
    let frame = FrameContext::builder(8, 8).build().expect("valid frame");
    let mut store = NeighborStore::for_frame(&frame).expect("valid store");
    assert!(store.insert(8, 0, BlockParameters::intra(BlockSize::Block8x8)).is_err());
}
