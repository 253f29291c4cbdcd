//! Projection of saved reference motion into the current frame's temporal field.
//!
//! Sources are tried in a fixed priority order: LAST (reversed), then
//! BACKWARD, ALTERNATE2 and ALTERNATE toward the future, then LAST2
//! (reversed). The latter two are only used while fewer than two of the
//! forward sources produced a usable projection. Later projections overwrite
//! earlier ones cell by cell.
//!
//! A stored vector never moves more than one 64x64 row band vertically, so
//! every band of [`SLAB_ROWS8X8`] rows can be filled on its own; that is what
//! [`MotionFieldProjector::setup_parallel`] exploits.

use std::ops::Range;

use arrayvec::ArrayVec;
use enum_map::EnumMap;
use log::{debug, trace};
use rayon::prelude::*;
use strum::IntoEnumIterator;

use crate::constants::{
    MAX_FRAME_DISTANCE, PROJECTION_MV_DIVISION_LOOKUP, PROJECTION_MV_MAX_HORIZONTAL_OFFSET,
};
use crate::frame::FrameContext;
use crate::motion_field::{FieldSlab, SavedMotionField, TemporalMotionField, SLAB_ROWS8X8};
use crate::precision::{project_mv_with_division, project_position};
use crate::types::ReferenceFrame;

/// Per source-reference distance and reciprocal, zero when the reference is skipped.
#[derive(Debug, Clone, Copy, Default)]
struct SourceOffset {
    offset: i8,
    division: i32,
}

/// One source frame ready to be scattered into the field.
#[derive(Clone)]
struct ProjectionPass<'a> {
    source: &'a SavedMotionField,
    reference_to_current: i32,
    reverse: bool,
    offsets: EnumMap<ReferenceFrame, SourceOffset>,
}

/// Outcome of checking one source before projecting it.
enum SourceCheck<'a> {
    /// Missing, intra-only, or of different dimensions.
    Unusable,
    /// Usable, but too far away to contribute anything.
    TooFar,
    Ready(ProjectionPass<'a>),
}

impl SourceCheck<'_> {
    fn is_usable(&self) -> bool {
        !matches!(self, SourceCheck::Unusable)
    }
}

pub struct MotionFieldProjector<'a> {
    frame: &'a FrameContext,
    sources: EnumMap<ReferenceFrame, Option<&'a SavedMotionField>>,
}

impl<'a> MotionFieldProjector<'a> {
    pub fn new(frame: &'a FrameContext) -> Self {
        MotionFieldProjector {
            frame,
            sources: EnumMap::default(),
        }
    }

    /// Registers the saved field of the frame behind `reference`.
    pub fn with_source(mut self, reference: ReferenceFrame, source: &'a SavedMotionField) -> Self {
        debug_assert!(reference.is_inter());
        self.sources[reference] = Some(source);
        self
    }

    fn check(
        &self,
        reference: ReferenceFrame,
        reference_to_current: i32,
        reverse: bool,
    ) -> SourceCheck<'a> {
        let Some(source) = self.sources[reference] else {
            trace!("projection: no saved field for {:?}", reference);
            return SourceCheck::Unusable;
        };
        if source.rows4x4 != self.frame.rows4x4 || source.columns4x4 != self.frame.columns4x4 {
            debug!(
                "projection: {:?} is {}x{} (4x4), current frame is {}x{}",
                reference,
                source.rows4x4,
                source.columns4x4,
                self.frame.rows4x4,
                self.frame.columns4x4
            );
            return SourceCheck::Unusable;
        }
        if source.is_intra_frame {
            trace!("projection: {:?} is an intra frame", reference);
            return SourceCheck::Unusable;
        }
        if reference_to_current > MAX_FRAME_DISTANCE {
            trace!("projection: {:?} is {} frames away", reference, reference_to_current);
            return SourceCheck::TooFar;
        }

        let mut offsets: EnumMap<ReferenceFrame, SourceOffset> = EnumMap::default();
        for r in ReferenceFrame::iter().filter(|r| r.is_inter()) {
            let offset =
                self.frame.relative_distance(source.order_hint, source.reference_order_hint[r]);
            if offset > 0 && offset <= MAX_FRAME_DISTANCE {
                offsets[r] = SourceOffset {
                    offset: offset as i8,
                    division: PROJECTION_MV_DIVISION_LOOKUP[offset as usize],
                };
            }
        }
        SourceCheck::Ready(ProjectionPass {
            source,
            reference_to_current,
            reverse,
            offsets,
        })
    }

    /// Projects the saved field behind `reference` into `field` over the given
    /// area of the current frame.
    ///
    /// `reference_to_current` is the signed order-hint distance used to scale
    /// stored vectors; `reverse` flips the direction positions move in.
    /// Returns whether the source was usable; a usable source further than 31
    /// frames away writes nothing.
    pub fn project(
        &self,
        reference: ReferenceFrame,
        reference_to_current: i32,
        reverse: bool,
        rows4x4: Range<i32>,
        columns4x4: Range<i32>,
        field: &mut TemporalMotionField,
    ) -> bool {
        let check = self.check(reference, reference_to_current, reverse);
        if let SourceCheck::Ready(pass) = &check {
            let (y8, x8) = self.area8x8(rows4x4, columns4x4);
            for mut slab in field.slabs_mut() {
                project_slab(pass, y8.clone(), x8.clone(), &mut slab);
            }
        }
        check.is_usable()
    }

    /// Decides which sources contribute, in the order they are applied.
    fn plan(&self) -> ArrayVec<ProjectionPass<'a>, 5> {
        let frame = self.frame;
        let mut passes = ArrayVec::new();
        let mut push = |check: SourceCheck<'a>| {
            let usable = check.is_usable();
            if let SourceCheck::Ready(pass) = check {
                passes.push(pass);
            }
            usable
        };

        // LAST is skipped when its own ALTERNATE is the current GOLDEN frame.
        let last_alternate = self.sources[ReferenceFrame::Last]
            .map(|s| s.reference_order_hint[ReferenceFrame::Alternate]);
        let golden = frame.reference_order_hint[ReferenceFrame::Golden];
        if last_alternate.is_some_and(|hint| hint != golden) {
            let offset = -frame.relative_distance(
                frame.reference_order_hint[ReferenceFrame::Last],
                frame.order_hint,
            );
            if offset.abs() <= MAX_FRAME_DISTANCE {
                push(self.check(ReferenceFrame::Last, offset, true));
            }
        }

        let mut ref_stamp = 1;
        for reference in [ReferenceFrame::Backward, ReferenceFrame::Alternate2] {
            let offset =
                frame.relative_distance(frame.reference_order_hint[reference], frame.order_hint);
            if offset > 0 && push(self.check(reference, offset, false)) {
                ref_stamp -= 1;
            }
        }
        if ref_stamp >= 0 {
            let offset = frame.relative_distance(
                frame.reference_order_hint[ReferenceFrame::Alternate],
                frame.order_hint,
            );
            if offset > 0 && push(self.check(ReferenceFrame::Alternate, offset, false)) {
                ref_stamp -= 1;
            }
        }
        if ref_stamp >= 0 {
            let offset = -frame.relative_distance(
                frame.reference_order_hint[ReferenceFrame::Last2],
                frame.order_hint,
            );
            if offset.abs() <= MAX_FRAME_DISTANCE {
                push(self.check(ReferenceFrame::Last2, offset, true));
            }
        }
        passes
    }

    fn area8x8(&self, rows4x4: Range<i32>, columns4x4: Range<i32>) -> (Range<usize>, Range<i32>) {
        let y8_start = (rows4x4.start.max(0) >> 1) as usize;
        let y8_end = (rows4x4.end.min(self.frame.rows4x4).max(0) >> 1) as usize;
        let x8_start = columns4x4.start.max(0) >> 1;
        let x8_end = columns4x4.end.min(self.frame.columns4x4).max(0) >> 1;
        (y8_start..y8_end, x8_start..x8_end)
    }

    /// Fills `field` for the given area from every contributing source.
    pub fn setup(
        &self,
        rows4x4: Range<i32>,
        columns4x4: Range<i32>,
        field: &mut TemporalMotionField,
    ) {
        if self.frame.order_hint_bits == 0 {
            debug!("projection: order hints disabled, field left empty");
            return;
        }
        let passes = self.plan();
        debug!("projection: {} source(s) for rows {:?}", passes.len(), rows4x4);
        let (y8, x8) = self.area8x8(rows4x4, columns4x4);
        for mut slab in field.slabs_mut() {
            for pass in &passes {
                project_slab(pass, y8.clone(), x8.clone(), &mut slab);
            }
        }
    }

    /// Fills the whole field, one row band per task.
    pub fn setup_parallel(&self, field: &mut TemporalMotionField) {
        if self.frame.order_hint_bits == 0 {
            debug!("projection: order hints disabled, field left empty");
            return;
        }
        let passes = self.plan();
        debug!("projection: {} source(s), parallel", passes.len());
        let (y8, x8) = self.area8x8(0..self.frame.rows4x4, 0..self.frame.columns4x4);
        field.par_slabs_mut().for_each(|mut slab| {
            for pass in &passes {
                project_slab(pass, y8.clone(), x8.clone(), &mut slab);
            }
        });
    }
}

/// Scatters one source into the rows of `slab` that fall inside `y8`.
fn project_slab(pass: &ProjectionPass, y8: Range<usize>, x8: Range<i32>, slab: &mut FieldSlab) {
    let rows = y8.start.max(slab.y8_start)..y8.end.min(slab.y8_end());
    if rows.is_empty() || x8.is_empty() {
        return;
    }
    let source = pass.source;
    let stride = slab.stride as i32;
    let scan_start = (x8.start - PROJECTION_MV_MAX_HORIZONTAL_OFFSET).max(0);
    let scan_end = (x8.end + PROJECTION_MV_MAX_HORIZONTAL_OFFSET)
        .min(stride)
        .min(source.columns() as i32);

    for row in rows {
        let y8_floor = (row & !7) as i32 - row as i32;
        let y8_ceiling = (y8.end as i32 - row as i32).min(y8_floor + SLAB_ROWS8X8 as i32);
        for column in scan_start..scan_end {
            let (reference, mv) = source.get(row, column as usize);
            if !reference.is_inter() {
                continue;
            }
            let SourceOffset { offset, division } = pass.offsets[reference];
            if offset == 0 {
                continue;
            }
            let projection = project_mv_with_division(mv, pass.reference_to_current, division);
            let position_y8 = project_position(0, projection.row as i32, pass.reverse);
            if position_y8 < y8_floor || position_y8 >= y8_ceiling {
                continue;
            }
            let x8_base = column & !7;
            let x8_floor = x8.start.max(x8_base - PROJECTION_MV_MAX_HORIZONTAL_OFFSET);
            let x8_ceiling = x8.end.min(x8_base + 2 * PROJECTION_MV_MAX_HORIZONTAL_OFFSET);
            let position_x8 = project_position(column, projection.col as i32, pass.reverse);
            if position_x8 < x8_floor || position_x8 >= x8_ceiling {
                continue;
            }
            let target = (row as i32 + position_y8) as usize;
            slab.write(target, position_x8 as usize, mv, offset);
        }
    }
}
