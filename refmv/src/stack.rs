//! The ranked candidate stack produced for every inter block.

use crate::constants::MAX_REF_MV_STACK_SIZE;
use crate::types::{CompoundMotionVector, MotionVector};

/// Accumulated weight of one stack entry, with the entry's slot in the
/// vector arrays. Sorting reorders these, never the vectors themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeightIndex {
    pub weight: u32,
    pub index: u8,
}

/// Candidate vectors for one block, in the order the derivation found them,
/// plus the ranking produced by the weight sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionParameters {
    /// Global motion evaluated at the block, per reference direction.
    pub global_mv: [MotionVector; 2],
    pub ref_mv_stack: [MotionVector; MAX_REF_MV_STACK_SIZE],
    pub compound_ref_mv_stack: [CompoundMotionVector; MAX_REF_MV_STACK_SIZE],
    pub weight_index_stack: [WeightIndex; MAX_REF_MV_STACK_SIZE],
    /// Entries found by the adjacent row, column and top-right scans.
    pub nearest_mv_count: usize,
    pub ref_mv_count: usize,
}

impl PredictionParameters {
    #[inline]
    pub(crate) fn set_weight_index_stack_entry(&mut self, index: usize, weight: u32) {
        self.weight_index_stack[index] = WeightIndex {
            weight,
            index: index as u8,
        };
    }

    #[inline]
    pub(crate) fn increase_weight(&mut self, index: usize, weight: u32) {
        self.weight_index_stack[index].weight += weight;
    }

    /// Merges a single-reference candidate into the stack.
    ///
    /// An equal entry gains `weight`; otherwise the candidate is appended
    /// while there is room and silently dropped when the stack is full.
    pub(crate) fn add_single(&mut self, candidate: MotionVector, weight: u32) {
        let count = self.ref_mv_count;
        let existing = self.ref_mv_stack[..count]
            .iter()
            .position(|&mv| mv == candidate);
        if let Some(index) = existing {
            self.increase_weight(index, weight);
            return;
        }
        if count >= MAX_REF_MV_STACK_SIZE {
            return;
        }
        self.ref_mv_stack[count] = candidate;
        self.set_weight_index_stack_entry(count, weight);
        self.ref_mv_count += 1;
    }

    /// Compound counterpart of [`add_single`](Self::add_single); both
    /// directions must match for entries to merge.
    pub(crate) fn add_compound(&mut self, candidate: CompoundMotionVector, weight: u32) {
        let count = self.ref_mv_count;
        let existing = self.compound_ref_mv_stack[..count]
            .iter()
            .position(|&mv| mv == candidate);
        if let Some(index) = existing {
            self.increase_weight(index, weight);
            return;
        }
        if count >= MAX_REF_MV_STACK_SIZE {
            return;
        }
        self.compound_ref_mv_stack[count] = candidate;
        self.set_weight_index_stack_entry(count, weight);
        self.ref_mv_count += 1;
    }

    /// Ranks the nearest entries among themselves and, when there are fewer
    /// than four of them, the remaining entries among themselves.
    pub(crate) fn sort(&mut self) {
        let nearest = self.nearest_mv_count.min(self.ref_mv_count);
        sort_weight_index_stack(&mut self.weight_index_stack[..nearest]);
        if nearest < 4 {
            sort_weight_index_stack(&mut self.weight_index_stack[nearest..self.ref_mv_count]);
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.ref_mv_count
    }

    /// Single-reference candidate of rank `rank`.
    pub fn ranked_mv(&self, rank: usize) -> Option<MotionVector> {
        (rank < self.ref_mv_count)
            .then(|| self.ref_mv_stack[self.weight_index_stack[rank].index as usize])
    }

    /// Compound candidate of rank `rank`.
    pub fn ranked_compound_mv(&self, rank: usize) -> Option<CompoundMotionVector> {
        (rank < self.ref_mv_count)
            .then(|| self.compound_ref_mv_stack[self.weight_index_stack[rank].index as usize])
    }

    /// Single-reference candidates, best first.
    pub fn ranked_mvs(&self) -> impl Iterator<Item = (MotionVector, u32)> + '_ {
        self.weight_index_stack[..self.ref_mv_count]
            .iter()
            .map(|entry| (self.ref_mv_stack[entry.index as usize], entry.weight))
    }

    /// Compound candidates, best first.
    pub fn ranked_compound_mvs(&self) -> impl Iterator<Item = (CompoundMotionVector, u32)> + '_ {
        self.weight_index_stack[..self.ref_mv_count]
            .iter()
            .map(|entry| (self.compound_ref_mv_stack[entry.index as usize], entry.weight))
    }
}

#[inline]
fn descending_order_two(stack: &mut [WeightIndex], a: usize, b: usize) {
    if stack[a].weight < stack[b].weight {
        stack.swap(a, b);
    }
}

/// Stable descending sort by weight.
///
/// Up to three entries go through a fixed compare-exchange network; equal
/// weights are never exchanged, so both paths keep ties in insertion order.
pub fn sort_weight_index_stack(stack: &mut [WeightIndex]) {
    match stack.len() {
        0 | 1 => {}
        2 => descending_order_two(stack, 0, 1),
        3 => {
            descending_order_two(stack, 0, 1);
            descending_order_two(stack, 1, 2);
            descending_order_two(stack, 0, 1);
        }
        _ => stack.sort_by(|a, b| b.weight.cmp(&a.weight)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn entries(weights: &[u32]) -> Vec<WeightIndex> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &weight)| WeightIndex {
                weight,
                index: i as u8,
            })
            .collect()
    }

    #[test]
    fn small_network_matches_stable_sort() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..2000 {
            let len = rng.gen_range(0..=3);
            // Narrow range to force ties.
            let weights: Vec<u32> = (0..len).map(|_| rng.gen_range(0..4) * 2).collect();
            let mut network = entries(&weights);
            sort_weight_index_stack(&mut network);
            let mut reference = entries(&weights);
            reference.sort_by(|a, b| b.weight.cmp(&a.weight));
            assert_eq!(network, reference, "weights {:?}", weights);
        }
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut stack = entries(&[2, 6, 2, 6, 4]);
        sort_weight_index_stack(&mut stack);
        let order: Vec<u8> = stack.iter().map(|e| e.index).collect();
        assert_eq!(order, vec![1, 3, 4, 0, 2]);
    }

    #[test]
    fn duplicates_merge_weights() {
        let mut params = PredictionParameters::default();
        let mv = MotionVector::new(4, 8);
        params.add_single(mv, 4);
        params.add_single(MotionVector::new(0, 2), 2);
        params.add_single(mv, 6);
        assert_eq!(params.ref_mv_count, 2);
        assert_eq!(params.weight_index_stack[0].weight, 10);
        assert_eq!(params.weight_index_stack[1].weight, 2);
    }

    #[test]
    fn full_stack_drops_new_candidates() {
        let mut params = PredictionParameters::default();
        for i in 0..MAX_REF_MV_STACK_SIZE as i16 {
            params.add_single(MotionVector::new(i * 2, 0), 2);
        }
        params.add_single(MotionVector::new(100, 0), 20);
        assert_eq!(params.ref_mv_count, MAX_REF_MV_STACK_SIZE);
        assert!(params.ranked_mvs().all(|(mv, _)| mv.row != 100));
        // Existing entries still accumulate.
        params.add_single(MotionVector::new(6, 0), 2);
        assert_eq!(params.weight_index_stack[3].weight, 4);
    }

    #[test]
    fn compound_entries_need_both_directions() {
        let mut params = PredictionParameters::default();
        let a = MotionVector::new(2, 2);
        let b = MotionVector::new(-2, 6);
        params.add_compound(CompoundMotionVector::new(a, b), 2);
        params.add_compound(CompoundMotionVector::new(a, a), 2);
        params.add_compound(CompoundMotionVector::new(a, b), 2);
        assert_eq!(params.ref_mv_count, 2);
        assert_eq!(params.weight_index_stack[0].weight, 4);
    }

    #[test]
    fn groups_sort_separately() {
        let mut params = PredictionParameters::default();
        for (i, weight) in [2u32, 4, 8, 16].into_iter().enumerate() {
            params.add_single(MotionVector::new(i as i16 * 2, 0), weight);
        }
        params.nearest_mv_count = 2;
        params.sort();
        let order: Vec<u8> = params.weight_index_stack[..4]
            .iter()
            .map(|e| e.index)
            .collect();
        assert_eq!(order, vec![1, 0, 3, 2]);
        assert_eq!(params.ranked_mv(0), Some(MotionVector::new(2, 0)));
        assert_eq!(params.ranked_mv(4), None);
    }

    #[test]
    fn many_nearest_leave_rest_unsorted() {
        let mut params = PredictionParameters::default();
        for (i, weight) in [2u32, 4, 6, 8, 2, 10].into_iter().enumerate() {
            params.add_single(MotionVector::new(i as i16 * 2, 0), weight);
        }
        params.nearest_mv_count = 4;
        params.sort();
        let order: Vec<u8> = params.weight_index_stack[..6]
            .iter()
            .map(|e| e.index)
            .collect();
        assert_eq!(order, vec![3, 2, 1, 0, 4, 5]);
    }
}
