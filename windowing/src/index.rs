use alloc::vec::Vec;
use core::cmp;

use crate::fenwick::Fenwick;

/// Prefix-offset table over the flat sequence's row heights (the Index Model).
///
/// Two shapes, chosen at engine construction:
/// - uniform: every row shares one height, all queries are pure arithmetic
///   and splices never touch a prefix table;
/// - measured: per-row heights with Fenwick prefix sums, `O(log n)` queries.
#[derive(Clone, Debug)]
pub struct RowIndex {
    model: Model,
}

#[derive(Clone, Debug)]
enum Model {
    Uniform { size: u32, count: usize },
    Measured { sizes: Vec<u32>, sums: Fenwick },
}

impl RowIndex {
    pub fn uniform(size: u32, count: usize) -> Self {
        Self {
            model: Model::Uniform { size, count },
        }
    }

    pub fn measured(sizes: Vec<u32>) -> Self {
        let sums = Fenwick::from_sizes(&sizes);
        Self {
            model: Model::Measured { sizes, sums },
        }
    }

    pub fn len(&self) -> usize {
        match &self.model {
            Model::Uniform { count, .. } => *count,
            Model::Measured { sizes, .. } => sizes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cumulative height of the entire flat sequence.
    pub fn total_extent(&self) -> u64 {
        match &self.model {
            Model::Uniform { size, count } => *size as u64 * *count as u64,
            Model::Measured { sums, .. } => sums.total(),
        }
    }

    /// Cumulative height up to (not including) `position`.
    ///
    /// `position` is clamped to the sequence length, so `offset_for_position
    /// (len())` is the total extent.
    pub fn offset_for_position(&self, position: usize) -> u64 {
        match &self.model {
            Model::Uniform { size, count } => {
                *size as u64 * cmp::min(position, *count) as u64
            }
            Model::Measured { sums, .. } => sums.prefix_sum(position),
        }
    }

    /// The logical position whose height range contains `scroll_offset`.
    ///
    /// Out-of-extent offsets clamp to the last row (scroll bounce tolerance);
    /// an empty sequence yields 0.
    pub fn position_for_offset(&self, scroll_offset: u64) -> usize {
        let count = self.len();
        if count == 0 {
            return 0;
        }
        let last = count - 1;
        match &self.model {
            Model::Uniform { size, .. } => {
                if *size == 0 {
                    return 0;
                }
                cmp::min((scroll_offset / *size as u64) as usize, last)
            }
            Model::Measured { sums, .. } => cmp::min(sums.lower_bound(scroll_offset), last),
        }
    }

    pub fn size_of(&self, position: usize) -> Option<u32> {
        match &self.model {
            Model::Uniform { size, count } => (position < *count).then_some(*size),
            Model::Measured { sizes, .. } => sizes.get(position).copied(),
        }
    }

    /// Replaces one row's height, returning the applied delta.
    ///
    /// No-op for uniform indexes (the engine never routes measurements here
    /// in uniform mode).
    pub fn set_size(&mut self, position: usize, size: u32) -> i64 {
        match &mut self.model {
            Model::Uniform { .. } => {
                debug_assert!(false, "set_size on a uniform RowIndex");
                0
            }
            Model::Measured { sizes, sums } => {
                let Some(cur) = sizes.get_mut(position) else {
                    return 0;
                };
                let delta = size as i64 - *cur as i64;
                if delta != 0 {
                    *cur = size;
                    sums.add(position, delta);
                }
                delta
            }
        }
    }

    /// Replaces the run `[at, at + removed)` with rows of the given heights.
    ///
    /// Uniform indexes only adjust the count. Measured indexes rebuild the
    /// prefix sums from the splice point onward (the suffix recompute the
    /// contract allows).
    pub fn splice(&mut self, at: usize, removed: usize, inserted: &[u32]) {
        match &mut self.model {
            Model::Uniform { count, .. } => {
                debug_assert!(at + removed <= *count, "splice out of range");
                *count = count.saturating_sub(removed).saturating_add(inserted.len());
            }
            Model::Measured { sizes, sums } => {
                debug_assert!(at + removed <= sizes.len(), "splice out of range");
                let at = cmp::min(at, sizes.len());
                let end = cmp::min(at + removed, sizes.len());
                sizes.splice(at..end, inserted.iter().copied());
                sums.truncate(at);
                sums.extend_from_sizes(&sizes[at..]);
            }
        }
    }
}
