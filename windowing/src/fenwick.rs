use alloc::vec::Vec;
use core::cmp;

/// Fenwick (binary indexed) tree over per-row heights.
///
/// Backs the measured-height row index: prefix sums give row offsets, and
/// `lower_bound` maps a scroll offset back to a row in `O(log n)`.
#[derive(Clone, Debug)]
pub(crate) struct Fenwick {
    tree: Vec<u64>, // 1-indexed
    total: u64,
    max_bit: usize,
}

impl Fenwick {
    pub(crate) fn new() -> Self {
        Self {
            tree: alloc::vec![0],
            total: 0,
            max_bit: 0,
        }
    }

    pub(crate) fn from_sizes(sizes: &[u32]) -> Self {
        let n = sizes.len();
        let mut tree = alloc::vec![0u64; n + 1];
        let mut total = 0u64;
        for i in 1..=n {
            let v = sizes[i - 1] as u64;
            total = total.saturating_add(v);
            tree[i] = tree[i].saturating_add(v);
            let j = i + lsb(i);
            if j <= n {
                tree[j] = tree[j].saturating_add(tree[i]);
            }
        }
        Self {
            tree,
            total,
            max_bit: top_bit(n),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    /// Drops all rows at index `new_len` and beyond.
    pub(crate) fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len() {
            return;
        }
        self.total = self.prefix_sum(new_len);
        self.tree.truncate(new_len + 1);
        self.max_bit = top_bit(new_len);
    }

    /// Appends one row of height `size`.
    ///
    /// `O(log n)`: the new internal node's value is derived from existing
    /// prefix sums (a Fenwick node at `i` covers the last `lsb(i)` rows).
    pub(crate) fn push(&mut self, size: u32) {
        let new_len = self.len() + 1;
        self.tree.push(0);
        self.total = self.total.saturating_add(size as u64);

        let covered_from = new_len - lsb(new_len);
        let before = self
            .prefix_sum(new_len - 1)
            .saturating_sub(self.prefix_sum(covered_from));
        self.tree[new_len] = before.saturating_add(size as u64);

        self.max_bit = top_bit(new_len);
    }

    /// Appends a run of rows. Used to rebuild the suffix after a splice.
    pub(crate) fn extend_from_sizes(&mut self, sizes: &[u32]) {
        for &s in sizes {
            self.push(s);
        }
    }

    pub(crate) fn add(&mut self, index: usize, delta: i64) {
        let n = self.len();
        if index >= n {
            return;
        }
        if delta > 0 {
            self.total = self.total.saturating_add(delta as u64);
        } else {
            self.total = self.total.saturating_sub(delta.unsigned_abs());
        }
        let mut i = index + 1;
        while i <= n {
            let cur = self.tree[i] as i128;
            let next = cur + delta as i128;
            debug_assert!(next >= 0, "Fenwick underflow (idx={i}, delta={delta})");
            self.tree[i] = next.clamp(0, u64::MAX as i128) as u64;
            i += lsb(i);
        }
    }

    pub(crate) fn prefix_sum(&self, count: usize) -> u64 {
        let mut i = cmp::min(count, self.len());
        let mut sum = 0u64;
        while i > 0 {
            sum = sum.saturating_add(self.tree[i]);
            i &= i - 1;
        }
        sum
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// Returns the number of rows whose prefix sum is <= `target`, i.e. the
    /// row index containing offset `target` (callers clamp to a valid index).
    pub(crate) fn lower_bound(&self, mut target: u64) -> usize {
        let n = self.len();
        if n == 0 {
            return 0;
        }
        let mut idx = 0usize;
        let mut bit = self.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && self.tree[next] <= target {
                target -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn top_bit(n: usize) -> usize {
    let mut p = 1usize;
    if n == 0 {
        return 0;
    }
    while p <= n / 2 {
        p <<= 1;
    }
    p
}
