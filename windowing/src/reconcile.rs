use alloc::vec::Vec;

use crate::types::{Reconciliation, RenderWindow, RenderedRow, RowSlot};

/// Position a row parks at when its logical position vanished in a splice.
/// Never inside any window, so the next reconcile recycles the slot.
const PARKED: usize = usize::MAX;

/// The Render Synchronizer: owns the pool of live row representations and
/// diffs it against each newly computed window.
///
/// Reuse policy: rows that fell out of the window are paired arbitrarily with
/// uncovered positions; only the surplus is destroyed and only the deficit is
/// created. The steady-state pool size is bounded by the window size, and
/// churn per scroll tick is bounded by the number of positions that entered or
/// left the window.
#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    rows: Vec<RenderedRow>,
    applied: Option<RenderWindow>,
    next_slot: u32,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live rows, each bound to exactly one logical position.
    pub fn rows(&self) -> &[RenderedRow] {
        &self.rows
    }

    pub fn live_count(&self) -> usize {
        self.rows.len()
    }

    /// The window the pool currently reflects, if any.
    pub fn applied_window(&self) -> Option<RenderWindow> {
        self.applied
    }

    /// Forces the next `reconcile` to run even for an identical window.
    pub fn invalidate(&mut self) {
        self.applied = None;
    }

    /// Rebinds the pool after the flat sequence spliced `removed` positions
    /// out and `inserted` positions in at `at`: surviving rows shift, rows
    /// inside the removed run are parked for recycling.
    pub fn apply_splice(&mut self, at: usize, removed: usize, inserted: usize) {
        self.applied = None;
        for row in &mut self.rows {
            if row.position == PARKED || row.position < at {
                continue;
            }
            if row.position < at + removed {
                row.position = PARKED;
            } else {
                row.position = row.position - removed + inserted;
            }
        }
    }

    /// Diffs the pool against `window` and returns the host instructions.
    ///
    /// An unchanged window yields an empty reconciliation.
    pub fn reconcile(&mut self, window: RenderWindow) -> Reconciliation {
        if self.applied == Some(window) {
            return Reconciliation::default();
        }

        let mut out = Reconciliation::default();
        let mut covered = alloc::vec![false; window.len()];
        let mut recycled: Vec<RowSlot> = Vec::new();

        self.rows.retain(|row| {
            if window.contains(row.position) {
                let i = row.position - window.start;
                if covered[i] {
                    // Two rows on one position can only follow a stale splice;
                    // keep the first, recycle the other.
                    debug_assert!(false, "duplicate row at position {}", row.position);
                    recycled.push(row.slot);
                    return false;
                }
                covered[i] = true;
                true
            } else {
                recycled.push(row.slot);
                false
            }
        });

        for (i, seen) in covered.iter().enumerate() {
            if *seen {
                continue;
            }
            let position = window.start + i;
            if let Some(slot) = recycled.pop() {
                out.reuse.push((slot, position));
                self.rows.push(RenderedRow { slot, position });
            } else {
                let slot = RowSlot(self.next_slot);
                self.next_slot = self.next_slot.wrapping_add(1);
                out.create.push((slot, position));
                self.rows.push(RenderedRow { slot, position });
            }
        }

        out.destroy = recycled;
        self.applied = Some(window);
        wtrace!(
            created = out.create.len(),
            reused = out.reuse.len(),
            destroyed = out.destroy.len(),
            live = self.rows.len(),
            "reconcile"
        );
        out
    }
}
