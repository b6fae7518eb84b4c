use alloc::vec::Vec;

/// Target alignment for programmatic scrolling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    Auto,
}

/// How the flat sequence is derived from the data.
///
/// `Table` treats every root as an always-visible depth-0 row and never
/// descends into children. `Tree` includes a node's children iff the node is
/// expanded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DisplayMode {
    Table,
    #[default]
    Tree,
}

/// Tri-state selection value for cascading hierarchical selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriState {
    #[default]
    Unchecked,
    Checked,
    Indeterminate,
}

/// One entry of the flattened sequence.
///
/// Its logical position is its index in the sequence; positions are contiguous
/// and strictly increasing in pre-order traversal order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatEntry<K> {
    /// Stable id of the node this entry mirrors. The node itself stays owned
    /// by the data source.
    pub id: K,
    pub depth: u32,
    /// Logical position of the parent entry, `None` for roots.
    pub parent: Option<usize>,
}

/// The contiguous range of logical positions that must be materialized.
///
/// `end` is exclusive. `buffer_before`/`buffer_after` record how many of the
/// contained positions are off-screen buffer rows (clamped at the sequence
/// edges, so they may be smaller than the configured buffer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderWindow {
    pub start: usize,
    pub end: usize,
    pub buffer_before: usize,
    pub buffer_after: usize,
}

impl RenderWindow {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end
    }
}

/// Opaque handle to one pooled, host-materialized row representation.
///
/// The host maps a slot to a concrete widget/element once on `create` and
/// keeps that mapping until the slot shows up in `destroy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowSlot(pub u32);

/// A live row representation bound to exactly one logical position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderedRow {
    pub slot: RowSlot,
    pub position: usize,
}

/// Instructions for the host after a window change.
///
/// `create` binds brand-new slots, `reuse` re-binds surviving slots that left
/// the window to uncovered positions, `destroy` releases surplus slots. Rows
/// already inside the window are not mentioned; the host re-reads their
/// offsets via `offset_for_position` when it repositions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reconciliation {
    pub create: Vec<(RowSlot, usize)>,
    pub reuse: Vec<(RowSlot, usize)>,
    pub destroy: Vec<RowSlot>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.reuse.is_empty() && self.destroy.is_empty()
    }
}
