/// Read-only view of the host's tree data, addressed by stable node ids.
///
/// Nodes are created and destroyed by the data owner; the engine never
/// allocates or frees them, it only indexes them. A flat table is the
/// degenerate case: every row is a root and `children` returns an empty
/// slice (combine with [`crate::DisplayMode::Table`]).
///
/// After any structural change (insert/remove/reparent, or an async subtree
/// load completing), the owner must call [`crate::Engine::rebuild`] or the
/// targeted splice operations (`toggle_expanded`, `complete_subtree_load`)
/// before reading positions again.
pub trait TreeSource {
    type Id: crate::NodeKey;

    /// Top-level nodes, in display order.
    fn roots(&self) -> &[Self::Id];

    /// Children of `id`, in display order. Empty for leaves and for subtrees
    /// whose async load has not completed yet.
    fn children(&self, id: &Self::Id) -> &[Self::Id];

    /// Parent of `id`, `None` for roots. Used by cascade selection to walk
    /// ancestors without touching rendered state.
    fn parent(&self, id: &Self::Id) -> Option<&Self::Id>;
}
