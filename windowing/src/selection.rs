use alloc::vec::Vec;

use crate::key::{KeyMap, KeySet};
use crate::source::TreeSource;
use crate::types::TriState;

/// Cross-cutting, position-independent state that survives virtualization:
/// the expand/collapse set, tri-state selection, and in-flight subtree-load
/// markers.
///
/// Everything is keyed by stable node id, never by logical position or row
/// identity, so scrolling, recycling, and re-flattening leave it untouched.
/// Selection cascades recurse over the logical node graph, so the tri-state
/// invariant holds for off-screen, unmaterialized nodes too.
///
/// Expansion flags feed the Flattener; when the store sits inside an
/// [`crate::Engine`], flip them through [`crate::Engine::toggle_expanded`] so
/// the flat sequence is spliced in the same step.
#[derive(Clone, Debug)]
pub struct StateStore<K> {
    expanded: KeySet<K>,
    selection: KeyMap<K, TriState>,
    pending_loads: KeySet<K>,
}

impl<K: crate::NodeKey> Default for StateStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: crate::NodeKey> StateStore<K> {
    pub fn new() -> Self {
        Self {
            expanded: KeySet::default(),
            selection: KeyMap::default(),
            pending_loads: KeySet::default(),
        }
    }

    // --- expand/collapse ---

    pub fn is_expanded(&self, id: &K) -> bool {
        self.expanded.contains(id)
    }

    /// Returns whether the flag changed. Collapsing also clears any pending
    /// subtree-load marker, which is what makes late load results ignorable.
    pub fn set_expanded(&mut self, id: K, expanded: bool) -> bool {
        if expanded {
            self.expanded.insert(id)
        } else {
            self.pending_loads.remove(&id);
            self.expanded.remove(&id)
        }
    }

    /// Flips the flag and returns the new state.
    pub fn toggle_expanded(&mut self, id: K) -> bool {
        let next = !self.is_expanded(&id);
        self.set_expanded(id, next);
        next
    }

    // --- tri-state selection ---

    pub fn selection_state(&self, id: &K) -> TriState {
        self.selection.get(id).copied().unwrap_or_default()
    }

    /// Raw setter; does not cascade.
    pub fn set_selection_state(&mut self, id: K, state: TriState) {
        self.store(id, state);
    }

    /// Toggles a node's selection and returns its new state.
    ///
    /// With `cascade`, every descendant takes the new state and ancestors are
    /// recomputed from their immediate children, stopping as soon as an
    /// ancestor's state is already correct (which bounds the walk to O(depth)
    /// amortized). Descendants are walked over the node graph regardless of
    /// what is expanded or rendered.
    pub fn toggle_selected<S: TreeSource<Id = K>>(
        &mut self,
        source: &S,
        id: &K,
        cascade: bool,
    ) -> TriState {
        let next = match self.selection_state(id) {
            TriState::Checked => TriState::Unchecked,
            TriState::Unchecked | TriState::Indeterminate => TriState::Checked,
        };

        if !cascade {
            self.store(id.clone(), next);
            return next;
        }

        let mut stack: Vec<K> = alloc::vec![id.clone()];
        while let Some(cur) = stack.pop() {
            for child in source.children(&cur) {
                stack.push(child.clone());
            }
            self.store(cur, next);
        }

        let mut cur = source.parent(id).cloned();
        while let Some(parent) = cur {
            let combined = self.combine_children(source, &parent);
            if self.selection_state(&parent) == combined {
                break;
            }
            cur = source.parent(&parent).cloned();
            self.store(parent, combined);
        }

        next
    }

    fn combine_children<S: TreeSource<Id = K>>(&self, source: &S, id: &K) -> TriState {
        let mut all_checked = true;
        let mut all_unchecked = true;
        for child in source.children(id) {
            match self.selection_state(child) {
                TriState::Checked => all_unchecked = false,
                TriState::Unchecked => all_checked = false,
                TriState::Indeterminate => {
                    all_checked = false;
                    all_unchecked = false;
                }
            }
        }
        if all_checked {
            TriState::Checked
        } else if all_unchecked {
            TriState::Unchecked
        } else {
            TriState::Indeterminate
        }
    }

    fn store(&mut self, id: K, state: TriState) {
        // Unchecked is the default; keep the map sparse.
        if state == TriState::Unchecked {
            self.selection.remove(&id);
        } else {
            self.selection.insert(id, state);
        }
    }

    // --- async subtree loads ---

    /// Marks a lazily loaded subtree as in flight. Returns `false` when a
    /// load for this node is already pending.
    pub fn begin_subtree_load(&mut self, id: K) -> bool {
        self.pending_loads.insert(id)
    }

    pub fn is_load_pending(&self, id: &K) -> bool {
        self.pending_loads.contains(id)
    }

    /// Check-before-apply gate for a completed load: clears the marker and
    /// returns whether the result is still wanted (the load is pending and
    /// the node is still expanded). A node re-collapsed mid-flight already
    /// lost its marker, so its late result reports unwanted here.
    pub fn take_subtree_load(&mut self, id: &K) -> bool {
        self.pending_loads.remove(id) && self.is_expanded(id)
    }

    /// Drops every trace of `id` (selection, expansion, pending load). Call
    /// when the data owner deletes a node, before its id may be reused.
    pub fn forget(&mut self, id: &K) {
        self.expanded.remove(id);
        self.selection.remove(id);
        self.pending_loads.remove(id);
    }
}
