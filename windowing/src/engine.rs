use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::flatten::{flatten, flatten_subtree};
use crate::index::RowIndex;
use crate::key::KeyMap;
use crate::reconcile::Reconciler;
use crate::selection::StateStore;
use crate::source::TreeSource;
use crate::{
    Align, DisplayMode, FlatEntry, FlattenError, Reconciliation, RenderWindow, RenderedRow,
    TriState,
};

/// A callback fired after the engine completes a consistent state transition.
pub type OnChangeCallback<K> = Arc<dyn Fn(&Engine<K>) + Send + Sync>;

/// Row height policy.
#[derive(Clone)]
pub enum HeightMode {
    /// Every row has the same fixed height. Offset queries are O(1) and
    /// splices never rebuild a prefix table.
    Uniform(u32),
    /// Rows start at an estimate (by logical position) and are refined by
    /// host measurements. Measurements are cached by node id, so they follow
    /// rows across splices and re-flattens.
    Estimated(Arc<dyn Fn(usize) -> u32 + Send + Sync>),
}

impl core::fmt::Debug for HeightMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Uniform(size) => f.debug_tuple("Uniform").field(size).finish(),
            Self::Estimated(_) => f.write_str("Estimated(..)"),
        }
    }
}

/// Configuration for [`Engine`].
///
/// Cheap to clone: closures are stored in `Arc`s.
pub struct EngineOptions<K> {
    pub mode: DisplayMode,
    /// Rows materialized on each side of the visible span to mask one-frame
    /// render latency while scrolling.
    pub buffer_rows: usize,
    pub heights: HeightMode,
    /// Invoked after every consistent state transition, never mid-mutation.
    pub on_change: Option<OnChangeCallback<K>>,
}

impl<K> EngineOptions<K> {
    /// Options for fixed-height rows.
    pub fn uniform(mode: DisplayMode, row_height: u32) -> Self {
        Self {
            mode,
            buffer_rows: 1,
            heights: HeightMode::Uniform(row_height),
            on_change: None,
        }
    }

    /// Options for estimated-then-measured row heights.
    pub fn estimated(
        mode: DisplayMode,
        estimate: impl Fn(usize) -> u32 + Send + Sync + 'static,
    ) -> Self {
        Self {
            mode,
            buffer_rows: 1,
            heights: HeightMode::Estimated(Arc::new(estimate)),
            on_change: None,
        }
    }

    pub fn with_buffer_rows(mut self, buffer_rows: usize) -> Self {
        self.buffer_rows = buffer_rows;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&Engine<K>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }
}

impl<K> Clone for EngineOptions<K> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            buffer_rows: self.buffer_rows,
            heights: self.heights.clone(),
            on_change: self.on_change.clone(),
        }
    }
}

impl<K> core::fmt::Debug for EngineOptions<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("mode", &self.mode)
            .field("buffer_rows", &self.buffer_rows)
            .field("heights", &self.heights)
            .finish_non_exhaustive()
    }
}

/// The virtual windowing engine.
///
/// One explicit instance owns all state — flat sequence, offset index,
/// selection/expansion store, row pool — so multiple independent virtualized
/// widgets can coexist in a process and everything is unit-testable without a
/// rendering surface.
///
/// The engine is driven, it does not drive: the host pushes scroll/resize
/// events and structural changes in, then pulls a [`RenderWindow`] and a
/// [`Reconciliation`] out. Nodes stay owned by the [`TreeSource`]; the engine
/// indexes them by stable id.
#[derive(Clone, Debug)]
pub struct Engine<K> {
    options: EngineOptions<K>,
    flat: Vec<FlatEntry<K>>,
    pos_of: KeyMap<K, usize>,
    index: RowIndex,
    measured_heights: KeyMap<K, u32>,
    state: StateStore<K>,
    reconciler: Reconciler,
    viewport_height: u32,
    scroll_offset: u64,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl<K: crate::NodeKey> Engine<K> {
    /// Creates an empty engine; call [`Engine::rebuild`] to index a source.
    pub fn new(options: EngineOptions<K>) -> Self {
        let index = match &options.heights {
            HeightMode::Uniform(size) => RowIndex::uniform(*size, 0),
            HeightMode::Estimated(_) => RowIndex::measured(Vec::new()),
        };
        Self {
            options,
            flat: Vec::new(),
            pos_of: KeyMap::default(),
            index,
            measured_heights: KeyMap::default(),
            state: StateStore::new(),
            reconciler: Reconciler::new(),
            viewport_height: 0,
            scroll_offset: 0,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    pub fn options(&self) -> &EngineOptions<K> {
        &self.options
    }

    pub fn set_buffer_rows(&mut self, buffer_rows: usize) {
        self.options.buffer_rows = buffer_rows;
        self.notify();
    }

    pub fn set_on_change(&mut self, on_change: Option<impl Fn(&Engine<K>) + Send + Sync + 'static>) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
    }

    // --- notification ---

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self);
        }
    }

    /// Notifications are queued while a batch (or a splice inside one) is in
    /// flight and delivered once, after the state is consistent again.
    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Coalesces multiple updates into a single `on_change` notification.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    // --- flat sequence ---

    /// Number of rows in the current flat sequence.
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn entries(&self) -> &[FlatEntry<K>] {
        &self.flat
    }

    pub fn entry(&self, position: usize) -> Option<&FlatEntry<K>> {
        self.flat.get(position)
    }

    /// Logical position of a currently visible node.
    pub fn position_of(&self, id: &K) -> Option<usize> {
        self.pos_of.get(id).copied()
    }

    /// Re-flattens the whole source under the current expansion state.
    ///
    /// Call after structural data changes (insert/remove/reparent). On error
    /// the previous flat sequence stays authoritative; nothing is modified.
    pub fn rebuild<S: TreeSource<Id = K>>(&mut self, source: &S) -> Result<(), FlattenError<K>> {
        let state = &self.state;
        let flat = flatten(source, self.options.mode, |id| state.is_expanded(id))?;
        self.flat = flat;
        self.pos_of = self
            .flat
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        self.rebuild_index();
        self.reconciler.invalidate();
        wdebug!(rows = self.flat.len(), "rebuild");
        self.notify();
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index = match &self.options.heights {
            HeightMode::Uniform(size) => RowIndex::uniform(*size, self.flat.len()),
            HeightMode::Estimated(estimate) => {
                let sizes = self
                    .flat
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        self.measured_heights
                            .get(&e.id)
                            .copied()
                            .unwrap_or_else(|| estimate(i))
                    })
                    .collect();
                RowIndex::measured(sizes)
            }
        };
    }

    /// Flips a node's expansion and splices its visible subtree in or out.
    ///
    /// Only the affected run is touched; positions after the splice point
    /// shift by the run length. Returns the new expansion state. Toggling a
    /// node that is not currently visible just flips the flag (it takes
    /// effect when its ancestors expand).
    pub fn toggle_expanded<S: TreeSource<Id = K>>(
        &mut self,
        source: &S,
        id: &K,
    ) -> Result<bool, FlattenError<K>> {
        let Some(&pos) = self.pos_of.get(id) else {
            let now = self.state.toggle_expanded(id.clone());
            self.notify();
            return Ok(now);
        };

        if self.state.is_expanded(id) {
            let run = self.subtree_run_len(pos);
            self.state.set_expanded(id.clone(), false);
            self.splice_entries(pos + 1, run, Vec::new());
            self.notify();
            Ok(false)
        } else {
            let depth = self.flat[pos].depth;
            let state = &self.state;
            let run = flatten_subtree(
                source,
                self.options.mode,
                |i| state.is_expanded(i),
                id,
                depth,
                pos,
            )?;
            self.guard_new_run(source, id, &run)?;
            self.state.set_expanded(id.clone(), true);
            self.splice_entries(pos + 1, 0, run);
            self.notify();
            Ok(true)
        }
    }

    /// Marks a lazily loaded subtree as in flight (typically right after
    /// expanding a node whose children are not loaded yet).
    pub fn begin_subtree_load(&mut self, id: K) -> bool {
        self.state.begin_subtree_load(id)
    }

    /// Splices in the children of `id` once their async load completed.
    ///
    /// Late results are ignored: if the node was re-collapsed (or the load
    /// superseded) since `begin_subtree_load`, this returns `Ok(false)` and
    /// changes nothing.
    pub fn complete_subtree_load<S: TreeSource<Id = K>>(
        &mut self,
        source: &S,
        id: &K,
    ) -> Result<bool, FlattenError<K>> {
        if !self.state.take_subtree_load(id) {
            wdebug!("ignoring superseded subtree load");
            return Ok(false);
        }
        let Some(&pos) = self.pos_of.get(id) else {
            // Still expanded, but an ancestor collapsed; the run appears when
            // the ancestor expands again.
            return Ok(false);
        };
        let depth = self.flat[pos].depth;
        let state = &self.state;
        let run = flatten_subtree(
            source,
            self.options.mode,
            |i| state.is_expanded(i),
            id,
            depth,
            pos,
        )?;
        self.guard_new_run(source, id, &run)?;
        self.splice_entries(pos + 1, 0, run);
        self.notify();
        Ok(true)
    }

    /// Entries after `pos` that belong to its subtree (depth greater than the
    /// entry's own).
    fn subtree_run_len(&self, pos: usize) -> usize {
        let depth = self.flat[pos].depth;
        self.flat[pos + 1..]
            .iter()
            .take_while(|e| e.depth > depth)
            .count()
    }

    /// A spliced-in run may not collide with ids already in the sequence: a
    /// collision on the expanded node's own ancestor chain is a cycle, any
    /// other collision a duplicate.
    fn guard_new_run<S: TreeSource<Id = K>>(
        &self,
        source: &S,
        expanded: &K,
        run: &[FlatEntry<K>],
    ) -> Result<(), FlattenError<K>> {
        for e in run {
            if !self.pos_of.contains_key(&e.id) {
                continue;
            }
            let mut cur = Some(expanded);
            while let Some(ancestor) = cur {
                if *ancestor == e.id {
                    return Err(FlattenError::CyclicStructure { id: e.id.clone() });
                }
                cur = source.parent(ancestor);
            }
            return Err(FlattenError::DuplicateNode { id: e.id.clone() });
        }
        Ok(())
    }

    fn splice_entries(&mut self, at: usize, removed: usize, inserted: Vec<FlatEntry<K>>) {
        let ins_len = inserted.len();
        let ins_sizes: Vec<u32> = match &self.options.heights {
            HeightMode::Uniform(size) => alloc::vec![*size; ins_len],
            HeightMode::Estimated(estimate) => inserted
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    self.measured_heights
                        .get(&e.id)
                        .copied()
                        .unwrap_or_else(|| estimate(at + i))
                })
                .collect(),
        };

        for e in &self.flat[at..at + removed] {
            self.pos_of.remove(&e.id);
        }
        self.flat.splice(at..at + removed, inserted);

        for i in at..at + ins_len {
            let id = self.flat[i].id.clone();
            self.pos_of.insert(id, i);
        }
        for i in at + ins_len..self.flat.len() {
            let entry = &mut self.flat[i];
            if let Some(p) = entry.parent {
                // A subtree run is contiguous, so no later entry can have its
                // parent inside the removed range.
                debug_assert!(p < at || p >= at + removed, "parent inside removed run");
                if p >= at + removed {
                    entry.parent = Some(p - removed + ins_len);
                }
            }
            let id = entry.id.clone();
            self.pos_of.insert(id, i);
        }

        self.index.splice(at, removed, &ins_sizes);
        self.reconciler.apply_splice(at, removed, ins_len);
        wdebug!(at, removed, inserted = ins_len, "splice");
    }

    // --- selection ---

    pub fn state(&self) -> &StateStore<K> {
        &self.state
    }

    pub fn selection_state(&self, id: &K) -> TriState {
        self.state.selection_state(id)
    }

    /// Toggles a node's selection; see [`StateStore::toggle_selected`].
    pub fn toggle_selected<S: TreeSource<Id = K>>(
        &mut self,
        source: &S,
        id: &K,
        cascade: bool,
    ) -> TriState {
        let next = self.state.toggle_selected(source, id, cascade);
        self.notify();
        next
    }

    /// Drops every trace of a node the data owner deleted (selection,
    /// expansion, pending load, cached measurement). Required before its id
    /// may be reused for a different node.
    pub fn forget(&mut self, id: &K) {
        debug_assert!(
            !self.pos_of.contains_key(id),
            "forget() on a node still in the flat sequence"
        );
        self.state.forget(id);
        self.measured_heights.remove(id);
    }

    // --- heights ---

    /// Records a host measurement for the row at `position`.
    ///
    /// No-op in uniform mode. The measurement is cached by node id and reused
    /// after splices and rebuilds.
    pub fn measure_row(&mut self, position: usize, size: u32) {
        if matches!(self.options.heights, HeightMode::Uniform(_)) {
            return;
        }
        let Some(entry) = self.flat.get(position) else {
            return;
        };
        wtrace!(position, size, "measure_row");
        self.measured_heights.insert(entry.id.clone(), size);
        self.index.set_size(position, size);
        self.notify();
    }

    pub fn measure_rows(&mut self, measurements: impl IntoIterator<Item = (usize, u32)>) {
        self.batch_update(|engine| {
            for (position, size) in measurements {
                engine.measure_row(position, size);
            }
        });
    }

    pub fn row_height(&self, position: usize) -> Option<u32> {
        self.index.size_of(position)
    }

    // --- geometry and scrolling ---

    pub fn row_index(&self) -> &RowIndex {
        &self.index
    }

    /// Cumulative height of the whole flat sequence; the host sizes its
    /// scrollable spacer from this.
    pub fn total_extent(&self) -> u64 {
        self.index.total_extent()
    }

    /// Cumulative height up to (not including) `position`; the host positions
    /// rows absolutely at this offset.
    pub fn offset_for_position(&self, position: usize) -> Option<u64> {
        (position < self.flat.len()).then(|| self.index.offset_for_position(position))
    }

    /// The logical position whose height range contains `scroll_offset`
    /// (clamped into the valid range).
    pub fn position_for_offset(&self, scroll_offset: u64) -> usize {
        self.index.position_for_offset(scroll_offset)
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.total_extent()
            .saturating_sub(self.viewport_height as u64)
    }

    pub fn clamp_scroll_offset(&self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    pub fn set_viewport_height(&mut self, viewport_height: u32) {
        if self.viewport_height == viewport_height {
            return;
        }
        self.viewport_height = viewport_height;
        self.notify();
    }

    pub fn set_scroll_offset(&mut self, offset: u64) {
        if self.scroll_offset == offset {
            return;
        }
        self.scroll_offset = offset;
        self.notify();
    }

    pub fn set_scroll_offset_clamped(&mut self, offset: u64) {
        let clamped = self.clamp_scroll_offset(offset);
        self.set_scroll_offset(clamped);
    }

    /// Host entry point for a raw scroll event.
    pub fn on_scroll(&mut self, offset: u64) {
        wtrace!(offset, "on_scroll");
        self.batch_update(|engine| engine.set_scroll_offset_clamped(offset));
    }

    /// Host entry point for a raw resize event.
    pub fn on_resize(&mut self, viewport_height: u32) {
        wtrace!(viewport_height, "on_resize");
        self.batch_update(|engine| engine.set_viewport_height(viewport_height));
    }

    /// Programmatically scrolls so `position` lands per `align`.
    ///
    /// Returns the applied (clamped) offset.
    pub fn scroll_to_position(&mut self, position: usize, align: Align) -> u64 {
        let offset = self.scroll_to_position_offset(position, align);
        self.set_scroll_offset(offset);
        offset
    }

    pub fn scroll_to_position_offset(&self, position: usize, align: Align) -> u64 {
        let count = self.flat.len();
        if count == 0 {
            return 0;
        }
        let position = position.min(count - 1);
        let start = self.index.offset_for_position(position);
        let size = self.index.size_of(position).unwrap_or(0) as u64;
        let end = start.saturating_add(size);
        let view = self.viewport_height as u64;

        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(view),
            Align::Center => start
                .saturating_add(size / 2)
                .saturating_sub(view / 2),
            Align::Auto => {
                let cur = self.scroll_offset;
                let cur_end = cur.saturating_add(view);
                if start >= cur && end <= cur_end {
                    cur
                } else if start < cur {
                    start
                } else {
                    end.saturating_sub(view)
                }
            }
        };
        self.clamp_scroll_offset(target)
    }

    // --- window and reconciliation ---

    /// The render window for the current scroll offset and viewport.
    pub fn compute_window(&self) -> RenderWindow {
        crate::window::compute_window(
            &self.index,
            self.scroll_offset,
            self.viewport_height,
            self.options.buffer_rows,
        )
    }

    /// Computes the current window and diffs the row pool against it.
    ///
    /// Returns the create/reuse/destroy instructions for the host; empty when
    /// nothing changed since the last call.
    pub fn reconcile(&mut self) -> Reconciliation {
        let window = self.compute_window();
        self.reconciler.reconcile(window)
    }

    /// The live, host-materialized rows.
    pub fn rendered_rows(&self) -> &[RenderedRow] {
        self.reconciler.rows()
    }
}
