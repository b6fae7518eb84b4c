use windowing::{
    Align, Engine, EngineOptions, FlattenError, Reconciliation, TreeSource, TriState,
};

use crate::{HostSurface, RowAnchor, WindowKey, apply_anchor, capture_first_visible_anchor};

/// A framework-neutral controller that wraps a [`windowing::Engine`] and
/// paces it against a [`HostSurface`].
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_scroll` / `on_resize` (or nothing; `tick` also pulls geometry from
///   the host) when UI events occur
/// - the structural entry points (`rebuild`, `toggle_expanded`, ...) when the
///   data or its view state changes
/// - `tick(host)` once per frame
///
/// Events only mark the controller dirty; all window computation and
/// reconciliation happens inside `tick`, so a burst of scroll events between
/// two frames costs exactly one reconciliation. The content extent is pushed
/// to the host only when it actually changed.
#[derive(Clone, Debug)]
pub struct Controller<K> {
    engine: Engine<K>,
    dirty: bool,
    pushed_extent: Option<u64>,
}

impl<K: WindowKey> Controller<K> {
    pub fn new(options: EngineOptions<K>) -> Self {
        Self::from_engine(Engine::new(options))
    }

    pub fn from_engine(engine: Engine<K>) -> Self {
        Self {
            engine,
            dirty: true,
            pushed_extent: None,
        }
    }

    pub fn engine(&self) -> &Engine<K> {
        &self.engine
    }

    /// Direct mutable access; prefer the entry points below, which track
    /// dirtiness. Callers mutating through this must call `mark_dirty`.
    pub fn engine_mut(&mut self) -> &mut Engine<K> {
        &mut self.engine
    }

    pub fn into_engine(self) -> Engine<K> {
        self.engine
    }

    /// Forces the next `tick` to recompute and reconcile.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // --- UI events ---

    pub fn on_scroll(&mut self, scroll_offset: u64) {
        self.engine.on_scroll(scroll_offset);
        self.dirty = true;
    }

    pub fn on_resize(&mut self, viewport_height: u32) {
        self.engine.on_resize(viewport_height);
        self.dirty = true;
    }

    /// Applies a scroll-to-position immediately and returns the applied
    /// (clamped) offset. The host moves its real scrollbar to the returned
    /// offset.
    pub fn scroll_to_position(&mut self, position: usize, align: Align) -> u64 {
        let offset = self.engine.scroll_to_position(position, align);
        self.dirty = true;
        offset
    }

    // --- structural events ---

    pub fn rebuild<S: TreeSource<Id = K>>(&mut self, source: &S) -> Result<(), FlattenError<K>> {
        self.engine.rebuild(source)?;
        self.dirty = true;
        Ok(())
    }

    pub fn toggle_expanded<S: TreeSource<Id = K>>(
        &mut self,
        source: &S,
        id: &K,
    ) -> Result<bool, FlattenError<K>> {
        let now = self.engine.toggle_expanded(source, id)?;
        self.dirty = true;
        Ok(now)
    }

    pub fn toggle_selected<S: TreeSource<Id = K>>(
        &mut self,
        source: &S,
        id: &K,
        cascade: bool,
    ) -> TriState {
        // Selection does not move rows; hosts restyle from their own state.
        self.engine.toggle_selected(source, id, cascade)
    }

    pub fn begin_subtree_load(&mut self, id: K) -> bool {
        self.engine.begin_subtree_load(id)
    }

    pub fn complete_subtree_load<S: TreeSource<Id = K>>(
        &mut self,
        source: &S,
        id: &K,
    ) -> Result<bool, FlattenError<K>> {
        let applied = self.engine.complete_subtree_load(source, id)?;
        if applied {
            self.dirty = true;
        }
        Ok(applied)
    }

    pub fn measure_rows(&mut self, measurements: impl IntoIterator<Item = (usize, u32)>) {
        self.engine.measure_rows(measurements);
        self.dirty = true;
    }

    // --- anchoring ---

    pub fn capture_first_visible_anchor(&self) -> Option<RowAnchor<K>> {
        capture_first_visible_anchor(&self.engine)
    }

    /// Re-applies an anchor; marks dirty only when it took effect.
    ///
    /// As with `scroll_to_position`, the host must move its real scrollbar to
    /// `engine().scroll_offset()` before the next `tick`, which otherwise
    /// pulls the host's stale offset back in.
    pub fn apply_anchor(&mut self, anchor: &RowAnchor<K>) -> bool {
        let applied = apply_anchor(&mut self.engine, anchor);
        if applied {
            self.dirty = true;
        }
        applied
    }

    // --- frame tick ---

    /// Advances the controller by one frame.
    ///
    /// Pulls the host's current geometry, then, if anything changed since the
    /// last tick, pushes the content extent (when it changed) and exactly one
    /// reconciliation. Returns whether a render pass ran.
    pub fn tick<H: HostSurface>(&mut self, host: &mut H) -> bool {
        let viewport = host.viewport_height();
        if viewport != self.engine.viewport_height() {
            self.engine.on_resize(viewport);
            self.dirty = true;
        }
        let offset = host.scroll_offset();
        if offset != self.engine.scroll_offset() && offset <= self.engine.max_scroll_offset() {
            self.engine.on_scroll(offset);
            self.dirty = true;
        }

        if !self.dirty {
            return false;
        }
        self.dirty = false;

        let extent = self.engine.total_extent();
        if self.pushed_extent != Some(extent) {
            self.pushed_extent = Some(extent);
            host.set_content_extent(extent);
        }

        let reconciliation = self.engine.reconcile();
        if !reconciliation.is_empty() {
            host.apply_reconciliation(&reconciliation);
        }
        true
    }

    /// Like `tick`, but hands the instructions back instead of pushing them
    /// into a host. For callers that own their render loop.
    pub fn tick_manual(&mut self) -> Option<Reconciliation> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.engine.reconcile())
    }
}
