use windowing::Reconciliation;

/// The narrow surface a host environment implements.
///
/// The engine never calls into the host on its own; a [`crate::Controller`]
/// pulls geometry from here at each tick and pushes instructions back. Hosts
/// are expected to:
///
/// - report the current viewport height and scroll offset (already clamped to
///   non-negative by the unsigned types)
/// - size a scrollable spacer from `set_content_extent`
/// - create/rebind/release pooled row widgets per [`Reconciliation`], reading
///   row offsets back from the engine when positioning
pub trait HostSurface {
    fn viewport_height(&self) -> u32;

    fn scroll_offset(&self) -> u64;

    /// Called when the cumulative height of the flat sequence changed.
    fn set_content_extent(&mut self, total_extent: u64);

    /// Called with the create/reuse/destroy instructions of one render pass.
    /// Never called with an empty reconciliation.
    fn apply_reconciliation(&mut self, reconciliation: &Reconciliation);
}
