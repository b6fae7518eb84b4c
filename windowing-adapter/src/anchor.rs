use core::fmt;

use windowing::Engine;

use crate::WindowKey;

/// A scroll anchor that preserves visual position across structural changes.
///
/// Typical use cases:
/// - collapsing or reloading a subtree above the viewport without the rows on
///   screen jumping
/// - any splice/reorder where the viewport should stay glued to a node
///   identity rather than to a raw offset
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowAnchor<K> {
    pub id: K,
    /// Distance from the anchor row's start to the viewport's scroll offset.
    pub offset_in_viewport: u64,
}

impl<K: fmt::Debug> fmt::Debug for RowAnchor<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAnchor")
            .field("id", &self.id)
            .field("offset_in_viewport", &self.offset_in_viewport)
            .finish()
    }
}

/// Captures an anchor for the first visible row.
///
/// Returns `None` when the flat sequence is empty.
pub fn capture_first_visible_anchor<K: WindowKey>(engine: &Engine<K>) -> Option<RowAnchor<K>> {
    capture_anchor_at(engine, 0)
}

/// Captures an anchor for the row at `offset_in_viewport` below the top of the
/// viewport (`0` anchors the topmost visible row).
pub fn capture_anchor_at<K: WindowKey>(
    engine: &Engine<K>,
    offset_in_viewport: u64,
) -> Option<RowAnchor<K>> {
    if engine.is_empty() {
        return None;
    }
    let abs = engine.scroll_offset().saturating_add(offset_in_viewport);
    let position = engine.position_for_offset(abs);
    let entry = engine.entry(position)?;
    let start = engine.offset_for_position(position)?;
    Some(RowAnchor {
        id: entry.id.clone(),
        offset_in_viewport: engine.scroll_offset().saturating_sub(start),
    })
}

/// Re-applies a previously captured anchor by adjusting the scroll offset so
/// the anchored node sits where it was.
///
/// Returns `false` when the anchored node is no longer in the flat sequence
/// (collapsed away or deleted); the offset is left alone in that case.
pub fn apply_anchor<K: WindowKey>(engine: &mut Engine<K>, anchor: &RowAnchor<K>) -> bool {
    let Some(position) = engine.position_of(&anchor.id) else {
        return false;
    };
    let Some(start) = engine.offset_for_position(position) else {
        return false;
    };
    engine.set_scroll_offset_clamped(start.saturating_add(anchor.offset_in_viewport));
    true
}
