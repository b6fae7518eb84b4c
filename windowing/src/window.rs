use core::cmp;

use crate::index::RowIndex;
use crate::types::RenderWindow;

/// Computes the contiguous range of logical positions to materialize.
///
/// Pure and idempotent: identical inputs yield an identical window, which is
/// what lets the Render Synchronizer skip work when nothing changed. The
/// scroll offset is clamped to the scrollable range first, so stale or
/// overscrolled offsets still produce a valid window.
///
/// `buffer_rows` are materialized on each side of the visible span to absorb
/// the one-frame latency between a scroll event and a completed render pass.
pub fn compute_window(
    index: &RowIndex,
    scroll_offset: u64,
    viewport_height: u32,
    buffer_rows: usize,
) -> RenderWindow {
    let count = index.len();
    if count == 0 || viewport_height == 0 {
        return RenderWindow::default();
    }

    let view = viewport_height as u64;
    let max_scroll = index.total_extent().saturating_sub(view);
    let offset = scroll_offset.min(max_scroll);

    let first = index.position_for_offset(offset);
    let last = index.position_for_offset(offset.saturating_add(view).saturating_sub(1));
    debug_assert!(first <= last, "inverted visible span ({first}..{last})");
    let last = cmp::max(first, last);

    let start = first.saturating_sub(buffer_rows);
    let end = cmp::min(count, last + 1 + buffer_rows);
    RenderWindow {
        start,
        end,
        buffer_before: first - start,
        buffer_after: end - cmp::min(end, last + 1),
    }
}
