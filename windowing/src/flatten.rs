use alloc::vec::Vec;

use crate::key::KeySet;
use crate::source::TreeSource;
use crate::{DisplayMode, FlatEntry, FlattenError};

/// Flattens the source into the linear sequence of visible-in-principle rows.
///
/// Pre-order, depth-first, children in source order; a node's children are
/// included iff `is_expanded` says so (`Table` mode never descends). The
/// traversal is iterative, so hierarchy depth is bounded only by memory.
///
/// Duplicate ids and cycles abort the pass; the detection is keyed by id, not
/// by reference, so accidental structural sharing is caught too. Callers keep
/// their previous sequence on error.
pub fn flatten<S: TreeSource>(
    source: &S,
    mode: DisplayMode,
    is_expanded: impl Fn(&S::Id) -> bool,
) -> Result<Vec<FlatEntry<S::Id>>, FlattenError<S::Id>> {
    let mut out = Vec::new();
    let mut walk = Walk::new();
    for root in source.roots().iter().rev() {
        walk.stack.push(Frame::Enter {
            id: root.clone(),
            depth: 0,
            parent: None,
        });
    }
    walk.run(source, mode, &is_expanded, 0, &mut out)?;
    wdebug!(rows = out.len(), "flatten");
    Ok(out)
}

/// Flattens the visible descendants of one expanded node.
///
/// `depth` and `position` are the node's own depth and logical position; the
/// returned run is what a splice inserts at `position + 1`, with absolute
/// parent positions already in place.
pub fn flatten_subtree<S: TreeSource>(
    source: &S,
    mode: DisplayMode,
    is_expanded: impl Fn(&S::Id) -> bool,
    id: &S::Id,
    depth: u32,
    position: usize,
) -> Result<Vec<FlatEntry<S::Id>>, FlattenError<S::Id>> {
    let mut out = Vec::new();
    if matches!(mode, DisplayMode::Table) {
        return Ok(out);
    }
    let mut walk = Walk::new();
    walk.on_path.insert(id.clone());
    walk.seen.insert(id.clone());
    for child in source.children(id).iter().rev() {
        walk.stack.push(Frame::Enter {
            id: child.clone(),
            depth: depth + 1,
            parent: Some(position),
        });
    }
    walk.run(source, mode, &is_expanded, position + 1, &mut out)?;
    Ok(out)
}

enum Frame<K> {
    Enter {
        id: K,
        depth: u32,
        parent: Option<usize>,
    },
    Exit(K),
}

struct Walk<K> {
    stack: Vec<Frame<K>>,
    seen: KeySet<K>,
    on_path: KeySet<K>,
}

impl<K: crate::NodeKey> Walk<K> {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            seen: KeySet::default(),
            on_path: KeySet::default(),
        }
    }

    fn run<S: TreeSource<Id = K>>(
        &mut self,
        source: &S,
        mode: DisplayMode,
        is_expanded: &impl Fn(&K) -> bool,
        position_base: usize,
        out: &mut Vec<FlatEntry<K>>,
    ) -> Result<(), FlattenError<K>> {
        while let Some(frame) = self.stack.pop() {
            let (id, depth, parent) = match frame {
                Frame::Exit(id) => {
                    self.on_path.remove(&id);
                    continue;
                }
                Frame::Enter { id, depth, parent } => (id, depth, parent),
            };

            if self.on_path.contains(&id) {
                wwarn!("flatten aborted: cyclic structure");
                return Err(FlattenError::CyclicStructure { id });
            }
            if !self.seen.insert(id.clone()) {
                wwarn!("flatten aborted: duplicate node id");
                return Err(FlattenError::DuplicateNode { id });
            }

            let position = position_base + out.len();
            out.push(FlatEntry {
                id: id.clone(),
                depth,
                parent,
            });

            let descend = matches!(mode, DisplayMode::Tree) && is_expanded(&id);
            if !descend {
                continue;
            }
            let children = source.children(&id);
            if children.is_empty() {
                continue;
            }
            self.on_path.insert(id.clone());
            self.stack.push(Frame::Exit(id));
            for child in children.iter().rev() {
                self.stack.push(Frame::Enter {
                    id: child.clone(),
                    depth: depth + 1,
                    parent: Some(position),
                });
            }
        }
        Ok(())
    }
}
