use std::collections::HashMap;
use std::vec::Vec;

use windowing::{DisplayMode, EngineOptions, Reconciliation, TreeSource};

use crate::{Controller, HostSurface, capture_first_visible_anchor};

#[derive(Clone, Debug, Default)]
struct TestTree {
    roots: Vec<u64>,
    children: HashMap<u64, Vec<u64>>,
    parents: HashMap<u64, u64>,
}

impl TestTree {
    fn add_root(&mut self, id: u64) {
        self.roots.push(id);
    }

    fn add_child(&mut self, parent: u64, id: u64) {
        self.children.entry(parent).or_default().push(id);
        self.parents.insert(id, parent);
    }
}

impl TreeSource for TestTree {
    type Id = u64;

    fn roots(&self) -> &[u64] {
        &self.roots
    }

    fn children(&self, id: &u64) -> &[u64] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn parent(&self, id: &u64) -> Option<&u64> {
        self.parents.get(id)
    }
}

/// Recording host: a scrollable area plus a log of every push.
#[derive(Debug, Default)]
struct MockHost {
    viewport_height: u32,
    scroll_offset: u64,
    extent_pushes: Vec<u64>,
    applied: Vec<Reconciliation>,
}

impl HostSurface for MockHost {
    fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    fn set_content_extent(&mut self, total_extent: u64) {
        self.extent_pushes.push(total_extent);
    }

    fn apply_reconciliation(&mut self, reconciliation: &Reconciliation) {
        assert!(!reconciliation.is_empty());
        self.applied.push(reconciliation.clone());
    }
}

fn twenty_roots_first_expandable() -> TestTree {
    let mut tree = TestTree::default();
    for root in 0..20 {
        tree.add_root(root);
    }
    for c in 0..5 {
        tree.add_child(0, 100 + c);
    }
    tree
}

#[test]
fn first_tick_pushes_extent_and_initial_window() {
    let tree = twenty_roots_first_expandable();
    let mut host = MockHost {
        viewport_height: 10,
        ..MockHost::default()
    };
    let mut controller = Controller::new(EngineOptions::uniform(DisplayMode::Tree, 2));
    controller.rebuild(&tree).unwrap();

    assert!(controller.tick(&mut host));
    assert_eq!(host.extent_pushes, vec![40]);
    assert_eq!(host.applied.len(), 1);
    assert_eq!(
        host.applied[0].create.len(),
        controller.engine().rendered_rows().len()
    );

    // Nothing changed: the next tick is a no-op.
    assert!(!controller.tick(&mut host));
    assert_eq!(host.applied.len(), 1);
}

#[test]
fn scroll_bursts_coalesce_into_one_reconciliation() {
    let tree = twenty_roots_first_expandable();
    let mut host = MockHost {
        viewport_height: 10,
        ..MockHost::default()
    };
    let mut controller = Controller::new(EngineOptions::uniform(DisplayMode::Tree, 2));
    controller.rebuild(&tree).unwrap();
    controller.tick(&mut host);

    for offset in [2u64, 5, 9, 14, 20] {
        controller.on_scroll(offset);
    }
    host.scroll_offset = 20;

    assert!(controller.tick(&mut host));
    assert_eq!(host.applied.len(), 2);
    // Scrolling does not change the extent; it was pushed exactly once.
    assert_eq!(host.extent_pushes.len(), 1);
}

#[test]
fn tick_pulls_geometry_the_host_never_pushed() {
    let tree = twenty_roots_first_expandable();
    let mut host = MockHost {
        viewport_height: 10,
        ..MockHost::default()
    };
    let mut controller = Controller::new(EngineOptions::uniform(DisplayMode::Tree, 2));
    controller.rebuild(&tree).unwrap();
    controller.tick(&mut host);

    // The host's scrollbar moved without an on_scroll call.
    host.scroll_offset = 12;
    assert!(controller.tick(&mut host));
    assert_eq!(controller.engine().scroll_offset(), 12);
}

#[test]
fn structure_change_pushes_the_new_extent() {
    let tree = twenty_roots_first_expandable();
    let mut host = MockHost {
        viewport_height: 10,
        ..MockHost::default()
    };
    let mut controller = Controller::new(EngineOptions::uniform(DisplayMode::Tree, 2));
    controller.rebuild(&tree).unwrap();
    controller.tick(&mut host);

    controller.toggle_expanded(&tree, &0).unwrap();
    assert!(controller.tick(&mut host));
    assert_eq!(host.extent_pushes, vec![40, 50]);
}

#[test]
fn anchor_survives_a_collapse_above_the_viewport() {
    let tree = twenty_roots_first_expandable();
    let mut host = MockHost {
        viewport_height: 10,
        ..MockHost::default()
    };
    let mut controller = Controller::new(EngineOptions::uniform(DisplayMode::Tree, 2));
    controller.rebuild(&tree).unwrap();
    controller.toggle_expanded(&tree, &0).unwrap();
    controller.tick(&mut host);

    // Scroll so root 5 (position 10 while 0 is expanded) tops the viewport,
    // one unit into the row.
    controller.on_scroll(21);
    host.scroll_offset = 21;
    controller.tick(&mut host);
    let anchor = capture_first_visible_anchor(controller.engine()).unwrap();
    assert_eq!(anchor.id, 5);
    assert_eq!(anchor.offset_in_viewport, 1);

    // Collapsing root 0 removes 10 units of height above the anchor.
    controller.toggle_expanded(&tree, &0).unwrap();
    assert!(controller.apply_anchor(&anchor));
    // The host scrollbar follows the corrected offset before the next frame.
    host.scroll_offset = controller.engine().scroll_offset();
    controller.tick(&mut host);

    // Root 5 sits at position 5 now; the viewport still starts one unit in.
    assert_eq!(controller.engine().scroll_offset(), 11);
    assert_eq!(controller.engine().position_for_offset(11), 5);
}

#[test]
fn anchor_on_a_collapsed_away_node_is_rejected() {
    let tree = twenty_roots_first_expandable();
    let mut controller = Controller::new(EngineOptions::uniform(DisplayMode::Tree, 2));
    controller.rebuild(&tree).unwrap();
    controller.engine_mut().on_resize(10);
    controller.toggle_expanded(&tree, &0).unwrap();

    controller.on_scroll(2); // child 100 tops the viewport
    let anchor = capture_first_visible_anchor(controller.engine()).unwrap();
    assert_eq!(anchor.id, 100);

    controller.toggle_expanded(&tree, &0).unwrap();
    let before = controller.engine().scroll_offset();
    assert!(!controller.apply_anchor(&anchor));
    assert_eq!(controller.engine().scroll_offset(), before);
}
