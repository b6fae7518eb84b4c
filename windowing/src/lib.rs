//! A headless virtual windowing engine for large table and tree views.
//!
//! For host-integration utilities (frame coalescing, anchoring), see the
//! `windowing-adapter` crate.
//!
//! This crate maps an unbounded, possibly hierarchical, dataset onto a bounded
//! render window: flattening a tree into a linear sequence under its current
//! expand/collapse state, prefix sums over row heights, fast offset → position
//! lookup, buffered window computation, and create/reuse/destroy reconciliation
//! of a bounded row pool.
//!
//! It is UI-agnostic. A host layer is expected to provide:
//! - viewport height and scroll offset
//! - the tree data, addressed by stable node ids (see [`TreeSource`])
//! - row height estimates and (optionally) dynamic measurements
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod engine;
mod error;
mod fenwick;
mod flatten;
mod index;
mod key;
mod reconcile;
mod selection;
mod source;
mod types;
mod window;


pub use engine::{Engine, EngineOptions, HeightMode, OnChangeCallback};
pub use error::FlattenError;
pub use flatten::{flatten, flatten_subtree};
pub use index::RowIndex;
pub use reconcile::Reconciler;
pub use selection::StateStore;
pub use source::TreeSource;
pub use types::{
    Align, DisplayMode, FlatEntry, Reconciliation, RenderWindow, RenderedRow, RowSlot, TriState,
};
pub use window::compute_window;

#[doc(hidden)]
pub use key::NodeKey;
