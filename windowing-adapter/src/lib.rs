//! Host-integration utilities for the `windowing` crate.
//!
//! The `windowing` crate is UI-agnostic and focuses on the core math and
//! state. This crate provides small, framework-neutral helpers commonly needed
//! when wiring an engine to a real scroll surface:
//!
//! - [`HostSurface`], the narrow trait a host implements (geometry in,
//!   reconciliation instructions out)
//! - [`Controller`], which coalesces scroll/resize/structure events into at
//!   most one reconciliation per frame tick
//! - Scroll anchoring by node id, so collapses and reloads above the viewport
//!   do not visually jump
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui/DOM
//! bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod anchor;
mod controller;
mod host;
mod key;

#[cfg(test)]
mod tests;

pub use anchor::{RowAnchor, apply_anchor, capture_anchor_at, capture_first_visible_anchor};
pub use controller::Controller;
pub use host::HostSurface;
pub use key::WindowKey;
