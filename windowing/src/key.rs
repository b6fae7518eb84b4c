#[cfg(not(feature = "std"))]
use alloc::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "std")]
use std::collections::{HashMap, HashSet};

#[cfg(feature = "std")]
pub(crate) type KeyMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyMap<K, V> = BTreeMap<K, V>;

#[cfg(feature = "std")]
pub(crate) type KeySet<K> = HashSet<K>;
#[cfg(not(feature = "std"))]
pub(crate) type KeySet<K> = BTreeSet<K>;

/// Bound for stable node ids the engine indexes by.
#[cfg(feature = "std")]
#[doc(hidden)]
pub trait NodeKey: core::hash::Hash + Eq + Clone + core::fmt::Debug {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq + Clone + core::fmt::Debug> NodeKey for K {}

#[cfg(not(feature = "std"))]
#[doc(hidden)]
pub trait NodeKey: Ord + Clone + core::fmt::Debug {}
#[cfg(not(feature = "std"))]
impl<K: Ord + Clone + core::fmt::Debug> NodeKey for K {}
