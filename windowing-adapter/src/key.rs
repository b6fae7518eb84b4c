/// Bound alias for node ids usable with the adapter helpers.
///
/// Matches the key bound of the `windowing` crate (hashable with `std`,
/// ordered without).
pub trait WindowKey: windowing::NodeKey {}
impl<T: windowing::NodeKey> WindowKey for T {}
