/// Data-integrity errors raised by the Flattener.
///
/// These are fatal to the flatten pass that raised them, but never to the
/// engine: the previously valid flat sequence stays authoritative until a
/// pass succeeds (see [`crate::Engine::rebuild`]).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlattenError<K: core::fmt::Debug> {
    /// The same node id appeared twice in one flatten pass.
    #[error("duplicate node id {id:?} in flatten pass")]
    DuplicateNode { id: K },
    /// A node is its own transitive ancestor.
    #[error("node id {id:?} is its own transitive ancestor")]
    CyclicStructure { id: K },
}

impl<K: core::fmt::Debug> FlattenError<K> {
    /// The offending node id.
    pub fn id(&self) -> &K {
        match self {
            Self::DuplicateNode { id } | Self::CyclicStructure { id } => id,
        }
    }
}
