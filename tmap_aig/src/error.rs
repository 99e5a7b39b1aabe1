use std::fmt;

/// Errors raised by graph-layer operations. Mirrors the shape of
/// `awint_dag::EvalError`: a plain `Debug + Clone` enum with a hand-written
/// `Display`, one line of doc per variant, no `thiserror`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// A cyclic fanin chain was found in the zero-lag projection, where the
    /// algorithm requires an acyclic graph (e.g. during `tsort`).
    CyclicZeroLagGraph,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::CyclicZeroLagGraph => write!(f, "cycle in zero-lag projection"),
        }
    }
}

impl std::error::Error for GraphError {}
