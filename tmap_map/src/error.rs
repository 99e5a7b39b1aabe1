use std::fmt;

/// Errors raised by the mapping layer. Same shape as `tmap_aig::GraphError`
/// (spec §7; grounded on `awint_dag::EvalError`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MapError {
    /// The underlying graph layer reported an error (e.g. a cycle in the
    /// zero-lag projection).
    Graph(tmap_aig::GraphError),
    /// A requested `max_cut` exceeds [`crate::cut::CUT_MAXIMUM`].
    CutTooWide(u32),
    /// A node's selected cut did not cover it (a structural invariant
    /// violation, spec §7 "Structural invariant violation").
    SpilledCut,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Graph(e) => write!(f, "graph layer error: {e}"),
            MapError::CutTooWide(k) => write!(f, "requested cut width {k} exceeds CUT_MAXIMUM"),
            MapError::SpilledCut => write!(f, "cut does not cover the node it was selected on"),
        }
    }
}

impl std::error::Error for MapError {}

impl From<tmap_aig::GraphError> for MapError {
    fn from(e: tmap_aig::GraphError) -> Self {
        MapError::Graph(e)
    }
}
